//! Integration тест: полный цикл shift через ECS (commands → systems → state)
//!
//! Rapier уровень: пол (верх y = 0), стена (face z = -1500, normal +Z).
//! Тики гоняем через `run_fixed_ticks`, без wall clock.

use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use bevy_rapier3d::prelude::ReadRapierContext;
use gravshift_simulation::shift::{AimMarker, ShiftMesh, ShiftVisual};
use gravshift_simulation::{
    create_headless_app, rapier_raycast, run_fixed_ticks, spawn_gravity_shifter, spawn_static_box, GravityShifter,
    MovementMode, ShiftBody, ShiftCommand, ShiftCommandKind, ShiftConfig, ShiftState, ShiftStateChanged,
};

const WALL_Z: f32 = -1500.0;
const STANDING_Y: f32 = 138.0;
const POSITION_TOLERANCE: f32 = 1e-2;

fn setup() -> (App, Entity) {
    let mut app = create_headless_app(7);

    let entity = {
        let mut commands = app.world_mut().commands();
        spawn_static_box(&mut commands, Vec3::new(0.0, -50.0, 0.0), Vec3::new(5000.0, 50.0, 5000.0));
        spawn_static_box(&mut commands, Vec3::new(0.0, 1500.0, WALL_Z - 100.0), Vec3::new(5000.0, 1500.0, 100.0));
        spawn_gravity_shifter(&mut commands, Vec3::new(0.0, 200.0, 0.0), ShiftConfig::default())
    };
    app.world_mut().flush();

    (app, entity)
}

fn send(app: &mut App, entity: Entity, kind: ShiftCommandKind) {
    app.world_mut().send_event(ShiftCommand::new(entity, kind));
}

fn state(app: &App, entity: Entity) -> ShiftState {
    app.world().get::<GravityShifter>(entity).unwrap().state()
}

fn translation(app: &App, entity: Entity) -> Vec3 {
    app.world().get::<Transform>(entity).unwrap().translation
}

fn body(app: &App, entity: Entity) -> ShiftBody {
    app.world().get::<ShiftBody>(entity).unwrap().clone()
}

/// Levitating → Accelerating → ждём стену
fn fly_to_wall(app: &mut App, entity: Entity) {
    send(app, entity, ShiftCommandKind::ShiftToggle);
    run_fixed_ticks(app, 5);
    send(app, entity, ShiftCommandKind::ShiftToggle);

    for _ in 0..600 {
        run_fixed_ticks(app, 1);
        if state(app, entity) == ShiftState::WallGrounded {
            break;
        }
    }
    assert_eq!(state(app, entity), ShiftState::WallGrounded, "never reached the wall");

    // Blend'ы капсулы/меша
    run_fixed_ticks(app, 20);
}

#[test]
fn test_spawned_shifter_lands_on_floor() {
    let (mut app, entity) = setup();
    run_fixed_ticks(&mut app, 60);

    let body = body(&app, entity);
    assert_eq!(body.mode, MovementMode::Walking);
    assert!(body.grounded);
    assert!((translation(&app, entity).y - STANDING_Y).abs() < POSITION_TOLERANCE);

    // Меш заспавнен child'ом
    let mesh = app.world().get::<ShiftVisual>(entity).unwrap().mesh;
    assert!(app.world().get::<ShiftMesh>(mesh).is_some());
}

#[test]
fn test_walk_on_ground_moves_camera_relative() {
    let (mut app, entity) = setup();
    run_fixed_ticks(&mut app, 60);
    let start = translation(&app, entity);

    for _ in 0..30 {
        send(&mut app, entity, ShiftCommandKind::Move(Vec2::new(0.0, 1.0)));
        run_fixed_ticks(&mut app, 1);
    }

    // Камера по умолчанию смотрит в -Z
    let moved = translation(&app, entity) - start;
    assert!(moved.z < -200.0);
    assert!(moved.x.abs() < POSITION_TOLERANCE);
    assert!((translation(&app, entity).y - STANDING_Y).abs() < POSITION_TOLERANCE);
}

#[test]
fn test_levitate_shows_marker_and_stops_gravity() {
    let (mut app, entity) = setup();
    run_fixed_ticks(&mut app, 60);

    send(&mut app, entity, ShiftCommandKind::ShiftToggle);
    run_fixed_ticks(&mut app, 1);

    assert_eq!(state(&app, entity), ShiftState::Levitating);
    assert!(app.world().get::<AimMarker>(entity).unwrap().visible);

    // Событие записано в этом же тике (до следующего swap'а буферов)
    let events = app.world().resource::<Events<ShiftStateChanged>>();
    let changes: Vec<_> = events.iter_current_update_events().copied().collect();
    assert_eq!(
        changes,
        vec![ShiftStateChanged {
            entity,
            from: ShiftState::NoShift,
            to: ShiftState::Levitating,
        }]
    );

    let before = translation(&app, entity);
    run_fixed_ticks(&mut app, 60);
    assert!(translation(&app, entity).abs_diff_eq(before, 1e-3));

    let body = body(&app, entity);
    assert_eq!(body.gravity_scale, 0.0);
    assert_eq!(body.mode, MovementMode::Flying);
}

#[test]
fn test_full_shift_cycle() {
    let (mut app, entity) = setup();
    run_fixed_ticks(&mut app, 60);

    fly_to_wall(&mut app, entity);

    // Капсула стоит на радиус от стены, "низ" = -normal
    let on_wall = translation(&app, entity);
    assert!((on_wall.z - (WALL_Z + 42.0)).abs() < POSITION_TOLERANCE, "capsule at {on_wall:?}");
    let shifter = app.world().get::<GravityShifter>(entity).unwrap();
    assert!(shifter.controller.gravity_direction().abs_diff_eq(Vec3::NEG_Z, 1e-4));
    assert_eq!(shifter.controller.speed(), 980.0);
    assert!(!app.world().get::<AimMarker>(entity).unwrap().visible);

    // Вверх по стене: forward стены = +Y
    for _ in 0..30 {
        send(&mut app, entity, ShiftCommandKind::Move(Vec2::new(0.0, 1.0)));
        run_fixed_ticks(&mut app, 1);
    }
    let climbed = translation(&app, entity);
    assert!(climbed.y > on_wall.y + 100.0);
    assert!((climbed.z - on_wall.z).abs() < POSITION_TOLERANCE);

    // Cancel: падаем обратно на пол
    send(&mut app, entity, ShiftCommandKind::Cancel);
    run_fixed_ticks(&mut app, 240);

    assert_eq!(state(&app, entity), ShiftState::NoShift);
    let body = body(&app, entity);
    assert_eq!(body.mode, MovementMode::Walking);
    assert_eq!(body.gravity_scale, 1.0);
    assert_eq!(body.air_control, 0.35);
    assert!(body.orient_to_velocity);
    assert!((translation(&app, entity).y - STANDING_Y).abs() < POSITION_TOLERANCE);
}

#[test]
fn test_jump_ignored_while_shifted() {
    let (mut app, entity) = setup();
    run_fixed_ticks(&mut app, 60);

    send(&mut app, entity, ShiftCommandKind::Jump);
    run_fixed_ticks(&mut app, 5);
    assert!(translation(&app, entity).y > STANDING_Y);

    // Приземлились, теперь shift и jump
    run_fixed_ticks(&mut app, 120);
    send(&mut app, entity, ShiftCommandKind::StopJumping);
    send(&mut app, entity, ShiftCommandKind::ShiftToggle);
    send(&mut app, entity, ShiftCommandKind::Jump);
    run_fixed_ticks(&mut app, 5);

    assert_eq!(state(&app, entity), ShiftState::Levitating);
    assert!(!body(&app, entity).wants_jump);
}

#[test]
fn test_command_for_unknown_entity_is_ignored() {
    let (mut app, entity) = setup();
    let stranger = app.world_mut().spawn_empty().id();

    send(&mut app, stranger, ShiftCommandKind::ShiftToggle);
    run_fixed_ticks(&mut app, 1);

    assert_eq!(state(&app, entity), ShiftState::NoShift);
}

#[test]
fn test_command_events_do_not_accumulate() {
    let (mut app, entity) = setup();

    for _ in 0..500 {
        send(&mut app, entity, ShiftCommandKind::Look(Vec2::new(0.5, 0.0)));
        run_fixed_ticks(&mut app, 1);
    }

    // Двойной буфер: живут только события последних двух update'ов
    let buffered = app.world().resource::<Events<ShiftCommand>>().len();
    assert!(buffered <= 2, "{buffered} ShiftCommand events still buffered");

    let changes = app.world().resource::<Events<ShiftStateChanged>>().len();
    assert!(changes <= 2);
}

#[test]
fn test_fixed_ticks_advance_fixed_time_exactly() {
    let (mut app, _) = setup();
    let timestep = app.world().resource::<Time<Fixed>>().timestep();
    let start = app.world().resource::<Time<Fixed>>().elapsed();

    run_fixed_ticks(&mut app, 10);

    let elapsed = app.world().resource::<Time<Fixed>>().elapsed() - start;
    assert_eq!(elapsed, timestep * 10);
}

#[test]
fn test_shifter_rays_skip_own_capsule() {
    let (mut app, entity) = setup();
    run_fixed_ticks(&mut app, 60);

    // Луч сверху вниз прямо сквозь стоящую капсулу
    let (blocked, through) = app
        .world_mut()
        .run_system_once(move |rapier_context: ReadRapierContext| {
            let context = rapier_context.single().expect("default rapier context");
            let origin = Vec3::new(0.0, 1000.0, 0.0);
            let end = Vec3::new(0.0, -10.0, 0.0);
            (
                rapier_raycast(&context, origin, end, None),
                rapier_raycast(&context, origin, end, Some(entity)),
            )
        })
        .expect("raycast system runs");

    let capsule_top = STANDING_Y + 96.0 + 42.0;
    let blocked = blocked.expect("capsule blocks the ray");
    assert!((blocked.point.y - capsule_top).abs() < POSITION_TOLERANCE);

    let through = through.expect("floor below the capsule");
    assert!(through.point.y.abs() < POSITION_TOLERANCE);
    assert!(through.normal.abs_diff_eq(Vec3::Y, 1e-4));
}
