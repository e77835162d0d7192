//! Headless демо gravity shift
//!
//! Сценарий: стоим на полу → Levitating → Accelerating к стене → WallGrounded
//! → идём вверх по стене → cancel → падаем обратно на пол.

use bevy::prelude::*;
use rand::Rng;

use gravshift_simulation::{
    create_headless_app, log_info, log_warning, run_fixed_ticks, spawn_gravity_shifter, spawn_static_box,
    DeterministicRng, GravityShifter, ShiftBody, ShiftCommand, ShiftCommandKind, ShiftConfig, ShiftState,
};

const WALL_Z: f32 = -1500.0;
const MAX_FLIGHT_TICKS: u32 = 600;

fn main() {
    let seed = 42;
    println!("Starting GravShift headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);

    let shifter = {
        let mut commands = app.world_mut().commands();
        // Пол (верх y = 0) и стена (face z = WALL_Z)
        spawn_static_box(&mut commands, Vec3::new(0.0, -50.0, 0.0), Vec3::new(5000.0, 50.0, 5000.0));
        spawn_static_box(&mut commands, Vec3::new(0.0, 1500.0, WALL_Z - 100.0), Vec3::new(5000.0, 1500.0, 100.0));
        spawn_gravity_shifter(&mut commands, Vec3::new(0.0, 200.0, 0.0), ShiftConfig::default())
    };
    app.world_mut().flush();

    // Приземляемся
    run_fixed_ticks(&mut app, 30);
    report(&app, shifter, "settled");

    // Чуть поворачиваем камеру (seeded)
    let yaw_jitter = app.world_mut().resource_mut::<DeterministicRng>().rng.gen_range(-5.0..5.0);
    send(&mut app, shifter, ShiftCommandKind::Look(Vec2::new(yaw_jitter, 0.0)));
    run_fixed_ticks(&mut app, 1);

    send(&mut app, shifter, ShiftCommandKind::ShiftToggle);
    run_fixed_ticks(&mut app, 20);
    report(&app, shifter, "levitating");

    send(&mut app, shifter, ShiftCommandKind::ShiftToggle);
    let mut flight_ticks = 0;
    while state(&app, shifter) == Some(ShiftState::Accelerating) && flight_ticks < MAX_FLIGHT_TICKS {
        run_fixed_ticks(&mut app, 1);
        flight_ticks += 1;
    }
    report(&app, shifter, &format!("after {} flight ticks", flight_ticks));

    if state(&app, shifter) != Some(ShiftState::WallGrounded) {
        log_warning("Never reached the wall, stopping");
        return;
    }

    // Идём по стене
    for _ in 0..60 {
        send(&mut app, shifter, ShiftCommandKind::Move(Vec2::new(0.0, 1.0)));
        run_fixed_ticks(&mut app, 1);
    }
    report(&app, shifter, "walked on wall");

    send(&mut app, shifter, ShiftCommandKind::Cancel);
    run_fixed_ticks(&mut app, 180);
    report(&app, shifter, "back on the ground");

    println!("Simulation complete!");
}

fn send(app: &mut App, entity: Entity, kind: ShiftCommandKind) {
    app.world_mut().send_event(ShiftCommand::new(entity, kind));
}

fn state(app: &App, entity: Entity) -> Option<ShiftState> {
    app.world().get::<GravityShifter>(entity).map(GravityShifter::state)
}

fn report(app: &App, entity: Entity, label: &str) {
    let world = app.world();
    let (Some(transform), Some(body), Some(shifter)) = (
        world.get::<Transform>(entity),
        world.get::<ShiftBody>(entity),
        world.get::<GravityShifter>(entity),
    ) else {
        log_warning(&format!("{}: shifter {:?} is gone", label, entity));
        return;
    };

    log_info(&format!(
        "{}: state={} pos={:?} mode={:?} speed={:.0} gravity={:?}",
        label,
        shifter.state(),
        transform.translation,
        body.mode,
        shifter.controller.speed(),
        shifter.controller.gravity_direction(),
    ));
}
