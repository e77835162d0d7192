//! ECS системы gravity shift
//!
//! Порядок в FixedUpdate (chain):
//! 1. update_camera_rigs: камера следует за капсулой
//! 2. apply_shift_commands: input → контроллер
//! 3. apply_shift_impacts: collision прошлого тика → `on_hit`
//! 4. tick_gravity_shifters: blend'ы, разгон, стена
//! 5. integrate_shift_bodies: velocity → Transform, capsule shape cast, ground snap
//!
//! Все queries идут в `RapierContext` (ReadRapierContext) и пропускают
//! collider самого персонажа.

use bevy::prelude::*;
use bevy_rapier3d::prelude::ReadRapierContext;

use super::components::{AimMarker, GravityShifter, ShiftBody, ShiftCameraRig, ShiftMesh, ShiftVisual};
use super::controller::{ShiftController, ShiftTrace};
use super::events::{ShiftCommand, ShiftCommandKind, ShiftImpact, ShiftStateChanged};
use super::host::{CameraRig, MarkerUi, MeshRestPose, MovementDefaults, MovementHost, TransformHost};
use super::state::MovementMode;
use super::ShiftConfig;
use crate::logger::{log, log_info, log_warning};
use crate::math::{horizontal, is_degenerate, look_at_rotation};
use crate::physics::{ground_below, rapier_raycast, shifter_collider, sweep_capsule, QueryProbe};
use crate::probe::{SurfaceHit, SurfaceProbe};
use crate::wall::CapsuleDimensions;

/// Нормаль с `y` выше этого порога считается полом
pub const FLOOR_NORMAL_MIN_Y: f32 = 0.7;

type ShifterData = (
    Entity,
    &'static mut GravityShifter,
    &'static mut ShiftBody,
    &'static mut Transform,
    &'static CapsuleDimensions,
    Option<&'static ShiftVisual>,
    &'static mut ShiftCameraRig,
    &'static mut AimMarker,
);

type MeshFilter = (With<ShiftMesh>, Without<GravityShifter>);

// ============================================================================
// Host adapter
// ============================================================================

/// ShiftHost поверх компонентов одного персонажа
pub struct EcsShiftHost<'a> {
    pub body: &'a mut ShiftBody,
    pub capsule: &'a mut Transform,
    pub dims: CapsuleDimensions,
    pub mesh: Option<&'a mut Transform>,
    pub rig: &'a mut ShiftCameraRig,
    pub marker: &'a mut AimMarker,
    /// Raycast в физику host'а (без collider'а этого персонажа)
    pub probe: &'a dyn SurfaceProbe,
}

impl MovementHost for EcsShiftHost<'_> {
    fn velocity(&self) -> Vec3 {
        self.body.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.body.velocity = velocity;
    }

    fn movement_mode(&self) -> MovementMode {
        self.body.mode
    }

    fn set_movement_mode(&mut self, mode: MovementMode) {
        if mode != MovementMode::Walking {
            self.body.grounded = false;
        }
        self.body.mode = mode;
    }

    fn gravity_scale(&self) -> f32 {
        self.body.gravity_scale
    }

    fn set_gravity_scale(&mut self, scale: f32) {
        self.body.gravity_scale = scale;
    }

    fn air_control(&self) -> f32 {
        self.body.air_control
    }

    fn set_air_control(&mut self, air_control: f32) {
        self.body.air_control = air_control;
    }

    fn stop_immediately(&mut self) {
        self.body.velocity = Vec3::ZERO;
        self.body.pending_input = Vec3::ZERO;
    }

    fn set_orient_to_velocity(&mut self, enabled: bool) {
        self.body.orient_to_velocity = enabled;
    }

    fn add_movement_input(&mut self, direction: Vec3, scale: f32) {
        self.body.pending_input += direction * scale;
    }

    fn jump(&mut self) {
        self.body.wants_jump = true;
    }

    fn stop_jumping(&mut self) {
        self.body.wants_jump = false;
    }
}

impl TransformHost for EcsShiftHost<'_> {
    fn capsule_transform(&self) -> Transform {
        *self.capsule
    }

    fn set_capsule_transform(&mut self, transform: Transform) {
        *self.capsule = transform;
    }

    fn capsule_dimensions(&self) -> CapsuleDimensions {
        self.dims
    }

    fn mesh_relative_transform(&self) -> Transform {
        self.mesh.as_deref().copied().unwrap_or_default()
    }

    fn set_mesh_relative_transform(&mut self, transform: Transform) {
        if let Some(mesh) = self.mesh.as_deref_mut() {
            *mesh = transform;
        }
    }
}

impl CameraRig for EcsShiftHost<'_> {
    fn camera_position(&self) -> Vec3 {
        self.rig.position
    }

    fn camera_forward(&self) -> Vec3 {
        self.rig.forward
    }

    fn add_look_input(&mut self, input: Vec2) {
        self.rig.add_look_input(input);
    }

    fn set_camera_offset(&mut self, offset: Vec3) {
        self.rig.offset = offset;
    }
}

impl MarkerUi for EcsShiftHost<'_> {
    fn show_marker(&mut self) {
        self.marker.visible = true;
    }

    fn hide_marker(&mut self) {
        self.marker.visible = false;
    }
}

impl SurfaceProbe for EcsShiftHost<'_> {
    fn raycast(&self, origin: Vec3, end: Vec3) -> Option<SurfaceHit> {
        self.probe.raycast(origin, end)
    }
}

// ============================================================================
// Spawn
// ============================================================================

/// Спавн персонажа: капсула + меш (child) + камера + маркер.
///
/// Контроллер получает trace hook, который пишет в crate logger.
pub fn spawn_gravity_shifter(commands: &mut Commands, position: Vec3, config: ShiftConfig) -> Entity {
    let body = ShiftBody::default();
    let rest_pose = MeshRestPose::default();
    let defaults = MovementDefaults {
        gravity_scale: body.gravity_scale,
        air_control: body.air_control,
    };

    let dims = CapsuleDimensions::default();
    let transform = Transform::from_translation(position);

    let mesh = commands.spawn((ShiftMesh, rest_pose.to_transform())).id();
    let root = commands
        .spawn((
            transform,
            GlobalTransform::from(transform),
            body,
            dims,
            shifter_collider(&dims),
            ShiftCameraRig::default(),
            AimMarker::default(),
            ShiftVisual { mesh },
        ))
        .id();

    let controller =
        ShiftController::new(config, defaults, rest_pose).with_trace_hook(move |event| log_shift_trace(root, event));

    commands
        .entity(root)
        .insert(GravityShifter::new(controller))
        .add_child(mesh);

    log_info(&format!("Spawned gravity shifter {:?} at {:?}", root, position));
    root
}

/// ShiftTrace → logger (transition = info, fallback = warning, остальное debug)
pub fn log_shift_trace(entity: Entity, event: &ShiftTrace) {
    match event {
        ShiftTrace::Transition(transition) => {
            log_info(&format!("{:?}: {} → {}", entity, transition.from, transition.to));
        }
        ShiftTrace::DegenerateWall {
            normal,
            approach_direction,
        } => {
            log_warning(&format!(
                "{:?}: horizontal surface {:?}, fallback approach {:?}",
                entity, normal, approach_direction
            ));
        }
        ShiftTrace::AimResolved { aim_point, direction, hit } => {
            log(&format!(
                "{:?}: aim {:?} (hit: {}), gravity → {:?}",
                entity, aim_point, hit, direction
            ));
        }
        ShiftTrace::ProximityBrake { point, distance } => {
            log(&format!("{:?}: wall ahead at {:?} ({:.1}), braking", entity, point, distance));
        }
        ShiftTrace::WallAttached { point, basis } => {
            log(&format!(
                "{:?}: attached at {:?} normal={:?} right={:?} forward={:?}",
                entity, point, basis.normal, basis.right, basis.forward
            ));
        }
        ShiftTrace::BlendFinished(target) => {
            log(&format!("{:?}: blend finished {:?}", entity, target));
        }
    }
}

fn emit_transitions(entity: Entity, controller: &mut ShiftController, changed: &mut EventWriter<ShiftStateChanged>) {
    for transition in controller.drain_transitions() {
        changed.write(ShiftStateChanged {
            entity,
            from: transition.from,
            to: transition.to,
        });
    }
}

// ============================================================================
// Systems
// ============================================================================

/// Камера следует за капсулой (position/forward для aim probe)
pub fn update_camera_rigs(mut rigs: Query<(&Transform, &mut ShiftCameraRig), Without<ShiftMesh>>) {
    for (transform, mut rig) in rigs.iter_mut() {
        rig.follow(transform.translation);
    }
}

/// Система: ShiftCommand → handlers контроллера
pub fn apply_shift_commands(
    mut commands: EventReader<ShiftCommand>,
    mut shifters: Query<ShifterData, Without<ShiftMesh>>,
    mut meshes: Query<&mut Transform, MeshFilter>,
    rapier_context: ReadRapierContext,
    mut changed: EventWriter<ShiftStateChanged>,
) {
    let context = rapier_context.single().ok();

    for command in commands.read() {
        let Ok((entity, mut shifter, mut body, mut capsule, dims, visual, mut rig, mut marker)) =
            shifters.get_mut(command.entity)
        else {
            log_warning(&format!("ShiftCommand for unknown entity {:?}", command.entity));
            continue;
        };

        let mut mesh = match visual {
            Some(visual) => meshes.get_mut(visual.mesh).ok(),
            None => None,
        };
        let probe = QueryProbe(|origin: Vec3, end: Vec3| {
            context
                .as_ref()
                .and_then(|context| rapier_raycast(context, origin, end, Some(entity)))
        });
        let mut host = EcsShiftHost {
            body: &mut body,
            capsule: &mut capsule,
            dims: *dims,
            mesh: mesh.as_deref_mut(),
            rig: &mut rig,
            marker: &mut marker,
            probe: &probe,
        };

        let controller = &mut shifter.controller;
        match command.kind {
            ShiftCommandKind::Move(input) => controller.on_move(input, &mut host),
            ShiftCommandKind::Look(input) => controller.on_look(input, &mut host),
            ShiftCommandKind::Jump => controller.on_jump(&mut host),
            ShiftCommandKind::StopJumping => controller.on_stop_jumping(&mut host),
            ShiftCommandKind::ShiftToggle => controller.on_shift_toggle(&mut host),
            ShiftCommandKind::Cancel => controller.on_cancel(&mut host),
        }

        emit_transitions(entity, controller, &mut changed);
    }
}

/// Система: ShiftImpact (collision) → `on_hit`
pub fn apply_shift_impacts(
    mut impacts: EventReader<ShiftImpact>,
    mut shifters: Query<ShifterData, Without<ShiftMesh>>,
    mut meshes: Query<&mut Transform, MeshFilter>,
    rapier_context: ReadRapierContext,
    mut changed: EventWriter<ShiftStateChanged>,
) {
    let context = rapier_context.single().ok();

    for impact in impacts.read() {
        let Ok((entity, mut shifter, mut body, mut capsule, dims, visual, mut rig, mut marker)) =
            shifters.get_mut(impact.entity)
        else {
            continue;
        };

        let mut mesh = match visual {
            Some(visual) => meshes.get_mut(visual.mesh).ok(),
            None => None,
        };
        let probe = QueryProbe(|origin: Vec3, end: Vec3| {
            context
                .as_ref()
                .and_then(|context| rapier_raycast(context, origin, end, Some(entity)))
        });
        let mut host = EcsShiftHost {
            body: &mut body,
            capsule: &mut capsule,
            dims: *dims,
            mesh: mesh.as_deref_mut(),
            rig: &mut rig,
            marker: &mut marker,
            probe: &probe,
        };

        shifter.controller.on_hit(impact.point, impact.normal, &mut host);
        emit_transitions(entity, &mut shifter.controller, &mut changed);
    }
}

/// Система: tick контроллеров (FixedUpdate)
pub fn tick_gravity_shifters(
    mut shifters: Query<ShifterData, Without<ShiftMesh>>,
    mut meshes: Query<&mut Transform, MeshFilter>,
    rapier_context: ReadRapierContext,
    time: Res<Time<Fixed>>,
    mut changed: EventWriter<ShiftStateChanged>,
) {
    let delta = time.delta_secs();
    let context = rapier_context.single().ok();

    for (entity, mut shifter, mut body, mut capsule, dims, visual, mut rig, mut marker) in shifters.iter_mut() {
        let mut mesh = match visual {
            Some(visual) => meshes.get_mut(visual.mesh).ok(),
            None => None,
        };
        let probe = QueryProbe(|origin: Vec3, end: Vec3| {
            context
                .as_ref()
                .and_then(|context| rapier_raycast(context, origin, end, Some(entity)))
        });
        let mut host = EcsShiftHost {
            body: &mut body,
            capsule: &mut capsule,
            dims: *dims,
            mesh: mesh.as_deref_mut(),
            rig: &mut rig,
            marker: &mut marker,
            probe: &probe,
        };

        shifter.controller.tick(delta, &mut host);
        emit_transitions(entity, &mut shifter.controller, &mut changed);
    }
}

/// Система: velocity → Transform (headless movement host)
///
/// - Walking: горизонтальная скорость из input, ground snap
/// - Falling: мировая гравитация * gravity_scale, air control
/// - Flying: velocity как есть + input вдоль стены
///
/// Столкновения шлют ShiftImpact (контроллер сам решает, нужен ли он).
pub fn integrate_shift_bodies(
    mut bodies: Query<(Entity, &mut ShiftBody, &mut Transform, &CapsuleDimensions), (With<GravityShifter>, Without<ShiftMesh>)>,
    rapier_context: ReadRapierContext,
    time: Res<Time<Fixed>>,
    mut impacts: EventWriter<ShiftImpact>,
) {
    let delta = time.delta_secs();
    if delta <= 0.0 {
        return;
    }
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, mut body, mut transform, dims) in bodies.iter_mut() {
        let input = std::mem::take(&mut body.pending_input).clamp_length_max(1.0);

        match body.mode {
            MovementMode::Walking => {
                let planar = horizontal(input) * body.walk_speed;
                body.velocity = planar;

                if body.wants_jump && body.grounded {
                    body.velocity.y = body.jump_speed;
                    body.mode = MovementMode::Falling;
                    body.grounded = false;
                    body.wants_jump = false;
                }
            }
            MovementMode::Falling => {
                let gravity = body.world_gravity * body.gravity_scale;
                let steer = horizontal(input) * body.walk_speed * body.air_control;
                body.velocity += (gravity + steer) * delta;
            }
            MovementMode::Flying => {}
        }

        let mut displacement = body.velocity * delta;
        if body.mode == MovementMode::Flying {
            displacement += input * body.walk_speed * delta;
        }

        match sweep_capsule(&context, entity, &transform, dims, displacement) {
            Some(hit) => {
                let direction = displacement.normalize_or_zero();
                transform.translation += direction * hit.distance;

                impacts.write(ShiftImpact {
                    entity,
                    point: hit.point,
                    normal: hit.normal,
                });

                // Гасим составляющую в поверхность
                let into = body.velocity.dot(hit.normal);
                if into < 0.0 {
                    let normal = hit.normal;
                    body.velocity -= normal * into;
                }

                if body.mode == MovementMode::Falling && hit.normal.y > FLOOR_NORMAL_MIN_Y {
                    body.mode = MovementMode::Walking;
                    body.grounded = true;
                    body.velocity.y = 0.0;
                }
            }
            None => {
                transform.translation += displacement;
            }
        }

        if body.mode == MovementMode::Walking {
            snap_to_ground(ground_below(&context, entity, transform.translation, dims), &mut body, &mut transform, dims);
        }

        if body.orient_to_velocity && body.mode != MovementMode::Flying {
            let flat = horizontal(body.velocity);
            if !is_degenerate(flat) {
                transform.rotation = look_at_rotation(Vec3::ZERO, flat);
            }
        }
    }
}

/// Walking: стоим на полу или начинаем падать
fn snap_to_ground(ground: Option<SurfaceHit>, body: &mut ShiftBody, transform: &mut Transform, dims: &CapsuleDimensions) {
    match ground {
        Some(hit) if hit.normal.y > FLOOR_NORMAL_MIN_Y => {
            transform.translation.y = hit.point.y + dims.radius + dims.half_height;
            body.grounded = true;
        }
        _ => {
            body.mode = MovementMode::Falling;
            body.grounded = false;
        }
    }
}
