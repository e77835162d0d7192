//! Gravity shift контроллер (state machine)
//!
//! Plain struct: владеет состоянием shift, blend'ами капсулы/меша и camera
//! timeline. Host передаётся в каждый вызов (`&mut H: ShiftHost`).
//!
//! Переходы:
//! - NoShift → Levitating: `on_shift_toggle` / `begin_levitating`
//! - Levitating → Accelerating: `on_shift_toggle` / `begin_accelerating`
//! - Accelerating → WallGrounded: `on_hit` или wall-proximity probe в `tick`
//! - * → NoShift: `on_cancel` / `return_to_ground`
//!
//! Команды не по состоянию (jump в воздухе, hit на земле) молча игнорируются.

use bevy::prelude::*;
use std::fmt;

use super::config::ShiftConfig;
use super::host::{MeshRestPose, MovementDefaults, ShiftHost};
use super::kinematics::ShiftKinematics;
use super::state::{MovementMode, ShiftState, ShiftTransition};
use crate::blend::{CameraOffsetTimeline, TransformBlend};
use crate::gravity::{probe_wall_proximity, resolve_aim};
use crate::math::{horizontal, safe_normalize, DEFAULT_HEADING, WORLD_DOWN, WORLD_UP};
use crate::probe::SurfaceHit;
use crate::wall::{
    compute_wall_attachment, forward_from_mesh_rotation, orient_mesh_to_wall, WallAttachment, WallBasis,
    WALL_ORIENT_BLEND_SECS,
};

/// Зачем запущен blend меша (определяет completion hook)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshBlendPurpose {
    /// Меш едет на стену; по завершении обновляем basis.forward
    WallAttach,
    /// Поворот меша по input на стене
    WallOrient,
    /// Возврат в rest pose
    ReturnToRest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendTarget {
    Capsule,
    Mesh(MeshBlendPurpose),
}

/// Диагностика контроллера (observability hook вместо логов в математике)
#[derive(Debug, Clone, PartialEq)]
pub enum ShiftTrace {
    Transition(ShiftTransition),
    AimResolved {
        aim_point: Vec3,
        direction: Vec3,
        hit: bool,
    },
    ProximityBrake {
        point: Vec3,
        distance: f32,
    },
    WallAttached {
        point: Vec3,
        basis: WallBasis,
    },
    /// Горизонтальная стена: approach direction взят из fallback
    DegenerateWall {
        normal: Vec3,
        approach_direction: Vec3,
    },
    BlendFinished(BlendTarget),
}

pub type ShiftTraceHook = Box<dyn FnMut(&ShiftTrace) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct MeshBlend {
    blend: TransformBlend,
    purpose: MeshBlendPurpose,
}

pub struct ShiftController {
    config: ShiftConfig,
    state: ShiftState,
    /// Текущий "низ" (unit)
    gravity_direction: Vec3,
    kinematics: ShiftKinematics,
    /// Последняя стена. Валидна только в WallGrounded, дальше остаётся stale.
    wall: Option<WallAttachment>,
    defaults: MovementDefaults,
    rest_pose: MeshRestPose,
    /// Move input, который WallGrounded съест в следующем tick
    pending_move: Vec2,
    capsule_blend: Option<TransformBlend>,
    mesh_blend: Option<MeshBlend>,
    camera_timeline: CameraOffsetTimeline,
    transitions: Vec<ShiftTransition>,
    trace_hook: Option<ShiftTraceHook>,
}

impl fmt::Debug for ShiftController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShiftController")
            .field("state", &self.state)
            .field("gravity_direction", &self.gravity_direction)
            .field("kinematics", &self.kinematics)
            .field("wall", &self.wall)
            .field("capsule_blend", &self.capsule_blend)
            .field("mesh_blend", &self.mesh_blend)
            .finish_non_exhaustive()
    }
}

impl ShiftController {
    pub fn new(config: ShiftConfig, defaults: MovementDefaults, rest_pose: MeshRestPose) -> Self {
        let camera_timeline = CameraOffsetTimeline::new(config.camera_offset_duration, config.camera_ease);

        Self {
            kinematics: ShiftKinematics::from_config(&config),
            config,
            state: ShiftState::NoShift,
            gravity_direction: WORLD_DOWN,
            wall: None,
            defaults,
            rest_pose,
            pending_move: Vec2::ZERO,
            capsule_blend: None,
            mesh_blend: None,
            camera_timeline,
            transitions: Vec::new(),
            trace_hook: None,
        }
    }

    /// Снимает дефолты movement и rest pose меша с host'а (один раз, на старте)
    pub fn from_host<H: ShiftHost + ?Sized>(config: ShiftConfig, host: &H) -> Self {
        Self::new(config, MovementDefaults::capture(host), MeshRestPose::capture(host))
    }

    pub fn with_trace_hook(mut self, hook: impl FnMut(&ShiftTrace) + Send + Sync + 'static) -> Self {
        self.set_trace_hook(hook);
        self
    }

    pub fn set_trace_hook(&mut self, hook: impl FnMut(&ShiftTrace) + Send + Sync + 'static) {
        self.trace_hook = Some(Box::new(hook));
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn state(&self) -> ShiftState {
        self.state
    }

    pub fn config(&self) -> &ShiftConfig {
        &self.config
    }

    pub fn gravity_direction(&self) -> Vec3 {
        self.gravity_direction
    }

    pub fn kinematics(&self) -> &ShiftKinematics {
        &self.kinematics
    }

    pub fn speed(&self) -> f32 {
        self.kinematics.speed
    }

    /// Текущая (или последняя) стена
    pub fn wall_attachment(&self) -> Option<&WallAttachment> {
        self.wall.as_ref()
    }

    /// WallBasis, только пока стоим на стене
    pub fn wall_basis(&self) -> Option<&WallBasis> {
        match self.state {
            ShiftState::WallGrounded => self.wall.as_ref().map(|wall| &wall.basis),
            _ => None,
        }
    }

    pub fn defaults(&self) -> MovementDefaults {
        self.defaults
    }

    pub fn rest_pose(&self) -> MeshRestPose {
        self.rest_pose
    }

    pub fn is_capsule_blending(&self) -> bool {
        self.capsule_blend.is_some()
    }

    pub fn mesh_blend_purpose(&self) -> Option<MeshBlendPurpose> {
        self.mesh_blend.map(|mesh| mesh.purpose)
    }

    /// Переходы с последнего вызова
    pub fn drain_transitions(&mut self) -> Vec<ShiftTransition> {
        std::mem::take(&mut self.transitions)
    }

    // ========================================================================
    // Input handlers
    // ========================================================================

    /// Move input (x = strafe, y = вперёд/назад)
    ///
    /// На земле: относительно yaw камеры. На стене: запоминаем до tick.
    pub fn on_move<H: ShiftHost + ?Sized>(&mut self, input: Vec2, host: &mut H) {
        match self.state {
            ShiftState::NoShift => {
                let forward = safe_normalize(horizontal(host.camera_forward()), DEFAULT_HEADING);
                let right = forward.cross(WORLD_UP);

                host.add_movement_input(forward, input.y);
                host.add_movement_input(right, input.x);
            }
            ShiftState::WallGrounded => {
                self.pending_move = input;
            }
            ShiftState::Levitating | ShiftState::Accelerating => {}
        }
    }

    pub fn on_look<H: ShiftHost + ?Sized>(&mut self, input: Vec2, host: &mut H) {
        host.add_look_input(input);
    }

    /// Jump только с земли
    pub fn on_jump<H: ShiftHost + ?Sized>(&mut self, host: &mut H) {
        if self.state == ShiftState::NoShift {
            host.jump();
        }
    }

    pub fn on_stop_jumping<H: ShiftHost + ?Sized>(&mut self, host: &mut H) {
        host.stop_jumping();
    }

    /// NoShift → Levitating, Levitating → Accelerating, иначе ничего
    pub fn on_shift_toggle<H: ShiftHost + ?Sized>(&mut self, host: &mut H) {
        match self.state {
            ShiftState::NoShift => {
                self.begin_levitating(host);
            }
            ShiftState::Levitating => {
                self.begin_accelerating(host);
            }
            ShiftState::Accelerating | ShiftState::WallGrounded => {}
        }
    }

    pub fn on_cancel<H: ShiftHost + ?Sized>(&mut self, host: &mut H) {
        self.return_to_ground(host);
    }

    /// Collision callback от movement host'а
    ///
    /// Учитывается только в Accelerating.
    pub fn on_hit<H: ShiftHost + ?Sized>(&mut self, point: Vec3, normal: Vec3, host: &mut H) {
        if self.state != ShiftState::Accelerating {
            return;
        }

        let hit = SurfaceHit {
            point,
            normal: safe_normalize(normal, -self.gravity_direction),
            distance: 0.0,
        };
        self.attach_to_wall(&hit, host);
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    /// Вход в Levitating (только из NoShift). Возвращает true если перешли.
    pub fn begin_levitating<H: ShiftHost + ?Sized>(&mut self, host: &mut H) -> bool {
        if self.state != ShiftState::NoShift {
            return false;
        }

        host.set_velocity(Vec3::ZERO);
        host.set_movement_mode(MovementMode::Flying);
        host.set_air_control(0.0);
        host.set_gravity_scale(0.0);
        host.set_orient_to_velocity(false);
        host.show_marker();

        self.camera_timeline.play_forward();
        self.start_mesh_blend(
            self.rest_pose.to_transform(),
            self.config.back_to_ground_transition_duration,
            MeshBlendPurpose::ReturnToRest,
            host,
        );

        self.transition_to(ShiftState::Levitating);
        true
    }

    /// Вход в Accelerating (только из Levitating): aim probe + сброс скорости.
    pub fn begin_accelerating<H: ShiftHost + ?Sized>(&mut self, host: &mut H) -> bool {
        if self.state != ShiftState::Levitating {
            return false;
        }

        host.hide_marker();
        host.set_air_control(self.defaults.air_control);
        host.set_gravity_scale(0.0);

        let character_position = host.capsule_transform().translation;
        let aim = resolve_aim(&*host, host.camera_position(), host.camera_forward(), character_position);

        self.gravity_direction = aim.direction;
        self.kinematics.reset();
        self.trace(ShiftTrace::AimResolved {
            aim_point: aim.aim_point,
            direction: aim.direction,
            hit: aim.hit.is_some(),
        });

        self.transition_to(ShiftState::Accelerating);
        true
    }

    /// Любое состояние → NoShift (cancel / fail-safe)
    pub fn return_to_ground<H: ShiftHost + ?Sized>(&mut self, host: &mut H) {
        host.set_gravity_scale(self.defaults.gravity_scale);
        host.set_air_control(self.defaults.air_control);
        host.set_orient_to_velocity(true);
        host.set_movement_mode(MovementMode::Falling);
        host.hide_marker();

        self.camera_timeline.reverse();
        self.capsule_blend = None;
        self.start_mesh_blend(
            self.rest_pose.to_transform(),
            self.config.back_to_ground_transition_duration,
            MeshBlendPurpose::ReturnToRest,
            host,
        );

        self.gravity_direction = WORLD_DOWN;
        self.pending_move = Vec2::ZERO;
        self.transition_to(ShiftState::NoShift);
    }

    fn attach_to_wall<H: ShiftHost + ?Sized>(&mut self, hit: &SurfaceHit, host: &mut H) {
        host.set_movement_mode(MovementMode::Flying);
        host.stop_immediately();
        host.set_orient_to_velocity(false);

        let capsule = host.capsule_transform();
        let attachment = compute_wall_attachment(hit, &capsule, &host.capsule_dimensions());

        if attachment.degenerate {
            self.trace(ShiftTrace::DegenerateWall {
                normal: attachment.basis.normal,
                approach_direction: attachment.approach_direction,
            });
        }

        self.gravity_direction = -attachment.basis.normal;
        self.wall = Some(attachment);
        self.pending_move = Vec2::ZERO;
        self.transition_to(ShiftState::WallGrounded);
        self.trace(ShiftTrace::WallAttached {
            point: hit.point,
            basis: attachment.basis,
        });

        self.start_capsule_blend(attachment.capsule, self.config.wall_capsule_transition_duration, host);
        self.start_mesh_blend(
            attachment.mesh_relative,
            self.config.wall_mesh_transition_duration,
            MeshBlendPurpose::WallAttach,
            host,
        );
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Один тик симуляции: blend'ы, camera offset, логика состояния.
    pub fn tick<H: ShiftHost + ?Sized>(&mut self, delta: f32, host: &mut H) {
        self.advance_blends(delta, host);

        if let Some(alpha) = self.camera_timeline.advance(delta) {
            let offset = self
                .config
                .camera_offset_default
                .lerp(self.config.camera_offset_levitating, alpha);
            host.set_camera_offset(offset);
        }

        match self.state {
            ShiftState::Accelerating => self.tick_accelerating(delta, host),
            ShiftState::WallGrounded => self.tick_wall_grounded(host),
            ShiftState::NoShift | ShiftState::Levitating => {}
        }
    }

    fn tick_accelerating<H: ShiftHost + ?Sized>(&mut self, delta: f32, host: &mut H) {
        let capsule = host.capsule_transform();
        let dims = host.capsule_dimensions();

        let proximity = probe_wall_proximity(
            &*host,
            capsule.translation,
            capsule.rotation * Vec3::Y,
            dims.half_height,
            self.gravity_direction,
            self.config.wall_raycast_length,
        );

        if let Some(hit) = proximity {
            // Стена впереди: тормозим до стартовой скорости и сразу цепляемся
            self.kinematics.reset();
            host.set_velocity(self.gravity_direction * self.kinematics.speed);
            self.trace(ShiftTrace::ProximityBrake {
                point: hit.point,
                distance: hit.distance,
            });
            self.attach_to_wall(&hit, host);
            return;
        }

        let speed = self.kinematics.integrate(delta);
        host.set_velocity(self.gravity_direction * speed);
    }

    fn tick_wall_grounded<H: ShiftHost + ?Sized>(&mut self, host: &mut H) {
        let input = std::mem::take(&mut self.pending_move);
        let Some(wall) = self.wall else {
            return;
        };

        host.add_movement_input(wall.basis.right, input.x);
        host.add_movement_input(wall.basis.forward, input.y);

        let Some(mesh_world_rotation) = orient_mesh_to_wall(input, &wall.basis, wall.wall_rotator) else {
            return;
        };

        let target = Transform {
            translation: wall.mesh_relative.translation,
            rotation: (wall.capsule.rotation.inverse() * mesh_world_rotation).normalize(),
            scale: wall.mesh_relative.scale,
        };
        self.start_mesh_blend(target, WALL_ORIENT_BLEND_SECS, MeshBlendPurpose::WallOrient, host);
    }

    // ========================================================================
    // Blends
    // ========================================================================

    fn start_capsule_blend<H: ShiftHost + ?Sized>(&mut self, target: Transform, duration: f32, host: &mut H) {
        if duration <= 0.0 {
            self.capsule_blend = None;
            host.set_capsule_transform(target);
            return;
        }
        self.capsule_blend = Some(TransformBlend::new(host.capsule_transform(), target, duration));
    }

    /// Новый blend меша перезаписывает предыдущий (без completion hook старого).
    fn start_mesh_blend<H: ShiftHost + ?Sized>(
        &mut self,
        target: Transform,
        duration: f32,
        purpose: MeshBlendPurpose,
        host: &mut H,
    ) {
        if duration <= 0.0 {
            self.mesh_blend = None;
            host.set_mesh_relative_transform(target);
            self.on_mesh_blend_finished(purpose, host);
            return;
        }

        self.mesh_blend = Some(MeshBlend {
            blend: TransformBlend::new(host.mesh_relative_transform(), target, duration),
            purpose,
        });
    }

    fn advance_blends<H: ShiftHost + ?Sized>(&mut self, delta: f32, host: &mut H) {
        if let Some(blend) = self.capsule_blend.as_mut() {
            let step = blend.advance(delta);
            host.set_capsule_transform(step.transform);
            if step.finished {
                self.capsule_blend = None;
                self.trace(ShiftTrace::BlendFinished(BlendTarget::Capsule));
            }
        }

        if let Some(mesh) = self.mesh_blend.as_mut() {
            let step = mesh.blend.advance(delta);
            let purpose = mesh.purpose;
            host.set_mesh_relative_transform(step.transform);
            if step.finished {
                self.mesh_blend = None;
                self.on_mesh_blend_finished(purpose, host);
            }
        }
    }

    fn on_mesh_blend_finished<H: ShiftHost + ?Sized>(&mut self, purpose: MeshBlendPurpose, host: &mut H) {
        if purpose == MeshBlendPurpose::WallAttach && self.state == ShiftState::WallGrounded {
            if let Some(wall) = self.wall.as_mut() {
                // Капсула могла ещё не доехать: берём её целевой поворот
                let mesh_world = wall.capsule.rotation * host.mesh_relative_transform().rotation;
                wall.basis.forward = forward_from_mesh_rotation(mesh_world);
            }
        }
        self.trace(ShiftTrace::BlendFinished(BlendTarget::Mesh(purpose)));
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn transition_to(&mut self, next: ShiftState) {
        let transition = ShiftTransition {
            from: self.state,
            to: next,
        };
        self.state = next;

        if transition.from != transition.to {
            self.transitions.push(transition);
            self.trace(ShiftTrace::Transition(transition));
        }
    }

    fn trace(&mut self, event: ShiftTrace) {
        if let Some(hook) = self.trace_hook.as_mut() {
            hook(&event);
        }
    }
}
