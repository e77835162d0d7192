//! ECS компоненты gravity shift персонажа
//!
//! Root entity: GravityShifter + ShiftBody + Transform (капсула) +
//! CapsuleDimensions + ShiftCameraRig + AimMarker + ShiftVisual.
//! Child entity: ShiftMesh + Transform (относительно капсулы).

use bevy::prelude::*;

use super::controller::ShiftController;
use super::state::{MovementMode, ShiftState};

/// Владеет shift контроллером персонажа
#[derive(Component, Debug)]
pub struct GravityShifter {
    pub controller: ShiftController,
}

impl GravityShifter {
    pub fn new(controller: ShiftController) -> Self {
        Self { controller }
    }

    pub fn state(&self) -> ShiftState {
        self.controller.state()
    }
}

/// Movement state host'а (то, что в движке делает character movement)
///
/// Controller пишет сюда velocity/режимы, `integrate_shift_bodies` двигает капсулу.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ShiftBody {
    pub velocity: Vec3,
    pub mode: MovementMode,
    pub gravity_scale: f32,
    pub air_control: f32,
    /// Поворачивать капсулу по горизонтальной velocity
    pub orient_to_velocity: bool,
    /// Накопленный за тик movement input (world)
    pub pending_input: Vec3,
    /// Скорость ходьбы (units/s)
    pub walk_speed: f32,
    pub jump_speed: f32,
    /// Мировая гравитация (units/s²)
    pub world_gravity: Vec3,
    pub grounded: bool,
    pub wants_jump: bool,
}

impl Default for ShiftBody {
    fn default() -> Self {
        Self {
            velocity: Vec3::ZERO,
            mode: MovementMode::Falling,
            gravity_scale: 1.0,
            air_control: 0.35,
            orient_to_velocity: true,
            pending_input: Vec3::ZERO,
            walk_speed: 500.0,
            jump_speed: 700.0,
            world_gravity: Vec3::new(0.0, -980.0, 0.0),
            grounded: false,
            wants_jump: false,
        }
    }
}

/// Ссылка root → меш
#[derive(Component, Debug, Clone, Copy)]
pub struct ShiftVisual {
    pub mesh: Entity,
}

/// Маркер визуального меша (child капсулы)
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ShiftMesh;

/// Boom камера вокруг персонажа (yaw/pitch + косметический offset)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ShiftCameraRig {
    /// Радианы
    pub yaw: f32,
    pub pitch: f32,
    pub boom_length: f32,
    /// Точка крепления boom относительно капсулы
    pub pivot_offset: Vec3,
    /// Offset в локальных осях камеры (x = вправо)
    pub offset: Vec3,
    pub look_sensitivity: f32,
    /// Считается в `update_camera_rigs`
    pub position: Vec3,
    pub forward: Vec3,
}

impl Default for ShiftCameraRig {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            boom_length: 400.0,
            pivot_offset: Vec3::new(0.0, 60.0, 0.0),
            offset: Vec3::ZERO,
            look_sensitivity: 0.01,
            position: Vec3::ZERO,
            forward: Vec3::NEG_Z,
        }
    }
}

/// Pitch ограничен чтобы камера не переворачивалась
pub const MAX_CAMERA_PITCH: f32 = 1.4;

impl ShiftCameraRig {
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Пересчёт position/forward от точки, за которой следим
    pub fn follow(&mut self, target: Vec3) {
        let rotation = self.rotation();
        self.forward = rotation * Vec3::NEG_Z;
        self.position = target + self.pivot_offset - self.forward * self.boom_length + rotation * self.offset;
    }

    pub fn add_look_input(&mut self, input: Vec2) {
        self.yaw -= input.x * self.look_sensitivity;
        self.pitch = (self.pitch - input.y * self.look_sensitivity).clamp(-MAX_CAMERA_PITCH, MAX_CAMERA_PITCH);
    }
}

/// Aim marker UI (в headless просто флаг)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct AimMarker {
    pub visible: bool,
}
