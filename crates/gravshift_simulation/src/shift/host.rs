//! Host capabilities для shift контроллера
//!
//! Контроллер не владеет физикой, капсулой, камерой и UI. Host (ECS адаптер,
//! движок, mock в тестах) реализует эти trait'ы и передаётся в каждый вызов
//! контроллера как `&mut H`.

use bevy::prelude::*;

use super::state::MovementMode;
use crate::probe::SurfaceProbe;
use crate::wall::CapsuleDimensions;

/// Character movement (velocity, гравитация, режимы)
pub trait MovementHost {
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);
    fn movement_mode(&self) -> MovementMode;
    fn set_movement_mode(&mut self, mode: MovementMode);
    fn gravity_scale(&self) -> f32;
    fn set_gravity_scale(&mut self, scale: f32);
    fn air_control(&self) -> f32;
    fn set_air_control(&mut self, air_control: f32);
    /// Обнулить velocity и накопленный input
    fn stop_immediately(&mut self);
    fn set_orient_to_velocity(&mut self, enabled: bool);
    /// Накопить movement input (world direction * scale), host применит в своём tick
    fn add_movement_input(&mut self, direction: Vec3, scale: f32);
    fn jump(&mut self);
    fn stop_jumping(&mut self);
}

/// Капсула (world transform) и визуальный меш (transform относительно капсулы)
pub trait TransformHost {
    fn capsule_transform(&self) -> Transform;
    fn set_capsule_transform(&mut self, transform: Transform);
    fn capsule_dimensions(&self) -> CapsuleDimensions;
    fn mesh_relative_transform(&self) -> Transform;
    fn set_mesh_relative_transform(&mut self, transform: Transform);
}

pub trait CameraRig {
    fn camera_position(&self) -> Vec3;
    fn camera_forward(&self) -> Vec3;
    fn add_look_input(&mut self, input: Vec2);
    /// Косметический offset камеры (lateral/vertical)
    fn set_camera_offset(&mut self, offset: Vec3);
}

/// Маркер прицела (только show/hide)
pub trait MarkerUi {
    fn show_marker(&mut self);
    fn hide_marker(&mut self);
}

/// Всё, что нужно контроллеру от host'а.
pub trait ShiftHost: MovementHost + TransformHost + CameraRig + MarkerUi + SurfaceProbe {}

impl<T> ShiftHost for T where T: MovementHost + TransformHost + CameraRig + MarkerUi + SurfaceProbe {}

/// Дефолты movement, снимаются один раз при создании контроллера
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct MovementDefaults {
    pub gravity_scale: f32,
    pub air_control: f32,
}

impl Default for MovementDefaults {
    fn default() -> Self {
        Self {
            gravity_scale: 1.0,
            air_control: 0.35,
        }
    }
}

impl MovementDefaults {
    pub fn capture<H: MovementHost + ?Sized>(host: &H) -> Self {
        Self {
            gravity_scale: host.gravity_scale(),
            air_control: host.air_control(),
        }
    }
}

/// Rest pose меша относительно капсулы (куда меш возвращается на землю)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct MeshRestPose {
    pub offset: Vec3,
    pub rotation: Quat,
}

impl MeshRestPose {
    pub fn capture<H: TransformHost + ?Sized>(host: &H) -> Self {
        let relative = host.mesh_relative_transform();
        Self {
            offset: relative.translation,
            rotation: relative.rotation,
        }
    }

    pub fn to_transform(self) -> Transform {
        Transform {
            translation: self.offset,
            rotation: self.rotation,
            scale: Vec3::ONE,
        }
    }
}

impl Default for MeshRestPose {
    /// Ноги на дне капсулы, визуальный "перед" меша (+X) смотрит в forward капсулы (-Z).
    fn default() -> Self {
        let dims = CapsuleDimensions::default();
        Self {
            offset: Vec3::new(0.0, -(dims.half_height + dims.radius), 0.0),
            rotation: Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        }
    }
}
