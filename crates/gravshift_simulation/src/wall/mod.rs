//! Wall alignment
//!
//! При контакте со стеной капсула остаётся вертикальной и смотрит в стену,
//! а визуальный меш переезжает на поверхность:
//! - `WallBasis` (forward/right/normal) для движения по стене
//! - wall rotator (up = normal) это world rotation меша
//!
//! ВАЖНО: forward basis'а = *right* вектор wall rotator'а, `orient` на это
//! опирается.

use bevy::prelude::*;

use crate::math::{
    frame_from_up_forward, horizontal, inverse_transform_point, inverse_transform_rotation, is_degenerate,
    look_at_rotation, safe_normalize, Frame, DEFAULT_HEADING, WORLD_UP,
};
use crate::probe::SurfaceHit;

pub mod orient;

pub use orient::{orient_mesh_to_wall, signed_input_angle, WALL_ORIENT_BLEND_SECS};

/// Дистанция look-at цели перед капсулой
pub const LOOK_AT_DISTANCE: f32 = 100.0;

/// `normal.y < -CEILING_NORMAL_THRESHOLD` = потолок/навес
pub const CEILING_NORMAL_THRESHOLD: f32 = 0.5;

/// Размер collision капсулы
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct CapsuleDimensions {
    pub radius: f32,
    pub half_height: f32,
}

impl Default for CapsuleDimensions {
    fn default() -> Self {
        Self {
            radius: 42.0,
            half_height: 96.0,
        }
    }
}

/// Локальный frame стены, к которой прилипли.
///
/// Инвариант: единичные векторы, `right = forward × normal`.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct WallBasis {
    pub normal: Vec3,
    pub right: Vec3,
    pub forward: Vec3,
}

impl WallBasis {
    /// Направление движения вдоль стены для 2D input (x = strafe, y = forward)
    pub fn movement_direction(&self, input: Vec2) -> Vec3 {
        self.right * input.x + self.forward * input.y
    }
}

/// Всё, что считается при контакте со стеной
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WallAttachment {
    pub basis: WallBasis,
    /// World rotation меша на стене (up = нормаль hit'а)
    pub wall_rotator: Quat,
    /// Куда ставим капсулу (world)
    pub capsule: Transform,
    /// Куда ставим меш, относительно `capsule`
    pub mesh_relative: Transform,
    /// Горизонтальное направление капсулы (в стену)
    pub approach_direction: Vec3,
    /// У нормали нет горизонтали, `approach_direction` это fallback
    pub degenerate: bool,
}

/// Горизонтальное направление в стену: `-normalize(horizontal(normal))`.
///
/// У пола и потолка горизонтали нет: капсула сохраняет текущий
/// горизонтальный heading, иначе `DEFAULT_HEADING`.
pub fn approach_direction(normal: Vec3, current_rotation: Quat) -> (Vec3, bool) {
    let flat = horizontal(normal);
    if !is_degenerate(flat) {
        return (-flat.normalize(), false);
    }

    let heading = horizontal(current_rotation * Vec3::NEG_Z);
    if is_degenerate(heading) {
        (DEFAULT_HEADING, true)
    } else {
        (heading.normalize(), true)
    }
}

/// Центр капсулы для контакта: radius вдоль нормали, у потолка ещё
/// half_height вниз, от навеса.
pub fn capsule_placement(hit: &SurfaceHit, dims: &CapsuleDimensions) -> Vec3 {
    let mut position = hit.point + hit.normal * dims.radius;
    if hit.normal.y < -CEILING_NORMAL_THRESHOLD {
        position -= WORLD_UP * dims.half_height;
    }
    position
}

/// Цели капсулы/меша и новый wall basis для контакта
pub fn compute_wall_attachment(hit: &SurfaceHit, capsule: &Transform, dims: &CapsuleDimensions) -> WallAttachment {
    let normal = safe_normalize(hit.normal, WORLD_UP);

    let (approach, degenerate) = approach_direction(normal, capsule.rotation);
    let look_rotation = look_at_rotation(
        capsule.translation,
        capsule.translation + approach * LOOK_AT_DISTANCE,
    );

    let capsule_target = Transform {
        translation: capsule_placement(&SurfaceHit { normal, ..*hit }, dims),
        rotation: look_rotation,
        scale: capsule.scale,
    };

    let capsule_right = look_rotation * Vec3::X;
    let wall_frame = frame_from_up_forward(normal, -capsule_right);
    let wall_rotator = wall_frame.to_rotation();

    // capsule_right is horizontal and perpendicular to the normal, so the
    // re-orthogonalised wall forward is exactly -capsule_right
    let basis = WallBasis {
        normal,
        right: -wall_frame.forward,
        forward: wall_frame.right,
    };

    let mesh_relative = Transform {
        translation: inverse_transform_point(&capsule_target, hit.point),
        rotation: inverse_transform_rotation(&capsule_target, wall_rotator),
        scale: Vec3::ONE,
    };

    WallAttachment {
        basis,
        wall_rotator,
        capsule: capsule_target,
        mesh_relative,
        approach_direction: approach,
        degenerate,
    }
}

/// Basis forward заново из устоявшейся world rotation меша
pub fn forward_from_mesh_rotation(mesh_world_rotation: Quat) -> Vec3 {
    Frame::from_rotation(mesh_world_rotation).right
}
