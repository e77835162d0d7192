//! Ориентация меша при ходьбе по стене
//!
//! Визуальный перёд меша это local +X, поэтому при attach (угол 0) он
//! смотрит в basis forward. Каждый move input поворачивает меш вокруг
//! нормали стены, пока перёд не совпадёт с направлением input'а.

use bevy::prelude::*;

use crate::math::{is_degenerate, make_rot_from_up_forward, rotate_angle_axis, safe_normalize, unsigned_angle_degrees};

use super::WallBasis;

/// Время blend'а к новой ориентации на стене
pub const WALL_ORIENT_BLEND_SECS: f32 = 0.1;

/// Угол (градусы) от `forward` до направления input'а на стене,
/// отрицательный, когда input смотрит влево.
///
/// `None` для нулевого input.
pub fn signed_input_angle(input: Vec2, forward: Vec3, right: Vec3) -> Option<f32> {
    let raw = right * input.x + forward * input.y;
    if is_degenerate(raw) {
        return None;
    }

    let direction = safe_normalize(raw, forward);
    let angle = unsigned_angle_degrees(forward, direction)?;

    if input.x.abs() > 0.0 {
        Some(angle * input.x.signum())
    } else {
        Some(angle)
    }
}

/// Целевая world rotation меша для `input` на стене `basis`.
///
/// Зависит только от `wall_rotator` (посчитан при attach) и input'а:
/// повтор того же input'а ничего не меняет.
pub fn orient_mesh_to_wall(input: Vec2, basis: &WallBasis, wall_rotator: Quat) -> Option<Quat> {
    let angle = signed_input_angle(input, basis.forward, basis.right)?;

    let rotator_forward = wall_rotator * Vec3::NEG_Z;
    let adjusted = rotate_angle_axis(rotator_forward, angle, basis.normal);

    Some(make_rot_from_up_forward(basis.normal, adjusted))
}
