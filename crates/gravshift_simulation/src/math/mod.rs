//! Vector/rotation helpers для gravity shift
//!
//! Конвенции (Bevy, right-handed, Y-up):
//! - local forward = -Z, local right = +X, local up = +Y
//! - `Frame` всегда удовлетворяет `right = forward × up`
//!
//! Чистые функции. Вырожденный input (нулевой вектор, forward ∥ up)
//! даёт fallback направление, никогда не NaN.

use bevy::prelude::*;

pub const WORLD_UP: Vec3 = Vec3::Y;
pub const WORLD_DOWN: Vec3 = Vec3::NEG_Y;

/// Горизонтальный heading, когда другого нет
pub const DEFAULT_HEADING: Vec3 = Vec3::NEG_Z;

/// length² ниже этого = нулевой вектор
pub const DEGENERATE_EPSILON: f32 = 1e-8;

/// Normalize, или `fallback` для (почти) нулевого `v`
pub fn safe_normalize(v: Vec3, fallback: Vec3) -> Vec3 {
    if !v.is_finite() || v.length_squared() <= DEGENERATE_EPSILON {
        fallback
    } else {
        v.normalize()
    }
}

/// Обнуляем вертикаль
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

pub fn is_degenerate(v: Vec3) -> bool {
    !v.is_finite() || v.length_squared() <= DEGENERATE_EPSILON
}

/// Ортонормированная тройка forward/right/up
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Frame {
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            forward: rotation * Vec3::NEG_Z,
            right: rotation * Vec3::X,
            up: rotation * Vec3::Y,
        }
    }

    pub fn to_rotation(&self) -> Quat {
        Quat::from_mat3(&Mat3::from_cols(self.right, self.up, -self.forward)).normalize()
    }
}

/// Axis-from-two-vectors.
///
/// `up` сохраняется точно, `forward_hint` только выбирает поворот вокруг него
/// (ортогонализуется против `up`). Hint ∥ up → произвольный перпендикуляр.
pub fn frame_from_up_forward(up: Vec3, forward_hint: Vec3) -> Frame {
    let up = safe_normalize(up, WORLD_UP);

    let projected = forward_hint - up * forward_hint.dot(up);
    let forward = if is_degenerate(projected) {
        up.any_orthonormal_vector()
    } else {
        projected.normalize()
    };

    Frame {
        forward,
        right: forward.cross(up),
        up,
    }
}

pub fn make_rot_from_up_forward(up: Vec3, forward_hint: Vec3) -> Quat {
    frame_from_up_forward(up, forward_hint).to_rotation()
}

/// Look-at: forward из `from` в `to`, right остаётся горизонтальным.
///
/// Строго вверх/вниз: right берём от `DEFAULT_HEADING`.
pub fn look_at_rotation(from: Vec3, to: Vec3) -> Quat {
    let forward = safe_normalize(to - from, DEFAULT_HEADING);

    let right = {
        let r = forward.cross(WORLD_UP);
        if is_degenerate(r) {
            DEFAULT_HEADING.cross(WORLD_UP)
        } else {
            r.normalize()
        }
    };
    let up = right.cross(forward).normalize();

    Frame { forward, right, up }.to_rotation()
}

/// Поворот `v` вокруг `axis` на `degrees`.
///
/// Положительный угол ведёт `v` к `v × axis` (forward вокруг up → к right).
pub fn rotate_angle_axis(v: Vec3, degrees: f32, axis: Vec3) -> Vec3 {
    if is_degenerate(axis) {
        return v;
    }
    Quat::from_axis_angle(axis.normalize(), -degrees.to_radians()) * v
}

/// Угол между направлениями в градусах, [0, 180]. `None` для нулевых.
pub fn unsigned_angle_degrees(a: Vec3, b: Vec3) -> Option<f32> {
    if is_degenerate(a) || is_degenerate(b) {
        return None;
    }
    let cos = a.normalize().dot(b.normalize()).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// World point → local space `transform`
pub fn inverse_transform_point(transform: &Transform, point: Vec3) -> Vec3 {
    (transform.rotation.inverse() * (point - transform.translation)) / transform.scale
}

/// World rotation → относительно `transform`
pub fn inverse_transform_rotation(transform: &Transform, rotation: Quat) -> Quat {
    (transform.rotation.inverse() * rotation).normalize()
}
