//! Surface probe: raycast по collision host'а
//!
//! Ядру нужен только "ближайший hit на отрезке". Host реализует
//! `SurfaceProbe` поверх своей физики и пропускает collider самого
//! персонажа (ECS host: `physics::rapier_raycast`).

use bevy::prelude::*;

/// Результат raycast'а
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Точка удара (world)
    pub point: Vec3,
    /// Единичная нормаль, смотрит от поверхности в открытое пространство
    pub normal: Vec3,
    /// Дистанция от origin луча
    pub distance: f32,
}

/// Отрезок луча `origin → end`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeRay {
    pub origin: Vec3,
    pub end: Vec3,
}

impl ProbeRay {
    pub fn along(origin: Vec3, direction: Vec3, length: f32) -> Self {
        Self {
            origin,
            end: origin + direction * length,
        }
    }
}

/// Collision query host'а (синхронный, в том же тике)
pub trait SurfaceProbe {
    /// Ближайший hit на отрезке `origin → end`
    fn raycast(&self, origin: Vec3, end: Vec3) -> Option<SurfaceHit>;
}

impl<T: SurfaceProbe + ?Sized> SurfaceProbe for &T {
    fn raycast(&self, origin: Vec3, end: Vec3) -> Option<SurfaceHit> {
        (**self).raycast(origin, end)
    }
}

/// Ближайший hit по нескольким лучам (distance от origin каждого луча)
pub fn nearest_hit<P: SurfaceProbe + ?Sized>(probe: &P, rays: &[ProbeRay]) -> Option<SurfaceHit> {
    rays.iter()
        .filter_map(|ray| probe.raycast(ray.origin, ray.end))
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Односторонние плоскости для unit тестов ядра (без Rapier)
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct PlaneProbe {
    pub planes: Vec<(Vec3, Vec3)>,
}

#[cfg(test)]
impl PlaneProbe {
    pub fn with_plane(mut self, point: Vec3, normal: Vec3) -> Self {
        self.planes.push((point, normal.normalize()));
        self
    }
}

#[cfg(test)]
impl SurfaceProbe for PlaneProbe {
    fn raycast(&self, origin: Vec3, end: Vec3) -> Option<SurfaceHit> {
        let segment = end - origin;
        self.planes
            .iter()
            .filter_map(|&(point, normal)| {
                // Только лицевая сторона
                let denom = segment.dot(normal);
                if denom >= 0.0 {
                    return None;
                }
                let t = (point - origin).dot(normal) / denom;
                (0.0..=1.0).contains(&t).then(|| SurfaceHit {
                    point: origin + segment * t,
                    normal,
                    distance: segment.length() * t,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
