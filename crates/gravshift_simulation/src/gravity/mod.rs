//! Gravity direction resolver
//!
//! Две пробы:
//! - aim probe: луч из камеры при входе в Accelerating
//! - wall-proximity probe: два луча капсулы (верх/низ) вдоль текущей
//!   гравитации, тормозим перед стеной

use bevy::prelude::*;

use crate::math::{safe_normalize, WORLD_DOWN};
use crate::probe::{nearest_hit, ProbeRay, SurfaceHit, SurfaceProbe};

/// Длина aim луча (world units)
pub const AIM_PROBE_DISTANCE: f32 = 9000.0;

/// Результат aim probe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AimResolution {
    /// Точка попадания, при промахе конец aim луча
    pub aim_point: Vec3,
    /// Новое направление гравитации (unit)
    pub direction: Vec3,
    /// Во что попал aim луч
    pub hit: Option<SurfaceHit>,
}

/// Aim луч → направление полёта от персонажа к точке прицела.
///
/// Если точка совпала с персонажем: camera forward, потом world down.
pub fn resolve_aim<P: SurfaceProbe + ?Sized>(
    probe: &P,
    camera_position: Vec3,
    camera_forward: Vec3,
    character_position: Vec3,
) -> AimResolution {
    let forward = safe_normalize(camera_forward, WORLD_DOWN);
    let ray = ProbeRay::along(camera_position, forward, AIM_PROBE_DISTANCE);

    let hit = probe.raycast(ray.origin, ray.end);
    let aim_point = hit.map_or(ray.end, |hit| hit.point);

    AimResolution {
        aim_point,
        direction: safe_normalize(aim_point - character_position, forward),
        hit,
    }
}

/// Два луча капсулы (верх/низ) для wall-proximity probe
pub fn wall_proximity_rays(
    origin: Vec3,
    up: Vec3,
    half_height: f32,
    direction: Vec3,
    length: f32,
) -> [ProbeRay; 2] {
    let direction = safe_normalize(direction, WORLD_DOWN);
    let offset = safe_normalize(up, Vec3::Y) * half_height;

    [
        ProbeRay::along(origin + offset, direction, length),
        ProbeRay::along(origin - offset, direction, length),
    ]
}

/// Ближайшая стена перед капсулой вдоль `direction`
pub fn probe_wall_proximity<P: SurfaceProbe + ?Sized>(
    probe: &P,
    origin: Vec3,
    up: Vec3,
    half_height: f32,
    direction: Vec3,
    length: f32,
) -> Option<SurfaceHit> {
    let rays = wall_proximity_rays(origin, up, half_height, direction, length);
    nearest_hit(probe, &rays)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::QueryProbe;
    use crate::probe::PlaneProbe;

    const TOLERANCE: f32 = 1e-4;

    #[test]
    fn test_aim_miss_straight_down_keeps_world_down() {
        // Camera right above the character, looking straight down, nothing below
        let probe = PlaneProbe::default();
        let aim = resolve_aim(&probe, Vec3::new(0.0, 400.0, 0.0), Vec3::NEG_Y, Vec3::ZERO);

        assert!(aim.hit.is_none());
        assert!(aim.aim_point.abs_diff_eq(Vec3::new(0.0, 400.0 - AIM_PROBE_DISTANCE, 0.0), TOLERANCE));
        assert!(aim.direction.abs_diff_eq(WORLD_DOWN, TOLERANCE));
    }

    #[test]
    fn test_aim_hit_points_character_at_hit() {
        let probe = PlaneProbe::default().with_plane(Vec3::new(1000.0, 0.0, 0.0), Vec3::NEG_X);

        let camera = Vec3::new(-300.0, 100.0, 0.0);
        let aim = resolve_aim(&probe, camera, Vec3::X, Vec3::ZERO);

        let hit = aim.hit.expect("wall is in front of the camera");
        assert!(hit.point.abs_diff_eq(Vec3::new(1000.0, 100.0, 0.0), TOLERANCE));
        assert_eq!(aim.aim_point, hit.point);
        assert!(aim.direction.abs_diff_eq(Vec3::new(1000.0, 100.0, 0.0).normalize(), TOLERANCE));
    }

    #[test]
    fn test_aim_degenerate_falls_back_to_camera_forward() {
        // Wall exactly at the character position
        let probe = PlaneProbe::default().with_plane(Vec3::ZERO, Vec3::NEG_X);
        let aim = resolve_aim(&probe, Vec3::new(-100.0, 0.0, 0.0), Vec3::X, Vec3::ZERO);

        assert!(aim.direction.abs_diff_eq(Vec3::X, TOLERANCE));
    }

    #[test]
    fn test_wall_proximity_rays_offsets() {
        let rays = wall_proximity_rays(Vec3::ZERO, Vec3::Y, 96.0, Vec3::X, 200.0);

        assert_eq!(rays[0].origin, Vec3::new(0.0, 96.0, 0.0));
        assert_eq!(rays[1].origin, Vec3::new(0.0, -96.0, 0.0));
        assert_eq!(rays[0].end, Vec3::new(200.0, 96.0, 0.0));
    }

    #[test]
    fn test_wall_proximity_only_bottom_ray_hits() {
        // Низкое препятствие (face x = 140, до y = -70): достаёт только нижний луч
        let obstacle = PlaneProbe::default().with_plane(Vec3::new(140.0, 0.0, 0.0), Vec3::NEG_X);
        let probe = QueryProbe(|origin: Vec3, end: Vec3| {
            if origin.y > -70.0 {
                return None;
            }
            obstacle.raycast(origin, end)
        });

        let hit = probe_wall_proximity(&probe, Vec3::ZERO, Vec3::Y, 96.0, Vec3::X, 200.0)
            .expect("bottom ray reaches the obstacle");
        assert!((hit.distance - 140.0).abs() < TOLERANCE);
        assert_eq!(hit.normal, Vec3::NEG_X);
    }

    #[test]
    fn test_wall_proximity_out_of_range() {
        let probe = PlaneProbe::default().with_plane(Vec3::new(500.0, 0.0, 0.0), Vec3::NEG_X);
        assert!(probe_wall_proximity(&probe, Vec3::ZERO, Vec3::Y, 96.0, Vec3::X, 200.0).is_none());
    }
}
