//! Physics: коллизии через Rapier
//!
//! Уровень это `RigidBody::Fixed` + `Collider::cuboid`, персонаж это
//! `RigidBody::KinematicPositionBased` + `Collider::capsule_y`. Velocity
//! интегрируем сами (`integrate_shift_bodies`), Rapier нужен только для
//! spatial queries:
//! - `rapier_raycast`: segment raycast для aim/proximity probe
//! - `sweep_capsule`: shape cast капсулы вдоль смещения тика
//! - `ground_below`: raycast вниз для ground snap
//!
//! Все queries пропускают collider самого персонажа.

use bevy::prelude::*;
use bevy_rapier3d::parry::shape::Capsule;
use bevy_rapier3d::prelude::*;

use crate::math::{is_degenerate, safe_normalize, WORLD_UP};
use crate::probe::{SurfaceHit, SurfaceProbe};
use crate::wall::CapsuleDimensions;

/// 100 units = 1 метр (капсула 42 x 96 в сантиметрах)
pub const PIXELS_PER_METER: f32 = 100.0;

/// Зазор между капсулой и поверхностью после sweep.
///
/// Cast идёт капсулой с радиусом меньше на `CAST_SKIN`: касание пола при
/// ходьбе вдоль него не считается столкновением.
pub const CAST_SKIN: f32 = 0.5;

/// Насколько ниже капсулы ищем пол при ходьбе
pub const GROUND_SNAP_DISTANCE: f32 = 10.0;

/// Marker: статическая геометрия уровня
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct LevelGeometry;

/// Rapier plugin в FixedPostUpdate (после наших FixedUpdate систем)
pub fn physics_plugin() -> RapierPhysicsPlugin<NoUserData> {
    RapierPhysicsPlugin::<NoUserData>::default()
        .with_length_unit(PIXELS_PER_METER)
        .in_fixed_schedule()
}

/// Статический box уровня (пол, стена, выступ)
pub fn spawn_static_box(commands: &mut Commands, center: Vec3, half_extents: Vec3) -> Entity {
    let transform = Transform::from_translation(center);
    commands
        .spawn((
            transform,
            GlobalTransform::from(transform),
            LevelGeometry,
            RigidBody::Fixed,
            Collider::cuboid(half_extents.x, half_extents.y, half_extents.z),
        ))
        .id()
}

/// Rapier компоненты капсулы персонажа
pub fn shifter_collider(dims: &CapsuleDimensions) -> (RigidBody, Collider) {
    (
        RigidBody::KinematicPositionBased,
        Collider::capsule_y(dims.half_height, dims.radius),
    )
}

/// Фильтр queries: без своего тела/collider'а и без sensors
pub fn shifter_filter(exclude: Option<Entity>) -> QueryFilter<'static> {
    let filter = QueryFilter::default().exclude_sensors();
    match exclude {
        Some(entity) => filter.exclude_rigid_body(entity).exclude_collider(entity),
        None => filter,
    }
}

/// Ближайший hit на отрезке `origin → end`
pub fn rapier_raycast(context: &RapierContext, origin: Vec3, end: Vec3, exclude: Option<Entity>) -> Option<SurfaceHit> {
    let segment = end - origin;
    if is_degenerate(segment) {
        return None;
    }

    let length = segment.length();
    let direction = segment / length;

    context
        .cast_ray_and_get_normal(origin, direction, length, true, shifter_filter(exclude))
        .map(|(_, intersection)| SurfaceHit {
            point: intersection.point,
            normal: safe_normalize(intersection.normal, -direction),
            distance: intersection.time_of_impact,
        })
}

/// SurfaceProbe поверх замыкания.
///
/// Так контроллер получает raycast в `RapierContext` без lifetime'ов
/// контекста в host adapter'е:
/// `QueryProbe(|origin, end| rapier_raycast(&context, origin, end, Some(entity)))`.
pub struct QueryProbe<F>(pub F);

impl<F> SurfaceProbe for QueryProbe<F>
where
    F: Fn(Vec3, Vec3) -> Option<SurfaceHit>,
{
    fn raycast(&self, origin: Vec3, end: Vec3) -> Option<SurfaceHit> {
        (self.0)(origin, end)
    }
}

/// Shape cast капсулы вдоль `displacement`.
///
/// `distance` в результате = сколько центр капсулы может пройти до
/// контакта, `point` = точка контакта на поверхности.
pub fn sweep_capsule(
    context: &RapierContext,
    entity: Entity,
    transform: &Transform,
    dims: &CapsuleDimensions,
    displacement: Vec3,
) -> Option<SurfaceHit> {
    if is_degenerate(displacement) {
        return None;
    }

    let length = displacement.length();
    let direction = displacement / length;
    let shape = Capsule::new_y(dims.half_height, (dims.radius - CAST_SKIN).max(CAST_SKIN));

    let (_, hit) = context.cast_shape(
        transform.translation,
        transform.rotation,
        direction,
        &shape,
        ShapeCastOptions {
            max_time_of_impact: length + CAST_SKIN,
            stop_at_penetration: false,
            ..default()
        },
        shifter_filter(Some(entity)),
    )?;

    let normal = safe_normalize(hit.details.map(|d| d.normal1).unwrap_or(-direction), -direction);
    let travel = (hit.time_of_impact - CAST_SKIN).max(0.0);
    let center = transform.translation + direction * travel;

    Some(SurfaceHit {
        point: center - normal * dims.radius,
        normal,
        distance: travel,
    })
}

/// Пол под капсулой: raycast от низа цилиндра на `radius + GROUND_SNAP_DISTANCE`
pub fn ground_below(context: &RapierContext, entity: Entity, position: Vec3, dims: &CapsuleDimensions) -> Option<SurfaceHit> {
    let feet = position - WORLD_UP * dims.half_height;
    let end = feet - WORLD_UP * (dims.radius + GROUND_SNAP_DISTANCE);
    rapier_raycast(context, feet, end, Some(entity))
}
