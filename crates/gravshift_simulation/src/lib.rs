//! GravShift Simulation Core
//!
//! Gravity-shift locomotion на Bevy 0.16 (headless ECS):
//! персонаж ходит по земле, зависает, летит в выбранном направлении и
//! прилипает к любой поверхности, где "низ" = -normal стены.
//!
//! Слои:
//! - math / probe / gravity / wall / blend: чистые функции и типы
//! - shift: state machine (ShiftController) + host traits + ECS plugin
//! - physics: Rapier colliders + spatial queries (raycast, capsule sweep)
//! - logger: pluggable logger для host'а

use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy_rapier3d::prelude::{NoUserData, RapierPhysicsPlugin};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod blend;
pub mod gravity;
pub mod logger;
pub mod math;
pub mod physics;
pub mod probe;
pub mod shift;
pub mod wall;

// Re-export основных типов
pub use blend::{CameraEase, CameraOffsetTimeline, TransformBlend};
pub use gravity::{probe_wall_proximity, resolve_aim, AimResolution, AIM_PROBE_DISTANCE};
pub use logger::{init_logger, log, log_error, log_info, log_warning, set_log_level, set_logger, LogLevel, LogPrinter};
pub use physics::{rapier_raycast, spawn_static_box, LevelGeometry};
pub use probe::{SurfaceHit, SurfaceProbe};
pub use shift::{
    spawn_gravity_shifter, AimMarker, GravityShifter, MovementMode, ShiftBody, ShiftCommand, ShiftCommandKind,
    ShiftConfig, ShiftController, ShiftHost, ShiftImpact, ShiftPlugin, ShiftState, ShiftStateChanged,
};
pub use wall::{compute_wall_attachment, CapsuleDimensions, WallAttachment, WallBasis};

/// Частота fixed timestep симуляции
pub const SIMULATION_HZ: f64 = 60.0;

/// Главный plugin симуляции
pub struct GravityShiftSimulationPlugin;

impl Plugin for GravityShiftSimulationPlugin {
    fn build(&self, app: &mut App) {
        app
            // Fixed timestep 60Hz для simulation tick
            .insert_resource(Time::<Fixed>::from_hz(SIMULATION_HZ))
            .add_plugins(ShiftPlugin);

        // Host мог подключить Rapier сам (со своим масштабом)
        if !app.is_plugin_added::<RapierPhysicsPlugin<NoUserData>>() {
            app.add_plugins(physics::physics_plugin());
        }

        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Minimal Bevy App для headless симуляции (logger + Rapier + 60Hz FixedUpdate + shift)
///
/// Время двигается вручную: каждый `app.update()` = ровно один fixed тик.
/// Один update уже прогнан (Startup, Rapier context, старт Time<Real>).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins((MinimalPlugins, TransformPlugin))
        .insert_resource(DeterministicRng::new(seed))
        .add_plugins(GravityShiftSimulationPlugin);

    let timestep = app.world().resource::<Time<Fixed>>().timestep();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(timestep));

    app.finish();
    app.cleanup();

    // Первый update даёт нулевой delta
    app.update();
    app
}

/// Прогоняет `ticks` fixed тиков полными `app.update()`.
///
/// Полный кадр (First → FixedMain → PostUpdate) нужен для swap'а event
/// буферов: события старше двух тиков выбрасываются.
pub fn run_fixed_ticks(app: &mut App, ticks: u32) {
    let timestep = app.world().resource::<Time<Fixed>>().timestep();
    let target = fixed_elapsed(app) + timestep * ticks;

    // ManualDuration == timestep: обычно один update на тик
    let max_updates = ticks.saturating_mul(2).saturating_add(2);
    for _ in 0..max_updates {
        if fixed_elapsed(app) >= target {
            return;
        }
        app.update();
    }

    log_warning(&format!(
        "run_fixed_ticks: fixed time stalled at {:?} (target {:?})",
        fixed_elapsed(app),
        target
    ));
}

fn fixed_elapsed(app: &App) -> Duration {
    app.world().resource::<Time<Fixed>>().elapsed()
}

/// Snapshot мира для сравнения детерминизма
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();

    // Сортируем по Entity ID для детерминизма
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
