//! Gravity shift module
//!
//! Контроллер (state machine) + host traits + ECS обвязка.
//!
//! Разделение:
//! - `controller`: чистая логика, не знает про ECS, тестируется с mock host
//! - `systems`: ECS адаптер (EcsShiftHost), movement host, камера
//!
//! Порядок систем см. в `systems`.

use bevy::prelude::*;
use bevy_rapier3d::plugin::PhysicsSet;

pub mod components;
pub mod config;
pub mod controller;
pub mod events;
pub mod host;
pub mod kinematics;
pub mod state;
pub mod systems;


pub use components::{AimMarker, GravityShifter, ShiftBody, ShiftCameraRig, ShiftMesh, ShiftVisual};
pub use config::ShiftConfig;
pub use controller::{BlendTarget, MeshBlendPurpose, ShiftController, ShiftTrace, ShiftTraceHook};
pub use events::{ShiftCommand, ShiftCommandKind, ShiftImpact, ShiftStateChanged};
pub use host::{CameraRig, MarkerUi, MeshRestPose, MovementDefaults, MovementHost, ShiftHost, TransformHost};
pub use kinematics::ShiftKinematics;
pub use state::{MovementMode, ShiftState, ShiftTransition};
pub use systems::{spawn_gravity_shifter, EcsShiftHost};

use crate::physics::LevelGeometry;
use crate::wall::CapsuleDimensions;

/// Shift Plugin
///
/// Регистрирует события и системы в FixedUpdate. Коллизии через Rapier
/// (plugin подключает `GravityShiftSimulationPlugin` или host).
pub struct ShiftPlugin;

impl Plugin for ShiftPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ShiftCommand>()
            .add_event::<ShiftImpact>()
            .add_event::<ShiftStateChanged>()
            .register_type::<ShiftBody>()
            .register_type::<ShiftCameraRig>()
            .register_type::<AimMarker>()
            .register_type::<CapsuleDimensions>()
            .register_type::<LevelGeometry>();

        app.add_systems(
            FixedUpdate,
            (
                systems::update_camera_rigs,
                systems::apply_shift_commands,
                systems::apply_shift_impacts,
                systems::tick_gravity_shifters,
                systems::integrate_shift_bodies,
            )
                .chain() // Последовательное выполнение
                .before(PhysicsSet::SyncBackend), // До rapier physics step
        );
    }
}
