//! Shift события
//!
//! Input layer → ShiftCommand → контроллер.
//! Movement (swept collision) → ShiftImpact → контроллер (`on_hit`).
//! Контроллер → ShiftStateChanged (для UI/аудио/логов).

use bevy::prelude::*;

use super::state::ShiftState;

/// Семантический input (уже смаплен из устройств)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShiftCommandKind {
    Move(Vec2),
    Look(Vec2),
    Jump,
    StopJumping,
    ShiftToggle,
    Cancel,
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ShiftCommand {
    pub entity: Entity,
    pub kind: ShiftCommandKind,
}

impl ShiftCommand {
    pub fn new(entity: Entity, kind: ShiftCommandKind) -> Self {
        Self { entity, kind }
    }
}

/// Столкновение капсулы при движении
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ShiftImpact {
    pub entity: Entity,
    pub point: Vec3,
    pub normal: Vec3,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftStateChanged {
    pub entity: Entity,
    pub from: ShiftState,
    pub to: ShiftState,
}
