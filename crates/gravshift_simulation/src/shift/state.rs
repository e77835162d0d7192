//! Состояния gravity shift и режимы движения host'а.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Состояние shift-автомата
///
/// NoShift → Levitating → Accelerating → WallGrounded → NoShift.
/// Из любого состояния можно вернуться в NoShift (cancel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Reflect)]
pub enum ShiftState {
    /// Обычная ходьба по земле
    #[default]
    NoShift,
    /// Зависание без гравитации, ждём подтверждения прицела
    Levitating,
    /// Разгон вдоль выбранного направления гравитации
    Accelerating,
    /// Прилипли к стене, "низ" = -normal стены
    WallGrounded,
}

impl ShiftState {
    /// Любое состояние кроме NoShift
    pub fn is_shifted(self) -> bool {
        !matches!(self, ShiftState::NoShift)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ShiftState::NoShift => "NoShift",
            ShiftState::Levitating => "Levitating",
            ShiftState::Accelerating => "Accelerating",
            ShiftState::WallGrounded => "WallGrounded",
        }
    }
}

impl fmt::Display for ShiftState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Режим movement host'а (аналог walking/falling/flying у character movement)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Reflect)]
pub enum MovementMode {
    #[default]
    Walking,
    Falling,
    /// Host не применяет гравитацию и не трогает velocity сам
    Flying,
}

/// Переход состояния (для ShiftStateChanged / трейса)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftTransition {
    pub from: ShiftState,
    pub to: ShiftState,
}
