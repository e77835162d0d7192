//! Разгон в Accelerating: скорость растёт линейно до max.

use bevy::prelude::*;

use super::config::ShiftConfig;

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct ShiftKinematics {
    /// Текущая скорость (units/s)
    pub speed: f32,
    pub start_speed: f32,
    pub acceleration: f32,
    pub max_speed: f32,
}

impl ShiftKinematics {
    pub fn from_config(config: &ShiftConfig) -> Self {
        Self {
            speed: config.shift_start_speed,
            start_speed: config.shift_start_speed,
            acceleration: config.shift_acceleration.max(0.0),
            max_speed: config.max_shift_speed,
        }
    }

    /// Сброс на стартовую скорость (вход в Accelerating, стена рядом)
    pub fn reset(&mut self) {
        self.speed = self.start_speed.min(self.max_speed);
    }

    /// `speed = min(speed + acceleration * dt, max_speed)`; не убывает.
    pub fn integrate(&mut self, delta: f32) -> f32 {
        let next = (self.speed + self.acceleration * delta.max(0.0)).min(self.max_speed);
        self.speed = next.max(self.speed.min(self.max_speed));
        self.speed
    }
}

impl Default for ShiftKinematics {
    fn default() -> Self {
        Self::from_config(&ShiftConfig::default())
    }
}
