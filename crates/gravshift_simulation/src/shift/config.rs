//! Конфиг gravity shift (tunable параметры)
//!
//! Передаётся в контроллер при создании. Можно держать в RON-файле рядом с
//! уровнем: все поля опциональны, отсутствующие берутся из Default.

use anyhow::{ensure, Context, Result};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::blend::CameraEase;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Reflect)]
#[serde(default)]
pub struct ShiftConfig {
    /// Время blend'а капсулы к стене (секунды, 0 = мгновенно)
    pub wall_capsule_transition_duration: f32,
    /// Время blend'а меша к стене
    pub wall_mesh_transition_duration: f32,
    /// Время возврата меша в rest pose
    pub back_to_ground_transition_duration: f32,
    /// Длина лучей wall-proximity probe
    pub wall_raycast_length: f32,
    /// Ускорение в Accelerating (units/s²)
    pub shift_acceleration: f32,
    pub shift_start_speed: f32,
    pub max_shift_speed: f32,
    /// Camera offset на земле
    pub camera_offset_default: Vec3,
    /// Camera offset во время shift
    pub camera_offset_levitating: Vec3,
    pub camera_offset_duration: f32,
    pub camera_ease: CameraEase,
}

impl Default for ShiftConfig {
    fn default() -> Self {
        Self {
            wall_capsule_transition_duration: 0.2,
            wall_mesh_transition_duration: 0.2,
            back_to_ground_transition_duration: 0.2,
            wall_raycast_length: 200.0,
            shift_acceleration: 1960.0,
            shift_start_speed: 980.0,
            max_shift_speed: 4000.0,
            camera_offset_default: Vec3::ZERO,
            camera_offset_levitating: Vec3::new(50.0, 0.0, 0.0),
            camera_offset_duration: 0.25,
            camera_ease: CameraEase::SmoothStep,
        }
    }
}

impl ShiftConfig {
    /// Проверка значений (вызывается после загрузки)
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("wall_capsule_transition_duration", self.wall_capsule_transition_duration),
            ("wall_mesh_transition_duration", self.wall_mesh_transition_duration),
            ("back_to_ground_transition_duration", self.back_to_ground_transition_duration),
            ("camera_offset_duration", self.camera_offset_duration),
        ];
        for (name, value) in durations {
            ensure!(value.is_finite() && value >= 0.0, "{name} must be >= 0, got {value}");
        }

        ensure!(
            self.wall_raycast_length.is_finite() && self.wall_raycast_length > 0.0,
            "wall_raycast_length must be > 0, got {}",
            self.wall_raycast_length
        );
        ensure!(
            self.shift_acceleration.is_finite() && self.shift_acceleration >= 0.0,
            "shift_acceleration must be >= 0, got {}",
            self.shift_acceleration
        );
        ensure!(
            self.shift_start_speed >= 0.0 && self.shift_start_speed <= self.max_shift_speed,
            "shift_start_speed ({}) must be in [0, max_shift_speed ({})]",
            self.shift_start_speed,
            self.max_shift_speed
        );

        Ok(())
    }

    /// Парсинг RON + validate
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: ShiftConfig = ron::from_str(source).context("failed to parse shift config")?;
        config.validate().context("invalid shift config")?;
        Ok(config)
    }

    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default()).context("failed to serialize shift config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ShiftConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.wall_raycast_length, 200.0);
        assert_eq!(config.shift_start_speed, 980.0);
        assert_eq!(config.max_shift_speed, 4000.0);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = ShiftConfig::from_ron_str("(shift_acceleration: 500.0, wall_raycast_length: 150.0)").unwrap();

        assert_eq!(config.shift_acceleration, 500.0);
        assert_eq!(config.wall_raycast_length, 150.0);
        assert_eq!(config.max_shift_speed, ShiftConfig::default().max_shift_speed);
    }

    #[test]
    fn test_ron_round_trip() {
        let config = ShiftConfig {
            camera_ease: CameraEase::CubicOut,
            camera_offset_levitating: Vec3::new(30.0, 10.0, 0.0),
            ..default()
        };

        let text = config.to_ron_string().unwrap();
        let parsed = ShiftConfig::from_ron_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation_errors() {
        let negative_duration = ShiftConfig {
            wall_mesh_transition_duration: -0.1,
            ..default()
        };
        assert!(negative_duration.validate().is_err());

        let zero_probe = ShiftConfig {
            wall_raycast_length: 0.0,
            ..default()
        };
        assert!(zero_probe.validate().is_err());

        let start_above_max = ShiftConfig {
            shift_start_speed: 5000.0,
            ..default()
        };
        assert!(start_above_max.validate().is_err());

        let negative_acceleration = ShiftConfig {
            shift_acceleration: -1.0,
            ..default()
        };
        assert!(negative_acceleration.validate().is_err());
    }

    #[test]
    fn test_parse_error_has_context() {
        let err = ShiftConfig::from_ron_str("(shift_acceleration: \"fast\")").unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse shift config"));

        let err = ShiftConfig::from_ron_str("(max_shift_speed: 10.0)").unwrap_err();
        assert!(format!("{err:#}").contains("invalid shift config"));
    }
}
