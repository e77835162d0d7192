//! Tick-driven интерполяция
//!
//! Вместо latent moves движка: владелец держит `TransformBlend`, зовёт
//! `advance(dt)` раз в тик и пишет результат в host. Новый blend на ту же
//! цель просто перезаписывает старый.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Blend position + rotation: `{start, end, duration, elapsed}`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformBlend {
    pub start: Transform,
    pub end: Transform,
    pub duration: f32,
    pub elapsed: f32,
}

/// Результат одного advance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendStep {
    pub transform: Transform,
    /// На этом advance дошли до `elapsed >= duration`
    pub finished: bool,
}

impl TransformBlend {
    /// Нулевой (или отрицательный) duration завершается на первом advance
    pub fn new(start: Transform, end: Transform, duration: f32) -> Self {
        Self {
            start,
            end,
            duration: duration.max(0.0),
            elapsed: 0.0,
        }
    }

    pub fn alpha(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn sample(&self) -> Transform {
        let t = self.alpha();
        Transform {
            translation: self.start.translation.lerp(self.end.translation, t),
            rotation: self.start.rotation.slerp(self.end.rotation, t).normalize(),
            scale: self.start.scale.lerp(self.end.scale, t),
        }
    }

    pub fn advance(&mut self, delta: f32) -> BlendStep {
        self.elapsed += delta.max(0.0);
        let finished = self.elapsed >= self.duration;

        BlendStep {
            // Точно в end на завершении
            transform: if finished { self.end } else { self.sample() },
            finished,
        }
    }
}

/// Easing для косметического camera offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Reflect)]
pub enum CameraEase {
    Linear,
    #[default]
    SmoothStep,
    QuadraticOut,
    CubicOut,
}

impl CameraEase {
    /// Значение на [0, 1] (input клампится)
    pub fn sample(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            CameraEase::Linear => t,
            CameraEase::SmoothStep => t * t * (3.0 - 2.0 * t),
            CameraEase::QuadraticOut => 1.0 - (1.0 - t) * (1.0 - t),
            CameraEase::CubicOut => 1.0 - (1.0 - t).powi(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect)]
pub enum TimelineDirection {
    #[default]
    Forward,
    Reverse,
}

/// Обратимый timeline 0→1 (easing camera offset)
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct CameraOffsetTimeline {
    /// Линейный progress в [0, 1]
    pub progress: f32,
    pub duration: f32,
    pub direction: TimelineDirection,
    pub playing: bool,
    pub ease: CameraEase,
}

impl CameraOffsetTimeline {
    pub fn new(duration: f32, ease: CameraEase) -> Self {
        Self {
            progress: 0.0,
            duration: duration.max(0.0),
            direction: TimelineDirection::Forward,
            playing: false,
            ease,
        }
    }

    /// Играем к 1 от текущего progress
    pub fn play_forward(&mut self) {
        self.direction = TimelineDirection::Forward;
        self.playing = true;
    }

    /// Играем назад к 0 от текущего progress
    pub fn reverse(&mut self) {
        self.direction = TimelineDirection::Reverse;
        self.playing = true;
    }

    /// Eased output для текущего progress
    pub fn output(&self) -> f32 {
        self.ease.sample(self.progress)
    }

    /// Advance + eased output, `None` пока timeline стоит
    pub fn advance(&mut self, delta: f32) -> Option<f32> {
        if !self.playing {
            return None;
        }

        let step = if self.duration <= 0.0 {
            1.0
        } else {
            delta.max(0.0) / self.duration
        };

        self.progress = match self.direction {
            TimelineDirection::Forward => (self.progress + step).min(1.0),
            TimelineDirection::Reverse => (self.progress - step).max(0.0),
        };

        let done = match self.direction {
            TimelineDirection::Forward => self.progress >= 1.0,
            TimelineDirection::Reverse => self.progress <= 0.0,
        };
        if done {
            self.playing = false;
        }

        Some(self.output())
    }
}
