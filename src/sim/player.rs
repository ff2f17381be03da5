//! First-person player controller
//!
//! Position, facing and speed, plus the two turning schemes: continuous
//! (angle changes while a turn is held) and discrete (eased 90° snaps).

use std::f32::consts::FRAC_PI_2;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::SpatialIndex;
use super::level::SpawnPose;
use super::tick::TickInput;
use crate::settings::{ControlScheme, TurnMode};
use crate::tuning::Tuning;
use crate::{ease_in_out, normalize_angle};

/// Which way to turn. Left increases the facing angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    fn sign(self) -> f32 {
        match self {
            TurnDirection::Left => 1.0,
            TurnDirection::Right => -1.0,
        }
    }
}

/// A discrete turn in flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationAnim {
    pub start_angle: f32,
    pub target_angle: f32,
    pub start_ms: f64,
    pub duration_ms: f64,
}

impl RotationAnim {
    /// Eased angle at `now_ms`, and whether the turn has finished
    fn sample(&self, now_ms: f64) -> (f32, bool) {
        let elapsed = now_ms - self.start_ms;
        if elapsed >= self.duration_ms {
            return (self.target_angle, true);
        }
        let t = (elapsed / self.duration_ms).clamp(0.0, 1.0) as f32;
        let eased = ease_in_out(t);
        let angle = self.start_angle + (self.target_angle - self.start_angle) * eased;
        (angle, false)
    }
}

/// The player
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Feet position
    pub position: Vec3,
    /// Facing angle around the vertical axis (radians, 0 looks down -Z)
    pub angle: f32,
    /// Displacement per tick at 1x
    pub base_speed: f32,
    /// Power-up multiplier on `base_speed`
    pub speed_multiplier: f32,
    pub movement_enabled: bool,
    /// At most one discrete turn at a time
    pub rotation: Option<RotationAnim>,
}

impl Player {
    pub fn new(base_speed: f32) -> Self {
        Self {
            position: Vec3::ZERO,
            angle: 0.0,
            base_speed,
            speed_multiplier: 1.0,
            movement_enabled: false,
            rotation: None,
        }
    }

    pub fn current_speed(&self) -> f32 {
        self.base_speed * self.speed_multiplier
    }

    pub fn is_boosted(&self) -> bool {
        self.speed_multiplier != 1.0
    }

    /// Put the player back on a spawn pose, cancelling any turn
    pub fn reset_to(&mut self, pose: &SpawnPose) {
        self.position = pose.position;
        self.angle = pose.angle;
        self.rotation = None;
    }

    /// Unit vector the player is looking along (XZ plane)
    pub fn forward(&self) -> Vec3 {
        Vec3::new(-self.angle.sin(), 0.0, -self.angle.cos())
    }

    /// Begin a 90° turn. Ignored while another turn is in flight.
    pub fn rotate(&mut self, direction: TurnDirection, now_ms: f64, duration_ms: f64) -> bool {
        if self.rotation.is_some() {
            return false;
        }
        let start = normalize_angle(self.angle);
        self.angle = start;
        self.rotation = Some(RotationAnim {
            start_angle: start,
            target_angle: start + direction.sign() * FRAC_PI_2,
            start_ms: now_ms,
            duration_ms,
        });
        true
    }

    /// One tick's worth of held-key turning
    pub fn turn_by(&mut self, direction: TurnDirection, turn_speed: f32) {
        self.angle = normalize_angle(self.angle + direction.sign() * turn_speed);
    }

    /// Step the in-flight turn, snapping onto the target when done
    pub fn advance_rotation(&mut self, now_ms: f64) {
        if let Some(anim) = self.rotation {
            let (angle, finished) = anim.sample(now_ms);
            self.angle = angle;
            if finished {
                self.rotation = None;
            }
        }
    }

    /// Move by `delta` unless the destination touches a wall.
    /// Blocked moves are rejected whole; there is no sliding.
    pub fn try_move(&mut self, delta: Vec3, walls: &SpatialIndex) -> bool {
        let candidate = self.position + delta;
        if walls.overlaps(candidate) {
            return false;
        }
        self.position = candidate;
        true
    }

    /// Advance turning and movement for one tick
    pub fn tick(
        &mut self,
        now_ms: f64,
        input: &TickInput,
        scheme: &ControlScheme,
        tuning: &Tuning,
        walls: &SpatialIndex,
    ) {
        self.advance_rotation(now_ms);

        if !self.movement_enabled {
            return;
        }

        match scheme.turn {
            TurnMode::Discrete => {
                if let Some(direction) = input.turn_press {
                    self.rotate(direction, now_ms, tuning.turn_duration_ms);
                }
            }
            TurnMode::Continuous => {
                if let Some(direction) = input.turn_held {
                    self.turn_by(direction, tuning.turn_speed);
                }
            }
        }

        if self.rotation.is_some() && !scheme.move_while_turning {
            return;
        }

        let sign = match input.movement {
            super::input::Movement::Forward => 1.0,
            super::input::Movement::Backward if scheme.allow_backward => -1.0,
            _ => return,
        };
        let step = self.forward() * self.current_speed() * sign;
        self.try_move(step, walls);
    }
}
