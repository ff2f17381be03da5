//! Triwizard Maze - a first-person hedge maze with timed hazards
//!
//! Core modules:
//! - `sim`: Deterministic game core (player, hazards, levels, tick)
//! - `platform`: Capability traits the core's events are dispatched to
//! - `audio`: Music/effect identifiers and the browser audio manager
//! - `persistence`: Key/value JSON storage (LocalStorage on web)
//! - `settings`: Player preferences, including the tutorial flag
//! - `tuning`: Data-driven timing and movement balance

pub mod audio;
pub mod persistence;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::{ControlScheme, Settings, TurnMode};
pub use tuning::Tuning;

use glam::Vec3;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one tick per 60 Hz display frame)
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Player collision volume
    pub const PLAYER_HEIGHT: f32 = 1.8;
    pub const PLAYER_RADIUS: f32 = 0.5;

    /// Distance to the goal's center that counts as reaching it
    pub const GOAL_REACH_RADIUS: f32 = 1.5;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::{PI, TAU};
    if (-PI..PI).contains(&angle) {
        return angle;
    }
    let wrapped = (angle + PI).rem_euclid(TAU);
    // rem_euclid can round up to TAU for tiny negative inputs
    if wrapped >= TAU { -PI } else { wrapped - PI }
}

/// Distance on the ground plane, ignoring height
#[inline]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

/// Quadratic ease-in-out on [0, 1]
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}
