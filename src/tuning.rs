//! Data-driven game balance
//!
//! Movement speeds and the delays of every timed sequence. Anything missing
//! from a JSON override falls back to the shipped default.

use serde::{Deserialize, Serialize};

/// Movement and timing knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Forward displacement per tick at 1x speed
    pub player_speed: f32,
    /// Radians per tick while a continuous turn is held
    pub turn_speed: f32,
    /// Length of a discrete 90° turn
    pub turn_duration_ms: f64,

    /// Pause between falling through a trapdoor and the game-over popup
    pub trapdoor_death_delay_ms: f64,
    /// Pause between being impaled and the game-over popup
    pub spikes_death_delay_ms: f64,
    /// Pause between being caught and the game-over popup
    pub monster_death_delay_ms: f64,
    /// Popup fade-out before the respawn or level swap happens
    pub popup_fade_ms: f64,

    /// How long a declined portal stays quiet
    pub portal_cooldown_ms: f64,

    /// Level name banner
    pub banner_duration_ms: f64,
    /// Generic HUD messages
    pub message_duration_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_speed: 0.07,
            turn_speed: 0.09,
            turn_duration_ms: 260.0,

            trapdoor_death_delay_ms: 800.0,
            spikes_death_delay_ms: 300.0,
            monster_death_delay_ms: 1000.0,
            popup_fade_ms: 500.0,

            portal_cooldown_ms: 3000.0,

            banner_duration_ms: 2000.0,
            message_duration_ms: 4000.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
