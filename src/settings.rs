//! Game settings and preferences
//!
//! Persisted in LocalStorage, including whether the tutorial was seen.

use serde::{Deserialize, Serialize};

use crate::persistence;

/// How turn keys rotate the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TurnMode {
    /// Eased 90° snap per key press
    Discrete,
    /// Angle changes every tick while the key is held
    #[default]
    Continuous,
}

impl TurnMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnMode::Discrete => "Discrete",
            TurnMode::Continuous => "Continuous",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "discrete" | "snap" => Some(TurnMode::Discrete),
            "continuous" | "smooth" => Some(TurnMode::Continuous),
            _ => None,
        }
    }
}

/// Movement controls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlScheme {
    pub turn: TurnMode,
    /// Whether the back key walks backwards
    pub allow_backward: bool,
    /// Whether walking continues during a discrete turn
    pub move_while_turning: bool,
}

impl Default for ControlScheme {
    fn default() -> Self {
        Self {
            turn: TurnMode::Continuous,
            allow_backward: false,
            move_while_turning: true,
        }
    }
}

impl ControlScheme {
    /// Grid-style controls: snap turns, stand still while turning, walk both ways
    pub fn discrete() -> Self {
        Self {
            turn: TurnMode::Discrete,
            allow_backward: true,
            move_while_turning: false,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub controls: ControlScheme,

    // === Audio ===
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,

    /// Set once the tutorial popup has been dismissed
    pub tutorial_seen: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            controls: ControlScheme::default(),

            music_volume: 0.5,
            sfx_volume: 0.8,
            muted: false,

            tutorial_seen: false,
        }
    }
}

impl Settings {
    /// Effective music volume (respects mute)
    pub fn effective_music_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.music_volume.clamp(0.0, 1.0) }
    }

    /// Effective effects volume (respects mute)
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.sfx_volume.clamp(0.0, 1.0) }
    }

    /// Parse stored settings, falling back to defaults for anything missing
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "triwizard_maze_settings";

    /// Load stored settings, or defaults on a first visit
    pub fn load() -> Self {
        match persistence::load(Self::STORAGE_KEY) {
            Some(settings) => {
                log::info!("Loaded settings");
                settings
            }
            None => {
                log::info!("Using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        match persistence::save(Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Settings not saved: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_controls_are_continuous_forward_only() {
        let scheme = ControlScheme::default();
        assert_eq!(scheme.turn, TurnMode::Continuous);
        assert!(!scheme.allow_backward);
        assert!(scheme.move_while_turning);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings = Settings::from_json(r#"{ "tutorial_seen": true }"#).unwrap();
        assert!(settings.tutorial_seen);
        assert_eq!(settings.controls, ControlScheme::default());
        assert_eq!(settings.music_volume, 0.5);
    }

    #[test]
    fn test_mute_zeroes_volume() {
        let settings = Settings {
            muted: true,
            ..Default::default()
        };
        assert_eq!(settings.effective_music_volume(), 0.0);
        assert_eq!(settings.effective_sfx_volume(), 0.0);
    }

    #[test]
    fn test_tutorial_flag_survives_reload() {
        let settings = Settings {
            tutorial_seen: true,
            controls: ControlScheme::discrete(),
            ..Default::default()
        };
        settings.save();
        assert_eq!(Settings::load(), settings);
    }

    #[test]
    fn test_turn_mode_from_str() {
        assert_eq!(TurnMode::from_str("SNAP"), Some(TurnMode::Discrete));
        assert_eq!(TurnMode::from_str("smooth"), Some(TurnMode::Continuous));
        assert_eq!(TurnMode::from_str("sideways"), None);
    }
}
