//! Declarative level definitions
//!
//! A level is data: wall boxes, hazard configs, a goal position and a spawn
//! pose. One generic loader (`GameSession::load_level`) turns any of these
//! into live state.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::collision::Aabb;
use crate::audio::MusicTrack;

/// The level pack shipped with the game
const BUILTIN_LEVELS: &str = include_str!("../../assets/levels.json");

/// Spawn and goal coordinates must lie within this distance of the origin on every axis
const MAX_COORDINATE: f32 = 1000.0;

#[derive(Error, Debug)]
pub enum LevelError {
    #[error("level pack is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level pack contains no levels")]
    Empty,
    #[error("no level {0} in this pack")]
    UnknownLevel(u32),
    #[error("level {level} is invalid: {reason}")]
    Invalid { level: u32, reason: String },
}

/// Where and how the player appears
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnPose {
    pub position: Vec3,
    #[serde(default)]
    pub angle: f32,
}

/// A wall box given by center and full size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallDef {
    pub center: Vec3,
    pub size: Vec3,
}

impl WallDef {
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_size(self.center, self.size)
    }
}

/// Hazard placement and parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HazardDef {
    Spikes {
        center: Vec3,
        width: f32,
        depth: f32,
        cycle_ms: f64,
        active_ms: f64,
    },
    Trapdoor {
        center: Vec3,
        radius: f32,
    },
    SpeedBoost {
        center: Vec3,
        radius: f32,
        multiplier: f32,
        duration_ms: f64,
        music_rate: f32,
    },
    Monster {
        spawn: Vec3,
        speed: f32,
        detection_radius: f32,
        kill_radius: f32,
    },
}

/// Return portal placement (only built for sessions that arrived by portal)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortalDef {
    pub center: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDef {
    pub name: String,
    pub sky_color: String,
    #[serde(default)]
    pub music: MusicTrack,
    pub spawn: SpawnPose,
    pub goal: Vec3,
    pub walls: Vec<WallDef>,
    #[serde(default)]
    pub hazards: Vec<HazardDef>,
    #[serde(default)]
    pub return_portal: Option<PortalDef>,
}

impl LevelDef {
    fn validate(&self, number: u32) -> Result<(), LevelError> {
        let invalid = |reason: &str| LevelError::Invalid {
            level: number,
            reason: reason.to_string(),
        };

        let in_bounds = |p: Vec3| p.is_finite() && p.abs().max_element() <= MAX_COORDINATE;
        if !in_bounds(self.spawn.position) {
            return Err(invalid("spawn position out of range"));
        }
        if !self.spawn.angle.is_finite() || self.spawn.angle.abs() > std::f32::consts::TAU {
            return Err(invalid("spawn angle must be a finite turn in radians"));
        }
        if !in_bounds(self.goal) {
            return Err(invalid("goal position out of range"));
        }

        if self.walls.iter().any(|w| w.size.min_element() <= 0.0) {
            return Err(invalid("wall with non-positive size"));
        }

        for hazard in &self.hazards {
            match *hazard {
                HazardDef::Spikes {
                    width,
                    depth,
                    cycle_ms,
                    active_ms,
                    ..
                } => {
                    if width <= 0.0 || depth <= 0.0 {
                        return Err(invalid("spikes need a positive footprint"));
                    }
                    if cycle_ms <= 0.0 || active_ms <= 0.0 || active_ms > cycle_ms {
                        return Err(invalid("spike active time must fit inside its cycle"));
                    }
                }
                HazardDef::Trapdoor { radius, .. } => {
                    if radius <= 0.0 {
                        return Err(invalid("trapdoor radius must be positive"));
                    }
                }
                HazardDef::SpeedBoost {
                    radius,
                    multiplier,
                    duration_ms,
                    music_rate,
                    ..
                } => {
                    let positive = radius > 0.0 && multiplier > 0.0 && music_rate > 0.0;
                    if !positive || duration_ms <= 0.0 {
                        return Err(invalid("speed boost parameters must be positive"));
                    }
                }
                HazardDef::Monster {
                    speed,
                    detection_radius,
                    kill_radius,
                    ..
                } => {
                    if speed < 0.0 || kill_radius <= 0.0 || detection_radius < kill_radius {
                        return Err(invalid("monster must detect before it can kill"));
                    }
                }
            }
        }

        if let Some(portal) = &self.return_portal {
            if portal.radius <= 0.0 {
                return Err(invalid("portal radius must be positive"));
            }
        }

        Ok(())
    }
}

/// Ordered list of levels; level numbers are 1-based
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    levels: Vec<LevelDef>,
}

impl LevelSet {
    /// Parse and validate a level pack
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let set: LevelSet = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }

    /// The embedded level pack
    pub fn builtin() -> Result<Self, LevelError> {
        Self::from_json(BUILTIN_LEVELS)
    }

    pub fn new(levels: Vec<LevelDef>) -> Result<Self, LevelError> {
        let set = Self { levels };
        set.validate()?;
        Ok(set)
    }

    pub fn validate(&self) -> Result<(), LevelError> {
        if self.levels.is_empty() {
            return Err(LevelError::Empty);
        }
        for (i, level) in self.levels.iter().enumerate() {
            level.validate(i as u32 + 1)?;
        }
        Ok(())
    }

    pub fn get(&self, number: u32) -> Result<&LevelDef, LevelError> {
        number
            .checked_sub(1)
            .and_then(|i| self.levels.get(i as usize))
            .ok_or(LevelError::UnknownLevel(number))
    }

    pub fn max_level(&self) -> u32 {
        self.levels.len() as u32
    }
}
