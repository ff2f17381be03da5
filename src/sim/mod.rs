//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only, time comes from the session clock
//! - Stable iteration order (hazards in level order)
//! - No rendering or platform dependencies; side effects leave as events

pub mod collision;
pub mod hazards;
pub mod input;
pub mod level;
mod level_manager;
pub mod player;
pub mod state;
pub mod tick;
pub mod timers;

pub use collision::{Aabb, SpatialIndex, Wall};
pub use hazards::{ContactOutcome, DeathCause, Hazard};
pub use input::{InputEvent, InputState, Movement};
pub use level::{LevelDef, LevelError, LevelSet};
pub use player::{Player, TurnDirection};
pub use state::{
    GameEvent, GamePhase, GameSession, Popup, SessionConfig, UiResponse, VisualId, VisualKind,
    VisualProperty,
};
pub use tick::{TickInput, tick};
