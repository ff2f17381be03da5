//! Session state and core simulation types
//!
//! `GameSession` owns everything that changes during play. Nothing here
//! talks to the platform; side effects leave as `GameEvent`s.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::collision::{Aabb, SpatialIndex};
use super::hazards::{ActiveHazard, DeathCause};
use super::level::{LevelSet, SpawnPose};
use super::player::Player;
use super::timers::Scheduler;
use crate::audio::{MusicTrack, SoundEffect};
use crate::settings::ControlScheme;
use crate::tuning::Tuning;

/// Handle for a visual the frontend spawned on our behalf
pub type VisualId = u32;

/// What a visual represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VisualKind {
    Floor,
    Wall,
    Goal,
    Spikes,
    Trapdoor,
    SpeedBoost,
    Monster,
    ReturnPortal,
}

/// Cosmetic state pushed to a visual
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VisualProperty {
    Raised(bool),
    Visible(bool),
    Open(bool),
    Position(Vec3),
    HoverOffset(f32),
    LightIntensity(f32),
}

/// Modal popups the frontend renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Popup {
    Tutorial,
    LevelComplete { level: u32 },
    GameOver(DeathCause),
    Victory,
}

/// Answers coming back from popups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UiResponse {
    DismissTutorial,
    Continue,
    Restart,
    PortalYes,
    PortalNo,
}

/// Side effects for the platform layer, in the order they happened
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A level's scene is built; set the sky
    LevelReady {
        level: u32,
        name: String,
        sky_color: String,
    },
    SpawnVisual {
        id: VisualId,
        kind: VisualKind,
        bounds: Aabb,
    },
    RemoveVisual(VisualId),
    SetVisualProperty {
        id: VisualId,
        property: VisualProperty,
    },
    PlayMusic(MusicTrack),
    PlaySound(SoundEffect),
    StopAllAudio,
    SetPlaybackRate(f32),
    ResetPlaybackRate,
    ShowMessage {
        text: String,
        color: String,
        duration_ms: f64,
    },
    ShowLevelBanner {
        name: String,
        duration_ms: f64,
    },
    ShowPopup(Popup),
    HidePopup,
    /// Yes/no prompt for leaving through the return portal
    ShowPortalConfirmation,
    /// The host should remember that the tutorial was seen
    TutorialDismissed,
    NavigateToReferrer(String),
    SessionComplete,
}

/// Steps between dying and playing again
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DeathStage {
    /// Death animation playing
    Dying { until_ms: f64 },
    /// Game-over popup up, waiting for "restart"
    ShowingPopup,
    /// Popup fading out
    Respawning { until_ms: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathSequence {
    pub cause: DeathCause,
    pub stage: DeathStage,
}

/// Steps between reaching the goal and the next level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransitionStage {
    /// Level-complete popup up, waiting for "continue"
    AwaitingContinue,
    FadingOut { until_ms: f64 },
}

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GamePhase {
    /// First visit: the tutorial popup is up
    Tutorial,
    /// Tearing down one level and building the next
    Loading,
    Active,
    Transitioning(TransitionStage),
    AwaitingRespawn(DeathSequence),
    /// Return-portal prompt is up
    PortalPrompt,
    /// Last level cleared
    Complete,
    /// Player took the portal home
    LeftViaPortal,
}

/// The level currently in play
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveLevel {
    pub number: u32,
    pub name: String,
    pub spawn: SpawnPose,
    pub goal: Vec3,
    pub goal_visual: VisualId,
    pub floor_visual: VisualId,
    pub music: MusicTrack,
    pub walls: SpatialIndex,
    pub hazards: Vec<ActiveHazard>,
}

/// Flags fixed for the whole session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub controls: ControlScheme,
    pub tuning: Tuning,
    pub tutorial_seen: bool,
    /// Set when the player arrived through a portal from another site
    pub referrer: Option<String>,
}

impl SessionConfig {
    pub fn arrived_via_portal(&self) -> bool {
        self.referrer.is_some()
    }
}

/// Music and playback rate as last requested
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioState {
    pub music: MusicTrack,
    pub playback_rate: f32,
}

impl Default for AudioState {
    fn default() -> Self {
        Self {
            music: MusicTrack::Default,
            playback_rate: 1.0,
        }
    }
}

/// Everything the game loop owns
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Simulation clock
    pub clock_ms: f64,
    pub phase: GamePhase,
    /// 1-based; 0 before the first load
    pub current_level: u32,
    pub max_level: u32,
    pub player: Player,
    pub level: Option<ActiveLevel>,
    /// Bumped on every death, goal, respawn and level change
    pub generation: u64,
    pub timers: Scheduler,
    pub audio: AudioState,
    pub config: SessionConfig,
    pub(crate) levels: LevelSet,
    events: Vec<GameEvent>,
    next_visual: VisualId,
}

impl GameSession {
    /// Create a session with nothing loaded yet; call `start` next
    pub fn new(levels: LevelSet, config: SessionConfig) -> Self {
        Self {
            clock_ms: 0.0,
            phase: GamePhase::Loading,
            current_level: 0,
            max_level: levels.max_level(),
            player: Player::new(config.tuning.player_speed),
            level: None,
            generation: 0,
            timers: Scheduler::new(),
            audio: AudioState::default(),
            config,
            levels,
            events: Vec::new(),
            next_visual: 1,
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Allocate an id and ask the frontend to draw it
    pub(crate) fn spawn_visual(&mut self, kind: VisualKind, bounds: Aabb) -> VisualId {
        let id = self.next_visual;
        self.next_visual += 1;
        self.emit(GameEvent::SpawnVisual { id, kind, bounds });
        id
    }

    pub(crate) fn set_visual(&mut self, id: VisualId, property: VisualProperty) {
        self.emit(GameEvent::SetVisualProperty { id, property });
    }

    pub(crate) fn play_music(&mut self, track: MusicTrack) {
        self.audio.music = track;
        self.emit(GameEvent::PlayMusic(track));
    }

    pub(crate) fn set_playback_rate(&mut self, rate: f32) {
        self.audio.playback_rate = rate;
        self.emit(GameEvent::SetPlaybackRate(rate));
    }

    pub(crate) fn reset_playback_rate(&mut self) {
        self.audio.playback_rate = 1.0;
        self.emit(GameEvent::ResetPlaybackRate);
    }

    pub(crate) fn show_message(&mut self, text: &str, color: &str) {
        let duration_ms = self.config.tuning.message_duration_ms;
        self.emit(GameEvent::ShowMessage {
            text: text.to_string(),
            color: color.to_string(),
            duration_ms,
        });
    }

    /// Hazards and the goal only react in live play
    pub fn accepts_contact(&self) -> bool {
        self.phase == GamePhase::Active && self.player.movement_enabled
    }
}
