//! Platform abstraction layer
//!
//! The simulation never touches the browser. It emits `GameEvent`s, and
//! `dispatch` routes them to whatever implements the capability traits:
//! - `AudioOutput`: music, effects, playback rate
//! - `Visuals`: spawning, removing and animating scene objects
//! - `Messages`: HUD messages, banners, popups, confirmations
//!
//! `LogHost` is the native stand-in; `web` holds the browser host.

use crate::audio::{MusicTrack, SoundEffect};
use crate::sim::{Aabb, GameEvent, Popup, UiResponse, VisualId, VisualKind, VisualProperty};

#[cfg(target_arch = "wasm32")]
pub mod web;

pub trait AudioOutput {
    fn play_music(&mut self, track: MusicTrack);
    fn play_sound(&mut self, effect: SoundEffect);
    fn stop_all(&mut self);
    fn set_playback_rate(&mut self, rate: f32);
    fn reset_playback_rate(&mut self) {
        self.set_playback_rate(1.0);
    }
}

pub trait Visuals {
    fn set_sky(&mut self, color: &str);
    fn spawn_visual(&mut self, id: VisualId, kind: VisualKind, bounds: Aabb);
    fn remove_visual(&mut self, id: VisualId);
    fn set_visual_property(&mut self, id: VisualId, property: VisualProperty);
}

pub trait Messages {
    fn show_message(&mut self, text: &str, color: &str, duration_ms: f64);
    fn show_level_banner(&mut self, name: &str, duration_ms: f64);
    fn show_popup(&mut self, popup: &Popup);
    fn hide_popup(&mut self);
    /// Yes/no prompt; the answer comes back as `PortalYes`/`PortalNo`
    fn show_confirmation(&mut self, text: &str);
}

/// Everything the game needs from its surroundings
pub trait Host: AudioOutput + Visuals + Messages {
    /// Remember the tutorial was seen
    fn tutorial_dismissed(&mut self);
    fn navigate_to(&mut self, url: &str);
    fn session_complete(&mut self) {}
}

/// Text shown when offered the way back to the referring site
pub const PORTAL_PROMPT: &str = "Return through the portal to where you came from?";

/// Title, body, button label and the response the button sends
pub fn popup_text(popup: &Popup) -> (String, String, &'static str, UiResponse) {
    match popup {
        Popup::Tutorial => (
            "Welcome to the Maze".to_string(),
            "Use the arrow keys to walk and turn. Find the glowing cup to finish each level, \
             and watch out for spikes, trapdoors and whatever lurks in the hedges."
                .to_string(),
            "Start",
            UiResponse::DismissTutorial,
        ),
        Popup::LevelComplete { level } => (
            "Level Complete!".to_string(),
            format!("Congratulations! You've completed level {level}."),
            "Continue",
            UiResponse::Continue,
        ),
        Popup::GameOver(cause) => (
            "Game Over".to_string(),
            cause.message().to_string(),
            "Try Again",
            UiResponse::Restart,
        ),
        Popup::Victory => (
            "Victory!".to_string(),
            "You found the cup on every level. The maze is yours.".to_string(),
            "Play Again",
            UiResponse::Continue,
        ),
    }
}

/// Route a batch of events to the host, in order
pub fn dispatch<H: Host + ?Sized>(events: Vec<GameEvent>, host: &mut H) {
    for event in events {
        match event {
            GameEvent::LevelReady {
                level,
                name,
                sky_color,
            } => {
                log::debug!("Level {level} ready: {name}");
                host.set_sky(&sky_color);
            }
            GameEvent::SpawnVisual { id, kind, bounds } => host.spawn_visual(id, kind, bounds),
            GameEvent::RemoveVisual(id) => host.remove_visual(id),
            GameEvent::SetVisualProperty { id, property } => host.set_visual_property(id, property),
            GameEvent::PlayMusic(track) => host.play_music(track),
            GameEvent::PlaySound(effect) => host.play_sound(effect),
            GameEvent::StopAllAudio => host.stop_all(),
            GameEvent::SetPlaybackRate(rate) => host.set_playback_rate(rate),
            GameEvent::ResetPlaybackRate => host.reset_playback_rate(),
            GameEvent::ShowMessage {
                text,
                color,
                duration_ms,
            } => host.show_message(&text, &color, duration_ms),
            GameEvent::ShowLevelBanner { name, duration_ms } => {
                host.show_level_banner(&name, duration_ms)
            }
            GameEvent::ShowPopup(popup) => host.show_popup(&popup),
            GameEvent::HidePopup => host.hide_popup(),
            GameEvent::ShowPortalConfirmation => host.show_confirmation(PORTAL_PROMPT),
            GameEvent::TutorialDismissed => host.tutorial_dismissed(),
            GameEvent::NavigateToReferrer(url) => host.navigate_to(&url),
            GameEvent::SessionComplete => host.session_complete(),
        }
    }
}

/// Headless host that logs what a real frontend would show
#[derive(Debug, Default)]
pub struct LogHost {
    pub visuals: usize,
    pub music: Option<MusicTrack>,
    pub playback_rate: f32,
    pub popup: Option<Popup>,
    pub messages: Vec<String>,
    pub tutorial_seen: bool,
    pub navigated_to: Option<String>,
    pub complete: bool,
}

impl LogHost {
    pub fn new() -> Self {
        Self {
            playback_rate: 1.0,
            ..Default::default()
        }
    }
}

impl AudioOutput for LogHost {
    fn play_music(&mut self, track: MusicTrack) {
        log::info!("Music: {}", track.file_name());
        self.music = Some(track);
    }

    fn play_sound(&mut self, effect: SoundEffect) {
        log::info!("Sound: {effect:?}");
    }

    fn stop_all(&mut self) {
        self.music = None;
    }

    fn set_playback_rate(&mut self, rate: f32) {
        log::debug!("Playback rate {rate}");
        self.playback_rate = rate;
    }
}

impl Visuals for LogHost {
    fn set_sky(&mut self, color: &str) {
        log::debug!("Sky {color}");
    }

    fn spawn_visual(&mut self, _id: VisualId, _kind: VisualKind, _bounds: Aabb) {
        self.visuals += 1;
    }

    fn remove_visual(&mut self, _id: VisualId) {
        self.visuals = self.visuals.saturating_sub(1);
    }

    fn set_visual_property(&mut self, _id: VisualId, _property: VisualProperty) {}
}

impl Messages for LogHost {
    fn show_message(&mut self, text: &str, _color: &str, _duration_ms: f64) {
        log::info!("Message: {text}");
        self.messages.push(text.to_string());
    }

    fn show_level_banner(&mut self, name: &str, _duration_ms: f64) {
        log::info!("Banner: {name}");
    }

    fn show_popup(&mut self, popup: &Popup) {
        let (title, body, _, _) = popup_text(popup);
        log::info!("Popup: {title} - {body}");
        self.popup = Some(popup.clone());
    }

    fn hide_popup(&mut self) {
        self.popup = None;
    }

    fn show_confirmation(&mut self, text: &str) {
        log::info!("Confirm: {text}");
    }
}

impl Host for LogHost {
    fn tutorial_dismissed(&mut self) {
        self.tutorial_seen = true;
    }

    fn navigate_to(&mut self, url: &str) {
        log::info!("Navigate to {url}");
        self.navigated_to = Some(url.to_string());
    }

    fn session_complete(&mut self) {
        self.complete = true;
    }
}
