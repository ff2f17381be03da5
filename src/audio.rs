//! Audio
//!
//! Track and effect identifiers used by the simulation, plus the browser
//! `AudioManager`: looping music through `HtmlAudioElement` and
//! procedurally generated one-shot effects through the Web Audio API.

use serde::{Deserialize, Serialize};

/// Background music
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MusicTrack {
    /// Upbeat score played on every level
    #[default]
    Default,
    /// Switched in once a monster wakes up
    Sinister,
}

impl MusicTrack {
    pub fn file_name(self) -> &'static str {
        match self {
            MusicTrack::Default => "upbeat_background_score.mp3",
            MusicTrack::Sinister => "sinister_background_score.mp3",
        }
    }
}

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundEffect {
    /// Level or game complete
    Fanfare,
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, HtmlAudioElement, OscillatorNode, OscillatorType};

    use super::{MusicTrack, SoundEffect};
    use crate::platform::AudioOutput;

    /// Where the music files are served from
    const MUSIC_DIR: &str = "audio";

    /// Audio manager for the game
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        music: Option<HtmlAudioElement>,
        current: Option<MusicTrack>,
        playback_rate: f32,
        music_volume: f32,
        sfx_volume: f32,
        muted: bool,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // Try to create audio context (may fail if not in secure context)
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - effects disabled");
            }
            Self {
                ctx,
                music: None,
                current: None,
                playback_rate: 1.0,
                music_volume: 0.5,
                sfx_volume: 0.8,
                muted: false,
            }
        }

        /// Apply volumes from settings
        pub fn configure(&mut self, settings: &crate::Settings) {
            self.music_volume = settings.effective_music_volume();
            self.sfx_volume = settings.effective_sfx_volume();
            self.muted = settings.muted;
            if let Some(music) = &self.music {
                music.set_volume(self.music_volume as f64);
            }
        }

        /// Resume audio context (required after user gesture)
        pub fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
            if let Some(music) = &self.music {
                if music.paused() {
                    let _ = music.play();
                }
            }
        }

        /// Silence everything while the tab is hidden
        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
            if let Some(music) = &self.music {
                music.set_muted(muted);
            }
        }

        fn start_track(&mut self, track: MusicTrack) {
            if self.current == Some(track) {
                return;
            }
            self.stop_music();

            let src = format!("{MUSIC_DIR}/{}", track.file_name());
            let element = match HtmlAudioElement::new_with_src(&src) {
                Ok(element) => element,
                Err(_) => {
                    log::warn!("Could not create audio element for {src}");
                    return;
                }
            };
            element.set_loop(true);
            element.set_volume(self.music_volume as f64);
            element.set_muted(self.muted);
            element.set_playback_rate(self.playback_rate as f64);
            // Autoplay may be refused until the first user gesture; `resume` retries
            let _ = element.play();

            self.music = Some(element);
            self.current = Some(track);
        }

        fn stop_music(&mut self) {
            if let Some(music) = self.music.take() {
                let _ = music.pause();
            }
            self.current = None;
        }

        fn effective_sfx_volume(&self) -> f32 {
            if self.muted { 0.0 } else { self.sfx_volume }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Trumpet-ish rising fanfare
        fn play_fanfare(&self, ctx: &AudioContext, vol: f32) {
            let notes = [(523.25, 0.0), (659.25, 0.12), (783.99, 0.24), (1046.5, 0.36)];
            for (freq, delay) in notes {
                if let Some((osc, gain)) = self.create_osc(ctx, freq, OscillatorType::Sawtooth) {
                    let t = ctx.current_time() + delay;
                    let hold = if freq > 1000.0 { 0.6 } else { 0.25 };
                    gain.gain().set_value_at_time(vol * 0.2, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + hold)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + hold + 0.05).ok();
                }
            }
        }
    }

    impl AudioOutput for AudioManager {
        fn play_music(&mut self, track: MusicTrack) {
            self.start_track(track);
        }

        fn play_sound(&mut self, effect: SoundEffect) {
            let vol = self.effective_sfx_volume();
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Resume context if suspended (browsers require user gesture)
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Fanfare => self.play_fanfare(ctx, vol),
            }
        }

        fn stop_all(&mut self) {
            self.stop_music();
        }

        fn set_playback_rate(&mut self, rate: f32) {
            self.playback_rate = rate;
            if let Some(music) = &self.music {
                music.set_playback_rate(rate as f64);
            }
        }
    }
}
