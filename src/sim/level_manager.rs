//! Level lifecycle
//!
//! Loading, clearing, goal transitions, deaths and respawns. Every death
//! cause ends in the same `respawn` path.

use glam::Vec3;

use super::collision::{Aabb, Wall};
use super::hazards::{
    ActiveHazard, ContactOutcome, DeathCause, Hazard, HazardContext, HazardSignal, Monster,
    ReturnPortal, SpeedBoost, Spikes, Trapdoor,
};
use super::level::{HazardDef, LevelDef, LevelError};
use super::state::{
    ActiveLevel, DeathSequence, DeathStage, GameEvent, GamePhase, GameSession, Popup,
    TransitionStage, UiResponse, VisualId, VisualKind, VisualProperty,
};
use super::timers::TimedAction;
use crate::audio::{MusicTrack, SoundEffect};
use crate::consts::GOAL_REACH_RADIUS;

/// Size of the ground plane under every level
const FLOOR_SIZE: f32 = 50.0;
/// How far the trapdoor sinks the player
const TRAPDOOR_FALL_DEPTH: f32 = -3.0;
/// Sink speed: units per 50 ms
const TRAPDOOR_SINK_PER_50MS: f32 = 0.1;
/// Spikes toss the player up this far
const SPIKE_TOSS_HEIGHT: f32 = 0.3;

const WARNING_COLOR: &str = "#ff5252";
const BOOST_COLOR: &str = "#1E88E5";

impl GameSession {
    /// Build level 1 and either gate on the tutorial or go straight to play
    pub fn start(&mut self) -> Result<(), LevelError> {
        self.build_level(1)?;
        if self.config.tutorial_seen {
            self.activate_level();
        } else {
            self.phase = GamePhase::Tutorial;
            self.player.movement_enabled = false;
            self.emit(GameEvent::ShowPopup(Popup::Tutorial));
            log::info!("Waiting on tutorial");
        }
        Ok(())
    }

    /// Discard the current level and bring up level `number`, ready to play
    pub fn load_level(&mut self, number: u32) -> Result<(), LevelError> {
        self.build_level(number)?;
        self.activate_level();
        Ok(())
    }

    /// Tear down walls, hazards, goal and floor of the active level
    pub fn clear_level(&mut self) {
        let Some(mut level) = self.level.take() else {
            return;
        };
        let mut visuals: Vec<VisualId> = level.walls.clear();
        visuals.push(level.goal_visual);
        visuals.push(level.floor_visual);
        visuals.extend(level.hazards.drain(..).map(|h| h.visual));
        for id in visuals {
            self.emit(GameEvent::RemoveVisual(id));
        }
        log::debug!("Cleared level {}", level.number);
    }

    fn build_level(&mut self, number: u32) -> Result<(), LevelError> {
        let def = self.levels.get(number)?.clone();

        self.phase = GamePhase::Loading;
        self.player.movement_enabled = false;
        self.clear_level();
        self.generation += 1;

        let now = self.clock_ms;
        let level = self.construct(number, &def, now);
        self.level = Some(level);
        self.current_level = number;

        self.player.reset_to(&def.spawn);
        if self.player.is_boosted() || self.audio.playback_rate != 1.0 {
            self.player.speed_multiplier = 1.0;
            self.reset_playback_rate();
        }

        self.emit(GameEvent::LevelReady {
            level: number,
            name: def.name.clone(),
            sky_color: def.sky_color.clone(),
        });
        log::info!("Built level {} ({})", number, def.name);
        Ok(())
    }

    /// Turn a level definition into live walls, hazards and visuals
    fn construct(&mut self, number: u32, def: &LevelDef, now: f64) -> ActiveLevel {
        let floor_visual = self.spawn_visual(
            VisualKind::Floor,
            Aabb::new(
                Vec3::new(-FLOOR_SIZE / 2.0, 0.0, -FLOOR_SIZE / 2.0),
                Vec3::new(FLOOR_SIZE / 2.0, 0.0, FLOOR_SIZE / 2.0),
            ),
        );

        let mut walls = super::collision::SpatialIndex::new();
        for wall in &def.walls {
            let bounds = wall.bounds();
            let visual = self.spawn_visual(VisualKind::Wall, bounds);
            walls.insert(Wall { bounds, visual });
        }

        let goal_visual = self.spawn_visual(
            VisualKind::Goal,
            Aabb::from_center_size(def.goal, Vec3::new(1.6, 1.2, 1.6)),
        );

        let mut hazards = Vec::with_capacity(def.hazards.len() + 1);
        for hazard_def in &def.hazards {
            let (hazard, kind, bounds) = hazard_from_def(hazard_def, now);
            let visual = self.spawn_visual(kind, bounds);
            hazards.push(ActiveHazard { hazard, visual });
        }

        if let (Some(portal), true) = (def.return_portal, self.config.arrived_via_portal()) {
            let hazard = Hazard::ReturnPortal(ReturnPortal::new(
                portal.center,
                portal.radius,
                self.config.tuning.portal_cooldown_ms,
                now,
            ));
            let visual = self.spawn_visual(
                VisualKind::ReturnPortal,
                Aabb::from_center_size(
                    portal.center,
                    Vec3::new(portal.radius, 2.0 * portal.radius, 0.2),
                ),
            );
            hazards.push(ActiveHazard { hazard, visual });
        }

        ActiveLevel {
            number,
            name: def.name.clone(),
            spawn: def.spawn,
            goal: def.goal,
            goal_visual,
            floor_visual,
            music: def.music,
            walls,
            hazards,
        }
    }

    fn activate_level(&mut self) {
        let Some((name, music)) = self.level.as_ref().map(|l| (l.name.clone(), l.music)) else {
            return;
        };
        self.phase = GamePhase::Active;
        self.player.movement_enabled = true;
        let duration_ms = self.config.tuning.banner_duration_ms;
        self.emit(GameEvent::ShowLevelBanner { name, duration_ms });
        self.play_music(music);
    }

    /// Player reached the goal
    pub fn on_goal_reached(&mut self) {
        if !self.accepts_contact() {
            return;
        }
        self.player.movement_enabled = false;
        // Timers from the finished level must not fire under the popup
        self.generation += 1;
        self.emit(GameEvent::PlaySound(SoundEffect::Fanfare));

        if self.current_level < self.max_level {
            self.phase = GamePhase::Transitioning(TransitionStage::AwaitingContinue);
            self.emit(GameEvent::ShowPopup(Popup::LevelComplete {
                level: self.current_level,
            }));
            log::info!("Level {} complete", self.current_level);
        } else {
            self.phase = GamePhase::Complete;
            self.emit(GameEvent::ShowPopup(Popup::Victory));
            self.emit(GameEvent::SessionComplete);
            log::info!("Final level cleared");
        }
    }

    /// A hazard killed the player; start the death sequence
    pub fn on_hazard_death(&mut self, cause: DeathCause) {
        if !self.accepts_contact() {
            return;
        }
        self.player.movement_enabled = false;
        // This life is over; its pending timers go stale
        self.generation += 1;

        let tuning = &self.config.tuning;
        let delay = match cause {
            DeathCause::Trapdoor => tuning.trapdoor_death_delay_ms,
            DeathCause::Spikes => tuning.spikes_death_delay_ms,
            DeathCause::Monster => tuning.monster_death_delay_ms,
        };
        if cause == DeathCause::Spikes {
            self.player.position.y = SPIKE_TOSS_HEIGHT;
        }

        self.phase = GamePhase::AwaitingRespawn(DeathSequence {
            cause,
            stage: DeathStage::Dying {
                until_ms: self.clock_ms + delay,
            },
        });
        log::info!("Player died ({:?}) on level {}", cause, self.current_level);
    }

    /// Put the player back at the current level's spawn with every hazard
    /// re-armed. Same path for every death cause.
    ///
    /// # Panics
    /// If no level is active; that means the lifecycle was driven out of order.
    pub fn respawn(&mut self) {
        let now = self.clock_ms;
        let Some(level) = self.level.as_mut() else {
            panic!("respawn called with no active level");
        };

        let mut visual_updates = Vec::new();
        for slot in &mut level.hazards {
            slot.hazard.reset(now);
            match &slot.hazard {
                Hazard::SpeedBoost(_) => {
                    visual_updates.push((slot.visual, VisualProperty::Visible(true)));
                }
                Hazard::Trapdoor(_) => {
                    visual_updates.push((slot.visual, VisualProperty::Open(false)));
                }
                Hazard::Monster(monster) => {
                    visual_updates.push((slot.visual, VisualProperty::Position(monster.position)));
                }
                Hazard::Spikes(_) | Hazard::ReturnPortal(_) => {}
            }
        }
        let spawn = level.spawn;
        let music = level.music;

        self.generation += 1;
        self.player.reset_to(&spawn);
        self.player.speed_multiplier = 1.0;
        self.player.movement_enabled = true;
        self.phase = GamePhase::Active;

        for (id, property) in visual_updates {
            self.set_visual(id, property);
        }
        if self.audio.playback_rate != 1.0 {
            self.reset_playback_rate();
        }
        if self.audio.music != music {
            self.play_music(music);
        }
        log::info!("Respawned on level {}", self.current_level);
    }

    /// Debug shortcut: jump straight to the next level
    pub fn skip_level(&mut self) {
        if self.phase != GamePhase::Active {
            return;
        }
        if self.current_level >= self.max_level {
            log::info!("Already at max level");
            return;
        }
        let next = self.current_level + 1;
        if let Err(e) = self.load_level(next) {
            log::error!("Failed to skip to level {next}: {e}");
        }
    }

    /// React to a popup button
    pub fn handle_ui(&mut self, response: UiResponse) {
        let now = self.clock_ms;
        match (self.phase, response) {
            (GamePhase::Tutorial, UiResponse::DismissTutorial) => {
                self.config.tutorial_seen = true;
                self.emit(GameEvent::HidePopup);
                self.emit(GameEvent::TutorialDismissed);
                self.activate_level();
            }
            (GamePhase::Transitioning(TransitionStage::AwaitingContinue), UiResponse::Continue) => {
                self.emit(GameEvent::HidePopup);
                self.phase = GamePhase::Transitioning(TransitionStage::FadingOut {
                    until_ms: now + self.config.tuning.popup_fade_ms,
                });
            }
            (
                GamePhase::AwaitingRespawn(DeathSequence {
                    cause,
                    stage: DeathStage::ShowingPopup,
                }),
                UiResponse::Restart,
            ) => {
                self.emit(GameEvent::HidePopup);
                self.phase = GamePhase::AwaitingRespawn(DeathSequence {
                    cause,
                    stage: DeathStage::Respawning {
                        until_ms: now + self.config.tuning.popup_fade_ms,
                    },
                });
            }
            (GamePhase::PortalPrompt, UiResponse::PortalYes) => {
                let url = self.config.referrer.clone().unwrap_or_default();
                self.phase = GamePhase::LeftViaPortal;
                self.emit(GameEvent::HidePopup);
                self.emit(GameEvent::StopAllAudio);
                self.emit(GameEvent::NavigateToReferrer(url));
                log::info!("Leaving through the return portal");
            }
            (GamePhase::PortalPrompt, UiResponse::PortalNo) => {
                if let Some(level) = self.level.as_mut() {
                    for slot in &mut level.hazards {
                        if let Hazard::ReturnPortal(portal) = &mut slot.hazard {
                            portal.decline(now);
                        }
                    }
                }
                self.emit(GameEvent::HidePopup);
                self.phase = GamePhase::Active;
                self.player.movement_enabled = true;
            }
            (phase, response) => {
                log::debug!("Ignoring {response:?} during {phase:?}");
            }
        }
    }

    /// Step the death and transition sequences by `dt_ms`
    pub fn advance_sequences(&mut self, dt_ms: f64) {
        let now = self.clock_ms;
        match self.phase {
            GamePhase::AwaitingRespawn(DeathSequence { cause, stage }) => match stage {
                DeathStage::Dying { until_ms } => {
                    if cause == DeathCause::Trapdoor {
                        let sink = TRAPDOOR_SINK_PER_50MS * (dt_ms / 50.0) as f32;
                        let y = self.player.position.y - sink;
                        self.player.position.y = y.max(TRAPDOOR_FALL_DEPTH);
                    }
                    if now >= until_ms {
                        if cause == DeathCause::Spikes {
                            self.player.position.y = 0.0;
                        }
                        self.phase = GamePhase::AwaitingRespawn(DeathSequence {
                            cause,
                            stage: DeathStage::ShowingPopup,
                        });
                        self.emit(GameEvent::ShowPopup(Popup::GameOver(cause)));
                    }
                }
                DeathStage::ShowingPopup => {}
                DeathStage::Respawning { until_ms } => {
                    if now >= until_ms {
                        self.respawn();
                    }
                }
            },
            GamePhase::Transitioning(TransitionStage::FadingOut { until_ms })
                if now >= until_ms =>
            {
                let next = self.current_level + 1;
                if let Err(e) = self.load_level(next) {
                    log::error!("Failed to load level {next}: {e}");
                    self.phase = GamePhase::Complete;
                }
            }
            _ => {}
        }
    }

    /// Fire due timers, dropping any scheduled under an older generation
    pub fn run_timers(&mut self) {
        for entry in self.timers.take_due(self.clock_ms) {
            if entry.generation != self.generation {
                log::debug!(
                    "Dropping stale {:?} from generation {}",
                    entry.action,
                    entry.generation
                );
                continue;
            }
            match entry.action {
                TimedAction::EndSpeedBoost => {
                    self.player.speed_multiplier = 1.0;
                    self.reset_playback_rate();
                    self.show_message("Speed boost ended", BOOST_COLOR);
                    log::debug!("Speed boost expired");
                }
            }
        }
    }

    /// Advance every hazard's own state machine
    pub fn update_hazards(&mut self) {
        let ctx = HazardContext {
            now_ms: self.clock_ms,
            player_position: self.player.position,
        };
        let Some(level) = self.level.as_mut() else {
            return;
        };
        let signals: Vec<(VisualId, HazardSignal)> = level
            .hazards
            .iter_mut()
            .filter_map(|slot| slot.hazard.update(&ctx).map(|signal| (slot.visual, signal)))
            .collect();

        for (visual, signal) in signals {
            match signal {
                HazardSignal::SpikesRaised => {
                    self.set_visual(visual, VisualProperty::Raised(true));
                }
                HazardSignal::SpikesLowered => {
                    self.set_visual(visual, VisualProperty::Raised(false));
                }
                HazardSignal::MonsterAwakened => {
                    log::debug!("Monster awakened");
                    self.show_message("Something stirs in the darkness... RUN!", WARNING_COLOR);
                    self.play_music(MusicTrack::Sinister);
                    if let Some(position) = self.hazard_position(visual) {
                        self.set_visual(visual, VisualProperty::Position(position));
                    }
                }
                HazardSignal::MonsterMoved(position) => {
                    self.set_visual(visual, VisualProperty::Position(position));
                }
                HazardSignal::PortalRearmed => log::debug!("Return portal armed"),
            }
        }
    }

    fn hazard_position(&self, visual: VisualId) -> Option<Vec3> {
        self.level
            .as_ref()?
            .hazards
            .iter()
            .find(|slot| slot.visual == visual)
            .map(|slot| slot.hazard.position())
    }

    /// Test the player against each hazard in order; the first contact that
    /// takes control away ends the pass.
    pub fn check_hazard_contacts(&mut self) {
        let player = self.player.position;
        let mut index = 0;
        while self.accepts_contact() {
            let Some(slot) = self.level.as_mut().and_then(|l| l.hazards.get_mut(index)) else {
                break;
            };
            index += 1;
            if !slot.hazard.check_collision(player) {
                continue;
            }
            let outcome = slot.hazard.trigger();
            let visual = slot.visual;
            self.on_contact(outcome, visual);
        }
    }

    fn on_contact(&mut self, outcome: ContactOutcome, visual: VisualId) {
        match outcome {
            ContactOutcome::Death(cause) => {
                if cause == DeathCause::Trapdoor {
                    self.set_visual(visual, VisualProperty::Open(true));
                }
                self.on_hazard_death(cause);
            }
            ContactOutcome::SpeedBoost {
                multiplier,
                duration_ms,
                music_rate,
            } => {
                self.player.speed_multiplier = multiplier;
                self.set_playback_rate(music_rate);
                self.set_visual(visual, VisualProperty::Visible(false));
                self.show_message("Speed Boost!", BOOST_COLOR);
                self.timers.schedule(
                    self.clock_ms + duration_ms,
                    self.generation,
                    TimedAction::EndSpeedBoost,
                );
                log::debug!("Speed boost x{multiplier} for {duration_ms} ms");
            }
            ContactOutcome::PortalPrompt => {
                self.player.movement_enabled = false;
                self.phase = GamePhase::PortalPrompt;
                self.emit(GameEvent::ShowPortalConfirmation);
            }
        }
    }

    /// Win check
    pub fn check_goal(&mut self) {
        let Some(goal) = self.level.as_ref().map(|l| l.goal) else {
            return;
        };
        if self.accepts_contact() && self.player.position.distance(goal) < GOAL_REACH_RADIUS {
            self.on_goal_reached();
        }
    }

    /// Goal glow and pickup bob
    pub fn animate_cosmetics(&mut self) {
        let now = self.clock_ms;
        let Some(level) = self.level.as_ref() else {
            return;
        };
        let goal_visual = level.goal_visual;
        let hovering: Vec<VisualId> = level
            .hazards
            .iter()
            .filter(|slot| matches!(&slot.hazard, Hazard::SpeedBoost(b) if b.available))
            .map(|slot| slot.visual)
            .collect();

        let pulse = (((now / 1000.0 * 2.0).sin() + 1.0) / 2.0) as f32;
        self.set_visual(goal_visual, VisualProperty::LightIntensity(0.5 + pulse * 0.8));
        let offset = SpeedBoost::hover_offset(now);
        for id in hovering {
            self.set_visual(id, VisualProperty::HoverOffset(offset));
        }
    }
}

/// Live hazard plus its visual kind and footprint
fn hazard_from_def(def: &HazardDef, now: f64) -> (Hazard, VisualKind, Aabb) {
    match *def {
        HazardDef::Spikes {
            center,
            width,
            depth,
            cycle_ms,
            active_ms,
        } => (
            Hazard::Spikes(Spikes::new(center, width, depth, cycle_ms, active_ms, now)),
            VisualKind::Spikes,
            Aabb::from_center_size(
                Vec3::new(center.x, 0.5, center.z),
                Vec3::new(width, 1.0, depth),
            ),
        ),
        HazardDef::Trapdoor { center, radius } => (
            Hazard::Trapdoor(Trapdoor::new(center, radius)),
            VisualKind::Trapdoor,
            // The panel is drawn larger than its trigger so it can be skirted
            Aabb::from_center_size(center, Vec3::new(radius * 2.5, 0.05, radius * 2.5)),
        ),
        HazardDef::SpeedBoost {
            center,
            radius,
            multiplier,
            duration_ms,
            music_rate,
        } => (
            Hazard::SpeedBoost(SpeedBoost::new(
                center,
                radius,
                multiplier,
                duration_ms,
                music_rate,
            )),
            VisualKind::SpeedBoost,
            Aabb::from_center_size(center + Vec3::Y * 0.8, Vec3::splat(radius * 2.0)),
        ),
        HazardDef::Monster {
            spawn,
            speed,
            detection_radius,
            kill_radius,
        } => (
            Hazard::Monster(Monster::new(spawn, speed, detection_radius, kill_radius)),
            VisualKind::Monster,
            Aabb::from_center_size(spawn, Vec3::splat(1.6)),
        ),
    }
}
