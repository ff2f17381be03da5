//! Fixed timestep simulation tick
//!
//! Core game loop that advances the session deterministically.

use super::input::Movement;
use super::player::TurnDirection;
use super::state::{GamePhase, GameSession, UiResponse};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Turn key went down this tick (discrete turning)
    pub turn_press: Option<TurnDirection>,
    /// Turn key currently held (continuous turning)
    pub turn_held: Option<TurnDirection>,
    pub movement: Movement,
    /// Popup button pressed
    pub ui: Option<UiResponse>,
    /// Jump to the next level (debug/testing)
    pub skip_level: bool,
}

/// Advance the session by one fixed timestep
pub fn tick(session: &mut GameSession, input: &TickInput, dt_ms: f64) {
    session.clock_ms += dt_ms;

    session.run_timers();

    if let Some(response) = input.ui {
        session.handle_ui(response);
    }
    if input.skip_level {
        session.skip_level();
    }

    session.advance_sequences(dt_ms);

    match session.phase {
        GamePhase::Complete | GamePhase::LeftViaPortal => return,
        _ => {}
    }

    let now = session.clock_ms;
    let Some(level) = session.level.as_ref() else {
        return;
    };
    session.player.tick(
        now,
        input,
        &session.config.controls,
        &session.config.tuning,
        &level.walls,
    );

    session.update_hazards();
    session.check_hazard_contacts();
    session.check_goal();
    session.animate_cosmetics();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{MusicTrack, SoundEffect};
    use crate::consts::SIM_DT_MS;
    use crate::horizontal_distance;
    use crate::sim::hazards::{DeathCause, Hazard, MonsterState};
    use crate::sim::level::LevelSet;
    use crate::sim::state::{
        DeathSequence, DeathStage, GameEvent, Popup, SessionConfig, TransitionStage,
    };
    use glam::Vec3;

    fn session_with(config: SessionConfig) -> GameSession {
        let mut session = GameSession::new(LevelSet::builtin().unwrap(), config);
        session.start().unwrap();
        session
    }

    fn playing_session() -> GameSession {
        session_with(SessionConfig {
            tutorial_seen: true,
            ..Default::default()
        })
    }

    fn on_level_two() -> GameSession {
        let mut session = playing_session();
        session.load_level(2).unwrap();
        session.drain_events();
        session
    }

    fn idle(session: &mut GameSession, ticks: usize) {
        for _ in 0..ticks {
            tick(session, &TickInput::default(), SIM_DT_MS);
        }
    }

    fn press(session: &mut GameSession, response: UiResponse) {
        let input = TickInput {
            ui: Some(response),
            ..Default::default()
        };
        tick(session, &input, SIM_DT_MS);
    }

    /// Tick until `done` holds; panics if it never does
    fn idle_until(
        session: &mut GameSession,
        max_ticks: usize,
        done: impl Fn(&GameSession) -> bool,
    ) {
        for _ in 0..max_ticks {
            if done(session) {
                return;
            }
            tick(session, &TickInput::default(), SIM_DT_MS);
        }
        assert!(done(session), "condition not reached, phase {:?}", session.phase);
    }

    /// Everything a respawn must restore. Spikes are left out: they keep
    /// their phase across deaths.
    fn life_snapshot(session: &GameSession) -> (Vec3, f32, f32, bool, Vec<String>) {
        let hazards = session
            .level
            .as_ref()
            .unwrap()
            .hazards
            .iter()
            .filter(|slot| !matches!(slot.hazard, Hazard::Spikes(_)))
            .map(|slot| format!("{:?}", slot.hazard))
            .collect();
        (
            session.player.position,
            session.player.angle,
            session.player.speed_multiplier,
            session.player.movement_enabled,
            hazards,
        )
    }

    fn die_and_restart(session: &mut GameSession, cause: DeathCause) {
        idle_until(session, 120, |s| {
            matches!(
                s.phase,
                GamePhase::AwaitingRespawn(DeathSequence { stage: DeathStage::ShowingPopup, .. })
            )
        });
        assert!(
            session
                .events()
                .contains(&GameEvent::ShowPopup(Popup::GameOver(cause)))
        );
        press(session, UiResponse::Restart);
        idle_until(session, 60, |s| s.phase == GamePhase::Active);
    }

    fn boost_of(session: &GameSession) -> bool {
        session.level.as_ref().unwrap().hazards.iter().any(|slot| {
            matches!(&slot.hazard, Hazard::SpeedBoost(b) if b.available)
        })
    }

    #[test]
    fn test_start_goes_straight_to_play_when_tutorial_seen() {
        let mut session = playing_session();
        assert_eq!(session.phase, GamePhase::Active);
        assert_eq!(session.current_level, 1);
        assert!(session.player.movement_enabled);
        assert_eq!(session.player.position, Vec3::new(0.0, 0.0, 15.0));

        let events = session.drain_events();
        assert!(events.iter().any(|e| matches!(e, GameEvent::LevelReady { level: 1, .. })));
        assert!(events.iter().any(|e| matches!(e, GameEvent::ShowLevelBanner { .. })));
        assert!(events.contains(&GameEvent::PlayMusic(MusicTrack::Default)));
    }

    #[test]
    fn test_tutorial_blocks_movement_until_dismissed() {
        let mut session = session_with(SessionConfig::default());
        assert_eq!(session.phase, GamePhase::Tutorial);
        assert!(session.events().contains(&GameEvent::ShowPopup(Popup::Tutorial)));

        let forward = TickInput {
            movement: Movement::Forward,
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut session, &forward, SIM_DT_MS);
        }
        assert_eq!(session.player.position, Vec3::new(0.0, 0.0, 15.0));

        press(&mut session, UiResponse::DismissTutorial);
        assert_eq!(session.phase, GamePhase::Active);
        assert!(session.config.tutorial_seen);
        assert!(session.events().contains(&GameEvent::TutorialDismissed));

        tick(&mut session, &forward, SIM_DT_MS);
        assert!(session.player.position.z < 15.0);
    }

    #[test]
    fn test_walking_into_wall_stops_short() {
        let mut session = playing_session();
        let forward = TickInput {
            movement: Movement::Forward,
            ..Default::default()
        };
        for _ in 0..500 {
            tick(&mut session, &forward, SIM_DT_MS);
        }
        // Level 1 cross wall spans z -11.5..-10.5; the footprint reaches 0.5 ahead
        let z = session.player.position.z;
        assert!(z > -10.0 && z < -9.9, "stopped at {z}");
        assert_eq!(session.phase, GamePhase::Active);
    }

    #[test]
    fn test_every_death_respawns_to_the_same_state() {
        let mut session = on_level_two();
        let fresh = life_snapshot(&session);

        // Trapdoor
        session.player.position = Vec3::new(10.0, 0.0, -12.0);
        tick(&mut session, &TickInput::default(), SIM_DT_MS);
        assert!(matches!(
            session.phase,
            GamePhase::AwaitingRespawn(DeathSequence { cause: DeathCause::Trapdoor, .. })
        ));
        assert!(!session.player.movement_enabled);
        idle(&mut session, 20);
        assert!(session.player.position.y < 0.0);
        die_and_restart(&mut session, DeathCause::Trapdoor);
        assert_eq!(life_snapshot(&session), fresh);

        // Spikes, while still raised in their first half cycle
        let anchor = session.clock_ms;
        let level = session.level.as_mut().unwrap();
        for slot in &mut level.hazards {
            if let Hazard::Spikes(spikes) = &mut slot.hazard {
                spikes.last_cycle_ms = anchor;
                spikes.raised = false;
            }
        }
        session.player.position = Vec3::new(0.0, 0.0, -20.0);
        tick(&mut session, &TickInput::default(), SIM_DT_MS);
        assert_eq!(session.player.position.y, 0.3);
        die_and_restart(&mut session, DeathCause::Spikes);
        assert_eq!(life_snapshot(&session), fresh);

        // Monster, after grabbing the boost on the way
        session.player.position = Vec3::new(-10.0, 0.0, -12.5);
        tick(&mut session, &TickInput::default(), SIM_DT_MS);
        assert_eq!(session.player.speed_multiplier, 3.0);
        assert!(!boost_of(&session));
        session.player.position = Vec3::new(-22.5, 0.0, -1.0);
        tick(&mut session, &TickInput::default(), SIM_DT_MS);
        assert!(matches!(
            session.phase,
            GamePhase::AwaitingRespawn(DeathSequence { cause: DeathCause::Monster, .. })
        ));
        die_and_restart(&mut session, DeathCause::Monster);
        assert_eq!(life_snapshot(&session), fresh);
        assert_eq!(session.audio.playback_rate, 1.0);
        assert_eq!(session.audio.music, MusicTrack::Default);
        assert!(boost_of(&session));
    }

    #[test]
    fn test_stale_boost_expiry_is_ignored() {
        let mut session = on_level_two();
        let boost_spot = Vec3::new(-10.0, 0.0, -12.5);

        session.player.position = boost_spot;
        tick(&mut session, &TickInput::default(), SIM_DT_MS);
        let first_pickup = session.clock_ms;
        assert!(session.player.is_boosted());

        session.player.position = Vec3::new(10.0, 0.0, -12.0);
        die_and_restart(&mut session, DeathCause::Trapdoor);
        assert!(!session.player.is_boosted());

        // Second pickup in the new life
        idle(&mut session, 60);
        session.player.position = boost_spot;
        tick(&mut session, &TickInput::default(), SIM_DT_MS);
        let second_pickup = session.clock_ms;
        assert!(session.player.is_boosted());
        session.drain_events();

        // The first life's expiry comes due and must not cut this boost short
        idle_until(&mut session, 2000, |s| s.clock_ms > first_pickup + 10_000.0);
        assert!(session.player.is_boosted());
        assert!(!session.events().iter().any(|e| matches!(
            e,
            GameEvent::ShowMessage { text, .. } if text == "Speed boost ended"
        )));

        idle_until(&mut session, 2000, |s| s.clock_ms > second_pickup + 10_000.0);
        assert!(!session.player.is_boosted());
        assert_eq!(session.audio.playback_rate, 1.0);
        assert!(session.events().contains(&GameEvent::ResetPlaybackRate));
    }

    #[test]
    fn test_boost_expiry_during_game_over_popup_is_ignored() {
        let mut session = on_level_two();
        session.player.position = Vec3::new(-10.0, 0.0, -12.5);
        tick(&mut session, &TickInput::default(), SIM_DT_MS);
        let pickup = session.clock_ms;
        assert!(session.player.is_boosted());

        session.player.position = Vec3::new(10.0, 0.0, -12.0);
        tick(&mut session, &TickInput::default(), SIM_DT_MS);
        session.drain_events();

        // Sit on the game-over popup well past the boost's ten seconds
        idle_until(&mut session, 1000, |s| s.clock_ms > pickup + 11_000.0);
        assert!(matches!(
            session.phase,
            GamePhase::AwaitingRespawn(DeathSequence { stage: DeathStage::ShowingPopup, .. })
        ));
        let events = session.drain_events();
        assert!(!events.iter().any(|e| matches!(
            e,
            GameEvent::ShowMessage { text, .. } if text == "Speed boost ended"
        )));
        assert!(!events.contains(&GameEvent::ResetPlaybackRate));
        assert_eq!(session.audio.playback_rate, 2.0);

        // Respawn is what puts the rate back
        press(&mut session, UiResponse::Restart);
        idle_until(&mut session, 60, |s| s.phase == GamePhase::Active);
        assert_eq!(session.audio.playback_rate, 1.0);
        assert!(!session.player.is_boosted());
    }

    #[test]
    #[should_panic(expected = "respawn called with no active level")]
    fn test_respawn_before_start_panics() {
        let mut session = GameSession::new(LevelSet::builtin().unwrap(), SessionConfig::default());
        session.respawn();
    }

    #[test]
    fn test_contacts_ignored_while_transitioning() {
        let mut session = playing_session();
        session.player.position = Vec3::new(20.0, 0.0, -8.5);
        tick(&mut session, &TickInput::default(), SIM_DT_MS);
        assert_eq!(
            session.phase,
            GamePhase::Transitioning(TransitionStage::AwaitingContinue)
        );

        // Still on the goal, then dropped onto the raised spikes
        idle(&mut session, 30);
        let anchor = session.clock_ms;
        for slot in &mut session.level.as_mut().unwrap().hazards {
            if let Hazard::Spikes(spikes) = &mut slot.hazard {
                spikes.last_cycle_ms = anchor;
            }
        }
        session.player.position = Vec3::new(17.0, 0.0, -8.5);
        idle(&mut session, 30);

        let completions = session
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::ShowPopup(Popup::LevelComplete { .. })))
            .count();
        assert_eq!(completions, 1);
        let deaths = session
            .events()
            .iter()
            .filter(|e| matches!(e, GameEvent::ShowPopup(Popup::GameOver(_))))
            .count();
        assert_eq!(deaths, 0);
        assert_eq!(
            session.phase,
            GamePhase::Transitioning(TransitionStage::AwaitingContinue)
        );
    }

    #[test]
    fn test_monster_wakes_once_and_closes_in() {
        let mut session = on_level_two();
        let player = Vec3::new(-22.5, 0.0, -6.5);
        session.player.position = player;

        idle(&mut session, 10);
        let events = session.drain_events();
        let warnings = events
            .iter()
            .filter(|e| matches!(e, GameEvent::ShowMessage { text, .. } if text.contains("RUN")))
            .count();
        assert_eq!(warnings, 1);
        assert_eq!(
            events
                .iter()
                .filter(|e| **e == GameEvent::PlayMusic(MusicTrack::Sinister))
                .count(),
            1
        );

        let monster = session
            .level
            .as_ref()
            .unwrap()
            .hazards
            .iter()
            .find_map(|slot| match &slot.hazard {
                Hazard::Monster(m) => Some(m.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(monster.state, MonsterState::Awakened);
        let distance = horizontal_distance(monster.position, player);
        assert!((distance - (4.5 - 0.6)).abs() < 1e-3, "distance {distance}");
    }

    #[test]
    fn test_distant_monster_stays_put() {
        let mut session = on_level_two();
        idle(&mut session, 30);
        assert!(!session.events().iter().any(|e| matches!(e, GameEvent::ShowMessage { .. })));
        assert_eq!(session.phase, GamePhase::Active);
    }

    #[test]
    fn test_goal_moves_on_to_level_two() {
        let mut session = playing_session();
        let old_walls: Vec<_> = session
            .level
            .as_ref()
            .unwrap()
            .walls
            .walls()
            .iter()
            .map(|w| w.visual)
            .collect();
        assert!(session.level.as_ref().unwrap().walls.overlaps(Vec3::new(0.0, 0.0, -10.0)));
        session.drain_events();

        session.player.position = Vec3::new(20.0, 0.0, -8.5);
        tick(&mut session, &TickInput::default(), SIM_DT_MS);
        assert_eq!(
            session.phase,
            GamePhase::Transitioning(TransitionStage::AwaitingContinue)
        );
        assert!(session.events().contains(&GameEvent::PlaySound(SoundEffect::Fanfare)));
        assert!(
            session
                .events()
                .contains(&GameEvent::ShowPopup(Popup::LevelComplete { level: 1 }))
        );

        // Nothing happens until the player continues
        idle(&mut session, 60);
        assert_eq!(session.current_level, 1);

        press(&mut session, UiResponse::Continue);
        idle_until(&mut session, 60, |s| s.phase == GamePhase::Active);

        assert_eq!(session.current_level, 2);
        let walls = &session.level.as_ref().unwrap().walls;
        assert_eq!(walls.len(), 11);
        // Blocked by level 1's cross wall, open floor on level 2
        assert!(!walls.overlaps(Vec3::new(0.0, 0.0, -10.0)));
        assert_eq!(session.player.position, Vec3::new(0.0, 0.0, 15.0));
        let events = session.drain_events();
        for id in old_walls {
            assert!(events.contains(&GameEvent::RemoveVisual(id)));
        }
        assert!(events.iter().any(|e| matches!(e, GameEvent::LevelReady { level: 2, .. })));
    }

    #[test]
    fn test_last_goal_completes_session() {
        let mut session = on_level_two();
        session.player.position = Vec3::new(-20.0, 0.0, -20.0);
        tick(&mut session, &TickInput::default(), SIM_DT_MS);
        assert_eq!(session.phase, GamePhase::Complete);
        assert!(session.events().contains(&GameEvent::ShowPopup(Popup::Victory)));
        assert!(session.events().contains(&GameEvent::SessionComplete));

        // Frozen from here on
        let clock_before = session.clock_ms;
        idle(&mut session, 5);
        assert_eq!(session.phase, GamePhase::Complete);
        assert!(session.clock_ms > clock_before);
    }

    #[test]
    fn test_skip_level_stops_at_last() {
        let mut session = playing_session();
        let skip = TickInput {
            skip_level: true,
            ..Default::default()
        };
        tick(&mut session, &skip, SIM_DT_MS);
        assert_eq!(session.current_level, 2);
        tick(&mut session, &skip, SIM_DT_MS);
        assert_eq!(session.current_level, 2);
        assert_eq!(session.phase, GamePhase::Active);
    }

    #[test]
    fn test_portal_only_for_portal_visitors() {
        let session = playing_session();
        let hazards = &session.level.as_ref().unwrap().hazards;
        assert!(!hazards.iter().any(|slot| matches!(slot.hazard, Hazard::ReturnPortal(_))));
    }

    #[test]
    fn test_portal_prompt_decline_and_accept() {
        let config = SessionConfig {
            tutorial_seen: true,
            referrer: Some("https://example.com/hub".to_string()),
            ..Default::default()
        };
        let mut session = session_with(config.clone());
        let spawn = session.player.position;

        // Standing on it at spawn does nothing
        idle(&mut session, 10);
        assert_eq!(session.phase, GamePhase::Active);

        // Step off, come back
        session.player.position = Vec3::new(0.0, 0.0, 10.0);
        idle(&mut session, 1);
        session.player.position = spawn;
        idle(&mut session, 1);
        assert_eq!(session.phase, GamePhase::PortalPrompt);
        assert!(session.events().contains(&GameEvent::ShowPortalConfirmation));

        press(&mut session, UiResponse::PortalNo);
        assert_eq!(session.phase, GamePhase::Active);
        idle(&mut session, 10);
        assert_eq!(session.phase, GamePhase::Active);

        let mut leaving = session_with(config);
        leaving.player.position = Vec3::new(0.0, 0.0, 10.0);
        idle(&mut leaving, 1);
        leaving.player.position = spawn;
        idle(&mut leaving, 1);
        press(&mut leaving, UiResponse::PortalYes);
        assert_eq!(leaving.phase, GamePhase::LeftViaPortal);
        assert!(leaving.events().contains(&GameEvent::StopAllAudio));
        assert!(
            leaving
                .events()
                .contains(&GameEvent::NavigateToReferrer("https://example.com/hub".to_string()))
        );
    }

    #[test]
    fn test_ui_answer_in_wrong_phase_is_ignored() {
        let mut session = playing_session();
        press(&mut session, UiResponse::Restart);
        press(&mut session, UiResponse::Continue);
        assert_eq!(session.phase, GamePhase::Active);
        assert_eq!(session.current_level, 1);
    }

    #[test]
    fn test_determinism() {
        let script: Vec<TickInput> = (0..600)
            .map(|i| TickInput {
                movement: if i % 200 < 150 { Movement::Forward } else { Movement::Idle },
                turn_held: if (300..340).contains(&i) { Some(TurnDirection::Left) } else { None },
                skip_level: i == 400,
                ..Default::default()
            })
            .collect();

        let mut a = playing_session();
        let mut b = playing_session();
        for input in &script {
            tick(&mut a, input, SIM_DT_MS);
            tick(&mut b, input, SIM_DT_MS);
        }

        assert_eq!(a.phase, b.phase);
        assert_eq!(a.player.position, b.player.position);
        assert_eq!(a.player.angle, b.player.angle);
        assert_eq!(a.drain_events(), b.drain_events());
    }
}
