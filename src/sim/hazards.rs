//! Hazard state machines
//!
//! Every hazard follows the same contract:
//! - `update` advances its own state (timers, pursuit, cooldowns)
//! - `check_collision` says whether the player is in its trigger region
//!   while it is in a state where contact matters
//! - `trigger` latches the contact and reports what it means
//! - `reset` re-arms it for a fresh life

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::state::VisualId;
use crate::horizontal_distance;

/// What killed the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeathCause {
    Trapdoor,
    Spikes,
    Monster,
}

impl DeathCause {
    /// Game-over popup text
    pub fn message(self) -> &'static str {
        match self {
            DeathCause::Trapdoor => {
                "A trapdoor swings open beneath your feet! You tumble into darkness..."
            }
            DeathCause::Spikes => "You were impaled by deadly spikes! Watch your step next time...",
            DeathCause::Monster => "The creature caught you! It was faster than it looked...",
        }
    }
}

/// What the player touching a hazard amounts to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactOutcome {
    Death(DeathCause),
    SpeedBoost {
        multiplier: f32,
        duration_ms: f64,
        music_rate: f32,
    },
    PortalPrompt,
}

/// State changes other systems care about (visuals, audio, messages)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HazardSignal {
    SpikesRaised,
    SpikesLowered,
    MonsterAwakened,
    MonsterMoved(Vec3),
    PortalRearmed,
}

/// Per-tick view of the world handed to hazards
#[derive(Debug, Clone, Copy)]
pub struct HazardContext {
    pub now_ms: f64,
    pub player_position: Vec3,
}

// ---------------------------------------------------------------------------
// Spikes

/// Floor spikes on a fixed duty cycle
///
/// Raised whenever `(now - last_cycle_ms) mod cycle_ms < active_ms`. The
/// anchor is rebased by whole cycles so the phase follows the wall clock no
/// matter how irregular the updates are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spikes {
    pub center: Vec3,
    pub width: f32,
    pub depth: f32,
    pub cycle_ms: f64,
    pub active_ms: f64,
    pub last_cycle_ms: f64,
    pub raised: bool,
}

impl Spikes {
    pub fn new(
        center: Vec3,
        width: f32,
        depth: f32,
        cycle_ms: f64,
        active_ms: f64,
        now_ms: f64,
    ) -> Self {
        Self {
            center,
            width,
            depth,
            cycle_ms,
            active_ms,
            last_cycle_ms: now_ms,
            raised: false,
        }
    }

    pub fn update(&mut self, now_ms: f64) -> Option<HazardSignal> {
        let since = (now_ms - self.last_cycle_ms).max(0.0);
        let raised = since % self.cycle_ms < self.active_ms;

        if since >= self.cycle_ms {
            self.last_cycle_ms = now_ms - since % self.cycle_ms;
        }

        if raised == self.raised {
            return None;
        }
        self.raised = raised;
        Some(if raised {
            HazardSignal::SpikesRaised
        } else {
            HazardSignal::SpikesLowered
        })
    }

    /// Only harmful while raised; the footprint is a rectangle on the floor
    pub fn check_collision(&self, player: Vec3) -> bool {
        if !self.raised {
            return false;
        }
        let dx = (player.x - self.center.x).abs();
        let dz = (player.z - self.center.z).abs();
        dx < self.width / 2.0 && dz < self.depth / 2.0
    }
}

// ---------------------------------------------------------------------------
// Trapdoor

/// Hidden floor panel. Springs once per life.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trapdoor {
    pub center: Vec3,
    /// Trigger radius; smaller than the panel so it can be skirted
    pub radius: f32,
    pub sprung: bool,
}

impl Trapdoor {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
            sprung: false,
        }
    }

    pub fn check_collision(&self, player: Vec3) -> bool {
        !self.sprung && horizontal_distance(player, self.center) < self.radius
    }
}

// ---------------------------------------------------------------------------
// Speed boost

/// Collectible that multiplies the player's speed for a while
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeedBoost {
    pub center: Vec3,
    pub radius: f32,
    pub multiplier: f32,
    pub duration_ms: f64,
    /// Music playback rate while boosted
    pub music_rate: f32,
    pub available: bool,
}

impl SpeedBoost {
    pub fn new(
        center: Vec3,
        radius: f32,
        multiplier: f32,
        duration_ms: f64,
        music_rate: f32,
    ) -> Self {
        Self {
            center,
            radius,
            multiplier,
            duration_ms,
            music_rate,
            available: true,
        }
    }

    pub fn check_collision(&self, player: Vec3) -> bool {
        self.available && horizontal_distance(player, self.center) < self.radius
    }

    /// Vertical bob of the pickup at `now_ms`
    pub fn hover_offset(now_ms: f64) -> f32 {
        ((now_ms * 0.002).sin() * 0.2) as f32
    }
}

// ---------------------------------------------------------------------------
// Monster

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonsterState {
    Dormant,
    Awakened,
    /// Terminal for the current life
    Caught,
}

/// Lurker that wakes when the player comes near, then seeks them
///
/// Pursuit is a straight normalized step each tick. It ignores walls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Monster {
    pub spawn: Vec3,
    pub position: Vec3,
    pub speed: f32,
    pub detection_radius: f32,
    pub kill_radius: f32,
    pub state: MonsterState,
}

impl Monster {
    pub fn new(spawn: Vec3, speed: f32, detection_radius: f32, kill_radius: f32) -> Self {
        Self {
            spawn,
            position: spawn,
            speed,
            detection_radius,
            kill_radius,
            state: MonsterState::Dormant,
        }
    }

    pub fn update(&mut self, player: Vec3) -> Option<HazardSignal> {
        let mut signal = None;

        if self.state == MonsterState::Dormant
            && horizontal_distance(self.position, player) < self.detection_radius
        {
            self.state = MonsterState::Awakened;
            signal = Some(HazardSignal::MonsterAwakened);
        }

        if self.state == MonsterState::Awakened {
            let to_player = Vec3::new(player.x - self.position.x, 0.0, player.z - self.position.z);
            let distance = to_player.length();
            if distance > f32::EPSILON {
                let step = self.speed.min(distance);
                self.position += to_player / distance * step;
                // Waking takes precedence; the frontend re-reads position anyway
                signal = signal.or(Some(HazardSignal::MonsterMoved(self.position)));
            }
        }

        signal
    }

    pub fn check_collision(&self, player: Vec3) -> bool {
        self.state == MonsterState::Awakened
            && horizontal_distance(self.position, player) < self.kill_radius
    }
}

// ---------------------------------------------------------------------------
// Return portal

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PortalState {
    Armed,
    /// Waiting on the yes/no popup
    AwaitingConfirmation,
    /// Quiet until `until_ms` has passed and the player has stepped out
    Cooldown { until_ms: f64, left_region: bool },
}

/// Way back to the site the player arrived from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnPortal {
    pub center: Vec3,
    pub radius: f32,
    pub cooldown_ms: f64,
    pub state: PortalState,
}

impl ReturnPortal {
    /// The portal sits on the spawn point, so it starts out waiting for the
    /// player to walk off it.
    pub fn new(center: Vec3, radius: f32, cooldown_ms: f64, now_ms: f64) -> Self {
        Self {
            center,
            radius,
            cooldown_ms,
            state: PortalState::Cooldown {
                until_ms: now_ms,
                left_region: false,
            },
        }
    }

    fn contains(&self, player: Vec3) -> bool {
        horizontal_distance(player, self.center) < self.radius
    }

    pub fn update(&mut self, ctx: &HazardContext) -> Option<HazardSignal> {
        let inside = self.contains(ctx.player_position);
        if let PortalState::Cooldown { until_ms, left_region } = self.state {
            let left_region = left_region || !inside;
            if left_region && ctx.now_ms >= until_ms {
                self.state = PortalState::Armed;
                return Some(HazardSignal::PortalRearmed);
            }
            self.state = PortalState::Cooldown { until_ms, left_region };
        }
        None
    }

    pub fn check_collision(&self, player: Vec3) -> bool {
        self.state == PortalState::Armed && self.contains(player)
    }

    /// Player said "no": stay put and go quiet
    pub fn decline(&mut self, now_ms: f64) {
        self.state = PortalState::Cooldown {
            until_ms: now_ms + self.cooldown_ms,
            left_region: false,
        };
    }
}

// ---------------------------------------------------------------------------

/// Any hazard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Hazard {
    Spikes(Spikes),
    Trapdoor(Trapdoor),
    SpeedBoost(SpeedBoost),
    Monster(Monster),
    ReturnPortal(ReturnPortal),
}

impl Hazard {
    pub fn update(&mut self, ctx: &HazardContext) -> Option<HazardSignal> {
        match self {
            Hazard::Spikes(spikes) => spikes.update(ctx.now_ms),
            Hazard::Monster(monster) => monster.update(ctx.player_position),
            Hazard::ReturnPortal(portal) => portal.update(ctx),
            Hazard::Trapdoor(_) | Hazard::SpeedBoost(_) => None,
        }
    }

    pub fn check_collision(&self, player: Vec3) -> bool {
        match self {
            Hazard::Spikes(spikes) => spikes.check_collision(player),
            Hazard::Trapdoor(trapdoor) => trapdoor.check_collision(player),
            Hazard::SpeedBoost(boost) => boost.check_collision(player),
            Hazard::Monster(monster) => monster.check_collision(player),
            Hazard::ReturnPortal(portal) => portal.check_collision(player),
        }
    }

    /// Latch the contact found by `check_collision`
    pub fn trigger(&mut self) -> ContactOutcome {
        match self {
            Hazard::Spikes(_) => ContactOutcome::Death(DeathCause::Spikes),
            Hazard::Trapdoor(trapdoor) => {
                trapdoor.sprung = true;
                ContactOutcome::Death(DeathCause::Trapdoor)
            }
            Hazard::SpeedBoost(boost) => {
                boost.available = false;
                ContactOutcome::SpeedBoost {
                    multiplier: boost.multiplier,
                    duration_ms: boost.duration_ms,
                    music_rate: boost.music_rate,
                }
            }
            Hazard::Monster(monster) => {
                monster.state = MonsterState::Caught;
                ContactOutcome::Death(DeathCause::Monster)
            }
            Hazard::ReturnPortal(portal) => {
                portal.state = PortalState::AwaitingConfirmation;
                ContactOutcome::PortalPrompt
            }
        }
    }

    /// Re-arm for a new life. Spikes keep their phase.
    pub fn reset(&mut self, now_ms: f64) {
        match self {
            Hazard::Spikes(_) => {}
            Hazard::Trapdoor(trapdoor) => trapdoor.sprung = false,
            Hazard::SpeedBoost(boost) => boost.available = true,
            Hazard::Monster(monster) => {
                monster.position = monster.spawn;
                monster.state = MonsterState::Dormant;
            }
            Hazard::ReturnPortal(portal) => {
                portal.state = PortalState::Cooldown {
                    until_ms: now_ms,
                    left_region: false,
                };
            }
        }
    }

    /// Where the hazard's visual should sit right now
    pub fn position(&self) -> Vec3 {
        match self {
            Hazard::Spikes(spikes) => spikes.center,
            Hazard::Trapdoor(trapdoor) => trapdoor.center,
            Hazard::SpeedBoost(boost) => boost.center,
            Hazard::Monster(monster) => monster.position,
            Hazard::ReturnPortal(portal) => portal.center,
        }
    }
}

/// A hazard placed in the active level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveHazard {
    pub hazard: Hazard,
    pub visual: VisualId,
}
