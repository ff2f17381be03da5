//! Normalized input
//!
//! Keyboard, buttons and touch gestures are translated upstream into
//! `InputEvent`s. `InputState` folds them into the held/pressed state a
//! single tick consumes.

use serde::{Deserialize, Serialize};

use super::player::TurnDirection;
use super::state::UiResponse;
use super::tick::TickInput;

/// Device-independent input events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    TurnLeft,
    TurnRight,
    /// Turn key released (continuous turning only)
    EndTurn,
    MoveForward,
    MoveBackward,
    /// Stop walking
    Stop,
}

/// Walking intent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Movement {
    #[default]
    Idle,
    Forward,
    Backward,
}

/// Accumulated input between ticks
#[derive(Debug, Clone, Default)]
pub struct InputState {
    turn_held: Option<TurnDirection>,
    pending_turn: Option<TurnDirection>,
    movement: Movement,
    pending_ui: Option<UiResponse>,
    skip_level: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: InputEvent) {
        match event {
            InputEvent::TurnLeft => self.press_turn(TurnDirection::Left),
            InputEvent::TurnRight => self.press_turn(TurnDirection::Right),
            InputEvent::EndTurn => self.turn_held = None,
            InputEvent::MoveForward => self.movement = Movement::Forward,
            InputEvent::MoveBackward => self.movement = Movement::Backward,
            InputEvent::Stop => self.movement = Movement::Idle,
        }
    }

    fn press_turn(&mut self, direction: TurnDirection) {
        // Key repeat re-sends the press; only the first one starts a snap turn
        if self.turn_held != Some(direction) {
            self.pending_turn = Some(direction);
        }
        self.turn_held = Some(direction);
    }

    /// Queue a popup button press for the next tick
    pub fn respond(&mut self, response: UiResponse) {
        self.pending_ui = Some(response);
    }

    pub fn request_skip_level(&mut self) {
        self.skip_level = true;
    }

    /// Drop everything held, e.g. when the page loses focus
    pub fn release_all(&mut self) {
        self.turn_held = None;
        self.pending_turn = None;
        self.movement = Movement::Idle;
    }

    /// Snapshot for one tick. One-shot inputs are consumed.
    pub fn take_tick_input(&mut self) -> TickInput {
        TickInput {
            turn_press: self.pending_turn.take(),
            turn_held: self.turn_held,
            movement: self.movement,
            ui: self.pending_ui.take(),
            skip_level: std::mem::take(&mut self.skip_level),
        }
    }
}
