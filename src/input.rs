//! Input-state snapshot
//!
//! Platform key events only flip flags here; the session samples the
//! snapshot once per tick. Movement is level-triggered (held), fire is
//! edge-triggered (latched on press, consumed by the next tick).

use std::collections::HashSet;

use crate::sim::TickInput;

/// Logical actions the game understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Fire,
}

impl Action {
    /// Map a `KeyboardEvent.code` to an action
    pub fn from_key_code(code: &str) -> Option<Self> {
        match code {
            "ArrowLeft" | "KeyA" => Some(Action::MoveLeft),
            "ArrowRight" | "KeyD" => Some(Action::MoveRight),
            "Space" => Some(Action::Fire),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InputState {
    held: HashSet<Action>,
    fire_latched: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key went down. Auto-repeat does not re-arm fire.
    pub fn press(&mut self, action: Action) {
        let newly_held = self.held.insert(action);
        if action == Action::Fire && newly_held {
            self.fire_latched = true;
        }
    }

    pub fn release(&mut self, action: Action) {
        self.held.remove(&action);
    }

    pub fn is_held(&self, action: Action) -> bool {
        self.held.contains(&action)
    }

    /// Snapshot for one tick; consumes the fire latch
    pub fn sample(&mut self) -> TickInput {
        TickInput {
            move_left: self.is_held(Action::MoveLeft),
            move_right: self.is_held(Action::MoveRight),
            fire: std::mem::take(&mut self.fire_latched),
        }
    }

    /// Drop everything (window blur, session change)
    pub fn clear(&mut self) {
        self.held.clear();
        self.fire_latched = false;
    }
}
