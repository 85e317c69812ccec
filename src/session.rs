//! Session scheduler
//!
//! Owns the simulation context, the input snapshot and the shot bridge,
//! and runs them once per display frame:
//!
//! ```text
//! AwaitingWallet --start--> Playing --lives 0 / breach--> GameOver
//!       ^                      |                            |
//!       +-------reset----------+<----------replay-----------+
//! ```
//!
//! Fire actions are handed to the bridge and never awaited; settlements
//! are merged at the end of every frame, in whatever order they arrive.

use crate::bridge::{ShotBridge, ShotSigner};
use crate::consts::*;
use crate::error::StartError;
use crate::input::InputState;
use crate::sim::{GameEvent, GameOverCause, GameState, tick};
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for a funded signer before play can begin
    AwaitingWallet,
    Playing,
    GameOver,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::AwaitingWallet => "awaiting wallet",
            SessionPhase::Playing => "playing",
            SessionPhase::GameOver => "game over",
        }
    }
}

/// Final numbers of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct GameSummary {
    pub score: u32,
    /// Waves reached (1-based)
    pub wave: u32,
    pub shots_fired: u64,
    pub cause: GameOverCause,
}

/// One-way notifications for the surrounding UI
pub trait SessionHooks {
    fn score_changed(&mut self, _score: u32) {}
    fn lives_changed(&mut self, _lives: u8) {}
    /// `wave` is the 1-based number of the wave just cleared
    fn wave_cleared(&mut self, _wave: u32) {}
    fn game_over(&mut self, _summary: &GameSummary) {}
}

/// Hooks that ignore everything
pub struct NoHooks;

impl SessionHooks for NoHooks {}

pub struct Session {
    phase: SessionPhase,
    tuning: Tuning,
    state: GameState,
    bridge: ShotBridge,
    input: InputState,
    hooks: Box<dyn SessionHooks>,
    accumulator: f32,
    summary: Option<GameSummary>,
}

impl Session {
    pub fn new(tuning: Tuning, seed: u64, hooks: Box<dyn SessionHooks>) -> Self {
        Self {
            phase: SessionPhase::AwaitingWallet,
            state: GameState::new(seed, tuning.clone()),
            bridge: ShotBridge::new(tuning.shot_history),
            input: InputState::new(),
            hooks,
            accumulator: 0.0,
            summary: None,
            tuning,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Playing
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn bridge(&self) -> &ShotBridge {
        &self.bridge
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn summary(&self) -> Option<&GameSummary> {
        self.summary.as_ref()
    }

    pub fn attach_signer(&mut self, signer: Box<dyn ShotSigner>) {
        self.bridge.attach_signer(signer);
    }

    /// AwaitingWallet -> Playing, only with a funded signer attached
    pub fn start(&mut self, seed: u64) -> Result<(), StartError> {
        if self.phase != SessionPhase::AwaitingWallet {
            return Err(self.invalid("start"));
        }
        if !self.bridge.has_signer() {
            log::warn!("Refusing to start: no funded signer");
            return Err(StartError::NoFundedSigner);
        }
        self.begin_run(seed);
        Ok(())
    }

    /// GameOver -> Playing with a fresh run
    pub fn replay(&mut self, seed: u64) -> Result<(), StartError> {
        if self.phase != SessionPhase::GameOver {
            return Err(self.invalid("replay"));
        }
        if !self.bridge.has_signer() {
            return Err(StartError::NoFundedSigner);
        }
        self.begin_run(seed);
        Ok(())
    }

    /// Back to AwaitingWallet from anywhere, dropping the signer.
    /// Shots still in flight settle on their own and are ignored.
    pub fn reset(&mut self) {
        self.bridge.detach_signer();
        self.input.clear();
        self.accumulator = 0.0;
        self.phase = SessionPhase::AwaitingWallet;
        log::info!("Session reset, waiting for wallet");
    }

    fn begin_run(&mut self, seed: u64) {
        self.state = GameState::new(seed, self.tuning.clone());
        self.bridge.reset();
        self.input.clear();
        self.accumulator = 0.0;
        self.summary = None;
        self.phase = SessionPhase::Playing;
        self.hooks.score_changed(self.state.score);
        self.hooks.lives_changed(self.state.lives);
        log::info!("Run started with seed: {}", seed);
    }

    fn invalid(&self, action: &'static str) -> StartError {
        StartError::InvalidTransition {
            action,
            phase: self.phase.as_str(),
        }
    }

    /// Run the fixed-step ticks owed for `dt` seconds of wall time, then
    /// merge settled shots. Returns the number of ticks run.
    pub fn advance(&mut self, dt: f32) -> u32 {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step();
            self.accumulator -= SIM_DT;
            substeps += 1;
        }
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        self.bridge.pump();
        substeps
    }

    /// Merge settlements without ticking. Used once the frame loop has
    /// stopped so late confirmations still reach the history.
    pub fn settle(&mut self) -> usize {
        self.bridge.pump()
    }

    /// One simulation tick with the current input snapshot
    pub fn step(&mut self) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        let input = self.input.sample();
        tick(&mut self.state, &input);

        for event in self.state.drain_events() {
            self.dispatch(event);
        }
    }

    fn dispatch(&mut self, event: GameEvent) {
        match event {
            GameEvent::ShotFired { at_ms, .. } => {
                self.bridge.submit_shot(at_ms);
            }
            GameEvent::ScoreChanged(score) => self.hooks.score_changed(score),
            GameEvent::LivesChanged(lives) => self.hooks.lives_changed(lives),
            GameEvent::GameOver { cause } => self.finish(cause),
            GameEvent::EnemyDestroyed { points } => log::debug!("Enemy destroyed (+{})", points),
            GameEvent::PowerUpSpawned(kind) => log::debug!("{} dropped", kind.label()),
            GameEvent::PowerUpCollected(kind) => log::debug!("Collected {}", kind.label()),
            GameEvent::PowerUpExpired(kind) => log::debug!("{} expired", kind.label()),
            GameEvent::WaveCleared { wave } => self.hooks.wave_cleared(wave + 1),
        }
    }

    fn finish(&mut self, cause: GameOverCause) {
        if self.phase != SessionPhase::Playing {
            return;
        }
        self.phase = SessionPhase::GameOver;
        self.input.clear();
        let summary = GameSummary {
            score: self.state.score,
            wave: self.state.wave_index + 1,
            shots_fired: self.bridge.stats().fired,
            cause,
        };
        log::info!(
            "Game over ({:?}): score {}, wave {}, {} shots",
            cause,
            summary.score,
            summary.wave,
            summary.shots_fired
        );
        self.hooks.game_over(&summary);
        self.summary = Some(summary);
    }
}
