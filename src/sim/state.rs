//! Game state and core simulation types
//!
//! `GameState` is the explicit simulation context: every subsystem takes it
//! by reference, nothing lives in globals.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::entity::{ActivePowerUp, Bullet, Enemy, Player, PowerUp, PowerUpKind};
use super::wave;
use crate::consts::*;
use crate::tuning::Tuning;

/// Current phase of the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Run ended; ticks are ignored
    GameOver,
}

/// Why a run ended. Both causes are an immediate loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverCause {
    /// Lives reached zero from enemy hits
    OutOfLives,
    /// An enemy's lower edge reached the player's row
    Breach,
}

/// Things that happened during a tick, drained by the session
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A fire action went through; `bullets` depends on the active power-up
    ShotFired { bullets: usize, at_ms: f64 },
    EnemyDestroyed { points: u32 },
    ScoreChanged(u32),
    LivesChanged(u8),
    PowerUpSpawned(PowerUpKind),
    PowerUpCollected(PowerUpKind),
    PowerUpExpired(PowerUpKind),
    /// Wave `wave` (0-based) was cleared and the next one spawned
    WaveCleared { wave: u32 },
    GameOver { cause: GameOverCause },
}

/// Complete simulation state for one session
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub phase: GamePhase,
    pub score: u32,
    pub lives: u8,
    /// Current wave index (0-based)
    pub wave_index: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulation clock in milliseconds
    pub clock_ms: f64,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub player_bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<Bullet>,
    pub power_ups: Vec<PowerUp>,
    pub active_power_up: Option<ActivePowerUp>,
    /// +1.0 moving right, -1.0 moving left
    pub enemy_direction: f32,
    pub enemy_speed: f32,
    pub enemy_shooting_frequency_ms: f64,
    pub last_enemy_shot_ms: f64,
    /// None until the first shot, so the opening shot is never blocked
    pub last_player_shot_ms: Option<f64>,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game state with the first wave in place
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let player = Player::new(
            Vec2::new(
                PLAYFIELD_WIDTH / 2.0 - tuning.player_width / 2.0,
                PLAYFIELD_HEIGHT - tuning.player_bottom_offset,
            ),
            Vec2::new(tuning.player_width, tuning.player_height),
            tuning.player_speed,
        );

        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Playing,
            score: 0,
            lives: INITIAL_LIVES,
            wave_index: 0,
            time_ticks: 0,
            clock_ms: 0.0,
            player,
            enemies: Vec::new(),
            player_bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            power_ups: Vec::new(),
            active_power_up: None,
            enemy_direction: 1.0,
            enemy_speed: tuning.enemy_speed,
            enemy_shooting_frequency_ms: tuning.enemy_shooting_frequency_ms,
            last_enemy_shot_ms: 0.0,
            last_player_shot_ms: None,
            events: Vec::new(),
            tuning,
        };

        wave::generate_wave(&mut state);
        state
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Award points; score only ever grows
    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        self.emit(GameEvent::ScoreChanged(self.score));
    }

    /// Remove one life (never below zero)
    pub fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.emit(GameEvent::LivesChanged(self.lives));
    }

    /// Enter GameOver. Returns false (and does nothing) if already over.
    pub fn end(&mut self, cause: GameOverCause) -> bool {
        if self.is_over() {
            return false;
        }
        self.phase = GamePhase::GameOver;
        self.emit(GameEvent::GameOver { cause });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_defaults() {
        let state = GameState::new(1, Tuning::default());
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, 3);
        assert_eq!(state.enemies.len(), 40);
        assert!(state.player_bullets.is_empty());
        assert!(state.active_power_up.is_none());
        assert_eq!(state.player.pos, Vec2::new(375.0, 540.0));
    }

    #[test]
    fn test_end_is_idempotent() {
        let mut state = GameState::new(1, Tuning::default());
        assert!(state.end(GameOverCause::Breach));
        assert!(!state.end(GameOverCause::OutOfLives));
        let overs = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(overs, 1);
    }

    #[test]
    fn test_lose_life_saturates() {
        let mut state = GameState::new(1, Tuning::default());
        for _ in 0..5 {
            state.lose_life();
        }
        assert_eq!(state.lives, 0);
    }
}
