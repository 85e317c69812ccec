//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order
//! - No rendering, platform or network dependencies

pub mod collision;
pub mod entity;
pub mod powerup;
pub mod state;
pub mod tick;
pub mod wave;

pub use entity::{ActivePowerUp, Bullet, Enemy, Player, PowerUp, PowerUpKind, Rect};
pub use state::{GameEvent, GameOverCause, GamePhase, GameState};
pub use tick::{TickInput, tick};
pub use wave::generate_wave;
