//! Chain Invaders - an arcade shooter where every shot is a transaction
//!
//! Core modules:
//! - `audio`: Synthesized theme music and mute state
//! - `sim`: Deterministic simulation (entities, collisions, waves, power-ups)
//! - `bridge`: Non-blocking shot-to-transaction side channel
//! - `session`: Per-frame scheduler and session state machine
//! - `input`: Input-state snapshot sampled once per frame
//! - `renderer`: Draw-list construction and Canvas 2D painting
//! - `platform`: Browser/native platform glue
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod bridge;
pub mod error;
pub mod input;
pub mod platform;
pub mod renderer;
pub mod session;
pub mod sim;
pub mod tuning;

pub use bridge::{SettlementReporter, ShotBridge, ShotId, ShotRecord, ShotSigner, ShotStatus};
pub use error::{StartError, SubmitError, TuningError};
pub use input::{Action, InputState};
pub use session::{Session, SessionHooks, SessionPhase};
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Logical playfield dimensions (the render target is always this size)
    pub const PLAYFIELD_WIDTH: f32 = 800.0;
    pub const PLAYFIELD_HEIGHT: f32 = 600.0;

    /// Fixed simulation timestep (one display frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Simulation clock advance per tick, in milliseconds
    pub const SIM_DT_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Lives at the start of every session
    pub const INITIAL_LIVES: u8 = 3;
}
