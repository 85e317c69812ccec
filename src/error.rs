//! Error types
//!
//! Gameplay never produces errors: wave clears, hits and breaches are
//! `GameEvent`s. Only starting a session, submitting a shot and loading
//! tuning can fail.

use thiserror::Error;

/// Why a session refused to enter `Playing`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("no funded signer attached")]
    NoFundedSigner,
    #[error("render surface unavailable: {0}")]
    SurfaceUnavailable(String),
    #[error("cannot {action} while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
}

/// A shot submission that failed before or after it reached the network
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("signer unavailable")]
    Unavailable,
    #[error("submission rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning: {0}")]
    Invalid(String),
}
