//! Native stand-in for the wallet
//!
//! `LatencySigner` settles every shot on a worker thread after a random
//! delay, so the headless build exercises the same out-of-order settlement
//! path as the browser.

use std::thread;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::bridge::{SettlementReporter, ShotRequest, ShotSigner, TxHandle};
use crate::error::SubmitError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencyProfile {
    /// Time from submission to broadcast, milliseconds
    pub send_ms: (u64, u64),
    /// Time from broadcast to confirmation, milliseconds
    pub confirm_ms: (u64, u64),
    /// Chance a submission is rejected after broadcast
    pub failure_rate: f64,
}

impl Default for LatencyProfile {
    fn default() -> Self {
        Self {
            send_ms: (20, 80),
            confirm_ms: (100, 400),
            failure_rate: 0.05,
        }
    }
}

impl LatencyProfile {
    pub fn instant() -> Self {
        Self {
            send_ms: (0, 0),
            confirm_ms: (0, 0),
            failure_rate: 0.0,
        }
    }
}

pub struct LatencySigner {
    rng: Pcg32,
    profile: LatencyProfile,
}

impl LatencySigner {
    pub fn new(seed: u64, profile: LatencyProfile) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            profile,
        }
    }

    fn delay(&mut self, (lo, hi): (u64, u64)) -> Duration {
        Duration::from_millis(if hi > lo { self.rng.random_range(lo..=hi) } else { lo })
    }
}

impl ShotSigner for LatencySigner {
    fn submit(
        &mut self,
        request: ShotRequest,
        reporter: SettlementReporter,
    ) -> Result<(), SubmitError> {
        // Roll everything up front so a run is reproducible from its seed
        let profile = self.profile;
        let send = self.delay(profile.send_ms);
        let confirm = self.delay(profile.confirm_ms);
        let fails = self.rng.random_bool(profile.failure_rate.clamp(0.0, 1.0));
        let handle = TxHandle(format!("0x{:016x}{:016x}", self.rng.random::<u64>(), request.id));
        let payload = request.payload();

        thread::Builder::new()
            .name(format!("shot-{}", request.id))
            .spawn(move || {
                thread::sleep(send);
                log::trace!("broadcast {} with {}", handle, payload);
                reporter.sent(handle);
                thread::sleep(confirm);
                if fails {
                    reporter.failed(SubmitError::Rejected("reverted".into()));
                } else {
                    reporter.confirmed();
                }
            })
            .map(|_| ())
            .map_err(|e| SubmitError::Rejected(e.to_string()))
    }
}
