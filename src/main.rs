//! Chain Invaders entry point
//!
//! On the web this hands over to the browser platform layer. Natively it
//! plays one headless session with a simulated wallet and logs the result.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = chain_invaders::platform::web::run() {
        log::error!("Cannot start: {}", e);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Chain Invaders (native) starting...");
    log::info!("Headless run with a simulated wallet - build for wasm32 to play");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xC4A1);

    if let Err(e) = headless::run(seed) {
        log::error!("Headless run failed: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::time::{Duration, Instant};

    use chain_invaders::consts::SIM_DT;
    use chain_invaders::platform::native::{LatencyProfile, LatencySigner};
    use chain_invaders::session::NoHooks;
    use chain_invaders::sim::GameState;
    use chain_invaders::{Action, Session, SessionPhase, StartError, Tuning};

    /// Five minutes of play at 60 Hz
    const MAX_FRAMES: u32 = 60 * 60 * 5;

    /// Chase the nearest front-line enemy and shoot whenever lined up
    fn autopilot(session: &mut Session) {
        let state = session.state();
        let px = state.player.center_x();
        let target = nearest_enemy_x(state, px);

        let input = session.input_mut();
        input.release(Action::MoveLeft);
        input.release(Action::MoveRight);
        input.release(Action::Fire);

        let Some(target) = target else {
            return;
        };
        if target < px - 4.0 {
            input.press(Action::MoveLeft);
        } else if target > px + 4.0 {
            input.press(Action::MoveRight);
        } else {
            input.press(Action::Fire);
        }
    }

    fn nearest_enemy_x(state: &GameState, px: f32) -> Option<f32> {
        state
            .enemies
            .iter()
            .map(|e| e.rect().center().x)
            .min_by(|a, b| (a - px).abs().total_cmp(&(b - px).abs()))
    }

    pub fn run(seed: u64) -> Result<(), StartError> {
        let tuning = Tuning::load();
        let mut session = Session::new(tuning, seed, Box::new(NoHooks));
        session.attach_signer(Box::new(LatencySigner::new(seed, LatencyProfile::default())));
        session.start(seed)?;

        let mut frames = 0;
        while session.is_running() && frames < MAX_FRAMES {
            autopilot(&mut session);
            session.advance(SIM_DT);
            frames += 1;
        }
        if session.phase() == SessionPhase::Playing {
            log::info!("Frame limit reached, stopping");
        }

        // Let the simulated network catch up
        let deadline = Instant::now() + Duration::from_secs(3);
        while session.bridge().pending() > 0 && Instant::now() < deadline {
            session.settle();
            std::thread::sleep(Duration::from_millis(10));
        }

        let state = session.state();
        let stats = session.bridge().stats();
        log::info!(
            "Finished after {} frames: score {}, wave {}, lives {}",
            frames,
            state.score,
            state.wave_index + 1,
            state.lives
        );
        log::info!(
            "Shots: {} fired, {} confirmed, {} failed, {} still pending",
            stats.fired,
            stats.confirmed,
            stats.failed,
            session.bridge().pending()
        );
        for record in session.bridge().ledger().recent(5) {
            let handle = record.handle.as_ref().map(|h| h.short()).unwrap_or_default();
            log::info!("  #{} {:?} {}", record.id, record.status, handle);
        }
        Ok(())
    }
}
