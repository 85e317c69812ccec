//! Browser platform layer
//!
//! Wires the session to the page: key listeners feed the input snapshot,
//! a `requestAnimationFrame` loop drives `Session::advance` and the theme
//! music, and the host page's wallet (exposed as `window.chainInvaders`)
//! signs shots.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Document, FocusEvent, KeyboardEvent, MouseEvent};

use crate::audio::AudioManager;
use crate::bridge::{SettlementReporter, ShotId, ShotRequest, ShotSigner, ShotStatus, TxHandle};
use crate::consts::SIM_DT;
use crate::error::{StartError, SubmitError};
use crate::input::Action;
use crate::renderer::{CanvasRenderState, build_frame};
use crate::session::{GameSummary, Session, SessionHooks, SessionPhase};
use crate::tuning::Tuning;

/// Recent transactions listed while playing
const TX_LIST_PLAYING: usize = 5;

// The wallet lives in page script: it owns the funded burner key and
// talks to the RPC node. We only ever see payloads and hashes.
#[wasm_bindgen(inline_js = "
    function wallet() {
        return window.chainInvaders || null;
    }

    export function has_funded_signer() {
        const w = wallet();
        return !!(w && typeof w.hasFundedSigner === 'function' && w.hasFundedSigner());
    }

    export function send_shot(payload) {
        const w = wallet();
        if (!w) {
            return Promise.reject(new Error('wallet disconnected'));
        }
        return w.sendShot(payload);
    }

    export function wait_shot(hash) {
        const w = wallet();
        if (!w) {
            return Promise.reject(new Error('wallet disconnected'));
        }
        return w.waitShot(hash);
    }
")]
extern "C" {
    fn has_funded_signer() -> bool;
    fn send_shot(payload: &str) -> js_sys::Promise;
    fn wait_shot(hash: &str) -> js_sys::Promise;
}

fn js_error(value: JsValue) -> SubmitError {
    let message = value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value));
    SubmitError::Rejected(message)
}

/// Signer backed by the page wallet. Each shot runs as its own local
/// future; `on_settled` lets the page refresh once the frame loop is idle.
struct JsSigner {
    on_settled: Rc<dyn Fn()>,
}

impl ShotSigner for JsSigner {
    fn submit(
        &mut self,
        request: ShotRequest,
        reporter: SettlementReporter,
    ) -> Result<(), SubmitError> {
        if !has_funded_signer() {
            return Err(SubmitError::Unavailable);
        }
        let payload = request.payload();
        let on_settled = self.on_settled.clone();

        spawn_local(async move {
            let hash = match JsFuture::from(send_shot(&payload)).await {
                Ok(value) => value.as_string(),
                Err(e) => {
                    reporter.failed(js_error(e));
                    on_settled();
                    return;
                }
            };
            let Some(hash) = hash else {
                reporter.failed(SubmitError::Rejected("wallet returned no hash".into()));
                on_settled();
                return;
            };

            reporter.sent(TxHandle(hash.clone()));
            on_settled();

            match JsFuture::from(wait_shot(&hash)).await {
                Ok(_) => reporter.confirmed(),
                Err(e) => reporter.failed(js_error(e)),
            }
            on_settled();
        });
        Ok(())
    }
}

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

fn set_text(document: &Document, selector: &str, text: &str) {
    if let Some(el) = document.query_selector(selector).ok().flatten() {
        el.set_text_content(Some(text));
    }
}

fn set_visible(document: &Document, id: &str, visible: bool) {
    if let Some(el) = document.get_element_by_id(id) {
        let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
    }
}

/// Lifecycle hooks that write straight into the HUD
struct DomHooks;

impl SessionHooks for DomHooks {
    fn score_changed(&mut self, score: u32) {
        if let Some(document) = document() {
            set_text(&document, "#hud-score .hud-value", &score.to_string());
        }
    }

    fn lives_changed(&mut self, lives: u8) {
        if let Some(document) = document() {
            set_text(&document, "#hud-lives .hud-value", &lives.to_string());
        }
    }

    fn game_over(&mut self, summary: &GameSummary) {
        let Some(document) = document() else {
            return;
        };
        set_text(&document, "#final-score", &summary.score.to_string());
        set_text(&document, "#final-wave", &summary.wave.to_string());
        set_text(&document, "#final-shots", &summary.shots_fired.to_string());
    }
}

/// Game instance holding the session, its render target and the music
struct Game {
    session: Session,
    render_state: CanvasRenderState,
    audio: AudioManager,
    last_time: f64,
    frame_request: Option<i32>,
    /// What the transaction list currently shows
    tx_view: Vec<(ShotId, ShotStatus)>,
}

impl Game {
    fn new(render_state: CanvasRenderState) -> Self {
        let seed = js_sys::Date::now() as u64;
        Self {
            session: Session::new(Tuning::load(), seed, Box::new(DomHooks)),
            render_state,
            audio: AudioManager::new(),
            last_time: 0.0,
            frame_request: None,
            tx_view: Vec::new(),
        }
    }

    fn render(&self) {
        self.render_state.render(&build_frame(self.session.state()));
    }

    fn update_hud(&mut self) {
        let Some(document) = document() else {
            return;
        };
        let phase = self.session.phase();
        let state = self.session.state();
        let bridge = self.session.bridge();
        let stats = bridge.stats();

        set_text(&document, "#hud-wave .hud-value", &(state.wave_index + 1).to_string());
        set_text(&document, "#hud-shots .hud-value", &stats.fired.to_string());
        set_text(&document, "#hud-pending .hud-value", &bridge.pending().to_string());
        set_text(&document, "#hud-confirmed .hud-value", &stats.confirmed.to_string());
        set_text(&document, "#hud-failed .hud-value", &stats.failed.to_string());

        set_visible(&document, "wallet-panel", phase == SessionPhase::AwaitingWallet);
        set_visible(&document, "hud", phase != SessionPhase::AwaitingWallet);
        set_visible(&document, "game-over", phase == SessionPhase::GameOver);

        let shown = match phase {
            SessionPhase::GameOver => self.session.state().tuning.shot_history,
            _ => TX_LIST_PLAYING,
        };
        let view: Vec<(ShotId, ShotStatus)> = bridge
            .ledger()
            .recent(shown)
            .map(|r| (r.id, r.status))
            .collect();
        if view != self.tx_view {
            self.rebuild_tx_list(&document, shown);
            self.tx_view = view;
        }
    }

    fn rebuild_tx_list(&self, document: &Document, shown: usize) {
        let Some(list) = document.get_element_by_id("tx-list") else {
            return;
        };
        list.set_inner_html("");

        for record in self.session.bridge().ledger().recent(shown) {
            let Ok(item) = document.create_element("li") else {
                continue;
            };
            let status = match record.status {
                ShotStatus::Submitting => "submitting",
                ShotStatus::Sent => "pending",
                ShotStatus::Confirmed => "confirmed",
                ShotStatus::Failed => "failed",
            };
            let _ = item.set_attribute("class", status);

            match &record.handle {
                Some(handle) => {
                    if let Ok(link) = document.create_element("a") {
                        let _ = link.set_attribute("href", &handle.explorer_url());
                        let _ = link.set_attribute("target", "_blank");
                        let _ = link.set_attribute("rel", "noopener");
                        link.set_text_content(Some(&format!("#{} {}", record.id, handle.short())));
                        let _ = item.append_child(&link);
                    }
                }
                None => item.set_text_content(Some(&format!("#{} {}", record.id, status))),
            }
            let _ = list.append_child(&item);
        }
    }

    fn set_status(&self, message: &str) {
        if let Some(document) = document() {
            set_text(&document, "#wallet-status", message);
        }
    }

    fn cancel_frame(&mut self) {
        if let Some(id) = self.frame_request.take() {
            if let Some(window) = web_sys::window() {
                let _ = window.cancel_animation_frame(id);
            }
        }
    }
}

pub fn run() -> Result<(), StartError> {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }

    log::info!("Chain Invaders starting...");

    let render_state = CanvasRenderState::new("canvas")?;
    let game = Rc::new(RefCell::new(Game::new(render_state)));

    if let Some(document) = document() {
        set_visible(&document, "loading", false);
    }

    setup_input_handlers(game.clone());
    setup_buttons(game.clone());
    setup_teardown(game.clone());

    {
        let mut g = game.borrow_mut();
        g.render();
        g.update_hud();
    }

    log::info!("Chain Invaders ready, waiting for wallet");
    Ok(())
}

/// Refresh callback for settlements that land while no frame is scheduled
fn settled_notifier(game: Weak<RefCell<Game>>) -> Rc<dyn Fn()> {
    Rc::new(move || {
        let Some(game) = game.upgrade() else {
            return;
        };
        let Ok(mut g) = game.try_borrow_mut() else {
            return;
        };
        if g.frame_request.is_none() {
            g.session.settle();
            g.update_hud();
        }
    })
}

fn setup_input_handlers(game: Rc<RefCell<Game>>) {
    let Some(window) = web_sys::window() else {
        return;
    };

    // Key down
    {
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let Some(action) = Action::from_key_code(&event.code()) else {
                return;
            };
            let mut g = game.borrow_mut();
            if !g.session.is_running() {
                return;
            }
            event.prevent_default();
            if !event.repeat() {
                g.session.input_mut().press(action);
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    // Key up
    {
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            if let Some(action) = Action::from_key_code(&event.code()) {
                game.borrow_mut().session.input_mut().release(action);
            }
        });
        let _ = window.add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    // Window blur: keyup never arrives, so drop held keys
    {
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: FocusEvent| {
            game.borrow_mut().session.input_mut().clear();
        });
        let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

fn on_click(document: &Document, id: &str, mut handler: impl FnMut() + 'static) {
    let Some(btn) = document.get_element_by_id(id) else {
        log::warn!("No #{} button on the page", id);
        return;
    };
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| handler());
    let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn setup_buttons(game: Rc<RefCell<Game>>) {
    let Some(document) = document() else {
        return;
    };

    // Start: needs a funded wallet on the page
    {
        let game = game.clone();
        on_click(&document, "start-btn", move || {
            let seed = js_sys::Date::now() as u64;
            let started = {
                let mut g = game.borrow_mut();
                if has_funded_signer() {
                    let on_settled = settled_notifier(Rc::downgrade(&game));
                    g.session.attach_signer(Box::new(JsSigner { on_settled }));
                }
                let result = g.session.start(seed);
                match &result {
                    Ok(()) => {
                        g.set_status("");
                        g.audio.start_theme();
                    }
                    Err(StartError::NoFundedSigner) => {
                        g.set_status("Fund the game wallet before starting")
                    }
                    Err(e) => g.set_status(&e.to_string()),
                }
                result.is_ok()
            };
            if started {
                begin_frames(game.clone());
            }
        });
    }

    // Replay from the game-over screen
    {
        let game = game.clone();
        on_click(&document, "replay-btn", move || {
            let seed = js_sys::Date::now() as u64;
            let result = game.borrow_mut().session.replay(seed);
            match result {
                Ok(()) => {
                    game.borrow_mut().audio.start_theme();
                    begin_frames(game.clone());
                }
                Err(e) => {
                    log::warn!("Replay refused: {}", e);
                    game.borrow().set_status(&e.to_string());
                }
            }
        });
    }

    // Music on/off, label shows what a click does next
    {
        let game = game.clone();
        on_click(&document, "mute-btn", move || {
            let muted = game.borrow_mut().audio.toggle_muted();
            if let Some(document) = self::document() {
                set_text(&document, "#mute-btn", if muted { "Unmute" } else { "Mute" });
            }
        });
    }

    // Change wallet: back to the wallet panel
    on_click(&document, "change-wallet-btn", move || {
        let mut g = game.borrow_mut();
        g.cancel_frame();
        g.audio.stop_theme();
        g.session.reset();
        g.render();
        g.update_hud();
    });
}

fn setup_teardown(game: Rc<RefCell<Game>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
        if let Ok(mut g) = game.try_borrow_mut() {
            g.cancel_frame();
            g.audio.stop_theme();
            g.session.reset();
            log::info!("Page hidden, frame loop stopped");
        }
    });
    let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
    closure.forget();
}

fn begin_frames(game: Rc<RefCell<Game>>) {
    {
        let mut g = game.borrow_mut();
        if g.frame_request.is_some() {
            return;
        }
        g.last_time = 0.0;
        g.tx_view.clear();
    }
    request_animation_frame(game);
}

fn request_animation_frame(game: Rc<RefCell<Game>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let handle = game.clone();
    let closure = Closure::once(move |time: f64| {
        game_loop(handle, time);
    });
    match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
        Ok(id) => game.borrow_mut().frame_request = Some(id),
        Err(e) => log::error!("requestAnimationFrame failed: {:?}", e),
    }
    closure.forget();
}

fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
    let running = {
        let mut g = game.borrow_mut();
        g.frame_request = None;

        // Calculate delta time
        let dt = if g.last_time > 0.0 {
            ((time - g.last_time) / 1000.0) as f32
        } else {
            SIM_DT
        };
        g.last_time = time;

        g.session.advance(dt);
        g.render();
        g.update_hud();

        let running = g.session.is_running();
        if running {
            g.audio.update();
        } else {
            g.audio.stop_theme();
        }
        running
    };

    if running {
        request_animation_frame(game);
    } else {
        log::info!("Frame loop stopped");
    }
}
