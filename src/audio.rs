//! Theme music using the Web Audio API
//!
//! The march is synthesized note by note, no external files needed.
//! `ThemeSequencer` and `MusicState` are plain state so the timing and the
//! mute rules run natively; `AudioManager` plays them in the browser.

/// Descending four-note bass line (G2 F2 Eb2 D2), looped
pub const THEME_NOTES: [f32; 4] = [98.0, 87.31, 77.78, 73.42];
/// Seconds between note onsets
pub const NOTE_INTERVAL: f64 = 0.5;
/// Seconds each note sounds
pub const NOTE_LENGTH: f64 = 0.15;
/// How far ahead of the audio clock notes are queued
pub const LOOKAHEAD: f64 = 0.2;

/// One queued note, `at` on the audio clock in seconds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub at: f64,
    pub freq: f32,
}

/// Hands out theme notes as the audio clock approaches them
#[derive(Debug, Clone, Default)]
pub struct ThemeSequencer {
    playing: bool,
    index: usize,
    next_at: f64,
}

impl ThemeSequencer {
    /// Restart from the first note at `now`
    pub fn start(&mut self, now: f64) {
        self.playing = true;
        self.index = 0;
        self.next_at = now;
    }

    pub fn stop(&mut self) {
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Notes starting before `now + lookahead` that were not handed out yet
    pub fn due(&mut self, now: f64, lookahead: f64) -> Vec<Note> {
        let mut notes = Vec::new();
        if !self.playing {
            return notes;
        }
        // Throttled tab: resume on the beat instead of flushing a backlog
        if self.next_at < now - NOTE_INTERVAL {
            self.next_at = now;
        }
        while self.next_at < now + lookahead {
            notes.push(Note {
                at: self.next_at,
                freq: THEME_NOTES[self.index],
            });
            self.index = (self.index + 1) % THEME_NOTES.len();
            self.next_at += NOTE_INTERVAL;
        }
        notes
    }
}

/// Whether the theme should be audible right now
#[derive(Debug, Clone, Default)]
pub struct MusicState {
    muted: bool,
    run_active: bool,
    sequencer: ThemeSequencer,
}

impl MusicState {
    /// A run began: play from the top unless muted
    pub fn run_started(&mut self, now: f64) {
        self.run_active = true;
        if !self.muted {
            self.sequencer.start(now);
        }
    }

    pub fn run_ended(&mut self) {
        self.run_active = false;
        self.sequencer.stop();
    }

    /// Flip mute; unmuting mid-run restarts the theme. Returns the new state.
    pub fn toggle_muted(&mut self, now: f64) -> bool {
        self.muted = !self.muted;
        if self.muted {
            self.sequencer.stop();
        } else if self.run_active {
            self.sequencer.start(now);
        }
        self.muted
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    pub fn due(&mut self, now: f64) -> Vec<Note> {
        self.sequencer.due(now, LOOKAHEAD)
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorType};

    use super::{MusicState, NOTE_LENGTH, Note};

    /// Browser audio output for the theme
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        /// Per-run output bus; disconnecting it silences notes already queued
        bus: Option<GainNode>,
        volume: f32,
        music: MusicState,
    }

    impl Default for AudioManager {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioManager {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - music disabled");
            }
            Self {
                ctx,
                bus: None,
                volume: 0.25,
                music: MusicState::default(),
            }
        }

        fn now(&self) -> f64 {
            self.ctx.as_ref().map(|c| c.current_time()).unwrap_or(0.0)
        }

        /// Resume audio context (required after user gesture)
        fn resume(&self) {
            if let Some(ctx) = &self.ctx {
                if ctx.state() == AudioContextState::Suspended {
                    let _ = ctx.resume();
                }
            }
        }

        fn open_bus(&mut self) {
            self.close_bus();
            let Some(ctx) = &self.ctx else { return };
            let Ok(bus) = ctx.create_gain() else { return };
            bus.gain().set_value(self.volume);
            if bus.connect_with_audio_node(&ctx.destination()).is_ok() {
                self.bus = Some(bus);
            }
        }

        fn close_bus(&mut self) {
            if let Some(bus) = self.bus.take() {
                let _ = bus.disconnect();
            }
        }

        /// Play the theme from the top (silent while muted)
        pub fn start_theme(&mut self) {
            self.resume();
            let now = self.now();
            self.music.run_started(now);
            if self.music.is_playing() {
                self.open_bus();
            }
        }

        pub fn stop_theme(&mut self) {
            self.music.run_ended();
            self.close_bus();
        }

        /// Returns true when now muted
        pub fn toggle_muted(&mut self) -> bool {
            self.resume();
            let now = self.now();
            let muted = self.music.toggle_muted(now);
            if self.music.is_playing() {
                self.open_bus();
            } else {
                self.close_bus();
            }
            log::info!("Music {}", if muted { "muted" } else { "on" });
            muted
        }

        pub fn is_muted(&self) -> bool {
            self.music.is_muted()
        }

        /// Queue upcoming notes; call once per frame
        pub fn update(&mut self) {
            let now = self.now();
            let notes = self.music.due(now);
            for note in notes {
                self.play_note(note);
            }
        }

        fn play_note(&self, note: Note) {
            let (Some(ctx), Some(bus)) = (&self.ctx, &self.bus) else {
                return;
            };
            let Ok(osc) = ctx.create_oscillator() else { return };
            let Ok(gain) = ctx.create_gain() else { return };

            osc.set_type(OscillatorType::Square);
            osc.frequency().set_value(note.freq);
            if osc.connect_with_audio_node(&gain).is_err()
                || gain.connect_with_audio_node(bus).is_err()
            {
                return;
            }

            let t = note.at;
            gain.gain().set_value_at_time(0.8, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + NOTE_LENGTH)
                .ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + NOTE_LENGTH + 0.02).ok();
        }
    }
}
