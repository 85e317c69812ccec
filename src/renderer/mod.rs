//! Rendering module
//!
//! `shapes` builds a plain draw list from the simulation state; the
//! browser-only `canvas` painter replays it with the Canvas 2D API.

pub mod command;
pub mod shapes;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderState;
pub use command::{DrawCmd, TextAlign};
pub use shapes::build_frame;
