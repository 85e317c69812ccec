//! Platform layer
//!
//! Browser and native differences for:
//! - Frame scheduling and input events (web)
//! - The funded signer behind the shot bridge
//! - HUD output

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(not(target_arch = "wasm32"))]
pub mod native;
