//! Canvas 2D painter
//!
//! Replays a draw list onto the page's `<canvas>`. The backing store is
//! fixed at the playfield size; CSS does any scaling.

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::command::DrawCmd;
use crate::consts::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use crate::error::StartError;

pub struct CanvasRenderState {
    ctx: CanvasRenderingContext2d,
}

impl CanvasRenderState {
    /// Bind to the canvas with the given element id
    pub fn new(canvas_id: &str) -> Result<Self, StartError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| StartError::SurfaceUnavailable("no document".into()))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| StartError::SurfaceUnavailable(format!("no #{canvas_id} element")))?
            .dyn_into()
            .map_err(|_| StartError::SurfaceUnavailable(format!("#{canvas_id} is not a canvas")))?;

        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")
            .map_err(|e| StartError::SurfaceUnavailable(format!("{e:?}")))?
            .ok_or_else(|| StartError::SurfaceUnavailable("2d context refused".into()))?
            .dyn_into()
            .map_err(|_| StartError::SurfaceUnavailable("unexpected context type".into()))?;

        canvas.set_width(PLAYFIELD_WIDTH as u32);
        canvas.set_height(PLAYFIELD_HEIGHT as u32);
        log::info!(
            "Canvas ready: {}x{}",
            canvas.width(),
            canvas.height()
        );

        Ok(Self { ctx })
    }

    pub fn render(&self, frame: &[DrawCmd]) {
        let ctx = &self.ctx;
        for cmd in frame {
            match cmd {
                DrawCmd::Rect { x, y, w, h, color } => {
                    ctx.set_fill_style_str(color);
                    ctx.fill_rect(*x as f64, *y as f64, *w as f64, *h as f64);
                }
                DrawCmd::Text {
                    x,
                    y,
                    text,
                    font,
                    align,
                    color,
                } => {
                    ctx.set_fill_style_str(color);
                    ctx.set_font(font);
                    ctx.set_text_align(align.as_css());
                    ctx.set_text_baseline("middle");
                    if let Err(e) = ctx.fill_text(text, *x as f64, *y as f64) {
                        log::warn!("fill_text failed: {:?}", e);
                    }
                }
            }
        }
    }
}
