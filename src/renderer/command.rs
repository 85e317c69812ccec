//! Draw commands for the 2D render target

/// Horizontal text anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
}

impl TextAlign {
    pub fn as_css(&self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
        }
    }
}

/// One primitive, painted in list order
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: &'static str,
    },
    /// Text vertically centered on `y`
    Text {
        x: f32,
        y: f32,
        text: String,
        font: &'static str,
        align: TextAlign,
        color: &'static str,
    },
}

impl DrawCmd {
    pub const fn rect(x: f32, y: f32, w: f32, h: f32, color: &'static str) -> Self {
        DrawCmd::Rect { x, y, w, h, color }
    }

    pub fn color(&self) -> &'static str {
        match self {
            DrawCmd::Rect { color, .. } | DrawCmd::Text { color, .. } => color,
        }
    }
}
