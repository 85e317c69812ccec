//! Entity data: player ship, enemies, bullets, power-ups
//!
//! Plain value structs. The only behavior is position mutation with the
//! player clamped to the playfield.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(w, h),
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    /// Strict overlap test; touching edges do not count
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.pos.x < other.right()
            && self.right() > other.pos.x
            && self.pos.y < other.bottom()
            && self.bottom() > other.pos.y
    }
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub size: Vec2,
    /// Horizontal distance per tick while a move key is held
    pub speed: f32,
}

impl Player {
    pub fn new(pos: Vec2, size: Vec2, speed: f32) -> Self {
        Self { pos, size, speed }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    pub fn move_left(&mut self) {
        self.pos.x = (self.pos.x - self.speed).max(0.0);
    }

    pub fn move_right(&mut self, playfield_width: f32) {
        self.pos.x = (self.pos.x + self.speed).min(playfield_width - self.size.x);
    }

    /// Horizontal center of the ship
    pub fn center_x(&self) -> f32 {
        self.pos.x + self.size.x / 2.0
    }
}

/// One member of the enemy formation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub pos: Vec2,
    pub size: Vec2,
    pub points: u32,
    /// Grid column this enemy was spawned in (formation moves rigidly)
    pub column: u32,
}

impl Enemy {
    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }
}

/// A projectile; player and enemy bullets live in separate collections
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub size: Vec2,
    /// x = horizontal speed (angled shots), y = vertical speed
    pub vel: Vec2,
}

impl Bullet {
    pub fn new(pos: Vec2, size: Vec2, vertical_speed: f32) -> Self {
        Self {
            pos,
            size,
            vel: Vec2::new(0.0, vertical_speed),
        }
    }

    /// Same bullet with a horizontal velocity component
    pub fn angled(mut self, horizontal_speed: f32) -> Self {
        self.vel.x = horizontal_speed;
        self
    }

    pub fn advance(&mut self) {
        self.pos += self.vel;
    }

    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }
}

/// Power-up variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    RapidFire,
    DoubleShot,
    SpreadShot,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::RapidFire,
        PowerUpKind::DoubleShot,
        PowerUpKind::SpreadShot,
    ];

    /// Single-letter glyph drawn on the falling capsule
    pub fn glyph(&self) -> &'static str {
        match self {
            PowerUpKind::RapidFire => "R",
            PowerUpKind::DoubleShot => "D",
            PowerUpKind::SpreadShot => "S",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PowerUpKind::RapidFire => "RAPID FIRE",
            PowerUpKind::DoubleShot => "DOUBLE SHOT",
            PowerUpKind::SpreadShot => "SPREAD SHOT",
        }
    }
}

/// A falling power-up capsule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub pos: Vec2,
    pub size: Vec2,
    pub kind: PowerUpKind,
}

impl PowerUp {
    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }
}

/// The single power-up effect currently applied to firing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivePowerUp {
    pub kind: PowerUpKind,
    /// Simulation clock time after which the effect is cleared
    pub expires_at_ms: f64,
}

impl ActivePowerUp {
    /// Fraction of the effect left (1.0 = just collected)
    pub fn remaining_fraction(&self, now_ms: f64, duration_ms: f64) -> f32 {
        if duration_ms <= 0.0 {
            return 0.0;
        }
        ((self.expires_at_ms - now_ms).max(0.0) / duration_ms).min(1.0) as f32
    }
}
