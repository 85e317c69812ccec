//! Shape generation for the playfield
//!
//! Turns a `GameState` into an ordered list of draw commands. Pure, so the
//! picture can be checked without a browser.

use super::command::{DrawCmd, TextAlign};
use crate::consts::{PLAYFIELD_HEIGHT, PLAYFIELD_WIDTH};
use crate::sim::{Enemy, GameState, PowerUp, PowerUpKind, Rect};

pub const BACKGROUND: &str = "black";
pub const PLAYER_COLOR: &str = "lime";
pub const PLAYER_BULLET_COLOR: &str = "white";
pub const ENEMY_BULLET_COLOR: &str = "red";
pub const ENEMY_COLOR: &str = "rgb(255, 50, 50)";

fn power_up_color(kind: PowerUpKind) -> &'static str {
    match kind {
        PowerUpKind::RapidFire => "yellow",
        PowerUpKind::DoubleShot => "cyan",
        PowerUpKind::SpreadShot => "magenta",
    }
}

fn fill(rect: Rect, color: &'static str) -> DrawCmd {
    DrawCmd::rect(rect.pos.x, rect.pos.y, rect.size.x, rect.size.y, color)
}

/// Enemy body plus three antennae
pub fn enemy(enemy: &Enemy, out: &mut Vec<DrawCmd>) {
    let (x, y, w) = (enemy.pos.x, enemy.pos.y, enemy.size.x);
    out.push(fill(enemy.rect(), ENEMY_COLOR));
    out.push(DrawCmd::rect(x + w / 2.0 - 2.0, y - 5.0, 4.0, 5.0, ENEMY_COLOR));
    out.push(DrawCmd::rect(x + w / 4.0 - 2.0, y - 3.0, 4.0, 3.0, ENEMY_COLOR));
    out.push(DrawCmd::rect(x + w * 3.0 / 4.0 - 2.0, y - 3.0, 4.0, 3.0, ENEMY_COLOR));
}

/// Colored capsule with its variant glyph
pub fn power_up(power_up: &PowerUp, out: &mut Vec<DrawCmd>) {
    let rect = power_up.rect();
    let center = rect.center();
    out.push(fill(rect, power_up_color(power_up.kind)));
    out.push(DrawCmd::Text {
        x: center.x,
        y: center.y,
        text: power_up.kind.glyph().to_string(),
        font: "bold 14px Arial",
        align: TextAlign::Center,
        color: "black",
    });
}

/// Name of the active effect and a bar showing the time left
pub fn active_indicator(state: &GameState, out: &mut Vec<DrawCmd>) {
    let Some(active) = state.active_power_up else {
        return;
    };
    let remaining = active.remaining_fraction(state.clock_ms, state.tuning.power_up_duration_ms);

    out.push(DrawCmd::rect(10.0, 10.0, 100.0, 30.0, "rgba(255, 255, 255, 0.7)"));
    out.push(DrawCmd::Text {
        x: 15.0,
        y: 25.0,
        text: active.kind.label().to_string(),
        font: "12px Arial",
        align: TextAlign::Left,
        color: "black",
    });
    out.push(DrawCmd::rect(15.0, 35.0, remaining * 90.0, 5.0, "green"));
}

/// Full frame, back to front
pub fn build_frame(state: &GameState) -> Vec<DrawCmd> {
    let mut out = Vec::with_capacity(
        8 + state.enemies.len() * 4
            + state.player_bullets.len()
            + state.enemy_bullets.len()
            + state.power_ups.len() * 2,
    );

    out.push(DrawCmd::rect(0.0, 0.0, PLAYFIELD_WIDTH, PLAYFIELD_HEIGHT, BACKGROUND));
    out.push(fill(state.player.rect(), PLAYER_COLOR));
    for bullet in &state.player_bullets {
        out.push(fill(bullet.rect(), PLAYER_BULLET_COLOR));
    }
    for bullet in &state.enemy_bullets {
        out.push(fill(bullet.rect(), ENEMY_BULLET_COLOR));
    }
    for e in &state.enemies {
        enemy(e, &mut out);
    }
    for p in &state.power_ups {
        power_up(p, &mut out);
    }
    active_indicator(state, &mut out);
    out
}
