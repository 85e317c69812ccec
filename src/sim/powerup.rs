//! Power-up lifecycle: drop roll, fall, collection, expiry, firing patterns

use glam::Vec2;
use rand::Rng;

use super::entity::{ActivePowerUp, Bullet, PowerUp, PowerUpKind};
use super::state::{GameEvent, GameState};
use crate::consts::PLAYFIELD_HEIGHT;

/// Roll for a power-up drop centered on a destroyed enemy
pub fn maybe_spawn(state: &mut GameState, center: Vec2) -> Option<PowerUpKind> {
    if !state.rng.random_bool(state.tuning.power_up_drop_chance) {
        return None;
    }
    let kind = PowerUpKind::ALL[state.rng.random_range(0..PowerUpKind::ALL.len())];
    let size = Vec2::splat(state.tuning.power_up_size);
    state.power_ups.push(PowerUp {
        pos: center - size * 0.5,
        size,
        kind,
    });
    state.emit(GameEvent::PowerUpSpawned(kind));
    Some(kind)
}

/// Make `kind` the active effect, replacing whatever was active
pub fn activate(state: &mut GameState, kind: PowerUpKind) {
    state.active_power_up = Some(ActivePowerUp {
        kind,
        expires_at_ms: state.clock_ms + state.tuning.power_up_duration_ms,
    });
    log::info!("Power-up activated: {}", kind.label());
    state.emit(GameEvent::PowerUpCollected(kind));
}

/// Per-tick lifecycle step: expire, fall, collect, discard
pub fn advance_power_ups(state: &mut GameState) {
    if let Some(active) = state.active_power_up {
        if state.clock_ms > active.expires_at_ms {
            state.active_power_up = None;
            state.emit(GameEvent::PowerUpExpired(active.kind));
        }
    }

    let fall = state.tuning.power_up_fall_speed;
    let player = state.player.rect();
    let mut collected = Vec::new();
    state.power_ups.retain_mut(|power_up| {
        power_up.pos.y += fall;
        if power_up.rect().overlaps(&player) {
            collected.push(power_up.kind);
            return false;
        }
        power_up.pos.y < PLAYFIELD_HEIGHT
    });

    // Several in one tick: the last one collected wins
    for kind in collected {
        activate(state, kind);
    }
}

/// Active variant, if any
pub fn active_kind(state: &GameState) -> Option<PowerUpKind> {
    state.active_power_up.map(|a| a.kind)
}

/// Minimum time between fire actions under the current effect
pub fn shoot_cooldown_ms(state: &GameState) -> f64 {
    match active_kind(state) {
        Some(PowerUpKind::RapidFire) => {
            state.tuning.shoot_cooldown_ms / state.tuning.rapid_fire_divisor
        }
        _ => state.tuning.shoot_cooldown_ms,
    }
}

/// Bullets spawned by one fire action under the current effect
pub fn fire_pattern(state: &GameState) -> Vec<Bullet> {
    let t = &state.tuning;
    let player = &state.player;
    let size = Vec2::new(t.bullet_width, t.bullet_height);
    let speed = t.player_bullet_speed;
    let y = player.pos.y;
    let center_x = player.center_x() - t.bullet_width / 2.0;

    match active_kind(state) {
        Some(PowerUpKind::SpreadShot) => vec![
            Bullet::new(Vec2::new(center_x, y), size, speed),
            Bullet::new(Vec2::new(center_x - t.spread_offset, y), size, speed)
                .angled(-t.spread_horizontal_speed),
            Bullet::new(Vec2::new(center_x + t.spread_offset, y), size, speed)
                .angled(t.spread_horizontal_speed),
        ],
        Some(PowerUpKind::DoubleShot) => vec![
            Bullet::new(Vec2::new(player.pos.x + t.double_shot_inset, y), size, speed),
            Bullet::new(
                Vec2::new(player.pos.x + player.size.x - t.double_shot_inset, y),
                size,
                speed,
            ),
        ],
        Some(PowerUpKind::RapidFire) | None => {
            vec![Bullet::new(Vec2::new(center_x, y), size, speed)]
        }
    }
}
