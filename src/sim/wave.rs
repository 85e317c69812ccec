//! Enemy formation: grid generation, edge bounce, return fire, escalation

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;

use super::entity::{Bullet, Enemy};
use super::state::{GameEvent, GameState};
use crate::consts::PLAYFIELD_WIDTH;

/// Replace the enemy collection with a full, centered grid
///
/// Back rows are worth more: the front row gets `row_points`, each row
/// behind it one more multiple.
pub fn generate_wave(state: &mut GameState) {
    let t = &state.tuning;
    let pitch_x = t.enemy_width + t.enemy_padding;
    let pitch_y = t.enemy_height + t.enemy_padding;
    let start_x = (PLAYFIELD_WIDTH - t.enemies_per_row as f32 * pitch_x) / 2.0;

    let mut enemies = Vec::with_capacity(t.wave_size());
    for row in 0..t.enemy_rows {
        for col in 0..t.enemies_per_row {
            enemies.push(Enemy {
                pos: Vec2::new(
                    start_x + col as f32 * pitch_x,
                    t.enemy_top_offset + row as f32 * pitch_y,
                ),
                size: Vec2::new(t.enemy_width, t.enemy_height),
                points: t.row_points * (t.enemy_rows - row),
                column: col,
            });
        }
    }
    state.enemies = enemies;
}

/// Move the formation one step; on an edge crossing, reverse and descend.
///
/// Returns true if the formation bounced this tick.
pub fn advance_formation(state: &mut GameState) -> bool {
    let dir = state.enemy_direction;
    let dx = dir * state.enemy_speed;

    let mut bounce = false;
    for enemy in &mut state.enemies {
        enemy.pos.x += dx;
        if (dir > 0.0 && enemy.pos.x + enemy.size.x > PLAYFIELD_WIDTH)
            || (dir < 0.0 && enemy.pos.x < 0.0)
        {
            bounce = true;
        }
    }

    if bounce {
        state.enemy_direction = -dir;
        let step = state.tuning.enemy_descend_step;
        for enemy in &mut state.enemies {
            enemy.pos.y += step;
        }
    }
    bounce
}

/// Indices of the lowest enemy in every occupied column, ordered by column
pub fn front_liners(enemies: &[Enemy]) -> Vec<usize> {
    let mut lowest: BTreeMap<u32, usize> = BTreeMap::new();
    for (i, enemy) in enemies.iter().enumerate() {
        match lowest.get(&enemy.column) {
            Some(&j) if enemies[j].pos.y >= enemy.pos.y => {}
            _ => {
                lowest.insert(enemy.column, i);
            }
        }
    }
    lowest.into_values().collect()
}

/// Fire at most one enemy bullet per elapsed shooting window.
///
/// The shooter is chosen uniformly among the column front-liners.
/// Returns the index of the enemy that fired.
pub fn enemy_fire(state: &mut GameState) -> Option<usize> {
    if state.clock_ms - state.last_enemy_shot_ms <= state.enemy_shooting_frequency_ms {
        return None;
    }

    let candidates = front_liners(&state.enemies);
    if candidates.is_empty() {
        return None;
    }
    let shooter = candidates[state.rng.random_range(0..candidates.len())];

    let t = &state.tuning;
    let enemy = &state.enemies[shooter];
    let bullet = Bullet::new(
        Vec2::new(
            enemy.pos.x + enemy.size.x / 2.0 - t.bullet_width / 2.0,
            enemy.pos.y + enemy.size.y,
        ),
        Vec2::new(t.bullet_width, t.bullet_height),
        t.enemy_bullet_speed,
    );
    state.enemy_bullets.push(bullet);
    state.last_enemy_shot_ms = state.clock_ms;
    Some(shooter)
}

/// If the wave is gone, spawn the next one and make it harder.
///
/// Speed grows without bound; the shooting interval shrinks toward its floor.
pub fn regenerate_if_cleared(state: &mut GameState) -> bool {
    if !state.enemies.is_empty() {
        return false;
    }

    let cleared = state.wave_index;
    state.wave_index += 1;
    state.enemy_speed += state.tuning.enemy_speed_increment;
    state.enemy_shooting_frequency_ms = (state.enemy_shooting_frequency_ms
        - state.tuning.enemy_shooting_frequency_step_ms)
        .max(state.tuning.enemy_shooting_frequency_floor_ms);
    generate_wave(state);

    log::info!(
        "Wave {} cleared (speed {:.1}, shot interval {} ms)",
        cleared + 1,
        state.enemy_speed,
        state.enemy_shooting_frequency_ms
    );
    state.emit(GameEvent::WaveCleared { wave: cleared });
    true
}

/// True once any enemy's lower edge reaches the player's row
pub fn breached(state: &GameState) -> bool {
    let line = state.player.pos.y;
    state.enemies.iter().any(|e| e.pos.y + e.size.y >= line)
}
