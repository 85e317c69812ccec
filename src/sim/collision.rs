//! Collision detection and scoring
//!
//! Axis-aligned rectangle overlap between bullets and their targets. Each
//! bullet is consumed by the first target it overlaps, so it scores at most
//! once per tick.

use super::entity::Enemy;
use super::powerup;
use super::state::{GameEvent, GameState};

/// Player bullets vs enemies. Returns the number of enemies destroyed.
pub fn resolve_player_bullets(state: &mut GameState) -> usize {
    let mut bullets = std::mem::take(&mut state.player_bullets);
    let mut destroyed: Vec<Enemy> = Vec::new();

    bullets.retain(|bullet| {
        let hitbox = bullet.rect();
        match state.enemies.iter().position(|e| hitbox.overlaps(&e.rect())) {
            Some(i) => {
                destroyed.push(state.enemies.remove(i));
                false
            }
            None => true,
        }
    });
    state.player_bullets = bullets;

    let count = destroyed.len();
    for enemy in destroyed {
        state.add_score(enemy.points);
        state.emit(GameEvent::EnemyDestroyed {
            points: enemy.points,
        });
        powerup::maybe_spawn(state, enemy.rect().center());
    }
    count
}

/// Enemy bullets vs the player. Returns the number of hits taken.
pub fn resolve_enemy_bullets(state: &mut GameState) -> usize {
    let player = state.player.rect();
    let before = state.enemy_bullets.len();
    state
        .enemy_bullets
        .retain(|bullet| !bullet.rect().overlaps(&player));
    let hits = before - state.enemy_bullets.len();

    for _ in 0..hits {
        state.lose_life();
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::Bullet;
    use crate::tuning::Tuning;
    use glam::Vec2;

    fn quiet_state() -> GameState {
        GameState::new(
            11,
            Tuning {
                power_up_drop_chance: 0.0,
                ..Tuning::default()
            },
        )
    }

    fn bullet_at(pos: Vec2, speed: f32) -> Bullet {
        Bullet::new(pos, Vec2::new(4.0, 10.0), speed)
    }

    #[test]
    fn test_hit_removes_one_bullet_one_enemy_and_scores() {
        let mut state = quiet_state();
        let target = state.enemies[0].clone();
        state
            .player_bullets
            .push(bullet_at(target.pos + Vec2::new(5.0, 5.0), -6.7));
        state.player_bullets.push(bullet_at(Vec2::new(5.0, 400.0), -6.7));

        assert_eq!(resolve_player_bullets(&mut state), 1);
        assert_eq!(state.enemies.len(), 39);
        assert_eq!(state.player_bullets.len(), 1);
        assert_eq!(state.score, target.points);
        assert!(!state.enemies.iter().any(|e| e.pos == target.pos));
    }

    #[test]
    fn test_bullet_straddling_two_enemies_scores_once() {
        let mut state = quiet_state();
        // Enemies 0 and 1 are 20 apart horizontally; stretch a bullet over both
        let a = state.enemies[0].pos;
        state.player_bullets.push(Bullet::new(
            Vec2::new(a.x + 30.0, a.y + 5.0),
            Vec2::new(40.0, 10.0),
            -6.7,
        ));

        assert_eq!(resolve_player_bullets(&mut state), 1);
        assert_eq!(state.enemies.len(), 39);
        assert!(state.player_bullets.is_empty());
        assert_eq!(state.score, 40);
    }

    #[test]
    fn test_two_bullets_on_one_enemy_kill_once() {
        let mut state = quiet_state();
        let target = state.enemies[5].pos;
        state.player_bullets.push(bullet_at(target + Vec2::new(2.0, 2.0), -6.7));
        state.player_bullets.push(bullet_at(target + Vec2::new(20.0, 2.0), -6.7));

        assert_eq!(resolve_player_bullets(&mut state), 1);
        assert_eq!(state.player_bullets.len(), 1, "second bullet flies on");
        assert_eq!(state.enemies.len(), 39);
    }

    #[test]
    fn test_enemy_bullet_costs_a_life() {
        let mut state = quiet_state();
        let player = state.player.pos;
        state.enemy_bullets.push(bullet_at(player + Vec2::new(10.0, 5.0), 4.7));
        state.enemy_bullets.push(bullet_at(Vec2::new(10.0, 10.0), 4.7));

        assert_eq!(resolve_enemy_bullets(&mut state), 1);
        assert_eq!(state.lives, 2);
        assert_eq!(state.enemy_bullets.len(), 1);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_lives_never_go_negative() {
        let mut state = quiet_state();
        let player = state.player.pos;
        for i in 0..5 {
            state
                .enemy_bullets
                .push(bullet_at(player + Vec2::new(i as f32 * 5.0, 5.0), 4.7));
        }
        assert_eq!(resolve_enemy_bullets(&mut state), 5);
        assert_eq!(state.lives, 0);
    }

    #[test]
    fn test_kill_can_drop_power_up_at_enemy_center() {
        let mut state = GameState::new(
            11,
            Tuning {
                power_up_drop_chance: 1.0,
                ..Tuning::default()
            },
        );
        let target = state.enemies[0].rect();
        state
            .player_bullets
            .push(bullet_at(target.pos + Vec2::new(5.0, 5.0), -6.7));
        resolve_player_bullets(&mut state);

        assert_eq!(state.power_ups.len(), 1);
        assert_eq!(state.power_ups[0].rect().center(), target.center());
    }
}
