//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use super::collision;
use super::powerup;
use super::state::{GameEvent, GameOverCause, GameState};
use super::wave;
use crate::consts::*;

/// Input commands for a single tick (sampled from the held-action snapshot)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    pub move_left: bool,
    pub move_right: bool,
    /// Fire was pressed since the last tick
    pub fire: bool,
}

/// Advance the game state by one fixed timestep
///
/// Order: player movement and fire, formation, enemy fire, bullets,
/// power-ups, collisions and wave regeneration, terminal check.
pub fn tick(state: &mut GameState, input: &TickInput) {
    if state.is_over() {
        return;
    }

    state.time_ticks += 1;
    state.clock_ms += SIM_DT_MS;

    if input.move_left {
        state.player.move_left();
    }
    if input.move_right {
        state.player.move_right(PLAYFIELD_WIDTH);
    }
    if input.fire {
        player_fire(state);
    }

    wave::advance_formation(state);
    wave::enemy_fire(state);

    advance_bullets(state);
    powerup::advance_power_ups(state);

    collision::resolve_player_bullets(state);
    collision::resolve_enemy_bullets(state);
    wave::regenerate_if_cleared(state);

    check_terminal(state);
}

/// Fire if the cooldown allows. Returns the number of bullets spawned.
///
/// One successful call is one fire action, whatever the bullet count.
pub fn player_fire(state: &mut GameState) -> Option<usize> {
    let cooldown = powerup::shoot_cooldown_ms(state);
    let ready = state
        .last_player_shot_ms
        .is_none_or(|last| state.clock_ms - last > cooldown);
    if !ready {
        return None;
    }

    let bullets = powerup::fire_pattern(state);
    let count = bullets.len();
    state.player_bullets.extend(bullets);
    state.last_player_shot_ms = Some(state.clock_ms);
    state.emit(GameEvent::ShotFired {
        bullets: count,
        at_ms: state.clock_ms,
    });
    Some(count)
}

/// Move every bullet and drop the ones that left the playfield
pub fn advance_bullets(state: &mut GameState) {
    state.player_bullets.retain_mut(|bullet| {
        bullet.advance();
        bullet.pos.y > 0.0 && bullet.pos.x > 0.0 && bullet.pos.x < PLAYFIELD_WIDTH
    });
    state.enemy_bullets.retain_mut(|bullet| {
        bullet.advance();
        bullet.pos.y < PLAYFIELD_HEIGHT
    });
}

/// Breach and zero lives both end the run; `end` guarantees a single
/// GameOver event even when both hold in the same tick.
fn check_terminal(state: &mut GameState) {
    if wave::breached(state) {
        if state.lives > 0 {
            state.lives = 0;
            state.emit(GameEvent::LivesChanged(0));
        }
        state.end(GameOverCause::Breach);
    }
    if state.lives == 0 {
        state.end(GameOverCause::OutOfLives);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::entity::{Bullet, PowerUpKind};
    use crate::sim::state::GamePhase;
    use crate::tuning::Tuning;
    use glam::Vec2;
    use proptest::prelude::*;

    fn quiet_state() -> GameState {
        GameState::new(
            5,
            Tuning {
                power_up_drop_chance: 0.0,
                ..Tuning::default()
            },
        )
    }

    fn fire() -> TickInput {
        TickInput {
            fire: true,
            ..Default::default()
        }
    }

    fn shots(events: &[GameEvent]) -> Vec<usize> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::ShotFired { bullets, .. } => Some(*bullets),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_cooldown_blocks_second_shot() {
        let mut state = quiet_state();
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, 3);
        assert_eq!(state.enemies.len(), 40);

        tick(&mut state, &fire());
        assert_eq!(state.player_bullets.len(), 1);

        tick(&mut state, &fire());
        assert_eq!(state.player_bullets.len(), 1);
        assert_eq!(shots(&state.drain_events()), vec![1]);

        // 750 ms is 45 ticks; one more tick to be strictly past it
        for _ in 0..45 {
            tick(&mut state, &TickInput::default());
        }
        tick(&mut state, &fire());
        assert_eq!(shots(&state.drain_events()), vec![1]);
    }

    #[test]
    fn test_rapid_fire_shortens_cooldown() {
        let mut state = quiet_state();
        powerup::activate(&mut state, PowerUpKind::RapidFire);
        tick(&mut state, &fire());
        for _ in 0..15 {
            tick(&mut state, &TickInput::default());
        }
        tick(&mut state, &fire());
        assert_eq!(shots(&state.drain_events()).len(), 2);
    }

    #[test]
    fn test_one_shot_event_per_fire_action() {
        for (kind, expected) in [
            (None, 1),
            (Some(PowerUpKind::DoubleShot), 2),
            (Some(PowerUpKind::SpreadShot), 3),
        ] {
            let mut state = quiet_state();
            if let Some(kind) = kind {
                powerup::activate(&mut state, kind);
            }
            tick(&mut state, &fire());
            assert_eq!(state.player_bullets.len(), expected);
            assert_eq!(shots(&state.drain_events()), vec![expected]);
        }
    }

    #[test]
    fn test_movement_is_level_triggered() {
        let mut state = quiet_state();
        let x = state.player.pos.x;
        let hold = TickInput {
            move_left: true,
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut state, &hold);
        }
        assert!((state.player.pos.x - (x - 27.0)).abs() < 1e-3);
    }

    #[test]
    fn test_off_screen_bullets_are_culled() {
        let mut state = quiet_state();
        state
            .player_bullets
            .push(Bullet::new(Vec2::new(20.0, 3.0), Vec2::new(4.0, 10.0), -6.7));
        state.enemy_bullets.push(Bullet::new(
            Vec2::new(20.0, PLAYFIELD_HEIGHT - 2.0),
            Vec2::new(4.0, 10.0),
            4.7,
        ));
        tick(&mut state, &TickInput::default());
        assert!(state.player_bullets.is_empty());
        assert!(state.enemy_bullets.is_empty());
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, 3);
    }

    #[test]
    fn test_angled_bullet_culled_at_side() {
        let mut state = quiet_state();
        state.player_bullets.push(
            Bullet::new(Vec2::new(0.3, 300.0), Vec2::new(4.0, 10.0), -6.7).angled(-0.5),
        );
        tick(&mut state, &TickInput::default());
        assert!(state.player_bullets.is_empty());
    }

    #[test]
    fn test_clearing_wave_regenerates_and_escalates() {
        let mut state = quiet_state();
        let speed = state.enemy_speed;
        let freq = state.enemy_shooting_frequency_ms;

        let last = state.enemies[0].clone();
        state.enemies.truncate(1);
        // Put a bullet where the enemy will be after this tick's formation step
        let target = last.pos + Vec2::new(0.8 + 5.0, 5.0 + 6.7);
        state
            .player_bullets
            .push(Bullet::new(target, Vec2::new(4.0, 10.0), -6.7));

        tick(&mut state, &TickInput::default());
        assert_eq!(state.score, last.points);
        assert_eq!(state.enemies.len(), 40);
        assert_eq!(state.wave_index, 1);
        assert!(state.enemy_speed > speed);
        assert!(state.enemy_shooting_frequency_ms <= freq);
        assert!(
            state
                .drain_events()
                .contains(&GameEvent::WaveCleared { wave: 0 })
        );

        tick(&mut state, &TickInput::default());
        assert_eq!(state.enemies.len(), 40);
    }

    #[test]
    fn test_last_life_lost_ends_game_once() {
        let mut state = quiet_state();
        state.lives = 1;
        let player = state.player.pos;
        state.enemy_bullets.push(Bullet::new(
            player + Vec2::new(10.0, 0.0),
            Vec2::new(4.0, 10.0),
            4.7,
        ));
        tick(&mut state, &TickInput::default());
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.lives, 0);

        let events = state.drain_events();
        let overs: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .collect();
        assert_eq!(overs, vec![&GameEvent::GameOver {
            cause: GameOverCause::OutOfLives
        }]);

        // Further ticks are ignored
        let ticks = state.time_ticks;
        tick(&mut state, &fire());
        assert_eq!(state.time_ticks, ticks);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_breach_and_last_life_same_tick_single_game_over() {
        let mut state = quiet_state();
        state.lives = 1;
        let player = state.player.pos;
        state.enemy_bullets.push(Bullet::new(
            player + Vec2::new(10.0, 0.0),
            Vec2::new(4.0, 10.0),
            4.7,
        ));
        let drop = player.y - (state.enemies[39].pos.y + state.enemies[39].size.y);
        for enemy in &mut state.enemies {
            enemy.pos.y += drop;
        }

        tick(&mut state, &TickInput::default());
        assert!(state.is_over());
        assert_eq!(state.lives, 0);
        let overs = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count();
        assert_eq!(overs, 1);
    }

    #[test]
    fn test_breach_with_lives_left_zeroes_lives() {
        let mut state = quiet_state();
        let player = state.player.pos;
        let drop = player.y - (state.enemies[39].pos.y + state.enemies[39].size.y);
        for enemy in &mut state.enemies {
            enemy.pos.y += drop;
        }
        tick(&mut state, &TickInput::default());
        assert_eq!(state.lives, 0);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::LivesChanged(0)));
        assert!(events.contains(&GameEvent::GameOver {
            cause: GameOverCause::Breach
        }));
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = GameState::new(99999, Tuning::default());
        let mut state2 = GameState::new(99999, Tuning::default());

        for i in 0..600u32 {
            let input = TickInput {
                move_left: i % 200 < 100,
                move_right: i % 200 >= 100,
                fire: i % 7 == 0,
            };
            tick(&mut state1, &input);
            tick(&mut state2, &input);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.score, state2.score);
        assert_eq!(state1.lives, state2.lives);
        assert_eq!(state1.enemies.len(), state2.enemies.len());
        assert_eq!(state1.enemy_bullets.len(), state2.enemy_bullets.len());
        assert_eq!(state1.player.pos, state2.player.pos);
    }

    proptest! {
        #[test]
        fn prop_lives_bounded_and_score_monotonic(
            seed in any::<u64>(),
            inputs in prop::collection::vec((any::<bool>(), any::<bool>(), any::<bool>()), 1..400),
        ) {
            let mut state = GameState::new(seed, Tuning::default());
            let mut last_score = 0;
            for (move_left, move_right, fire) in inputs {
                tick(&mut state, &TickInput { move_left, move_right, fire });
                prop_assert!(state.lives <= INITIAL_LIVES);
                prop_assert!(state.score >= last_score);
                last_score = state.score;

                prop_assert!(state.player_bullets.iter().all(|b| b.pos.y > 0.0));
                prop_assert!(state.enemy_bullets.iter().all(|b| b.pos.y < PLAYFIELD_HEIGHT));
                prop_assert!(state.player.pos.x >= 0.0);
                prop_assert!(state.player.pos.x <= PLAYFIELD_WIDTH - state.player.size.x);
            }
        }
    }
}
