//! Data-driven game balance
//!
//! Every speed is in playfield units per tick, every interval in
//! milliseconds of simulation clock. Optionally overridden from
//! LocalStorage on the web.

use serde::{Deserialize, Serialize};

use crate::error::TuningError;

/// Largest enemy grid a tuning may ask for
pub const MAX_WAVE_SIZE: u32 = 1024;
/// Largest shot history a tuning may ask for
pub const MAX_SHOT_HISTORY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Player ===
    pub player_width: f32,
    pub player_height: f32,
    /// Distance from the bottom of the playfield to the top of the ship
    pub player_bottom_offset: f32,
    pub player_speed: f32,
    /// Vertical speed of player bullets (negative = upward)
    pub player_bullet_speed: f32,
    /// Minimum time between two fire actions
    pub shoot_cooldown_ms: f64,
    /// Cooldown divisor while RapidFire is active
    pub rapid_fire_divisor: f64,

    // === Bullets ===
    pub bullet_width: f32,
    pub bullet_height: f32,
    pub enemy_bullet_speed: f32,

    // === Enemy grid ===
    pub enemy_rows: u32,
    pub enemies_per_row: u32,
    pub enemy_width: f32,
    pub enemy_height: f32,
    pub enemy_padding: f32,
    pub enemy_top_offset: f32,
    /// Points for the front row; each row further back adds this again
    pub row_points: u32,

    // === Difficulty ===
    pub enemy_speed: f32,
    pub enemy_speed_increment: f32,
    pub enemy_shooting_frequency_ms: f64,
    pub enemy_shooting_frequency_step_ms: f64,
    pub enemy_shooting_frequency_floor_ms: f64,
    /// Formation drop on each edge bounce
    pub enemy_descend_step: f32,

    // === Power-ups ===
    pub power_up_size: f32,
    pub power_up_fall_speed: f32,
    pub power_up_drop_chance: f64,
    pub power_up_duration_ms: f64,
    pub spread_offset: f32,
    pub spread_horizontal_speed: f32,
    pub double_shot_inset: f32,

    // === Shot ledger ===
    /// Shot records kept for display (older ones are trimmed)
    pub shot_history: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            player_width: 50.0,
            player_height: 30.0,
            player_bottom_offset: 60.0,
            player_speed: 2.7,
            player_bullet_speed: -6.7,
            shoot_cooldown_ms: 750.0,
            rapid_fire_divisor: 3.0,

            bullet_width: 4.0,
            bullet_height: 10.0,
            enemy_bullet_speed: 4.7,

            enemy_rows: 4,
            enemies_per_row: 10,
            enemy_width: 40.0,
            enemy_height: 30.0,
            enemy_padding: 20.0,
            enemy_top_offset: 50.0,
            row_points: 10,

            enemy_speed: 0.8,
            enemy_speed_increment: 0.2,
            enemy_shooting_frequency_ms: 2250.0,
            enemy_shooting_frequency_step_ms: 200.0,
            enemy_shooting_frequency_floor_ms: 500.0,
            enemy_descend_step: 17.0,

            power_up_size: 20.0,
            power_up_fall_speed: 2.0,
            power_up_drop_chance: 0.25,
            power_up_duration_ms: 10_000.0,
            spread_offset: 8.0,
            spread_horizontal_speed: 0.5,
            double_shot_inset: 10.0,

            shot_history: 10,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let sizes = [
            ("player", self.player_width, self.player_height),
            ("bullet", self.bullet_width, self.bullet_height),
            ("enemy", self.enemy_width, self.enemy_height),
            ("power-up", self.power_up_size, self.power_up_size),
        ];
        for (name, w, h) in sizes {
            if w <= 0.0 || h <= 0.0 {
                return Err(TuningError::Invalid(format!("{name} size must be positive")));
            }
        }
        if self.enemy_rows == 0 || self.enemies_per_row == 0 {
            return Err(TuningError::Invalid("enemy grid is empty".into()));
        }
        match self.enemy_rows.checked_mul(self.enemies_per_row) {
            Some(n) if n <= MAX_WAVE_SIZE => {}
            _ => {
                return Err(TuningError::Invalid(format!(
                    "enemy grid larger than {MAX_WAVE_SIZE} enemies"
                )));
            }
        }
        if self.shot_history == 0 || self.shot_history > MAX_SHOT_HISTORY {
            return Err(TuningError::Invalid(format!(
                "shot_history must be within 1..={MAX_SHOT_HISTORY}"
            )));
        }
        if !(0.0..=1.0).contains(&self.power_up_drop_chance) {
            return Err(TuningError::Invalid(
                "power_up_drop_chance must be within [0, 1]".into(),
            ));
        }
        if self.rapid_fire_divisor < 1.0 {
            return Err(TuningError::Invalid("rapid_fire_divisor must be >= 1".into()));
        }
        if self.enemy_shooting_frequency_floor_ms > self.enemy_shooting_frequency_ms {
            return Err(TuningError::Invalid(
                "shooting frequency floor is above the starting frequency".into(),
            ));
        }
        if self.enemy_speed_increment <= 0.0 {
            return Err(TuningError::Invalid("enemy_speed_increment must be positive".into()));
        }
        // NaN fails this too
        if !(self.enemy_shooting_frequency_step_ms >= 0.0) {
            return Err(TuningError::Invalid(
                "enemy_shooting_frequency_step_ms must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Total enemies in a full wave
    pub fn wave_size(&self) -> usize {
        (self.enemy_rows as usize).saturating_mul(self.enemies_per_row as usize)
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "chain_invaders_tuning";

    /// Load a tuning override from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(tuning) => {
                        log::info!("Loaded tuning override from LocalStorage");
                        return tuning;
                    }
                    Err(e) => log::warn!("Ignoring tuning override: {}", e),
                }
            }
        }

        Self::default()
    }

    /// Native stub
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let tuning = Tuning::default();
        assert!(tuning.validate().is_ok());
        assert_eq!(tuning.wave_size(), 40);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "enemy_rows": 2, "player_speed": 5.0 }"#).unwrap();
        assert_eq!(tuning.enemy_rows, 2);
        assert_eq!(tuning.player_speed, 5.0);
        assert_eq!(tuning.enemies_per_row, 10);
        assert_eq!(tuning.shoot_cooldown_ms, 750.0);
    }

    #[test]
    fn test_rejects_bad_drop_chance() {
        let err = Tuning::from_json(r#"{ "power_up_drop_chance": 1.5 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));
    }

    #[test]
    fn test_rejects_empty_grid() {
        let err = Tuning::from_json(r#"{ "enemies_per_row": 0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));
    }

    #[test]
    fn test_rejects_malformed_json() {
        let err = Tuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
    }

    #[test]
    fn test_rejects_negative_frequency_step() {
        let err = Tuning::from_json(r#"{ "enemy_shooting_frequency_step_ms": -300.0 }"#)
            .unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));

        let zero = Tuning::from_json(r#"{ "enemy_shooting_frequency_step_ms": 0.0 }"#);
        assert!(zero.is_ok(), "a flat interval never increases");
    }

    #[test]
    fn test_rejects_oversized_grid() {
        let err = Tuning::from_json(r#"{ "enemy_rows": 100000, "enemies_per_row": 100000 }"#)
            .unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));

        let err = Tuning::from_json(r#"{ "enemy_rows": 33, "enemies_per_row": 32 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));

        let edge = Tuning::from_json(r#"{ "enemy_rows": 32, "enemies_per_row": 32 }"#).unwrap();
        assert_eq!(edge.wave_size(), 1024);
    }

    #[test]
    fn test_wave_size_does_not_overflow() {
        let tuning = Tuning {
            enemy_rows: u32::MAX,
            enemies_per_row: u32::MAX,
            ..Tuning::default()
        };
        assert!(tuning.validate().is_err());
        assert!(tuning.wave_size() > 0);
    }

    #[test]
    fn test_rejects_shot_history_out_of_range() {
        let err = Tuning::from_json(r#"{ "shot_history": 18446744073709551615 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));

        let err = Tuning::from_json(r#"{ "shot_history": 0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid(_)));
    }
}
