//! Gameplay tuning
//!
//! Every balance constant the simulation consults lives here so levels and
//! tests can run with different rules. Missing JSON fields fall back to the
//! defaults.

use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::sim::entity::EnemyType;

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Starting lives for this preset
    pub fn initial_lives(&self) -> u8 {
        match self {
            Difficulty::Easy => 5,
            Difficulty::Normal => 3,
            Difficulty::Hard => 2,
        }
    }

    /// Power-up drop chance on enemy death
    pub fn drop_chance(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.3,
            Difficulty::Normal => 0.2,
            Difficulty::Hard => 0.1,
        }
    }

    /// Live enemy cap for the filler spawner
    pub fn filler_enemy_cap(&self) -> usize {
        match self {
            Difficulty::Easy => 8,
            Difficulty::Normal => 12,
            Difficulty::Hard => 18,
        }
    }
}

/// Game balance settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,

    // === Player ===
    pub initial_lives: u8,
    /// Hit points per life
    pub player_health: u8,
    /// Invulnerability after taking damage (ms)
    pub invulnerable_ms: f64,
    /// Invulnerability after the shield absorbs a hit (ms)
    pub shield_invulnerable_ms: f64,
    /// Delay between death and respawn (ms)
    pub respawn_ms: f64,
    pub shield_ms: f64,
    pub speed_boost_ms: f64,

    // === Collisions ===
    /// Enemy types destroyed outright when they ram the player
    pub ram_kill_types: Vec<EnemyType>,
    /// Damage the player takes from a ram
    pub ram_damage: u8,
    /// White-flash duration on enemy hit (ms)
    pub hit_flash_ms: f64,

    // === Power-ups ===
    pub powerup_drop_chance: f32,
    pub powerup_lifetime_ms: f64,
    pub powerup_score: u64,

    // === Scoring ===
    /// A life is granted each time the score crosses a multiple of this (0 = off)
    pub extra_life_every: u64,
    pub combo_window_ms: f64,
    pub combo_step: f32,
    pub max_multiplier: f32,
    /// Emit a milestone event every this many combo hits
    pub combo_milestone: u32,
    /// Base of the level-clear time bonus
    pub level_clear_bonus: u64,

    // === Spawning ===
    pub filler_enemy_cap: usize,
    /// Delay between the boss warning and the boss appearing (ms)
    pub boss_warning_ms: f64,
    /// Delay between a cleared level and the next one (ms)
    pub level_transition_ms: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,

            initial_lives: 3,
            player_health: 1,
            invulnerable_ms: 2000.0,
            shield_invulnerable_ms: 1000.0,
            respawn_ms: 1000.0,
            shield_ms: 5000.0,
            speed_boost_ms: 5000.0,

            ram_kill_types: vec![EnemyType::Basic, EnemyType::Scout],
            ram_damage: 1,
            hit_flash_ms: 100.0,

            powerup_drop_chance: 0.2,
            powerup_lifetime_ms: 10_000.0,
            powerup_score: 500,

            extra_life_every: 10_000,
            combo_window_ms: 2000.0,
            combo_step: 0.1,
            max_multiplier: 5.0,
            combo_milestone: 10,
            level_clear_bonus: 10_000,

            filler_enemy_cap: 12,
            boss_warning_ms: 2000.0,
            level_transition_ms: 3000.0,
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_preset(preset: Difficulty) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a difficulty preset (updates preset-dependent fields)
    pub fn apply_preset(&mut self, preset: Difficulty) {
        self.difficulty = preset;
        self.initial_lives = preset.initial_lives();
        self.powerup_drop_chance = preset.drop_chance();
        self.filler_enemy_cap = preset.filler_enemy_cap();
    }

    /// Whether an enemy of this type dies on contact with the player
    pub fn is_ram_killed(&self, enemy: EnemyType) -> bool {
        self.ram_kill_types.contains(&enemy)
    }

    /// Parse and validate settings from JSON
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(0.0..=1.0).contains(&self.powerup_drop_chance) {
            return Err(SettingsError::OutOfRange {
                field: "powerup_drop_chance",
                reason: format!("{} is not within 0..=1", self.powerup_drop_chance),
            });
        }
        if self.max_multiplier < 1.0 {
            return Err(SettingsError::OutOfRange {
                field: "max_multiplier",
                reason: format!("{} is below 1", self.max_multiplier),
            });
        }
        if self.player_health == 0 {
            return Err(SettingsError::OutOfRange {
                field: "player_health",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.initial_lives == 0 {
            return Err(SettingsError::OutOfRange {
                field: "initial_lives",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{ "extra_life_every": 20000 }"#).unwrap();
        assert_eq!(settings.extra_life_every, 20_000);
        assert_eq!(settings.initial_lives, 3);
        assert!(settings.is_ram_killed(EnemyType::Basic));
        assert!(!settings.is_ram_killed(EnemyType::Heavy));
    }

    #[test]
    fn test_ram_kill_types_configurable() {
        let settings = Settings::from_json(r#"{ "ram_kill_types": ["heavy"] }"#).unwrap();
        assert!(settings.is_ram_killed(EnemyType::Heavy));
        assert!(!settings.is_ram_killed(EnemyType::Basic));
    }

    #[test]
    fn test_validation_rejects_bad_drop_chance() {
        let err = Settings::from_json(r#"{ "powerup_drop_chance": 1.5 }"#).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::OutOfRange { field: "powerup_drop_chance", .. }
        ));
    }

    #[test]
    fn test_preset_roundtrip_names() {
        for preset in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            assert_eq!(Difficulty::from_str(preset.as_str()), Some(preset));
        }
        let hard = Settings::from_preset(Difficulty::Hard);
        assert_eq!(hard.initial_lives, 2);
        assert_eq!(hard.filler_enemy_cap, 18);
    }
}
