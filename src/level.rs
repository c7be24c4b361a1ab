//! Level descriptors
//!
//! A level is static data loaded before play: duration, scroll speed, the
//! scripted wave timeline and the boss. The simulation treats it as
//! immutable. Enemy type and pattern names stay strings here; the spawn
//! director resolves them at load and skips what it cannot resolve.

use serde::{Deserialize, Serialize};

use crate::error::LevelError;

/// One group within a wave: `count` enemies spawned `spacing_ms` apart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub enemy_type: String,
    pub count: u32,
    pub pattern: String,
    #[serde(default)]
    pub spacing_ms: f64,
}

/// A scripted wave fired once when the level clock reaches `trigger_ms`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveSpec {
    pub trigger_ms: f64,
    pub groups: Vec<GroupSpec>,
}

fn default_scroll_speed() -> f32 {
    1.0
}

fn default_filler_interval() -> f64 {
    1000.0
}

fn default_boss() -> String {
    "boss".to_string()
}

fn default_boss_fraction() -> f64 {
    0.8
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub name: String,
    pub duration_ms: f64,
    #[serde(default = "default_scroll_speed")]
    pub scroll_speed: f32,
    /// Base interval of the filler spawner (actual gaps are in `[base, 2 * base)`)
    #[serde(default = "default_filler_interval")]
    pub filler_interval_ms: f64,
    /// Boss identity, for display and logs
    #[serde(default = "default_boss")]
    pub boss: String,
    /// Fraction of `duration_ms` at which the boss warning starts
    #[serde(default = "default_boss_fraction")]
    pub boss_trigger_fraction: f64,
    /// Remove regular enemies when the boss warning starts
    #[serde(default)]
    pub clear_on_boss: bool,
    #[serde(default)]
    pub waves: Vec<WaveSpec>,
}

impl LevelDescriptor {
    pub fn from_json(json: &str) -> Result<Self, LevelError> {
        let level: LevelDescriptor = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    /// Parse a JSON array of levels
    pub fn campaign_from_json(json: &str) -> Result<Vec<Self>, LevelError> {
        let levels: Vec<LevelDescriptor> = serde_json::from_str(json)?;
        if levels.is_empty() {
            return Err(LevelError::Empty);
        }
        for level in &levels {
            level.validate()?;
        }
        Ok(levels)
    }

    /// Level time at which the boss warning starts
    pub fn boss_trigger_ms(&self) -> f64 {
        self.duration_ms * self.boss_trigger_fraction
    }

    /// Structural checks only. Unknown enemy or pattern names are tolerated
    /// here and handled when the director loads the level.
    pub fn validate(&self) -> Result<(), LevelError> {
        let invalid = |reason: String| LevelError::Invalid {
            name: self.name.clone(),
            reason,
        };
        if !(self.duration_ms.is_finite() && self.duration_ms > 0.0) {
            return Err(invalid(format!("duration_ms must be positive, got {}", self.duration_ms)));
        }
        if !(self.filler_interval_ms.is_finite() && self.filler_interval_ms > 0.0) {
            return Err(invalid(format!(
                "filler_interval_ms must be positive, got {}",
                self.filler_interval_ms
            )));
        }
        if !(self.boss_trigger_fraction > 0.0 && self.boss_trigger_fraction <= 1.0) {
            return Err(invalid(format!(
                "boss_trigger_fraction must be in (0, 1], got {}",
                self.boss_trigger_fraction
            )));
        }
        for (i, wave) in self.waves.iter().enumerate() {
            if !(wave.trigger_ms.is_finite() && wave.trigger_ms >= 0.0) {
                return Err(invalid(format!("wave {i} has trigger_ms {}", wave.trigger_ms)));
            }
            if let Some(g) = wave
                .groups
                .iter()
                .find(|g| !(g.spacing_ms.is_finite() && g.spacing_ms >= 0.0))
            {
                return Err(invalid(format!("wave {i} group '{}' has spacing_ms {}", g.enemy_type, g.spacing_ms)));
            }
        }
        Ok(())
    }
}

fn group(enemy_type: &str, count: u32, pattern: &str, spacing_ms: f64) -> GroupSpec {
    GroupSpec {
        enemy_type: enemy_type.to_string(),
        count,
        pattern: pattern.to_string(),
        spacing_ms,
    }
}

fn wave(trigger_ms: f64, groups: Vec<GroupSpec>) -> WaveSpec {
    WaveSpec { trigger_ms, groups }
}

fn level(
    name: &str,
    duration_ms: f64,
    scroll_speed: f32,
    filler_interval_ms: f64,
    boss: &str,
    waves: Vec<WaveSpec>,
) -> LevelDescriptor {
    LevelDescriptor {
        name: name.to_string(),
        duration_ms,
        scroll_speed,
        filler_interval_ms,
        boss: boss.to_string(),
        boss_trigger_fraction: default_boss_fraction(),
        clear_on_boss: false,
        waves,
    }
}

/// The six built-in stages
pub fn builtin_campaign() -> Vec<LevelDescriptor> {
    vec![
        level(
            "STRITE",
            120_000.0,
            1.5,
            1000.0,
            "gargoyle",
            vec![
                wave(1000.0, vec![group("basic", 5, "sine", 300.0)]),
                wave(
                    5000.0,
                    vec![group("medium", 3, "straight", 400.0), group("basic", 4, "zigzag", 200.0)],
                ),
                wave(
                    10_000.0,
                    vec![group("heavy", 1, "drift", 0.0), group("basic", 6, "circle", 100.0)],
                ),
                wave(15_000.0, vec![group("medium", 4, "dive", 300.0)]),
            ],
        ),
        level(
            "DASER",
            150_000.0,
            2.0,
            800.0,
            "bell_mite",
            vec![
                wave(1000.0, vec![group("basic", 8, "wave", 200.0)]),
                wave(
                    4000.0,
                    vec![group("medium", 2, "spiral", 500.0), group("basic", 6, "straight", 150.0)],
                ),
                wave(8000.0, vec![group("heavy", 2, "straight", 600.0)]),
            ],
        ),
        level(
            "RUINS",
            180_000.0,
            1.2,
            600.0,
            "fomalhaut",
            vec![
                wave(2000.0, vec![group("medium", 4, "formation", 200.0)]),
                wave(6000.0, vec![group("scout", 10, "swarm", 100.0)]),
                wave(
                    12_000.0,
                    vec![group("heavy", 1, "drift", 0.0), group("fighter", 2, "escort", 300.0)],
                ),
            ],
        ),
        level(
            "VOLBADOS",
            210_000.0,
            1.8,
            500.0,
            "hell_arm",
            vec![
                wave(1500.0, vec![group("basic", 12, "scatter", 150.0)]),
                wave(5000.0, vec![group("interceptor", 5, "pincer", 250.0)]),
                wave(10_000.0, vec![group("bomber", 3, "column", 400.0)]),
            ],
        ),
        level(
            "VIOS",
            180_000.0,
            2.5,
            500.0,
            "spark_lancer",
            vec![
                wave(1000.0, vec![group("scout", 8, "fast_straight", 100.0)]),
                wave(3000.0, vec![group("medium", 6, "crossfire", 200.0)]),
                wave(7000.0, vec![group("elite", 2, "pinwheel", 800.0)]),
                wave(12_000.0, vec![group("basic", 15, "storm", 50.0)]),
            ],
        ),
        level(
            "VIOS FORTRESS",
            240_000.0,
            1.0,
            400.0,
            "orn_emperor",
            vec![
                wave(2000.0, vec![group("heavy", 4, "column", 500.0)]),
                wave(6000.0, vec![group("medium", 8, "crossfire", 150.0)]),
                wave(10_000.0, vec![group("fighter", 20, "final_assault", 100.0)]),
                wave(15_000.0, vec![group("elite", 5, "formation", 400.0)]),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_campaign_is_valid() {
        let campaign = builtin_campaign();
        assert_eq!(campaign.len(), 6);
        for level in &campaign {
            level.validate().unwrap();
            // Timeline is ordered
            assert!(level.waves.windows(2).all(|w| w[0].trigger_ms <= w[1].trigger_ms));
        }
        assert_eq!(campaign[0].boss_trigger_ms(), 96_000.0);
    }

    #[test]
    fn test_json_defaults() {
        let level = LevelDescriptor::from_json(
            r#"{
                "name": "Test",
                "duration_ms": 10000,
                "waves": [
                    { "trigger_ms": 500, "groups": [
                        { "enemy_type": "basic", "count": 3, "pattern": "sine" }
                    ] }
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(level.boss_trigger_fraction, 0.8);
        assert_eq!(level.filler_interval_ms, 1000.0);
        assert_eq!(level.waves[0].groups[0].spacing_ms, 0.0);
        assert!(!level.clear_on_boss);
    }

    #[test]
    fn test_invalid_duration_rejected() {
        let err = LevelDescriptor::from_json(r#"{ "name": "Bad", "duration_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, LevelError::Invalid { ref name, .. } if name == "Bad"));
    }

    #[test]
    fn test_unknown_enemy_is_not_a_load_error() {
        let level = LevelDescriptor::from_json(
            r#"{ "name": "Odd", "duration_ms": 5000, "waves": [
                { "trigger_ms": 0, "groups": [
                    { "enemy_type": "gargoyle", "count": 1, "pattern": "nowhere" }
                ] }
            ] }"#,
        );
        assert!(level.is_ok());
    }

    #[test]
    fn test_empty_campaign_rejected() {
        assert!(matches!(LevelDescriptor::campaign_from_json("[]"), Err(LevelError::Empty)));
        assert!(matches!(
            LevelDescriptor::campaign_from_json("{"),
            Err(LevelError::Parse(_))
        ));
    }
}
