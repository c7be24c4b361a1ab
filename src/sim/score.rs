//! Combo and score ledger
//!
//! Consumes hit events after collision resolution. Each player-bullet hit
//! extends the combo window and raises the multiplier; kill scores are
//! multiplied. Crossing each `extra_life_every` boundary grants a life.

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreLedger {
    score: u64,
    combo: u32,
    multiplier: f32,
    /// Time left before the combo lapses (ms)
    combo_timer_ms: f64,
    /// Next score at which a life is granted (0 = disabled)
    next_life_at: u64,
    window_ms: f64,
    step: f32,
    max_multiplier: f32,
    milestone: u32,
    life_every: u64,
}

/// What a single award produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Award {
    pub points: u64,
    pub lives_granted: u8,
}

impl ScoreLedger {
    pub fn new(settings: &Settings) -> Self {
        Self {
            score: 0,
            combo: 0,
            multiplier: 1.0,
            combo_timer_ms: 0.0,
            next_life_at: settings.extra_life_every,
            window_ms: settings.combo_window_ms,
            step: settings.combo_step,
            max_multiplier: settings.max_multiplier,
            milestone: settings.combo_milestone,
            life_every: settings.extra_life_every,
        }
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Register a player hit. Returns the combo count when it lands on a milestone.
    pub fn on_hit(&mut self) -> Option<u32> {
        self.combo += 1;
        self.combo_timer_ms = self.window_ms;
        self.multiplier = (1.0 + self.combo as f32 * self.step).min(self.max_multiplier);
        (self.milestone > 0 && self.combo % self.milestone == 0).then_some(self.combo)
    }

    /// Award a kill, scaled by the current multiplier
    pub fn award_kill(&mut self, base: u64) -> Award {
        let points = (base as f64 * self.multiplier as f64).round() as u64;
        self.award(points)
    }

    /// Award flat points (pickups, bonuses)
    pub fn award(&mut self, points: u64) -> Award {
        self.score = self.score.saturating_add(points);
        let mut lives_granted = 0u8;
        if self.life_every > 0 {
            while self.score >= self.next_life_at {
                lives_granted = lives_granted.saturating_add(1);
                self.next_life_at = self.next_life_at.saturating_add(self.life_every);
                if self.next_life_at == u64::MAX {
                    break;
                }
            }
        }
        Award {
            points,
            lives_granted,
        }
    }

    /// Tick the combo window
    pub fn update(&mut self, dt_ms: f64) {
        if self.combo_timer_ms > 0.0 {
            self.combo_timer_ms -= dt_ms;
            if self.combo_timer_ms <= 0.0 {
                self.break_combo();
            }
        }
    }

    pub fn break_combo(&mut self) {
        self.combo = 0;
        self.combo_timer_ms = 0.0;
        self.multiplier = 1.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> ScoreLedger {
        ScoreLedger::new(&Settings::default())
    }

    #[test]
    fn test_multiplier_grows_and_caps() {
        let mut l = ledger();
        for _ in 0..5 {
            l.on_hit();
        }
        assert!((l.multiplier() - 1.5).abs() < 1e-5);
        for _ in 0..100 {
            l.on_hit();
        }
        assert_eq!(l.multiplier(), 5.0);
    }

    #[test]
    fn test_milestone_every_ten_hits() {
        let mut l = ledger();
        let milestones: Vec<u32> = (0..25).filter_map(|_| l.on_hit()).collect();
        assert_eq!(milestones, vec![10, 20]);
    }

    #[test]
    fn test_combo_lapses_after_window() {
        let mut l = ledger();
        l.on_hit();
        l.update(1999.0);
        assert_eq!(l.combo(), 1);
        l.update(2.0);
        assert_eq!(l.combo(), 0);
        assert_eq!(l.multiplier(), 1.0);
    }

    #[test]
    fn test_kill_score_is_multiplied() {
        let mut l = ledger();
        l.on_hit();
        l.on_hit();
        let award = l.award_kill(100);
        assert_eq!(award.points, 120);
        assert_eq!(l.score(), 120);
    }

    #[test]
    fn test_extra_life_on_each_crossing() {
        let mut l = ledger();
        assert_eq!(l.award(9_900).lives_granted, 0);
        // Crossing, not landing exactly, is what counts
        assert_eq!(l.award(150).lives_granted, 1);
        assert_eq!(l.award(25_000).lives_granted, 2);
    }

    #[test]
    fn test_extra_life_disabled() {
        let settings = Settings {
            extra_life_every: 0,
            ..Settings::default()
        };
        let mut l = ScoreLedger::new(&settings);
        assert_eq!(l.award(1_000_000).lives_granted, 0);
    }
}
