//! Spawn director
//!
//! Drives one level: the scripted wave timeline, a randomized filler spawner
//! and the boss encounter. Every delay (group spacing, boss warning) is an
//! entry on the level clock, so pausing the simulation pauses spawning.
//!
//! Per level: `Normal -> BossWarning -> BossActive -> Cleared`.
//! Per wave: `fired` goes false -> true exactly once.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{EnemyType, Entity, Kind, Motion};
use super::pattern::Pattern;
use super::schedule::Schedule;
use super::store::EntityStore;
use crate::consts::{WORLD_HEIGHT, WORLD_WIDTH};
use crate::level::LevelDescriptor;
use crate::settings::Settings;

/// Spawn x for waves and filler
const SPAWN_X: f32 = WORLD_WIDTH + 50.0;
/// Floor for a malformed filler interval (ms)
const MIN_FILLER_INTERVAL_MS: f64 = 1.0;
/// Gap between filler formation members (ms)
const FILLER_SPACING_MS: f64 = 200.0;
/// Filler formations: (type, count, pattern)
const FILLER_FORMATIONS: [(EnemyType, u32, Pattern); 5] = [
    (EnemyType::Basic, 3, Pattern::Straight),
    (EnemyType::Basic, 5, Pattern::Sine),
    (EnemyType::Medium, 2, Pattern::Straight),
    (EnemyType::Basic, 4, Pattern::ZigZag),
    (EnemyType::Heavy, 1, Pattern::Straight),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPhase {
    Normal,
    BossWarning,
    BossActive,
    Cleared,
}

/// A resolved wave group. `pattern: None` drifts at the type's own speed.
#[derive(Debug, Clone)]
struct Group {
    enemy_type: EnemyType,
    count: u32,
    pattern: Option<Pattern>,
    spacing_ms: f64,
}

/// A scripted wave and whether it has been consumed
#[derive(Debug, Clone)]
pub struct Wave {
    pub trigger_ms: f64,
    groups: Vec<Group>,
    pub fired: bool,
}

impl Wave {
    pub fn enemy_count(&self) -> u32 {
        self.groups.iter().map(|g| g.count).sum()
    }
}

/// One enemy waiting for its due time
#[derive(Debug, Clone)]
struct SpawnOrder {
    enemy_type: EnemyType,
    pattern: Option<Pattern>,
    origin: Vec2,
    index: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DirectorEvent {
    WaveFired { index: usize, enemies: u32 },
    FillerLaunched { enemy_type: EnemyType, count: u32 },
    BossWarning,
    BossSpawned { id: u32 },
    LevelCleared,
}

#[derive(Debug, Clone)]
pub struct SpawnDirector {
    name: String,
    boss_name: String,
    boss_trigger_ms: f64,
    clear_on_boss: bool,
    filler_interval_ms: f64,
    filler_cap: usize,
    boss_warning_ms: f64,
    waves: Vec<Wave>,
    queue: Schedule<SpawnOrder>,
    phase: LevelPhase,
    boss_due_ms: f64,
    next_filler_ms: f64,
    rng: Pcg32,
}

impl SpawnDirector {
    /// Resolve a level descriptor. Groups naming an unknown enemy type are
    /// skipped; unknown patterns fall back to straight. The pattern name
    /// `drift` means no pattern at all.
    pub fn new(level: &LevelDescriptor, settings: &Settings, seed: u64) -> Self {
        let mut waves: Vec<Wave> = level
            .waves
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let groups = spec
                    .groups
                    .iter()
                    .filter_map(|g| {
                        let Some(enemy_type) = EnemyType::from_name(&g.enemy_type) else {
                            log::warn!(
                                "Level '{}' wave {i}: unknown enemy type '{}', group skipped",
                                level.name,
                                g.enemy_type
                            );
                            return None;
                        };
                        let pattern = if g.pattern.eq_ignore_ascii_case("drift") {
                            None
                        } else {
                            Some(Pattern::from_name(&g.pattern, 0).unwrap_or_else(|| {
                                log::warn!(
                                    "Level '{}' wave {i}: unknown pattern '{}', using straight",
                                    level.name,
                                    g.pattern
                                );
                                Pattern::Straight
                            }))
                        };
                        Some(Group {
                            enemy_type,
                            count: g.count,
                            pattern,
                            spacing_ms: g.spacing_ms,
                        })
                    })
                    .collect();
                Wave {
                    trigger_ms: spec.trigger_ms,
                    groups,
                    fired: false,
                }
            })
            .collect();
        waves.sort_by(|a, b| a.trigger_ms.total_cmp(&b.trigger_ms));

        let filler_interval_ms = level.filler_interval_ms;
        let filler_interval_ms = if filler_interval_ms.is_finite() && filler_interval_ms >= MIN_FILLER_INTERVAL_MS {
            filler_interval_ms
        } else {
            log::warn!(
                "Level '{}': filler interval {} clamped to {MIN_FILLER_INTERVAL_MS}ms",
                level.name,
                level.filler_interval_ms
            );
            MIN_FILLER_INTERVAL_MS
        };

        Self {
            name: level.name.clone(),
            boss_name: level.boss.clone(),
            boss_trigger_ms: level.boss_trigger_ms(),
            clear_on_boss: level.clear_on_boss,
            filler_interval_ms,
            filler_cap: settings.filler_enemy_cap,
            boss_warning_ms: settings.boss_warning_ms,
            waves,
            queue: Schedule::new(),
            phase: LevelPhase::Normal,
            boss_due_ms: f64::INFINITY,
            next_filler_ms: filler_interval_ms,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn phase(&self) -> LevelPhase {
        self.phase
    }

    pub fn level_name(&self) -> &str {
        &self.name
    }

    pub fn waves(&self) -> &[Wave] {
        &self.waves
    }

    /// Spawns scheduled but not yet emitted
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Advance to `level_ms`, emitting due enemies into the store's queue
    pub fn advance(&mut self, level_ms: f64, store: &mut EntityStore) -> Vec<DirectorEvent> {
        let mut events = Vec::new();
        if self.phase == LevelPhase::Cleared {
            return events;
        }

        self.fire_waves(level_ms, &mut events);

        for order in self.queue.pop_due(level_ms) {
            self.spawn(order, level_ms, store);
        }

        let boss_present = boss_present(store);
        if self.phase == LevelPhase::Normal && !boss_present {
            self.run_filler(level_ms, store, &mut events);
        }

        match self.phase {
            LevelPhase::Normal if level_ms >= self.boss_trigger_ms && !boss_present => {
                log::info!("Level '{}': boss '{}' approaching", self.name, self.boss_name);
                self.phase = LevelPhase::BossWarning;
                self.boss_due_ms = level_ms + self.boss_warning_ms;
                events.push(DirectorEvent::BossWarning);
                if self.clear_on_boss {
                    // Includes anything spawned earlier in this same call
                    self.queue.clear();
                    store.discard_pending(Kind::Enemy);
                    store.for_each_mut(Kind::Enemy, |e| e.alive = false);
                }
            }
            LevelPhase::BossWarning if level_ms >= self.boss_due_ms => {
                let id = self.spawn_boss(level_ms, store);
                self.phase = LevelPhase::BossActive;
                events.push(DirectorEvent::BossSpawned { id });
            }
            LevelPhase::BossActive if !boss_present => {
                log::info!("Level '{}': boss destroyed", self.name);
                self.phase = LevelPhase::Cleared;
                events.push(DirectorEvent::LevelCleared);
            }
            _ => {}
        }
        events
    }

    fn fire_waves(&mut self, level_ms: f64, events: &mut Vec<DirectorEvent>) {
        let origin = Vec2::new(SPAWN_X, WORLD_HEIGHT / 2.0);
        for (index, wave) in self.waves.iter_mut().enumerate() {
            if wave.fired || level_ms < wave.trigger_ms {
                continue;
            }
            wave.fired = true;
            for group in &wave.groups {
                for k in 0..group.count {
                    self.queue.push(
                        level_ms + k as f64 * group.spacing_ms,
                        SpawnOrder {
                            enemy_type: group.enemy_type,
                            pattern: group.pattern,
                            origin,
                            index: k,
                        },
                    );
                }
            }
            log::debug!("Wave {index} fired at {level_ms:.0}ms ({} enemies)", wave.enemy_count());
            events.push(DirectorEvent::WaveFired {
                index,
                enemies: wave.enemy_count(),
            });
        }
    }

    fn run_filler(&mut self, level_ms: f64, store: &EntityStore, events: &mut Vec<DirectorEvent>) {
        if level_ms < self.next_filler_ms {
            return;
        }
        let live = store.live_count(Kind::Enemy) + store.pending(Kind::Enemy).count();
        if live >= self.filler_cap {
            return;
        }
        let (enemy_type, count, pattern) =
            FILLER_FORMATIONS[self.rng.random_range(0..FILLER_FORMATIONS.len())];
        for k in 0..count {
            let y = self.rng.random_range(50.0..WORLD_HEIGHT - 50.0);
            self.queue.push(
                level_ms + k as f64 * FILLER_SPACING_MS,
                SpawnOrder {
                    enemy_type,
                    pattern: Some(pattern),
                    origin: Vec2::new(SPAWN_X, y),
                    index: k,
                },
            );
        }
        self.next_filler_ms =
            level_ms + self.rng.random_range(self.filler_interval_ms..2.0 * self.filler_interval_ms);
        events.push(DirectorEvent::FillerLaunched { enemy_type, count });
    }

    fn spawn(&mut self, order: SpawnOrder, level_ms: f64, store: &mut EntityStore) -> u32 {
        let seed: u32 = self.rng.random();
        let shoot_timer_ms = self.rng.random_range(1000.0..3000.0);
        let (pos, motion) = match order.pattern {
            Some(pattern) => {
                let pattern = pattern.reseeded(seed);
                let motion = Motion::Pattern {
                    pattern,
                    origin: order.origin,
                    index: order.index,
                    spawn_ms: level_ms,
                };
                (pattern.evaluate(order.origin, 0.0, order.index), motion)
            }
            None => (order.origin, Motion::Drift),
        };
        store.add(Entity::enemy(order.enemy_type, pos, motion, shoot_timer_ms))
    }

    fn spawn_boss(&mut self, level_ms: f64, store: &mut EntityStore) -> u32 {
        let size = EnemyType::Boss.stats().size;
        let y = WORLD_HEIGHT / 2.0 - size.y / 2.0;
        let target = Vec2::new(WORLD_WIDTH - size.x - 50.0, y);
        let id = store.add(Entity::enemy(
            EnemyType::Boss,
            Vec2::new(WORLD_WIDTH + 100.0, y),
            Motion::Hover { target },
            2000.0,
        ));
        log::info!("Level '{}': boss '{}' spawned at {level_ms:.0}ms", self.name, self.boss_name);
        id
    }
}

/// A boss is stored or queued and still alive
fn boss_present(store: &EntityStore) -> bool {
    store.live(Kind::Enemy).any(Entity::is_boss) || store.pending(Kind::Enemy).any(Entity::is_boss)
}
