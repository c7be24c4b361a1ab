//! Game state and the collaborator surface
//!
//! [`GameState`] is the context object handed to every pipeline stage. It
//! owns the store, grid, director, ledger and RNG for one run, so several
//! simulations can live in one process. Renderers, audio and UI read
//! snapshots, drained events and the HUD from it after each tick.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::HitEvent;
use super::director::SpawnDirector;
use super::entity::{Body, Entity, Kind, PowerUpKind};
use super::grid::SpatialGrid;
use super::schedule::Schedule;
use super::score::ScoreLedger;
use super::store::EntityStore;
use crate::error::LevelError;
use crate::level::LevelDescriptor;
use crate::settings::Settings;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Playing,
    Paused,
    /// Boss down, waiting for the next level
    LevelClear,
    GameOver,
    /// Every level cleared
    Complete,
}

/// Named audio cues, fire-and-forget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCue {
    Shoot,
    Explosion,
    PowerUp,
    BossWarning,
    Hit,
    LevelStart,
    GameOver,
}

impl AudioCue {
    pub fn name(&self) -> &'static str {
        match self {
            AudioCue::Shoot => "shoot",
            AudioCue::Explosion => "explosion",
            AudioCue::PowerUp => "powerup",
            AudioCue::BossWarning => "bossWarning",
            AudioCue::Hit => "hit",
            AudioCue::LevelStart => "levelStart",
            AudioCue::GameOver => "gameOver",
        }
    }
}

/// Everything that happened during a tick, in order
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    LevelStarted { index: usize, name: String },
    PlayerFired { bullets: u8 },
    Collision(HitEvent),
    ComboMilestone { count: u32, multiplier: f32 },
    ExtraLife { lives: u8 },
    PlayerRespawned,
    BossWarning,
    BossSpawned { id: u32 },
    LevelCleared { index: usize, bonus: u64 },
    GameOver { score: u64 },
    CampaignComplete { score: u64 },
}

impl GameEvent {
    pub fn audio_cue(&self) -> Option<AudioCue> {
        match self {
            GameEvent::LevelStarted { .. } => Some(AudioCue::LevelStart),
            GameEvent::PlayerFired { .. } => Some(AudioCue::Shoot),
            GameEvent::Collision(hit) => match hit {
                HitEvent::EnemyDestroyed { .. }
                | HitEvent::PlayerKilled { .. }
                | HitEvent::BombDetonated { .. } => Some(AudioCue::Explosion),
                HitEvent::EnemyDamaged { .. }
                | HitEvent::PlayerDamaged { .. }
                | HitEvent::ShieldAbsorbed { .. } => Some(AudioCue::Hit),
                HitEvent::PowerUpCollected { .. } => Some(AudioCue::PowerUp),
                HitEvent::BulletHit { .. } => None,
            },
            GameEvent::ExtraLife { .. } => Some(AudioCue::PowerUp),
            GameEvent::BossWarning => Some(AudioCue::BossWarning),
            GameEvent::GameOver { .. } => Some(AudioCue::GameOver),
            GameEvent::ComboMilestone { .. }
            | GameEvent::PlayerRespawned
            | GameEvent::BossSpawned { .. }
            | GameEvent::LevelCleared { .. }
            | GameEvent::CampaignComplete { .. } => None,
        }
    }
}

/// Read-only view of one entity for the renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntitySnapshot {
    pub id: u32,
    pub kind: Kind,
    pub pos: Vec2,
    pub size: Vec2,
    pub hit_flash: bool,
    pub alpha: f32,
    /// Power-up type, for picking a sprite
    pub power_up: Option<PowerUpKind>,
}

/// Values the score/UI collaborator shows after each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hud {
    pub score: u64,
    pub lives: u8,
    pub weapon_level: u8,
    pub combo_multiplier: f32,
}

/// Delayed effects on the level clock
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// One bullet of a boss aimed stream
    AimedShot { shooter: u32, direction: Vec2 },
    /// One blast of a boss death chain
    ChainExplosion { center: Vec2, extent: f32 },
    /// Leave the cleared level
    NextLevel,
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub settings: Settings,
    pub store: EntityStore,
    pub grid: SpatialGrid,
    pub director: SpawnDirector,
    pub ledger: ScoreLedger,
    /// Delayed effects, keyed by level time
    pub effects: Schedule<Effect>,
    /// World RNG (enemy fire, drops, boss retargeting)
    pub rng: Pcg32,
    pub campaign: Vec<LevelDescriptor>,
    pub level_index: usize,
    /// Level clock (ms since level start)
    pub level_ms: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Phase restored when a pause ends
    pub resume_phase: GamePhase,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Start a run on the first level of `campaign`
    pub fn new(seed: u64, settings: Settings, campaign: Vec<LevelDescriptor>) -> Result<Self, LevelError> {
        let first = campaign.first().ok_or(LevelError::Empty)?;
        for level in &campaign {
            level.validate()?;
        }
        let director = SpawnDirector::new(first, &settings, director_seed(seed, 0));
        let mut state = Self {
            seed,
            ledger: ScoreLedger::new(&settings),
            store: EntityStore::new(),
            grid: SpatialGrid::default(),
            director,
            effects: Schedule::new(),
            rng: Pcg32::seed_from_u64(seed),
            campaign,
            level_index: 0,
            level_ms: 0.0,
            time_ticks: 0,
            phase: GamePhase::Playing,
            resume_phase: GamePhase::Playing,
            events: Vec::new(),
            settings,
        };
        state
            .store
            .add(Entity::player(state.settings.initial_lives, state.settings.player_health));
        state.store.merge_pending();
        state.start_level(0);
        Ok(state)
    }

    /// Run over the built-in campaign with default settings
    pub fn with_builtin_campaign(seed: u64) -> Result<Self, LevelError> {
        Self::new(seed, Settings::default(), crate::level::builtin_campaign())
    }

    /// Reset the level clock and world for `index` (the player carries over)
    pub fn start_level(&mut self, index: usize) {
        let Some(level) = self.campaign.get(index) else {
            log::warn!("No level {index} in campaign");
            return;
        };
        for kind in [Kind::Enemy, Kind::PlayerBullet, Kind::EnemyBullet, Kind::PowerUp, Kind::Explosion] {
            self.store.clear_kind(kind);
        }
        self.director = SpawnDirector::new(level, &self.settings, director_seed(self.seed, index));
        self.effects.clear();
        self.level_index = index;
        self.level_ms = 0.0;
        self.phase = GamePhase::Playing;
        log::info!("Level {} '{}' started", index + 1, level.name);
        self.events.push(GameEvent::LevelStarted {
            index,
            name: level.name.clone(),
        });
    }

    pub fn level(&self) -> Option<&LevelDescriptor> {
        self.campaign.get(self.level_index)
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Events since the last drain
    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Snapshots of every visible entity, in kind then storage order
    pub fn snapshots(&self) -> Vec<EntitySnapshot> {
        let mut out = Vec::with_capacity(self.store.len());
        for kind in Kind::ALL {
            for entity in self.store.live(kind) {
                if let Some(snapshot) = self.snapshot(entity) {
                    out.push(snapshot);
                }
            }
        }
        out
    }

    fn snapshot(&self, entity: &Entity) -> Option<EntitySnapshot> {
        let (hit_flash, alpha, power_up) = match &entity.body {
            Body::Player(pilot) => {
                if pilot.dead {
                    return None;
                }
                // Blink while invulnerable
                let alpha = if pilot.is_invulnerable() && (self.time_ticks / 6) % 2 == 1 {
                    0.4
                } else {
                    1.0
                };
                (false, alpha, None)
            }
            Body::Enemy(enemy) => (enemy.hit_flash_ms > 0.0, 1.0, None),
            Body::Bullet(_) => (false, 1.0, None),
            Body::PowerUp(p) => {
                // Fade over the last second
                let remaining = (p.expires_at_ms - self.level_ms).clamp(0.0, 1000.0);
                (false, (remaining / 1000.0) as f32, Some(p.kind))
            }
            Body::Explosion(x) => (false, (1.0 - x.age_ms / x.lifetime_ms).clamp(0.0, 1.0) as f32, None),
        };
        let bounds = entity.bounds();
        Some(EntitySnapshot {
            id: entity.id,
            kind: entity.kind(),
            pos: bounds.min,
            size: bounds.size,
            hit_flash,
            alpha,
            power_up,
        })
    }

    pub fn hud(&self) -> Hud {
        let pilot = self.store.player().and_then(Entity::as_pilot);
        Hud {
            score: self.ledger.score(),
            lives: pilot.map_or(0, |p| p.lives),
            weapon_level: pilot.map_or(1, |p| p.weapon_level),
            combo_multiplier: self.ledger.multiplier(),
        }
    }
}

/// Independent director stream per level
fn director_seed(seed: u64, level_index: usize) -> u64 {
    seed ^ (level_index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_player_and_level_event() {
        let state = GameState::with_builtin_campaign(1).unwrap();
        assert_eq!(state.store.live_count(Kind::Player), 1);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(matches!(
            state.events()[0],
            GameEvent::LevelStarted { index: 0, .. }
        ));
        assert_eq!(state.events()[0].audio_cue().map(|c| c.name()), Some("levelStart"));
    }

    #[test]
    fn test_empty_campaign_is_an_error() {
        let err = GameState::new(1, Settings::default(), Vec::new()).unwrap_err();
        assert!(matches!(err, LevelError::Empty));
    }

    #[test]
    fn test_hud_reflects_player() {
        let state = GameState::with_builtin_campaign(1).unwrap();
        let hud = state.hud();
        assert_eq!(hud.lives, 3);
        assert_eq!(hud.weapon_level, 1);
        assert_eq!(hud.score, 0);
        assert_eq!(hud.combo_multiplier, 1.0);
    }

    #[test]
    fn test_dead_player_not_in_snapshots() {
        let mut state = GameState::with_builtin_campaign(1).unwrap();
        assert_eq!(state.snapshots().len(), 1);
        state.store.player_mut().unwrap().as_pilot_mut().unwrap().dead = true;
        assert!(state.snapshots().is_empty());
    }

    #[test]
    fn test_powerup_fades_in_last_second() {
        let mut state = GameState::with_builtin_campaign(1).unwrap();
        state
            .store
            .add(Entity::power_up(PowerUpKind::Shield, Vec2::new(500.0, 300.0), 10_000.0));
        state.store.merge_pending();
        state.level_ms = 9_500.0;
        let snap = state
            .snapshots()
            .into_iter()
            .find(|s| s.kind == Kind::PowerUp)
            .unwrap();
        assert!((snap.alpha - 0.5).abs() < 1e-6);
        assert_eq!(snap.power_up, Some(PowerUpKind::Shield));
    }

    #[test]
    fn test_cue_names() {
        assert_eq!(GameEvent::BossWarning.audio_cue().unwrap().name(), "bossWarning");
        assert_eq!(GameEvent::PlayerFired { bullets: 1 }.audio_cue().unwrap().name(), "shoot");
        assert_eq!(GameEvent::GameOver { score: 0 }.audio_cue().unwrap().name(), "gameOver");
    }
}
