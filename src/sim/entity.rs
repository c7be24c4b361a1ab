//! Entity data model
//!
//! Every simulated object is an [`Entity`]: shared kinematic fields plus a
//! [`Body`] carrying the kind-specific state. Behavior is selected by matching
//! on the body, never by inspecting concrete types.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pattern::Pattern;
use crate::consts::*;
use crate::rects_overlap;

/// Entity discriminator. Drives storage partitioning and collision eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    Player,
    Enemy,
    PlayerBullet,
    EnemyBullet,
    PowerUp,
    Explosion,
}

impl Kind {
    pub const COUNT: usize = 6;

    /// Iteration order used everywhere a stable kind order matters
    pub const ALL: [Kind; Kind::COUNT] = [
        Kind::Player,
        Kind::Enemy,
        Kind::PlayerBullet,
        Kind::EnemyBullet,
        Kind::PowerUp,
        Kind::Explosion,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn faction(self) -> Faction {
        match self {
            Kind::Player | Kind::PlayerBullet => Faction::Player,
            Kind::Enemy | Kind::EnemyBullet => Faction::Hostile,
            Kind::PowerUp | Kind::Explosion => Faction::Neutral,
        }
    }
}

/// Side an entity fights for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Faction {
    Player,
    Hostile,
    Neutral,
}

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
}

/// Axis-aligned bounding box (top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        rects_overlap(self.min, self.size, other.min, other.size)
    }
}

/// Enemy roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyType {
    Basic,
    Medium,
    Heavy,
    Boss,
    Scout,
    Fighter,
    Bomber,
    Interceptor,
    Elite,
}

/// How an enemy type shoots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireStyle {
    Straight,
    Aimed,
    Spread,
    Double,
    Bomb,
    Homing,
    Fan,
    /// Cycles burst / aimed stream / wave volley
    BossCycle,
}

/// Static per-type stats
#[derive(Debug, Clone, Copy)]
pub struct EnemyStats {
    pub size: Vec2,
    pub health: i32,
    pub score: u64,
    /// Drift speed (units/second) when no pattern drives the enemy
    pub speed: f32,
    pub fire: FireStyle,
}

impl EnemyType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "basic" => Some(EnemyType::Basic),
            "medium" => Some(EnemyType::Medium),
            "heavy" => Some(EnemyType::Heavy),
            "boss" => Some(EnemyType::Boss),
            "scout" => Some(EnemyType::Scout),
            "fighter" => Some(EnemyType::Fighter),
            "bomber" => Some(EnemyType::Bomber),
            "interceptor" => Some(EnemyType::Interceptor),
            "elite" => Some(EnemyType::Elite),
            _ => None,
        }
    }

    pub fn stats(self) -> EnemyStats {
        let (w, h, health, score, speed, fire) = match self {
            EnemyType::Basic => (32.0, 32.0, 1, 100, 120.0, FireStyle::Straight),
            EnemyType::Medium => (48.0, 48.0, 3, 300, 90.0, FireStyle::Aimed),
            EnemyType::Heavy => (64.0, 64.0, 5, 500, 60.0, FireStyle::Spread),
            EnemyType::Boss => (128.0, 96.0, 50, 5000, 30.0, FireStyle::BossCycle),
            EnemyType::Scout => (24.0, 24.0, 1, 150, 180.0, FireStyle::Straight),
            EnemyType::Fighter => (40.0, 24.0, 2, 200, 120.0, FireStyle::Double),
            EnemyType::Bomber => (54.0, 54.0, 4, 400, 60.0, FireStyle::Bomb),
            EnemyType::Interceptor => (38.0, 38.0, 2, 350, 120.0, FireStyle::Homing),
            EnemyType::Elite => (52.0, 52.0, 6, 800, 90.0, FireStyle::Fan),
        };
        EnemyStats {
            size: Vec2::new(w, h),
            health,
            score,
            speed,
            fire,
        }
    }

    pub fn is_boss(self) -> bool {
        self == EnemyType::Boss
    }
}

/// How an enemy's position is produced each tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Motion {
    /// Integrate velocity
    Drift,
    /// Position is a pure function of the level time since spawn
    Pattern {
        pattern: Pattern,
        origin: Vec2,
        index: u32,
        spawn_ms: f64,
    },
    /// Ease toward a hover point (boss)
    Hover { target: Vec2 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub enemy_type: EnemyType,
    pub health: i32,
    pub max_health: i32,
    pub score_value: u64,
    pub motion: Motion,
    /// Time until the next shot (ms)
    pub shoot_timer_ms: f64,
    pub boss: bool,
    /// 1 normally, 2 once a boss drops under 30% health
    pub boss_phase: u8,
    pub attack_cycle: u8,
    pub hit_flash_ms: f64,
}

/// Homing guidance toward another entity, looked up by id each tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Homing {
    pub target: u32,
    /// Lerp factor per nominal frame
    pub turn_rate: f32,
}

/// Sine offset on y driven by x: `base_y + sin(x * frequency + phase) * amplitude`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveMotion {
    pub amplitude: f32,
    pub frequency: f32,
    pub phase: f32,
    pub base_y: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub owner: Owner,
    pub damage: u8,
    /// Survives hits
    pub piercing: bool,
    /// Enemies a piercing bullet already damaged; each is hit once
    pub pierced: Vec<u32>,
    pub homing: Option<Homing>,
    pub wave: Option<WaveMotion>,
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    Weapon,
    Shield,
    Speed,
    Life,
    Bomb,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 5] = [
        PowerUpKind::Weapon,
        PowerUpKind::Shield,
        PowerUpKind::Speed,
        PowerUpKind::Life,
        PowerUpKind::Bomb,
    ];
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    /// Level time at which the pickup disappears
    pub expires_at_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub age_ms: f64,
    pub lifetime_ms: f64,
}

/// The player's ship state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pilot {
    pub health: u8,
    pub max_health: u8,
    pub lives: u8,
    pub weapon_level: u8,
    pub invulnerable_ms: f64,
    pub shield_ms: f64,
    pub speed_boost_ms: f64,
    pub fire_cooldown_ms: f64,
    /// Destroyed and waiting to respawn (or out of lives)
    pub dead: bool,
    pub respawn_ms: f64,
}

impl Pilot {
    pub fn new(lives: u8, health: u8) -> Self {
        Self {
            health,
            max_health: health,
            lives,
            weapon_level: 1,
            invulnerable_ms: 0.0,
            shield_ms: 0.0,
            speed_boost_ms: 0.0,
            fire_cooldown_ms: 0.0,
            dead: false,
            respawn_ms: 0.0,
        }
    }

    #[inline]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable_ms > 0.0
    }

    #[inline]
    pub fn has_shield(&self) -> bool {
        self.shield_ms > 0.0
    }

    /// Out of lives for good
    pub fn is_out(&self) -> bool {
        self.dead && self.lives == 0
    }
}

/// Kind-specific state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Body {
    Player(Pilot),
    Enemy(Enemy),
    Bullet(Bullet),
    PowerUp(PowerUp),
    Explosion(Explosion),
}

/// A simulated object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Assigned by the store, never reused within a session
    pub id: u32,
    /// Top-left corner
    pub pos: Vec2,
    /// Units per second
    pub vel: Vec2,
    pub size: Vec2,
    pub scale: f32,
    /// Cleared to mark the entity for removal at the next compaction
    pub alive: bool,
    pub body: Body,
}

impl Entity {
    fn with_body(pos: Vec2, size: Vec2, vel: Vec2, body: Body) -> Self {
        Self {
            id: 0,
            pos,
            vel,
            size,
            scale: 1.0,
            alive: true,
            body,
        }
    }

    pub fn player(lives: u8, health: u8) -> Self {
        Self::with_body(
            player_spawn_point(),
            Vec2::new(PLAYER_WIDTH, PLAYER_HEIGHT),
            Vec2::ZERO,
            Body::Player(Pilot::new(lives, health)),
        )
    }

    pub fn enemy(enemy_type: EnemyType, pos: Vec2, motion: Motion, shoot_timer_ms: f64) -> Self {
        let stats = enemy_type.stats();
        let vel = match motion {
            Motion::Drift => Vec2::new(-stats.speed, 0.0),
            _ => Vec2::ZERO,
        };
        Self::with_body(
            pos,
            stats.size,
            vel,
            Body::Enemy(Enemy {
                enemy_type,
                health: stats.health,
                max_health: stats.health,
                score_value: stats.score,
                motion,
                shoot_timer_ms,
                boss: enemy_type.is_boss(),
                boss_phase: 1,
                attack_cycle: 0,
                hit_flash_ms: 0.0,
            }),
        )
    }

    pub fn bullet(owner: Owner, pos: Vec2, vel: Vec2, damage: u8) -> Self {
        let (w, h) = match owner {
            Owner::Player => PLAYER_BULLET_SIZE,
            Owner::Enemy => ENEMY_BULLET_SIZE,
        };
        Self::with_body(
            pos,
            Vec2::new(w, h),
            vel,
            Body::Bullet(Bullet {
                owner,
                damage,
                piercing: false,
                pierced: Vec::new(),
                homing: None,
                wave: None,
            }),
        )
    }

    /// Power-up centered on `center`
    pub fn power_up(kind: PowerUpKind, center: Vec2, expires_at_ms: f64) -> Self {
        let size = Vec2::splat(POWERUP_SIZE);
        Self::with_body(
            center - size / 2.0,
            size,
            Vec2::new(-POWERUP_DRIFT, 0.0),
            Body::PowerUp(PowerUp {
                kind,
                expires_at_ms,
            }),
        )
    }

    /// Explosion centered on `center`
    pub fn explosion(center: Vec2, extent: f32) -> Self {
        let size = Vec2::splat(extent);
        Self::with_body(
            center - size / 2.0,
            size,
            Vec2::ZERO,
            Body::Explosion(Explosion {
                age_ms: 0.0,
                lifetime_ms: EXPLOSION_MS,
            }),
        )
    }

    pub fn kind(&self) -> Kind {
        match &self.body {
            Body::Player(_) => Kind::Player,
            Body::Enemy(_) => Kind::Enemy,
            Body::Bullet(b) => match b.owner {
                Owner::Player => Kind::PlayerBullet,
                Owner::Enemy => Kind::EnemyBullet,
            },
            Body::PowerUp(_) => Kind::PowerUp,
            Body::Explosion(_) => Kind::Explosion,
        }
    }

    #[inline]
    pub fn faction(&self) -> Faction {
        self.kind().faction()
    }

    /// Collision bounds (size scaled by `scale`)
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.size * self.scale)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * self.scale / 2.0
    }

    /// Whether this entity may take part in overlap tests at all.
    /// Dead, destroyed and invulnerable entities are skipped entirely.
    pub fn collidable(&self) -> bool {
        if !self.alive {
            return false;
        }
        match &self.body {
            Body::Player(p) => !p.dead && !p.is_invulnerable(),
            Body::Explosion(_) => false,
            _ => true,
        }
    }

    /// Outside the padded world rectangle
    pub fn out_of_bounds(&self) -> bool {
        let b = self.bounds();
        b.max().x < -CULL_PADDING
            || b.min.x > WORLD_WIDTH + CULL_PADDING
            || b.max().y < -CULL_PADDING
            || b.min.y > WORLD_HEIGHT + CULL_PADDING
    }

    pub fn as_enemy(&self) -> Option<&Enemy> {
        match &self.body {
            Body::Enemy(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_enemy_mut(&mut self) -> Option<&mut Enemy> {
        match &mut self.body {
            Body::Enemy(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_pilot(&self) -> Option<&Pilot> {
        match &self.body {
            Body::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_pilot_mut(&mut self) -> Option<&mut Pilot> {
        match &mut self.body {
            Body::Player(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_bullet(&self) -> Option<&Bullet> {
        match &self.body {
            Body::Bullet(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_bullet_mut(&mut self) -> Option<&mut Bullet> {
        match &mut self.body {
            Body::Bullet(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_boss(&self) -> bool {
        self.as_enemy().is_some_and(|e| e.boss)
    }
}

/// Where the player (re)appears
pub fn player_spawn_point() -> Vec2 {
    Vec2::new(PLAYER_SPAWN_X, WORLD_HEIGHT / 2.0 - PLAYER_HEIGHT / 2.0)
}
