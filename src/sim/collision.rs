//! Collision detection and resolution
//!
//! Detection walks every collidable entity, asks the grid for candidates,
//! filters them through the kind-pair matrix and only then runs the
//! rectangle test. Each unordered id pair is considered once per tick.
//!
//! Resolution mutates the store in place: damage, destruction, explosions,
//! drops and pickup effects. Scoring is left to the ledger, which consumes
//! the returned [`HitEvent`]s.

use std::collections::HashSet;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::entity::{Body, EnemyType, Entity, Kind, PowerUpKind};
use super::grid::SpatialGrid;
use super::store::{EntityStore, Handle};
use crate::consts::MAX_WEAPON_LEVEL;
use crate::settings::Settings;

const fn pair_allowed(a: Kind, b: Kind) -> bool {
    matches!(
        (a, b),
        (Kind::Player, Kind::Enemy)
            | (Kind::Enemy, Kind::Player)
            | (Kind::Player, Kind::EnemyBullet)
            | (Kind::EnemyBullet, Kind::Player)
            | (Kind::Player, Kind::PowerUp)
            | (Kind::PowerUp, Kind::Player)
            | (Kind::PlayerBullet, Kind::Enemy)
            | (Kind::Enemy, Kind::PlayerBullet)
    )
}

const fn build_matrix() -> [[bool; Kind::COUNT]; Kind::COUNT] {
    let mut m = [[false; Kind::COUNT]; Kind::COUNT];
    let mut i = 0;
    while i < Kind::COUNT {
        let mut j = 0;
        while j < Kind::COUNT {
            m[i][j] = pair_allowed(Kind::ALL[i], Kind::ALL[j]);
            j += 1;
        }
        i += 1;
    }
    m
}

/// Kind-pair eligibility, indexed by [`Kind::index`]. Symmetric.
pub const ELIGIBLE: [[bool; Kind::COUNT]; Kind::COUNT] = build_matrix();

#[inline]
pub fn eligible(a: Kind, b: Kind) -> bool {
    ELIGIBLE[a.index()][b.index()]
}

/// An overlapping eligible pair. `a` always has the lower [`Kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: Handle,
    pub b: Handle,
}

impl Contact {
    fn new(x: Handle, y: Handle) -> Self {
        if x.kind <= y.kind {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    /// Unordered id pair
    pub fn key(&self) -> (u32, u32) {
        (self.a.id.min(self.b.id), self.a.id.max(self.b.id))
    }
}

/// How an enemy was destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillCause {
    Bullet,
    Ram,
    Bomb,
}

/// Outcome of resolving one contact
#[derive(Debug, Clone, PartialEq)]
pub enum HitEvent {
    /// A player bullet connected (drives the combo)
    BulletHit { bullet: u32, enemy: u32 },
    EnemyDamaged { enemy: u32, damage: u8, remaining: i32 },
    EnemyDestroyed {
        enemy: u32,
        enemy_type: EnemyType,
        score: u64,
        center: Vec2,
        boss: bool,
        cause: KillCause,
    },
    PlayerDamaged { player: u32, by: u32, damage: u8, remaining: u8 },
    ShieldAbsorbed { player: u32, by: u32 },
    /// Exactly one per life lost
    PlayerKilled { player: u32, lives_left: u8, center: Vec2 },
    PowerUpCollected { player: u32, power_up: u32, kind: PowerUpKind, score: u64 },
    BombDetonated { enemies: usize, bullets: usize },
}

/// Everything resolution needs besides the store
pub struct Resolver<'a> {
    pub settings: &'a Settings,
    pub rng: &'a mut Pcg32,
    /// Level clock, for pickup expiry
    pub now_ms: f64,
}

/// Find every overlapping eligible pair, each unordered pair at most once
pub fn detect(grid: &SpatialGrid, store: &EntityStore) -> Vec<Contact> {
    let mut seen: HashSet<(u32, u32)> = HashSet::new();
    let mut contacts = Vec::new();

    for kind in Kind::ALL {
        for handle in store.handles(kind) {
            let Some(entity) = store.get(handle).filter(|e| e.collidable()) else {
                continue;
            };
            let bounds = entity.bounds();
            for candidate in grid.query(entity) {
                if !eligible(kind, candidate.kind) {
                    continue;
                }
                let contact = Contact::new(handle, candidate);
                if !seen.insert(contact.key()) {
                    continue;
                }
                let Some(other) = store.get(candidate).filter(|e| e.collidable()) else {
                    continue;
                };
                if bounds.overlaps(&other.bounds()) {
                    contacts.push(contact);
                }
            }
        }
    }
    contacts
}

/// Detect and apply all contacts for this tick
pub fn resolve(grid: &SpatialGrid, store: &mut EntityStore, ctx: &mut Resolver) -> Vec<HitEvent> {
    let contacts = detect(grid, store);
    apply_contacts(&contacts, store, ctx)
}

/// Apply contacts in order. A repeated pair is a no-op.
pub fn apply_contacts(
    contacts: &[Contact],
    store: &mut EntityStore,
    ctx: &mut Resolver,
) -> Vec<HitEvent> {
    let mut applied: HashSet<(u32, u32)> = HashSet::new();
    let mut events = Vec::new();
    for contact in contacts {
        if !applied.insert(contact.key()) {
            log::debug!("Duplicate contact {:?} ignored", contact.key());
            continue;
        }
        apply(*contact, store, ctx, &mut events);
    }
    events
}

fn apply(contact: Contact, store: &mut EntityStore, ctx: &mut Resolver, events: &mut Vec<HitEvent>) {
    // Earlier contacts this tick may have killed or shielded either side
    let still_live = |h: Handle| store.get(h).is_some_and(Entity::collidable);
    if !still_live(contact.a) || !still_live(contact.b) {
        return;
    }

    match (contact.a.kind, contact.b.kind) {
        (Kind::Player, Kind::Enemy) => ram(contact.a, contact.b, store, ctx, events),
        (Kind::Player, Kind::EnemyBullet) => {
            let Some((player, bullet)) = store.pair_mut(contact.a, contact.b) else {
                return;
            };
            let damage = bullet.as_bullet().map_or(1, |b| b.damage);
            bullet.alive = false;
            damage_player(player, bullet.id, damage, ctx.settings, events);
        }
        (Kind::Player, Kind::PowerUp) => collect(contact.a, contact.b, store, ctx, events),
        (Kind::Enemy, Kind::PlayerBullet) => {
            let Some((enemy, bullet)) = store.pair_mut(contact.a, contact.b) else {
                return;
            };
            let enemy_id = enemy.id;
            let Some(b) = bullet.as_bullet_mut() else {
                return;
            };
            if b.pierced.contains(&enemy_id) {
                return;
            }
            let damage = b.damage;
            if b.piercing {
                b.pierced.push(enemy_id);
            } else {
                bullet.alive = false;
            }
            events.push(HitEvent::BulletHit {
                bullet: bullet.id,
                enemy: enemy_id,
            });
            damage_enemy(contact.a, damage as i32, KillCause::Bullet, store, ctx, events);
        }
        (a, b) => log::warn!("No resolution for eligible pair {a:?}/{b:?}"),
    }
}

fn ram(player: Handle, enemy: Handle, store: &mut EntityStore, ctx: &mut Resolver, events: &mut Vec<HitEvent>) {
    let Some((p, e)) = store.pair_mut(player, enemy) else {
        return;
    };
    damage_player(p, e.id, ctx.settings.ram_damage, ctx.settings, events);
    let rammed = e
        .as_enemy()
        .is_some_and(|en| !en.boss && ctx.settings.is_ram_killed(en.enemy_type));
    if rammed {
        damage_enemy(enemy, i32::MAX, KillCause::Ram, store, ctx, events);
    }
}

fn damage_player(player: &mut Entity, by: u32, damage: u8, settings: &Settings, events: &mut Vec<HitEvent>) {
    let id = player.id;
    let center = player.center();
    let Some(pilot) = player.as_pilot_mut() else {
        return;
    };
    if pilot.has_shield() {
        pilot.shield_ms = 0.0;
        pilot.invulnerable_ms = settings.shield_invulnerable_ms;
        events.push(HitEvent::ShieldAbsorbed { player: id, by });
        return;
    }

    pilot.health = pilot.health.saturating_sub(damage);
    if pilot.health == 0 {
        pilot.lives = pilot.lives.saturating_sub(1);
        pilot.dead = true;
        pilot.respawn_ms = settings.respawn_ms;
        pilot.shield_ms = 0.0;
        pilot.speed_boost_ms = 0.0;
        events.push(HitEvent::PlayerKilled {
            player: id,
            lives_left: pilot.lives,
            center,
        });
    } else {
        pilot.invulnerable_ms = settings.invulnerable_ms;
        events.push(HitEvent::PlayerDamaged {
            player: id,
            by,
            damage,
            remaining: pilot.health,
        });
    }
}

fn damage_enemy(
    handle: Handle,
    damage: i32,
    cause: KillCause,
    store: &mut EntityStore,
    ctx: &mut Resolver,
    events: &mut Vec<HitEvent>,
) {
    let Some(entity) = store.get_mut(handle) else {
        return;
    };
    let Some(enemy) = entity.as_enemy_mut() else {
        return;
    };
    enemy.health = enemy.health.saturating_sub(damage);
    enemy.hit_flash_ms = ctx.settings.hit_flash_ms;
    if enemy.health > 0 {
        events.push(HitEvent::EnemyDamaged {
            enemy: handle.id,
            damage: damage.clamp(0, u8::MAX as i32) as u8,
            remaining: enemy.health,
        });
        return;
    }
    destroy_enemy(handle, cause, store, ctx, events);
}

fn destroy_enemy(
    handle: Handle,
    cause: KillCause,
    store: &mut EntityStore,
    ctx: &mut Resolver,
    events: &mut Vec<HitEvent>,
) {
    let Some(entity) = store.get_mut(handle) else {
        return;
    };
    let Some(enemy) = entity.as_enemy() else {
        return;
    };
    let (enemy_type, score, boss) = (enemy.enemy_type, enemy.score_value, enemy.boss);
    entity.alive = false;
    let center = entity.center();

    store.add(Entity::explosion(center, if boss { 100.0 } else { 40.0 }));
    if ctx.rng.random::<f32>() < ctx.settings.powerup_drop_chance {
        let kind = PowerUpKind::ALL[ctx.rng.random_range(0..PowerUpKind::ALL.len())];
        store.add(Entity::power_up(kind, center, ctx.now_ms + ctx.settings.powerup_lifetime_ms));
    }

    events.push(HitEvent::EnemyDestroyed {
        enemy: handle.id,
        enemy_type,
        score,
        center,
        boss,
        cause,
    });
}

fn collect(player: Handle, power_up: Handle, store: &mut EntityStore, ctx: &mut Resolver, events: &mut Vec<HitEvent>) {
    let Some((p, pu)) = store.pair_mut(player, power_up) else {
        return;
    };
    let Body::PowerUp(body) = &pu.body else {
        return;
    };
    let kind = body.kind;
    pu.alive = false;
    let Some(pilot) = p.as_pilot_mut() else {
        return;
    };
    match kind {
        PowerUpKind::Weapon => pilot.weapon_level = (pilot.weapon_level + 1).min(MAX_WEAPON_LEVEL),
        PowerUpKind::Shield => pilot.shield_ms = ctx.settings.shield_ms,
        PowerUpKind::Speed => pilot.speed_boost_ms = ctx.settings.speed_boost_ms,
        PowerUpKind::Life => pilot.lives = pilot.lives.saturating_add(1),
        PowerUpKind::Bomb => {}
    }
    events.push(HitEvent::PowerUpCollected {
        player: player.id,
        power_up: power_up.id,
        kind,
        score: ctx.settings.powerup_score,
    });
    if kind == PowerUpKind::Bomb {
        detonate_bomb(store, ctx, events);
    }
}

/// Destroy every non-boss enemy and every enemy bullet
pub fn detonate_bomb(store: &mut EntityStore, ctx: &mut Resolver, events: &mut Vec<HitEvent>) {
    let targets: Vec<Handle> = store
        .handles(Kind::Enemy)
        .into_iter()
        .filter(|h| store.get(*h).is_some_and(|e| !e.is_boss()))
        .collect();
    for handle in &targets {
        destroy_enemy(*handle, KillCause::Bomb, store, ctx, events);
    }
    let mut bullets = 0;
    store.for_each_mut(Kind::EnemyBullet, |b| {
        b.alive = false;
        bullets += 1;
    });
    events.push(HitEvent::BombDetonated {
        enemies: targets.len(),
        bullets,
    });
}
