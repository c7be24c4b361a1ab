//! Fixed timestep simulation tick
//!
//! One call to [`tick`] runs the whole pipeline in a strict order:
//! spawn director, delayed effects, entity updates, grid rebuild, collision
//! resolution, score ledger, phase checks, then compaction and the merge of
//! everything spawned this tick.

use std::f32::consts::{FRAC_PI_3, PI, TAU};

use glam::Vec2;
use rand::Rng;

use super::clock::FrameClock;
use super::collision::{self, HitEvent, Resolver};
use super::director::DirectorEvent;
use super::entity::{
    Body, Entity, FireStyle, Homing, Kind, Motion, Owner, Pilot, WaveMotion, player_spawn_point,
};
use super::schedule::Schedule;
use super::state::{Effect, GameEvent, GamePhase, GameState};
use crate::consts::*;
use crate::{angle_to, from_angle};

/// Fire interval (ms) and bullet count per weapon level
const WEAPON_LEVELS: [(f64, u8); MAX_WEAPON_LEVEL as usize] =
    [(200.0, 1), (180.0, 2), (160.0, 3), (140.0, 4), (120.0, 5)];
/// Angle between player spread shots
const SPREAD_DEG: f32 = 15.0;
/// Weapon level from which player bullets pierce
const PIERCING_LEVEL: u8 = 4;
/// Boss hover easing per nominal frame
const HOVER_EASE: f32 = 0.02;
/// Chance per tick that the boss picks a new hover height
const HOVER_RETARGET_CHANCE: f32 = 0.01;
/// Boss shoot interval once below 30% health
const BOSS_RAGE_INTERVAL_MS: f64 = 500.0;
const BOSS_CHAIN_BLASTS: u32 = 6;
const BOSS_CHAIN_GAP_MS: f64 = 150.0;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Desired movement; longer than 1 is normalized
    pub move_vector: Vec2,
    pub firing: bool,
    /// Pause toggle
    pub pause_requested: bool,
}

/// Toggle pause. Returns true if the state is now paused.
pub fn toggle_pause(state: &mut GameState) -> bool {
    match state.phase {
        GamePhase::Playing | GamePhase::LevelClear => {
            state.resume_phase = state.phase;
            state.phase = GamePhase::Paused;
            log::info!("Paused");
        }
        GamePhase::Paused => {
            state.phase = state.resume_phase;
            log::info!("Resumed");
        }
        GamePhase::GameOver | GamePhase::Complete => {}
    }
    state.phase == GamePhase::Paused
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt_ms: f64) {
    if input.pause_requested && toggle_pause(state) {
        return;
    }
    match state.phase {
        GamePhase::Paused | GamePhase::GameOver | GamePhase::Complete => return,
        GamePhase::Playing | GamePhase::LevelClear => {}
    }

    state.time_ticks += 1;
    state.level_ms += dt_ms;

    run_director(state);
    run_effects(state);

    update_player(state, input, dt_ms);
    update_enemies(state, dt_ms);
    update_bullets(state, dt_ms);
    update_power_ups(state, dt_ms);
    update_explosions(state, dt_ms);

    state.grid.rebuild(&state.store);
    let hits = {
        let mut ctx = Resolver {
            settings: &state.settings,
            rng: &mut state.rng,
            now_ms: state.level_ms,
        };
        collision::resolve(&state.grid, &mut state.store, &mut ctx)
    };
    apply_hits(state, hits);
    state.ledger.update(dt_ms);

    if state.phase != GamePhase::GameOver
        && state.store.player().and_then(Entity::as_pilot).is_some_and(Pilot::is_out)
    {
        state.phase = GamePhase::GameOver;
        let score = state.ledger.score();
        log::info!("Game over with {score} points");
        state.push_event(GameEvent::GameOver { score });
    }

    state.store.compact();
    state.store.merge_pending();
}

fn run_director(state: &mut GameState) {
    let events = state.director.advance(state.level_ms, &mut state.store);
    for event in events {
        match event {
            DirectorEvent::WaveFired { .. } | DirectorEvent::FillerLaunched { .. } => {}
            DirectorEvent::BossWarning => state.push_event(GameEvent::BossWarning),
            DirectorEvent::BossSpawned { id } => state.push_event(GameEvent::BossSpawned { id }),
            DirectorEvent::LevelCleared => level_cleared(state),
        }
    }
}

fn level_cleared(state: &mut GameState) {
    let bonus = state
        .settings
        .level_clear_bonus
        .saturating_sub((state.level_ms / 10.0).floor() as u64);
    let award = state.ledger.award(bonus);
    grant_lives(state, award.lives_granted);
    log::info!("Level {} cleared, time bonus {bonus}", state.level_index + 1);
    state.push_event(GameEvent::LevelCleared {
        index: state.level_index,
        bonus,
    });
    state.phase = GamePhase::LevelClear;
    state
        .effects
        .push(state.level_ms + state.settings.level_transition_ms, Effect::NextLevel);
}

fn run_effects(state: &mut GameState) {
    for effect in state.effects.pop_due(state.level_ms) {
        match effect {
            Effect::AimedShot { shooter, direction } => {
                let Some(enemy) = state.store.find(shooter).filter(|e| e.alive) else {
                    continue;
                };
                let muzzle = Vec2::new(enemy.pos.x, enemy.center().y);
                state.store.add(Entity::bullet(
                    Owner::Enemy,
                    muzzle,
                    direction * ENEMY_BULLET_SPEED * 1.5,
                    1,
                ));
            }
            Effect::ChainExplosion { center, extent } => {
                state.store.add(Entity::explosion(center, extent));
            }
            Effect::NextLevel => {
                let next = state.level_index + 1;
                if next < state.campaign.len() {
                    state.start_level(next);
                } else {
                    state.phase = GamePhase::Complete;
                    let score = state.ledger.score();
                    log::info!("Campaign complete with {score} points");
                    state.push_event(GameEvent::CampaignComplete { score });
                }
                // start_level dropped everything else queued
                return;
            }
        }
    }
}

fn update_player(state: &mut GameState, input: &TickInput, dt_ms: f64) {
    let settings = &state.settings;
    let Some(player) = state.store.player_mut() else {
        return;
    };
    let size = player.size;
    let mut shots: Vec<Entity> = Vec::new();
    let mut respawned = false;
    {
        let Body::Player(pilot) = &mut player.body else {
            return;
        };

        if pilot.dead {
            pilot.respawn_ms -= dt_ms;
            if pilot.respawn_ms <= 0.0 && pilot.lives > 0 {
                pilot.dead = false;
                pilot.health = pilot.max_health;
                pilot.weapon_level = pilot.weapon_level.saturating_sub(1).max(1);
                pilot.invulnerable_ms = settings.invulnerable_ms;
                pilot.fire_cooldown_ms = 0.0;
                player.pos = player_spawn_point();
                player.vel = Vec2::ZERO;
                respawned = true;
            }
        } else {
            pilot.invulnerable_ms = (pilot.invulnerable_ms - dt_ms).max(0.0);
            pilot.shield_ms = (pilot.shield_ms - dt_ms).max(0.0);
            pilot.speed_boost_ms = (pilot.speed_boost_ms - dt_ms).max(0.0);
            pilot.fire_cooldown_ms = (pilot.fire_cooldown_ms - dt_ms).max(0.0);

            let mut dir = input.move_vector;
            if !dir.is_finite() {
                dir = Vec2::ZERO;
            }
            if dir.length_squared() > 1.0 {
                dir = dir.normalize();
            }
            let speed = if pilot.speed_boost_ms > 0.0 {
                PLAYER_BOOST_SPEED
            } else {
                PLAYER_SPEED
            };
            player.vel = dir * speed;
            player.pos += player.vel * (dt_ms / 1000.0) as f32;
            player.pos = player
                .pos
                .clamp(Vec2::ZERO, Vec2::new(WORLD_WIDTH, WORLD_HEIGHT) - size);

            if input.firing && pilot.fire_cooldown_ms <= 0.0 {
                let level = pilot.weapon_level.clamp(1, MAX_WEAPON_LEVEL);
                let (interval, count) = WEAPON_LEVELS[level as usize - 1];
                pilot.fire_cooldown_ms = interval;
                let muzzle = Vec2::new(player.pos.x + size.x, player.pos.y + size.y / 2.0);
                shots = player_volley(muzzle, level, count);
            }
        }
    }

    if respawned {
        state.push_event(GameEvent::PlayerRespawned);
    }
    if !shots.is_empty() {
        let bullets = shots.len() as u8;
        for shot in shots {
            state.store.add(shot);
        }
        state.push_event(GameEvent::PlayerFired { bullets });
    }
}

/// Spread volley: `count` bullets fanned `SPREAD_DEG` apart around straight ahead
fn player_volley(muzzle: Vec2, level: u8, count: u8) -> Vec<Entity> {
    (0..count)
        .map(|i| {
            let spread = i as f32 - (count as f32 - 1.0) / 2.0;
            let angle = (spread * SPREAD_DEG).to_radians();
            let pos = muzzle + Vec2::new(0.0, spread * 8.0 - PLAYER_BULLET_SIZE.1 / 2.0);
            let mut bullet = Entity::bullet(Owner::Player, pos, from_angle(angle) * PLAYER_BULLET_SPEED, level);
            if let Some(b) = bullet.as_bullet_mut() {
                b.piercing = level >= PIERCING_LEVEL;
            }
            bullet
        })
        .collect()
}

fn update_enemies(state: &mut GameState, dt_ms: f64) {
    let level_ms = state.level_ms;
    let frames = (dt_ms / FRAME_MS) as f32;
    let target = state
        .store
        .player()
        .filter(|p| p.as_pilot().is_some_and(|pilot| !pilot.dead))
        .map(|p| (p.id, p.center()));
    let rng = &mut state.rng;
    let effects = &mut state.effects;
    let mut spawned: Vec<Entity> = Vec::new();

    state.store.for_each_mut(Kind::Enemy, |entity| {
        let pos = entity.pos;
        let size = entity.size;
        let Body::Enemy(enemy) = &mut entity.body else {
            return;
        };

        match &mut enemy.motion {
            Motion::Drift => entity.pos += entity.vel * (dt_ms / 1000.0) as f32,
            Motion::Pattern {
                pattern,
                origin,
                index,
                spawn_ms,
            } => entity.pos = pattern.evaluate(*origin, level_ms - *spawn_ms, *index),
            Motion::Hover { target: hover } => {
                entity.pos += (*hover - pos) * HOVER_EASE * frames;
                if rng.random::<f32>() < HOVER_RETARGET_CHANCE {
                    hover.y = rng.random_range(size.y..WORLD_HEIGHT - size.y);
                }
            }
        }

        enemy.hit_flash_ms = (enemy.hit_flash_ms - dt_ms).max(0.0);
        if enemy.boss && enemy.boss_phase == 1 && (enemy.health as f32) < enemy.max_health as f32 * 0.3 {
            enemy.boss_phase = 2;
            log::info!("Boss entering phase 2");
        }

        // Enemies fire only at a live player and once on screen
        if let Some((target_id, target_center)) = target
            && entity.pos.x < WORLD_WIDTH
        {
            enemy.shoot_timer_ms -= dt_ms;
            if enemy.shoot_timer_ms <= 0.0 {
                let style = enemy.enemy_type.stats().fire;
                let shooter = Shooter {
                    id: entity.id,
                    pos: entity.pos,
                    size,
                };
                if style == FireStyle::BossCycle {
                    let cycle = enemy.attack_cycle;
                    enemy.attack_cycle = (cycle + 1) % 3;
                    boss_attack(&shooter, cycle, target_center, level_ms, effects, &mut spawned);
                } else {
                    spawned.extend(enemy_volley(&shooter, style, target_id, target_center));
                }
                enemy.shoot_timer_ms = if enemy.boss_phase == 2 {
                    BOSS_RAGE_INTERVAL_MS
                } else {
                    rng.random_range(1000.0..3000.0)
                };
            }
        }

        // Enemies enter from the right, so only the other edges cull
        if entity.out_of_bounds() && entity.pos.x < WORLD_WIDTH {
            entity.alive = false;
        }
    });

    for bullet in spawned {
        state.store.add(bullet);
    }
}

struct Shooter {
    id: u32,
    pos: Vec2,
    size: Vec2,
}

impl Shooter {
    /// Left edge, vertical middle
    fn muzzle(&self) -> Vec2 {
        Vec2::new(self.pos.x, self.pos.y + self.size.y / 2.0)
    }

    fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }
}

fn enemy_bullet(pos: Vec2, angle: f32, speed_scale: f32) -> Entity {
    Entity::bullet(Owner::Enemy, pos, from_angle(angle) * ENEMY_BULLET_SPEED * speed_scale, 1)
}

fn enemy_volley(shooter: &Shooter, style: FireStyle, target_id: u32, target: Vec2) -> Vec<Entity> {
    let muzzle = shooter.muzzle();
    match style {
        FireStyle::Straight => vec![enemy_bullet(muzzle, PI, 1.0)],
        FireStyle::Aimed => vec![enemy_bullet(muzzle, angle_to(muzzle, target), 1.0)],
        FireStyle::Spread => (0..3)
            .map(|i| enemy_bullet(muzzle, PI + ((i - 1) as f32 * 30.0).to_radians(), 1.0))
            .collect(),
        FireStyle::Double => vec![
            enemy_bullet(muzzle - Vec2::new(0.0, 5.0), PI, 1.0),
            enemy_bullet(muzzle + Vec2::new(0.0, 5.0), PI, 1.0),
        ],
        FireStyle::Bomb => {
            let mut bomb = Entity::bullet(
                Owner::Enemy,
                Vec2::new(shooter.pos.x, shooter.pos.y + shooter.size.y),
                Vec2::new(-0.3, 0.5) * ENEMY_BULLET_SPEED,
                2,
            );
            bomb.size = Vec2::splat(12.0);
            vec![bomb]
        }
        FireStyle::Homing => {
            let mut missile = enemy_bullet(muzzle, PI, 1.0);
            if let Some(b) = missile.as_bullet_mut() {
                b.homing = Some(Homing {
                    target: target_id,
                    turn_rate: 0.05,
                });
            }
            vec![missile]
        }
        FireStyle::Fan => (0..5)
            .map(|i| enemy_bullet(muzzle, (140.0 + i as f32 * 20.0).to_radians(), 0.8))
            .collect(),
        // Handled by boss_attack
        FireStyle::BossCycle => Vec::new(),
    }
}

/// Boss attack rotation: circular burst, aimed stream, wave volley
fn boss_attack(
    shooter: &Shooter,
    cycle: u8,
    target: Vec2,
    now_ms: f64,
    effects: &mut Schedule<Effect>,
    spawned: &mut Vec<Entity>,
) {
    match cycle {
        0 => {
            let center = shooter.center();
            spawned.extend((0..16).map(|i| enemy_bullet(center, TAU * i as f32 / 16.0, 0.7)));
        }
        1 => {
            // Direction is fixed when the stream starts
            let direction = from_angle(angle_to(shooter.muzzle(), target));
            for i in 0..5 {
                effects.push(
                    now_ms + i as f64 * 100.0,
                    Effect::AimedShot {
                        shooter: shooter.id,
                        direction,
                    },
                );
            }
        }
        _ => {
            let muzzle = shooter.muzzle();
            for i in 0..3 {
                let pos = muzzle + Vec2::new(0.0, (i as f32 - 1.0) * 20.0);
                let mut bullet = enemy_bullet(pos, PI, 1.0);
                if let Some(b) = bullet.as_bullet_mut() {
                    b.wave = Some(WaveMotion {
                        amplitude: 50.0,
                        frequency: 0.1,
                        phase: i as f32 * FRAC_PI_3,
                        base_y: pos.y,
                    });
                }
                spawned.push(bullet);
            }
        }
    }
}

fn update_bullets(state: &mut GameState, dt_ms: f64) {
    let dt_s = (dt_ms / 1000.0) as f32;
    let frames = (dt_ms / FRAME_MS) as f32;
    let target = state
        .store
        .player()
        .filter(|p| p.as_pilot().is_some_and(|pilot| !pilot.dead))
        .map(|p| (p.id, p.center()));

    for kind in [Kind::PlayerBullet, Kind::EnemyBullet] {
        state.store.for_each_mut(kind, |entity| {
            let center = entity.center();
            let Body::Bullet(bullet) = &entity.body else {
                return;
            };
            if let Some(homing) = bullet.homing
                && let Some((_, goal)) = target.filter(|(id, _)| *id == homing.target)
            {
                let speed = entity.vel.x.abs().max(1.0);
                let desired = from_angle(angle_to(center, goal)) * speed;
                entity.vel = entity.vel.lerp(desired, (homing.turn_rate * frames).min(1.0));
            }

            if let Some(wave) = bullet.wave {
                entity.pos.x += entity.vel.x * dt_s;
                entity.pos.y = wave.base_y + (entity.pos.x * wave.frequency + wave.phase).sin() * wave.amplitude;
            } else {
                entity.pos += entity.vel * dt_s;
            }

            if entity.out_of_bounds() {
                entity.alive = false;
            }
        });
    }
}

fn update_power_ups(state: &mut GameState, dt_ms: f64) {
    let now = state.level_ms;
    let dt_s = (dt_ms / 1000.0) as f32;
    state.store.for_each_mut(Kind::PowerUp, |entity| {
        entity.pos += entity.vel * dt_s;
        let expired = matches!(&entity.body, Body::PowerUp(p) if now >= p.expires_at_ms);
        if expired || entity.out_of_bounds() {
            entity.alive = false;
        }
    });
}

fn update_explosions(state: &mut GameState, dt_ms: f64) {
    state.store.for_each_mut(Kind::Explosion, |entity| {
        if let Body::Explosion(x) = &mut entity.body {
            x.age_ms += dt_ms;
            if x.age_ms >= x.lifetime_ms {
                entity.alive = false;
            }
        }
    });
}

fn grant_lives(state: &mut GameState, count: u8) {
    if count == 0 {
        return;
    }
    let Some(pilot) = state.store.player_mut().and_then(Entity::as_pilot_mut) else {
        return;
    };
    pilot.lives = pilot.lives.saturating_add(count);
    let lives = pilot.lives;
    log::info!("Extra life ({lives} lives)");
    state.push_event(GameEvent::ExtraLife { lives });
}

/// Feed collision outcomes to the ledger and queue follow-up effects
fn apply_hits(state: &mut GameState, hits: Vec<HitEvent>) {
    for hit in hits {
        match &hit {
            HitEvent::BulletHit { .. } => {
                if let Some(count) = state.ledger.on_hit() {
                    state.push_event(GameEvent::ComboMilestone {
                        count,
                        multiplier: state.ledger.multiplier(),
                    });
                }
            }
            HitEvent::EnemyDestroyed {
                score, boss, center, ..
            } => {
                let award = state.ledger.award_kill(*score);
                grant_lives(state, award.lives_granted);
                if *boss {
                    for i in 0..BOSS_CHAIN_BLASTS {
                        let offset = Vec2::new(
                            state.rng.random_range(-60.0..60.0),
                            state.rng.random_range(-45.0..45.0),
                        );
                        state.effects.push(
                            state.level_ms + i as f64 * BOSS_CHAIN_GAP_MS,
                            Effect::ChainExplosion {
                                center: *center + offset,
                                extent: 60.0,
                            },
                        );
                    }
                }
            }
            HitEvent::PowerUpCollected { score, .. } => {
                let award = state.ledger.award(*score);
                grant_lives(state, award.lives_granted);
            }
            HitEvent::PlayerKilled { lives_left, .. } => {
                log::info!("Player destroyed, {lives_left} lives left");
            }
            _ => {}
        }
        state.push_event(GameEvent::Collision(hit));
    }
}

/// Clock plus state: what a host drives once per display frame
#[derive(Debug, Clone)]
pub struct Simulation {
    pub clock: FrameClock,
    pub state: GameState,
}

impl Simulation {
    pub fn new(state: GameState) -> Self {
        Self {
            clock: FrameClock::default(),
            state,
        }
    }

    /// Feed one host frame. Returns the number of fixed steps run.
    pub fn advance(&mut self, host_delta_ms: f64, input: &TickInput) -> u32 {
        if input.pause_requested {
            if toggle_pause(&mut self.state) {
                self.clock.pause();
            } else if self.clock.is_paused() {
                // The toggle frame itself is the resync frame
                self.clock.resume();
                self.clock.advance(host_delta_ms);
            }
            return 0;
        }
        let steps = self.clock.advance(host_delta_ms);
        let step_ms = self.clock.step_ms();
        for _ in 0..steps {
            tick(&mut self.state, input, step_ms);
        }
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{GroupSpec, LevelDescriptor, WaveSpec};
    use crate::settings::Settings;
    use crate::sim::director::LevelPhase;
    use crate::sim::entity::{EnemyType, PowerUpKind};

    fn quiet_level(duration_ms: f64) -> LevelDescriptor {
        LevelDescriptor {
            name: "Quiet".to_string(),
            duration_ms,
            scroll_speed: 1.0,
            filler_interval_ms: 1.0e9,
            boss: "boss".to_string(),
            boss_trigger_fraction: 0.8,
            clear_on_boss: false,
            waves: vec![],
        }
    }

    fn quiet_state() -> GameState {
        let settings = Settings {
            powerup_drop_chance: 0.0,
            ..Settings::default()
        };
        GameState::new(5, settings, vec![quiet_level(1.0e9)]).unwrap()
    }

    #[test]
    fn test_player_moves_and_clamps() {
        let mut state = quiet_state();
        let input = TickInput {
            move_vector: Vec2::new(-1.0, 0.0),
            ..Default::default()
        };
        for _ in 0..120 {
            tick(&mut state, &input, FRAME_MS);
        }
        assert_eq!(state.store.player().unwrap().pos.x, 0.0);
    }

    #[test]
    fn test_diagonal_is_normalized() {
        let mut state = quiet_state();
        let start = state.store.player().unwrap().pos;
        let input = TickInput {
            move_vector: Vec2::new(1.0, 1.0),
            ..Default::default()
        };
        tick(&mut state, &input, 100.0);
        let moved = state.store.player().unwrap().pos - start;
        assert!((moved.length() - PLAYER_SPEED * 0.1).abs() < 0.01);
    }

    #[test]
    fn test_firing_spawns_after_tick_and_respects_rate() {
        let mut state = quiet_state();
        let input = TickInput {
            firing: true,
            ..Default::default()
        };
        tick(&mut state, &input, FRAME_MS);
        assert_eq!(state.store.live_count(Kind::PlayerBullet), 1);
        // 200ms interval: no second shot on the next few frames
        for _ in 0..5 {
            tick(&mut state, &input, FRAME_MS);
        }
        assert_eq!(state.store.live_count(Kind::PlayerBullet), 1);
        let shots = state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::PlayerFired { .. }))
            .count();
        assert_eq!(shots, 1);
    }

    #[test]
    fn test_weapon_level_spread_and_piercing() {
        let bullets = player_volley(Vec2::new(100.0, 100.0), 5, 5);
        assert_eq!(bullets.len(), 5);
        assert!(bullets.iter().all(|b| b.as_bullet().unwrap().piercing));
        assert!(bullets.iter().all(|b| b.as_bullet().unwrap().damage == 5));
        // Middle bullet goes straight
        assert!(bullets[2].vel.y.abs() < 1e-3);
        assert!(bullets[0].vel.y < 0.0 && bullets[4].vel.y > 0.0);
    }

    #[test]
    fn test_pause_stops_level_clock() {
        let mut state = quiet_state();
        tick(&mut state, &TickInput::default(), FRAME_MS);
        let before = state.level_ms;
        let pause = TickInput {
            pause_requested: true,
            ..Default::default()
        };
        tick(&mut state, &pause, FRAME_MS);
        assert_eq!(state.phase, GamePhase::Paused);
        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), FRAME_MS);
        }
        assert_eq!(state.level_ms, before);
        tick(&mut state, &pause, FRAME_MS);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(state.level_ms > before);
    }

    #[test]
    fn test_player_death_respawn_and_game_over() {
        let settings = Settings {
            initial_lives: 1,
            powerup_drop_chance: 0.0,
            ..Settings::default()
        };
        let mut state = GameState::new(5, settings, vec![quiet_level(1.0e9)]).unwrap();
        let pos = state.store.player().unwrap().pos;
        state.store.add(Entity::bullet(Owner::Enemy, pos + Vec2::splat(4.0), Vec2::ZERO, 1));
        state.store.merge_pending();

        tick(&mut state, &TickInput::default(), FRAME_MS);
        assert_eq!(state.phase, GamePhase::GameOver);
        let events = state.drain_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, GameEvent::Collision(HitEvent::PlayerKilled { .. })))
                .count(),
            1
        );
        assert!(events.iter().any(|e| matches!(e, GameEvent::GameOver { .. })));
        // Further ticks do nothing
        let ticks = state.time_ticks;
        tick(&mut state, &TickInput::default(), FRAME_MS);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_respawn_reuses_id_and_drops_weapon_level() {
        let mut state = quiet_state();
        let id = state.store.player().unwrap().id;
        {
            let pilot = state.store.player_mut().unwrap().as_pilot_mut().unwrap();
            pilot.weapon_level = 3;
        }
        let pos = state.store.player().unwrap().pos;
        state.store.add(Entity::bullet(Owner::Enemy, pos + Vec2::splat(4.0), Vec2::ZERO, 1));
        state.store.merge_pending();
        tick(&mut state, &TickInput::default(), FRAME_MS);
        assert!(state.store.player().unwrap().as_pilot().unwrap().dead);

        for _ in 0..70 {
            tick(&mut state, &TickInput::default(), FRAME_MS);
        }
        let player = state.store.player().unwrap();
        let pilot = player.as_pilot().unwrap();
        assert_eq!(player.id, id);
        assert!(!pilot.dead);
        assert_eq!(pilot.lives, 2);
        assert_eq!(pilot.weapon_level, 2);
        assert!(pilot.is_invulnerable());
        assert_eq!(player.pos, player_spawn_point());
    }

    #[test]
    fn test_kill_awards_multiplied_score() {
        let mut state = quiet_state();
        state.store.add(Entity::enemy(EnemyType::Basic, Vec2::new(600.0, 300.0), Motion::Drift, 1.0e9));
        state.store.add(Entity::bullet(Owner::Player, Vec2::new(600.0, 310.0), Vec2::ZERO, 1));
        state.store.merge_pending();
        tick(&mut state, &TickInput::default(), FRAME_MS);
        // One hit raises the multiplier to 1.1 before the kill is scored
        assert_eq!(state.ledger.score(), 110);
        assert_eq!(state.store.live_count(Kind::Enemy), 0);
        // Explosion merged at the end of the tick
        assert_eq!(state.store.live_count(Kind::Explosion), 1);
    }

    #[test]
    fn test_boss_cycle_and_aimed_stream_on_level_clock() {
        let mut state = quiet_state();
        let mut boss = Entity::enemy(
            EnemyType::Boss,
            Vec2::new(900.0, 300.0),
            Motion::Hover {
                target: Vec2::new(900.0, 300.0),
            },
            1.0,
        );
        if let Some(e) = boss.as_enemy_mut() {
            e.attack_cycle = 1;
        }
        state.store.add(boss);
        state.store.merge_pending();

        tick(&mut state, &TickInput::default(), FRAME_MS);
        assert_eq!(state.effects.len(), 5);
        assert_eq!(state.store.live_count(Kind::EnemyBullet), 0);
        for _ in 0..30 {
            tick(&mut state, &TickInput::default(), FRAME_MS);
        }
        assert!(state.effects.is_empty());
        assert_eq!(state.store.live_count(Kind::EnemyBullet), 5);
        assert_eq!(state.store.live(Kind::Enemy).next().unwrap().as_enemy().unwrap().attack_cycle, 2);
    }

    #[test]
    fn test_level_clear_bonus_and_transition() {
        let level = LevelDescriptor {
            waves: vec![WaveSpec {
                trigger_ms: 0.0,
                groups: vec![GroupSpec {
                    enemy_type: "basic".to_string(),
                    count: 1,
                    pattern: "straight".to_string(),
                    spacing_ms: 0.0,
                }],
            }],
            ..quiet_level(1000.0)
        };
        let mut state = GameState::new(9, Settings::default(), vec![level.clone(), level]).unwrap();
        let idle = TickInput::default();

        // Boss warning at 800ms, boss 2s later
        for _ in 0..400 {
            if state.director.phase() == LevelPhase::BossActive {
                break;
            }
            tick(&mut state, &idle, FRAME_MS);
        }
        assert_eq!(state.director.phase(), LevelPhase::BossActive);
        state.store.for_each_mut(Kind::Enemy, |e| e.alive = false);
        tick(&mut state, &idle, FRAME_MS);
        assert_eq!(state.phase, GamePhase::LevelClear);
        let bonus = state.drain_events().into_iter().find_map(|e| match e {
            GameEvent::LevelCleared { bonus, .. } => Some(bonus),
            _ => None,
        });
        assert!(bonus.is_some_and(|b| b > 9_000 && b < 10_000));

        for _ in 0..200 {
            tick(&mut state, &idle, FRAME_MS);
        }
        assert_eq!(state.level_index, 1);
        assert_eq!(state.phase, GamePhase::Playing);
    }

    #[test]
    fn test_pickup_awards_flat_score() {
        let mut state = quiet_state();
        let center = state.store.player().unwrap().center();
        state
            .store
            .add(Entity::power_up(PowerUpKind::Speed, center, 10_000.0));
        state.store.merge_pending();
        tick(&mut state, &TickInput::default(), FRAME_MS);
        assert_eq!(state.ledger.score(), 500);
        assert!(state.store.player().unwrap().as_pilot().unwrap().speed_boost_ms > 0.0);
    }

    fn hovering_boss(pos: Vec2, shoot_timer_ms: f64) -> Entity {
        Entity::enemy(EnemyType::Boss, pos, Motion::Hover { target: pos }, shoot_timer_ms)
    }

    fn pause_input() -> TickInput {
        TickInput {
            pause_requested: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_boss_chain_explosions_follow_level_clock() {
        let mut state = quiet_state();
        let mut boss = hovering_boss(Vec2::new(900.0, 300.0), 1.0e9);
        boss.as_enemy_mut().unwrap().health = 1;
        state.store.add(boss);
        state.store.add(Entity::bullet(Owner::Player, Vec2::new(950.0, 340.0), Vec2::ZERO, 1));
        state.store.merge_pending();
        let idle = TickInput::default();

        tick(&mut state, &idle, FRAME_MS);
        assert_eq!(state.store.live_count(Kind::Enemy), 0);
        assert_eq!(state.effects.len(), 6);

        // Paused ticks leave the queue untouched
        tick(&mut state, &pause_input(), FRAME_MS);
        for _ in 0..60 {
            tick(&mut state, &idle, FRAME_MS);
        }
        assert_eq!(state.effects.len(), 6);

        tick(&mut state, &pause_input(), FRAME_MS);
        tick(&mut state, &idle, FRAME_MS);
        assert_eq!(state.effects.len(), 5);
        assert!(state.store.live_count(Kind::Explosion) >= 1);

        // Five more blasts 150ms apart
        for _ in 0..46 {
            tick(&mut state, &idle, FRAME_MS);
        }
        assert!(state.effects.is_empty());
    }

    #[test]
    fn test_boss_phase_two_shoots_faster() {
        let mut state = quiet_state();
        let calm = hovering_boss(Vec2::new(900.0, 100.0), 1.0);
        let mut raging = hovering_boss(Vec2::new(900.0, 450.0), 1.0);
        raging.as_enemy_mut().unwrap().health = 14;
        let calm_id = state.store.add(calm);
        let raging_id = state.store.add(raging);
        state.store.merge_pending();

        tick(&mut state, &TickInput::default(), FRAME_MS);
        let calm = state.store.find(calm_id).unwrap().as_enemy().unwrap();
        assert_eq!(calm.boss_phase, 1);
        assert!(calm.shoot_timer_ms >= 1000.0);
        let raging = state.store.find(raging_id).unwrap().as_enemy().unwrap();
        assert_eq!(raging.boss_phase, 2);
        assert_eq!(raging.shoot_timer_ms, BOSS_RAGE_INTERVAL_MS);
        // Both opened with the 16-bullet burst
        assert_eq!(state.store.live_count(Kind::EnemyBullet), 32);
    }

    #[test]
    fn test_power_up_drifts_and_expires() {
        let mut state = quiet_state();
        let id = state.store.add(Entity::power_up(PowerUpKind::Shield, Vec2::new(640.0, 100.0), 100.0));
        state.store.merge_pending();
        let start = state.store.find(id).unwrap().pos;

        tick(&mut state, &TickInput::default(), FRAME_MS);
        let moved = state.store.find(id).unwrap().pos;
        assert!(moved.x < start.x);
        assert_eq!(moved.y, start.y);

        for _ in 0..10 {
            tick(&mut state, &TickInput::default(), FRAME_MS);
        }
        assert_eq!(state.store.live_count(Kind::PowerUp), 0);
    }

    #[test]
    fn test_power_up_culled_past_left_edge() {
        let mut state = quiet_state();
        state
            .store
            .add(Entity::power_up(PowerUpKind::Bomb, Vec2::new(-CULL_PADDING - 10.0, 100.0), 1.0e9));
        state.store.merge_pending();
        for _ in 0..5 {
            tick(&mut state, &TickInput::default(), FRAME_MS);
        }
        assert_eq!(state.store.live_count(Kind::PowerUp), 0);
    }

    #[test]
    fn test_bullets_culled_off_screen() {
        let mut state = quiet_state();
        state.store.add(Entity::bullet(
            Owner::Player,
            Vec2::new(WORLD_WIDTH + CULL_PADDING - 5.0, 300.0),
            Vec2::new(PLAYER_BULLET_SPEED, 0.0),
            1,
        ));
        state.store.add(Entity::bullet(
            Owner::Enemy,
            Vec2::new(600.0, -CULL_PADDING - 5.0),
            Vec2::new(0.0, -ENEMY_BULLET_SPEED),
            1,
        ));
        state.store.merge_pending();
        tick(&mut state, &TickInput::default(), FRAME_MS);
        assert_eq!(state.store.live_count(Kind::PlayerBullet), 0);
        assert_eq!(state.store.live_count(Kind::EnemyBullet), 0);
    }

    #[test]
    fn test_enemies_not_culled_past_right_edge() {
        let mut state = quiet_state();
        let incoming = state.store.add(Entity::enemy(
            EnemyType::Basic,
            Vec2::new(WORLD_WIDTH + CULL_PADDING + 50.0, 300.0),
            Motion::Drift,
            1.0e9,
        ));
        state.store.add(Entity::enemy(
            EnemyType::Basic,
            Vec2::new(600.0, WORLD_HEIGHT + CULL_PADDING + 10.0),
            Motion::Drift,
            1.0e9,
        ));
        state.store.add(Entity::enemy(
            EnemyType::Basic,
            Vec2::new(-CULL_PADDING - 40.0, 300.0),
            Motion::Drift,
            1.0e9,
        ));
        state.store.merge_pending();

        tick(&mut state, &TickInput::default(), FRAME_MS);
        let ids: Vec<u32> = state.store.live(Kind::Enemy).map(|e| e.id).collect();
        assert_eq!(ids, vec![incoming]);
        assert!(state.store.find(incoming).unwrap().pos.x < WORLD_WIDTH + CULL_PADDING + 50.0);
    }

    #[test]
    fn test_homing_bullet_turns_toward_player() {
        let mut state = quiet_state();
        let player_id = state.store.player().unwrap().id;
        let mut missile = Entity::bullet(
            Owner::Enemy,
            Vec2::new(600.0, 100.0),
            Vec2::new(-ENEMY_BULLET_SPEED, 0.0),
            1,
        );
        missile.as_bullet_mut().unwrap().homing = Some(Homing {
            target: player_id,
            turn_rate: 0.05,
        });
        let missile_id = state.store.add(missile);
        let plain_id = state.store.add(Entity::bullet(
            Owner::Enemy,
            Vec2::new(600.0, 600.0),
            Vec2::new(-ENEMY_BULLET_SPEED, 0.0),
            1,
        ));
        state.store.merge_pending();

        tick(&mut state, &TickInput::default(), FRAME_MS);
        // Player sits below the missile
        let missile = state.store.find(missile_id).unwrap();
        assert!(missile.vel.y > 0.0);
        assert!(missile.vel.x < 0.0);
        assert_eq!(state.store.find(plain_id).unwrap().vel, Vec2::new(-ENEMY_BULLET_SPEED, 0.0));
    }

    #[test]
    fn test_wave_bullet_follows_sine_of_x() {
        let mut state = quiet_state();
        let wave = WaveMotion {
            amplitude: 50.0,
            frequency: 0.1,
            phase: 0.0,
            base_y: 200.0,
        };
        let mut bullet = Entity::bullet(
            Owner::Enemy,
            Vec2::new(800.0, 200.0),
            Vec2::new(-ENEMY_BULLET_SPEED, 0.0),
            1,
        );
        bullet.as_bullet_mut().unwrap().wave = Some(wave);
        let id = state.store.add(bullet);
        state.store.merge_pending();

        for _ in 0..3 {
            tick(&mut state, &TickInput::default(), FRAME_MS);
            let b = state.store.find(id).unwrap();
            let expected = wave.base_y + (b.pos.x * wave.frequency + wave.phase).sin() * wave.amplitude;
            assert!((b.pos.y - expected).abs() < 1e-3);
        }
        let x = state.store.find(id).unwrap().pos.x;
        assert!((x - (800.0 - ENEMY_BULLET_SPEED * 0.05)).abs() < 0.01);
    }

    #[test]
    fn test_kill_crossing_threshold_grants_life() {
        let settings = Settings {
            powerup_drop_chance: 0.0,
            extra_life_every: 100,
            ..Settings::default()
        };
        let mut state = GameState::new(5, settings, vec![quiet_level(1.0e9)]).unwrap();
        state.store.add(Entity::enemy(EnemyType::Basic, Vec2::new(600.0, 300.0), Motion::Drift, 1.0e9));
        state.store.add(Entity::bullet(Owner::Player, Vec2::new(600.0, 310.0), Vec2::ZERO, 1));
        state.store.merge_pending();

        tick(&mut state, &TickInput::default(), FRAME_MS);
        assert_eq!(state.ledger.score(), 110);
        assert_eq!(state.store.player().unwrap().as_pilot().unwrap().lives, 4);
        assert!(
            state
                .drain_events()
                .iter()
                .any(|e| matches!(e, GameEvent::ExtraLife { lives: 4 }))
        );
    }

    #[test]
    fn test_simulation_is_deterministic() {
        let run = || {
            let mut sim = Simulation::new(GameState::with_builtin_campaign(2024).unwrap());
            let input = TickInput {
                move_vector: Vec2::new(0.0, 0.3),
                firing: true,
                pause_requested: false,
            };
            for _ in 0..1200 {
                sim.advance(16.7, &input);
            }
            (sim.state.ledger.score(), sim.state.store.len(), sim.state.snapshots())
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_simulation_pause_does_not_catch_up() {
        let mut sim = Simulation::new(quiet_state());
        let idle = TickInput::default();
        sim.advance(50.0, &idle);
        let ticks = sim.state.time_ticks;
        let pause = TickInput {
            pause_requested: true,
            ..Default::default()
        };
        sim.advance(16.0, &pause);
        for _ in 0..300 {
            assert_eq!(sim.advance(16.0, &idle), 0);
        }
        assert_eq!(sim.state.time_ticks, ticks);
        assert_eq!(sim.advance(16.0, &pause), 0);
        assert_eq!(sim.state.phase, GamePhase::Playing);
        // The frame right after the toggle already runs
        assert!(sim.advance(20.0, &idle) >= 1);
    }
}
