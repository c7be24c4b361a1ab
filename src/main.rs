//! Starlance headless runner
//!
//! Plays a campaign with a simple autopilot and logs what happens. Useful for
//! soak-testing levels and settings without a renderer.
//!
//! Usage: `starlance [seed] [settings.json] [campaign.json]`

use std::error::Error;
use std::fs;

use glam::Vec2;

use starlance::consts::FRAME_MS;
use starlance::level::{LevelDescriptor, builtin_campaign};
use starlance::settings::Settings;
use starlance::sim::{GameEvent, GamePhase, GameState, HitEvent, Kind, Simulation, TickInput};

/// Host frames before the runner gives up (about 30 minutes at 60Hz)
const MAX_FRAMES: u64 = 60 * 60 * 30;

/// Dodge vertically toward the lane furthest from any enemy bullet, always firing
fn autopilot(state: &GameState) -> TickInput {
    let Some(player) = state.store.player() else {
        return TickInput::default();
    };
    let center = player.center();
    let threat = state
        .store
        .live(Kind::EnemyBullet)
        .filter(|b| b.pos.x > center.x - 20.0 && b.pos.x < center.x + 250.0)
        .map(|b| b.center())
        .min_by(|a, b| a.distance_squared(center).total_cmp(&b.distance_squared(center)));
    let dy = match threat {
        Some(bullet) if (bullet.y - center.y).abs() < 60.0 => {
            if bullet.y > center.y {
                -1.0
            } else {
                1.0
            }
        }
        _ => (state.time_ticks as f32 * 0.02).sin() * 0.5,
    };
    TickInput {
        move_vector: Vec2::new(0.0, dy),
        firing: true,
        pause_requested: false,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(s) => s.parse::<u64>()?,
        None => 0x5EED,
    };
    let settings = match args.next() {
        Some(path) => Settings::from_json(&fs::read_to_string(path)?)?,
        None => Settings::default(),
    };
    let campaign = match args.next() {
        Some(path) => LevelDescriptor::campaign_from_json(&fs::read_to_string(path)?)?,
        None => builtin_campaign(),
    };

    log::info!("Starlance starting with seed {seed}");
    let mut sim = Simulation::new(GameState::new(seed, settings, campaign)?);

    let mut kills = 0u32;
    let mut deaths = 0u32;
    for _ in 0..MAX_FRAMES {
        let input = autopilot(&sim.state);
        sim.advance(FRAME_MS, &input);
        for event in sim.state.drain_events() {
            match event {
                GameEvent::Collision(HitEvent::EnemyDestroyed { .. }) => kills += 1,
                GameEvent::Collision(HitEvent::PlayerKilled { .. }) => deaths += 1,
                GameEvent::ComboMilestone { count, multiplier } => {
                    log::debug!("Combo {count} (x{multiplier:.1})");
                }
                GameEvent::BossWarning => log::info!("Warning: boss approaching"),
                _ => {}
            }
        }
        if matches!(sim.state.phase, GamePhase::GameOver | GamePhase::Complete) {
            break;
        }
    }

    let hud = sim.state.hud();
    log::info!(
        "Finished in phase {:?} on level {}: score {}, {kills} kills, {deaths} deaths, {} ticks",
        sim.state.phase,
        sim.state.level_index + 1,
        hud.score,
        sim.state.time_ticks
    );
    Ok(())
}
