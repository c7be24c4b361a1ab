//! Starlance - a side-scrolling arcade shooter simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (clock, entities, collisions, spawning)
//! - `level`: Level descriptors and the built-in campaign
//! - `settings`: Data-driven game balance
//! - `error`: Errors for the few fallible loading paths
//!
//! Rendering, audio playback, input devices and persistence live outside this
//! crate. The core consumes [`sim::TickInput`] and publishes snapshots, HUD
//! values and [`sim::GameEvent`]s.

pub mod error;
pub mod level;
pub mod settings;
pub mod sim;

pub use error::{LevelError, SettingsError};
pub use level::LevelDescriptor;
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Nominal simulation step (60 Hz, milliseconds)
    pub const FRAME_MS: f64 = 1000.0 / 60.0;
    /// Host deltas above this are treated as a stall and replaced by one frame
    pub const STALL_THRESHOLD_MS: f64 = 100.0;
    /// Maximum substeps per host frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World dimensions
    pub const WORLD_WIDTH: f32 = 1280.0;
    pub const WORLD_HEIGHT: f32 = 720.0;
    /// Entities further than this outside the world are culled
    pub const CULL_PADDING: f32 = 100.0;

    /// Spatial grid bucket size (world units)
    pub const GRID_CELL_SIZE: f32 = 100.0;

    /// Player ship defaults
    pub const PLAYER_WIDTH: f32 = 48.0;
    pub const PLAYER_HEIGHT: f32 = 32.0;
    pub const PLAYER_SPAWN_X: f32 = 100.0;
    /// Player speed in units/second (normal and boosted)
    pub const PLAYER_SPEED: f32 = 300.0;
    pub const PLAYER_BOOST_SPEED: f32 = 480.0;

    /// Bullet defaults (units/second)
    pub const PLAYER_BULLET_SPEED: f32 = 720.0;
    pub const PLAYER_BULLET_SIZE: (f32, f32) = (16.0, 4.0);
    pub const ENEMY_BULLET_SPEED: f32 = 300.0;
    pub const ENEMY_BULLET_SIZE: (f32, f32) = (8.0, 8.0);

    /// Power-up defaults
    pub const POWERUP_SIZE: f32 = 24.0;
    pub const POWERUP_DRIFT: f32 = 60.0;

    /// Explosion lifetime (ms)
    pub const EXPLOSION_MS: f64 = 300.0;

    /// Highest player weapon level
    pub const MAX_WEAPON_LEVEL: u8 = 5;
}

/// Axis-aligned rectangle overlap (strict, touching edges do not overlap)
#[inline]
pub fn rects_overlap(a_min: Vec2, a_size: Vec2, b_min: Vec2, b_size: Vec2) -> bool {
    a_min.x < b_min.x + b_size.x
        && a_min.x + a_size.x > b_min.x
        && a_min.y < b_min.y + b_size.y
        && a_min.y + a_size.y > b_min.y
}

/// Unit vector for an angle in radians
#[inline]
pub fn from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Angle from `from` to `to` in radians
#[inline]
pub fn angle_to(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}
