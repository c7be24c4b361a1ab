//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by kind, then spawn order)
//! - No rendering or platform dependencies

pub mod clock;
pub mod collision;
pub mod director;
pub mod entity;
pub mod grid;
pub mod pattern;
pub mod schedule;
pub mod score;
pub mod state;
pub mod store;
pub mod tick;

pub use clock::FrameClock;
pub use collision::{Contact, HitEvent, KillCause, Resolver};
pub use director::{DirectorEvent, LevelPhase, SpawnDirector};
pub use entity::{Aabb, Body, EnemyType, Entity, Faction, FireStyle, Kind, Motion, Owner, PowerUpKind};
pub use grid::SpatialGrid;
pub use pattern::Pattern;
pub use schedule::Schedule;
pub use score::{Award, ScoreLedger};
pub use state::{AudioCue, Effect, EntitySnapshot, GameEvent, GamePhase, GameState, Hud};
pub use store::{EntityStore, Handle};
pub use tick::{Simulation, TickInput, tick, toggle_pause};
