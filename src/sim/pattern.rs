//! Parametric movement patterns
//!
//! A pattern maps (origin, time since spawn, formation index) to a position.
//! Evaluation is pure: no hidden state, no RNG draws. Entities store the
//! pattern and their time origin and re-evaluate each tick, so positions never
//! accumulate drift.
//!
//! Time is in milliseconds; speeds below are in world units per millisecond.

use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    Straight,
    Sine,
    ZigZag,
    Circle,
    Dive,
    Wave,
    Spiral,
    Formation,
    Pincer,
    Column,
    Crossfire,
    /// Jittery swarm; jitter comes from a per-entity seed fixed at spawn
    Storm { seed: u32 },
}

impl Pattern {
    /// Resolve a level-data pattern name. `seed` only matters for storms.
    pub fn from_name(name: &str, seed: u32) -> Option<Self> {
        let pattern = match name.to_lowercase().as_str() {
            "straight" | "fast_straight" => Pattern::Straight,
            "sine" => Pattern::Sine,
            "zigzag" | "zig_zag" => Pattern::ZigZag,
            "circle" => Pattern::Circle,
            "dive" => Pattern::Dive,
            "wave" => Pattern::Wave,
            "spiral" | "pinwheel" => Pattern::Spiral,
            "formation" | "escort" => Pattern::Formation,
            "pincer" => Pattern::Pincer,
            "column" => Pattern::Column,
            "crossfire" => Pattern::Crossfire,
            "storm" | "swarm" | "scatter" | "final_assault" => Pattern::Storm { seed },
            _ => return None,
        };
        Some(pattern)
    }

    /// Same pattern with a different storm seed (no-op for the others)
    pub fn reseeded(self, seed: u32) -> Self {
        match self {
            Pattern::Storm { .. } => Pattern::Storm { seed },
            other => other,
        }
    }

    /// Position at `t_ms` after spawn. Negative times evaluate as zero.
    pub fn evaluate(&self, origin: Vec2, t_ms: f64, index: u32) -> Vec2 {
        let t = t_ms.max(0.0) as f32;
        let i = index as f32;
        let (x0, y0) = (origin.x, origin.y);

        let (x, y) = match *self {
            Pattern::Straight => (x0 - t * 0.1, y0),
            Pattern::Sine => (x0 - t * 0.1, y0 + (t * 0.003).sin() * 50.0),
            Pattern::ZigZag => {
                let up = (t / 500.0).floor() as i64 % 2 == 1;
                (x0 - t * 0.1, y0 + if up { 50.0 } else { -50.0 })
            }
            Pattern::Circle => {
                let a = t * 0.002 + i;
                (x0 + a.cos() * 100.0 - t * 0.05, y0 + a.sin() * 100.0)
            }
            Pattern::Dive => {
                let drop = if t < 1000.0 { 0.0 } else { (t - 1000.0) * 0.1 };
                (x0 - t * 0.15, y0 + drop)
            }
            Pattern::Wave => (x0 - t * 0.12, y0 + (t * 0.004 + i * 0.5).sin() * 80.0),
            Pattern::Spiral => {
                let radius = 50.0 + t * 0.02;
                let a = t * 0.003 + i * std::f32::consts::PI;
                (x0 + a.cos() * radius - t * 0.08, y0 + a.sin() * radius)
            }
            Pattern::Formation => {
                let row = (index / 2) as f32;
                let col = (index % 2) as f32;
                (x0 - t * 0.1 - row * 50.0, y0 + col * 60.0 - 30.0)
            }
            Pattern::Pincer => {
                let y = if index % 2 == 0 {
                    y0 - 100.0 + t * 0.05
                } else {
                    y0 + 100.0 - t * 0.05
                };
                (x0 - t * 0.1, y)
            }
            Pattern::Column => (x0 - t * 0.08 - i * 100.0, y0),
            Pattern::Crossfire => {
                let a = (i / 6.0) * std::f32::consts::PI - std::f32::consts::FRAC_PI_2;
                (x0 - t * 0.12 + a.cos() * t * 0.05, y0 + a.sin() * t * 0.05)
            }
            Pattern::Storm { seed } => {
                let jitter = Vec2::new(
                    value_noise(seed, index, 0, t / 120.0),
                    value_noise(seed, index, 1, t / 120.0),
                ) * 10.0;
                (
                    x0 - t * 0.15 + jitter.x,
                    y0 + (t * 0.005 + i).sin() * 40.0 + jitter.y,
                )
            }
        };
        Vec2::new(x, y)
    }
}

/// Integer hash mixing seed, index, channel and lattice cell
fn lattice(seed: u32, index: u32, channel: u32, cell: i64) -> f32 {
    let mut h = seed
        .wrapping_mul(2654435761)
        .wrapping_add(index.wrapping_mul(7919))
        .wrapping_add(channel.wrapping_mul(104729))
        .wrapping_add((cell as u32).wrapping_mul(40503));
    h ^= h >> 15;
    h = h.wrapping_mul(2246822519);
    h ^= h >> 13;
    h = h.wrapping_mul(3266489917);
    h ^= h >> 16;
    (h % 2001) as f32 / 1000.0 - 1.0 // -1..=1
}

/// Smooth noise in [-1, 1] interpolated between lattice cells
fn value_noise(seed: u32, index: u32, channel: u32, x: f32) -> f32 {
    let cell = x.floor();
    let frac = x - cell;
    let a = lattice(seed, index, channel, cell as i64);
    let b = lattice(seed, index, channel, cell as i64 + 1);
    let s = frac * frac * (3.0 - 2.0 * frac);
    a + (b - a) * s
}
