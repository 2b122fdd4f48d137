//! Core simulation engine for shoal: flocking creatures foraging in a bounded arena.
//!
//! The host owns the frame loop and the arena extent. Once per frame it calls
//! [`World::tick`], which runs feed, steer and integrate for every agent in
//! insertion order, then tries to spawn food. Everything the host draws comes
//! out of [`World::snapshot`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod agent;
pub mod config;
pub mod food;
pub mod geometry;
pub mod lifecycle;
pub mod population;
pub mod snapshot;
pub mod world;

pub use agent::{Agent, SteeringForces};
pub use config::{
    AgentTraits, FoodConfig, InheritanceConfig, LifecycleMode, PopulationConfig, ShoalConfig,
    Span, UpdateOrder,
};
pub use food::Food;
pub use geometry::{Arena, Vec2};
pub use lifecycle::{EnergyGated, Immortal, PopulationPolicy};
pub use population::{AgentArena, AgentId};
pub use snapshot::{AgentView, FoodView, RenderFrame};
pub use world::World;

/// Errors raised while building or reconfiguring a world.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum WorldError {
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// A configuration document could not be decoded.
    #[error("configuration parse error: {0}")]
    ConfigParse(String),
    /// The arena leaves no interior inside the configured margin.
    #[error("arena {width}x{height} leaves no room inside a margin of {margin}")]
    ArenaTooSmall { width: f32, height: f32, margin: f32 },
}

/// Simulation clock (ticks processed since the world was built).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}

/// Lineage counter (agents produced by reproduction increment this).
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct Generation(pub u32);

impl Generation {
    /// Advances to the next lineage generation.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

/// What happened during one call to [`World::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickEvents {
    pub tick: Tick,
    /// Food items eaten this tick.
    pub meals: usize,
    /// Position of the food item spawned this tick, if any.
    pub food_spawned: Option<Vec2>,
    pub births: usize,
    pub deaths: usize,
}

/// Aggregate statistics recorded after each tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickSummary {
    pub tick: Tick,
    pub agent_count: usize,
    pub food_count: usize,
    pub births: usize,
    pub deaths: usize,
    pub total_energy: f32,
    pub average_energy: f32,
}
