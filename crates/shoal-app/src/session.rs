use serde::Serialize;
use shoal_core::{Arena, RenderFrame, ShoalConfig, TickEvents, World, WorldError};
use tracing::{debug, info};

/// Lightweight status line for overlays and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub tick: u64,
    pub agent_count: usize,
    pub food_count: usize,
    pub running: bool,
}

/// A world plus the run/pause switch the host frame loop consults.
#[derive(Debug)]
pub struct Session {
    world: World,
    running: bool,
}

fn seeded_world(config: ShoalConfig, arena: Arena) -> Result<World, WorldError> {
    let count = config.population.initial_count;
    let mut world = World::new(config, arena)?;
    world.populate(count);
    Ok(world)
}

impl Session {
    /// Builds and populates a world, starting in the running state.
    pub fn new(config: ShoalConfig, arena: Arena) -> Result<Self, WorldError> {
        let world = seeded_world(config, arena)?;
        info!(
            agents = world.agent_count(),
            width = arena.width,
            height = arena.height,
            "session started",
        );
        Ok(Self {
            world,
            running: true,
        })
    }

    /// Advance one frame. Paused sessions leave the world untouched.
    pub fn frame(&mut self) -> Option<TickEvents> {
        if !self.running {
            return None;
        }
        Some(self.world.tick())
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Replace the world with a freshly populated one and pause.
    pub fn reset(&mut self) -> Result<(), WorldError> {
        let config = self.world.config().clone();
        let arena = self.world.arena();
        self.world = seeded_world(config, arena)?;
        self.running = false;
        debug!(agents = self.world.agent_count(), "session reset");
        Ok(())
    }

    /// Forward a host resize to the world.
    pub fn resize(&mut self, arena: Arena) -> Result<(), WorldError> {
        self.world.set_arena(arena)
    }

    #[must_use]
    pub fn status(&self) -> StatusReport {
        StatusReport {
            tick: self.world.tick_count().0,
            agent_count: self.world.agent_count(),
            food_count: self.world.food_count(),
            running: self.running,
        }
    }

    #[must_use]
    pub fn render_frame(&self) -> RenderFrame {
        self.world.snapshot()
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
