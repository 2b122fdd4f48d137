//! World state and the per-tick update pipeline.

use rand::{Rng, SeedableRng, rngs::SmallRng};
use rayon::prelude::*;
use std::collections::{HashSet, VecDeque};
use std::fmt;
use tracing::{debug, trace, warn};

use crate::agent::{Agent, SteeringForces};
use crate::config::{ShoalConfig, UpdateOrder};
use crate::food::Food;
use crate::geometry::{Arena, Vec2};
use crate::lifecycle::{PopulationPolicy, policy_for};
use crate::population::{AgentArena, AgentId};
use crate::snapshot::{AgentView, FoodView, RenderFrame};
use crate::{Tick, TickEvents, TickSummary, WorldError};

/// Owns the agent population, the food supply and the RNG driving both.
pub struct World {
    config: ShoalConfig,
    arena: Arena,
    tick: Tick,
    rng: SmallRng,
    agents: AgentArena,
    food: Vec<Food>,
    policy: Box<dyn PopulationPolicy>,
    history: VecDeque<TickSummary>,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("config", &self.config)
            .field("arena", &self.arena)
            .field("tick", &self.tick)
            .field("agent_count", &self.agents.len())
            .field("food_count", &self.food.len())
            .field("policy", &self.policy.name())
            .finish()
    }
}

fn seeded_rng(config: &ShoalConfig) -> SmallRng {
    match config.rng_seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => {
            let seed: u64 = rand::random();
            SmallRng::seed_from_u64(seed)
        }
    }
}

fn check_arena(arena: &Arena, margin: f32) -> Result<(), WorldError> {
    if arena.fits_margin(margin) {
        Ok(())
    } else {
        Err(WorldError::ArenaTooSmall {
            width: arena.width,
            height: arena.height,
            margin,
        })
    }
}

fn warn_on_radius_order(config: &ShoalConfig) {
    if !config.traits.radii_ordered() {
        warn!(
            separation = config.traits.separation_radius,
            alignment = config.traits.alignment_radius,
            cohesion = config.traits.cohesion_radius,
            "perception radii are not ordered separation < alignment < cohesion",
        );
    }
}

impl World {
    /// Empty world seeded from `config.rng_seed` (or OS entropy when absent).
    pub fn new(config: ShoalConfig, arena: Arena) -> Result<Self, WorldError> {
        let rng = seeded_rng(&config);
        Self::with_rng(config, arena, rng)
    }

    /// Empty world drawing all randomness from the supplied generator.
    pub fn with_rng(config: ShoalConfig, arena: Arena, rng: SmallRng) -> Result<Self, WorldError> {
        config.validate()?;
        check_arena(&arena, config.arena_margin)?;
        warn_on_radius_order(&config);
        let policy = policy_for(config.lifecycle);
        let history_capacity = config.history_capacity;
        Ok(Self {
            agents: AgentArena::with_capacity(config.population.initial_count),
            food: Vec::with_capacity(config.food.max_food),
            config,
            arena,
            tick: Tick::zero(),
            rng,
            policy,
            history: VecDeque::with_capacity(history_capacity),
        })
    }

    /// Adds `count` randomized agents built from the population ranges and default traits.
    pub fn populate(&mut self, count: usize) -> Vec<AgentId> {
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let agent = Agent::spawn_random(
                &self.config.population,
                self.config.traits,
                &self.arena,
                self.config.arena_margin,
                &mut self.rng,
            );
            ids.push(self.agents.insert(agent));
        }
        debug!(count, population = self.agents.len(), "populated world");
        ids
    }

    /// Appends an agent to the update order. There is no population cap.
    pub fn add_agent(&mut self, agent: Agent) -> AgentId {
        self.agents.insert(agent)
    }

    /// Remove an agent by handle, returning its last state.
    pub fn remove_agent(&mut self, id: AgentId) -> Option<Agent> {
        self.agents.remove(id)
    }

    fn stage_interleaved(&mut self) -> usize {
        let arena = self.arena;
        let margin = self.config.arena_margin;
        let mut meals = 0;
        for index in 0..self.agents.len() {
            let agents = self.agents.as_mut_slice();
            if agents[index].feed(&mut self.food) {
                meals += 1;
                trace!(index, energy = agents[index].energy, "agent fed");
            }
            let forces = {
                let current: &[Agent] = agents;
                current[index].compute_steering(current, &self.food, &mut self.rng)
            };
            let agent = &mut agents[index];
            agent.apply_steering(&forces);
            agent.integrate(&arena, margin);
        }
        meals
    }

    fn stage_synchronous(&mut self) -> usize {
        let arena = self.arena;
        let margin = self.config.arena_margin;
        let agents = self.agents.as_mut_slice();
        let mut meals = 0;
        for (index, agent) in agents.iter_mut().enumerate() {
            if agent.feed(&mut self.food) {
                meals += 1;
                trace!(index, energy = agent.energy, "agent fed");
            }
        }

        let wander: Vec<Vec2> = (0..agents.len())
            .map(|_| Agent::draw_wander(&mut self.rng))
            .collect();
        let food = &self.food;
        let forces: Vec<SteeringForces> = {
            let frozen: &[Agent] = agents;
            frozen
                .par_iter()
                .zip(wander.par_iter())
                .map(|(agent, direction)| agent.steering_with_wander(frozen, food, *direction))
                .collect()
        };

        for (agent, force) in agents.iter_mut().zip(&forces) {
            agent.apply_steering(force);
            agent.integrate(&arena, margin);
        }
        meals
    }

    /// Bernoulli trial for one new food item while below capacity.
    ///
    /// Returns where the item landed. No random draw happens at capacity.
    pub fn spawn_food(&mut self) -> Option<Vec2> {
        let food_config = self.config.food;
        if self.food.len() >= food_config.max_food {
            return None;
        }
        if self.rng.random::<f32>() >= food_config.spawn_probability {
            return None;
        }
        let position = self
            .arena
            .random_point(self.config.arena_margin, &mut self.rng);
        self.food.push(Food::new(position, food_config.energy_value));
        trace!(x = position.x, y = position.y, food = self.food.len(), "food spawned");
        Some(position)
    }

    fn stage_population(&mut self) -> (usize, usize) {
        let dead: HashSet<AgentId> = self
            .agents
            .iter_with_handles()
            .filter(|(_, agent)| self.policy.is_expired(agent))
            .map(|(id, _)| id)
            .collect();
        let deaths = self.agents.remove_many(&dead);

        let inheritance = self.config.inheritance;
        let mut population = self.agents.len();
        let mut children = Vec::new();
        for parent in self.agents.as_mut_slice() {
            if self.policy.wants_offspring(parent, population) {
                children.push(parent.reproduce(&inheritance, &mut self.rng));
                population += 1;
            }
        }
        let births = children.len();
        for child in children {
            self.agents.insert(child);
        }

        if births > 0 || deaths > 0 {
            debug!(
                policy = self.policy.name(),
                births,
                deaths,
                population = self.agents.len(),
                "population changed",
            );
        }
        (births, deaths)
    }

    fn record_summary(&mut self, events: &TickEvents) {
        let agent_count = self.agents.len();
        let total_energy: f32 = self.agents.iter().map(|agent| agent.energy).sum();
        let average_energy = if agent_count > 0 {
            total_energy / agent_count as f32
        } else {
            0.0
        };
        if self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(TickSummary {
            tick: events.tick,
            agent_count,
            food_count: self.food.len(),
            births: events.births,
            deaths: events.deaths,
            total_energy,
            average_energy,
        });
    }

    /// Execute one simulation tick.
    ///
    /// Agents are visited in insertion order. Under [`UpdateOrder::Interleaved`]
    /// each agent feeds, steers and integrates before the next one is looked at,
    /// so agent `i` sees the post-tick state of agents `0..i`. Food spawning and
    /// the population policy run after the agent pass.
    pub fn tick(&mut self) -> TickEvents {
        let meals = match self.config.update_order {
            UpdateOrder::Interleaved => self.stage_interleaved(),
            UpdateOrder::Synchronous => self.stage_synchronous(),
        };
        let food_spawned = self.spawn_food();
        let (births, deaths) = self.stage_population();
        self.tick = self.tick.next();

        let events = TickEvents {
            tick: self.tick,
            meals,
            food_spawned,
            births,
            deaths,
        };
        self.record_summary(&events);
        events
    }

    /// Replace the configuration (for hot edits from the host).
    ///
    /// Existing agents keep their own traits; the population policy is rebuilt
    /// only when the lifecycle mode changes.
    pub fn set_config(&mut self, config: ShoalConfig) -> Result<(), WorldError> {
        config.validate()?;
        check_arena(&self.arena, config.arena_margin)?;
        warn_on_radius_order(&config);
        if config.lifecycle != self.config.lifecycle {
            self.policy = policy_for(config.lifecycle);
        }
        while self.history.len() > config.history_capacity {
            self.history.pop_front();
        }
        debug!(tick = self.tick.0, "configuration replaced");
        self.config = config;
        Ok(())
    }

    /// Adopt a new arena extent from the host. Food left outside the new interior is dropped.
    pub fn set_arena(&mut self, arena: Arena) -> Result<(), WorldError> {
        let margin = self.config.arena_margin;
        check_arena(&arena, margin)?;
        let (lo, hi) = arena.interior(margin);
        let before = self.food.len();
        self.food.retain(|item| {
            (lo.x..=hi.x).contains(&item.position.x) && (lo.y..=hi.y).contains(&item.position.y)
        });
        debug!(
            width = arena.width,
            height = arena.height,
            dropped_food = before - self.food.len(),
            "arena resized",
        );
        self.arena = arena;
        Ok(())
    }

    /// Install a custom growth/death policy.
    pub fn set_population_policy(&mut self, policy: Box<dyn PopulationPolicy>) {
        debug!(policy = policy.name(), "population policy installed");
        self.policy = policy;
    }

    #[must_use]
    pub fn population_policy(&self) -> &dyn PopulationPolicy {
        self.policy.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &ShoalConfig {
        &self.config
    }

    #[must_use]
    pub const fn arena(&self) -> Arena {
        self.arena
    }

    /// Current simulation tick.
    #[must_use]
    pub const fn tick_count(&self) -> Tick {
        self.tick
    }

    /// Borrow the world RNG mutably for deterministic sampling.
    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    /// Read-only access to the agents in update order.
    #[must_use]
    pub fn agents(&self) -> &AgentArena {
        &self.agents
    }

    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id)
    }

    #[must_use]
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id)
    }

    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn food(&self) -> &[Food] {
        &self.food
    }

    /// Mutable access to the food supply (for scripted scenarios).
    #[must_use]
    pub fn food_mut(&mut self) -> &mut Vec<Food> {
        &mut self.food
    }

    #[must_use]
    pub fn food_count(&self) -> usize {
        self.food.len()
    }

    /// Iterate over retained tick summaries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &TickSummary> {
        self.history.iter()
    }

    /// Drawable copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> RenderFrame {
        RenderFrame {
            tick: self.tick,
            arena: self.arena,
            agents: self
                .agents
                .iter_with_handles()
                .map(|(id, agent)| AgentView::new(id, agent))
                .collect(),
            food: self.food.iter().map(FoodView::from).collect(),
        }
    }
}
