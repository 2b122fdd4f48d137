//! Creature state and the steering model that drives it.
//!
//! An [`Agent`] never holds references to the world or to its peers. Each tick
//! the world hands it read-only slices of the current population and food,
//! the agent answers with a [`SteeringForces`] breakdown, and only
//! [`Agent::integrate`], [`Agent::feed`] and [`Agent::reproduce`] mutate it.

use ordered_float::OrderedFloat;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Generation;
use crate::config::{AgentTraits, InheritanceConfig, PopulationConfig};
use crate::food::Food;
use crate::geometry::{Arena, Vec2};

/// Half-width of the box the raw wander direction is drawn from.
const WANDER_SPREAD: f32 = 0.5;

/// Weighted steering contributions computed for one agent in one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SteeringForces {
    pub separation: Vec2,
    pub alignment: Vec2,
    pub cohesion: Vec2,
    pub wander: Vec2,
    pub forage: Vec2,
}

impl SteeringForces {
    /// Sum of all contributions (mass is 1, so this is the acceleration delta).
    #[must_use]
    pub fn total(&self) -> Vec2 {
        self.separation + self.alignment + self.cohesion + self.wander + self.forage
    }

    /// Sum of the neighbour-driven contributions only.
    #[must_use]
    pub fn social(&self) -> Vec2 {
        self.separation + self.alignment + self.cohesion
    }
}

/// One simulated creature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Forces accumulated since the last integration; cleared by [`Agent::integrate`].
    pub acceleration: Vec2,
    pub max_speed: f32,
    /// Body size; doubles as the eating radius.
    pub size: f32,
    /// RGB channels in `[0, 1]`, carried for rendering and inheritance.
    pub color: [f32; 3],
    pub energy: f32,
    /// Ticks integrated since creation.
    pub age: u32,
    pub generation: Generation,
    pub traits: AgentTraits,
}

impl Agent {
    /// Creates an agent with a random initial velocity in `[-1, 1]` per axis.
    pub fn new<R: Rng + ?Sized>(
        position: Vec2,
        size: f32,
        max_speed: f32,
        color: [f32; 3],
        energy: f32,
        traits: AgentTraits,
        rng: &mut R,
    ) -> Self {
        let velocity = Vec2::new(rng.random_range(-1.0..=1.0), rng.random_range(-1.0..=1.0))
            .limit(max_speed);
        Self {
            position,
            velocity,
            acceleration: Vec2::ZERO,
            max_speed,
            size,
            color,
            energy,
            age: 0,
            generation: Generation::default(),
            traits,
        }
    }

    /// Randomized construction used when seeding a world.
    pub fn spawn_random<R: Rng + ?Sized>(
        population: &PopulationConfig,
        traits: AgentTraits,
        arena: &Arena,
        margin: f32,
        rng: &mut R,
    ) -> Self {
        let position = arena.random_point(margin, rng);
        let size = population.size.sample(rng);
        let max_speed = population.max_speed.sample(rng);
        let color = [
            population.color.sample(rng),
            population.color.sample(rng),
            population.color.sample(rng),
        ];
        let energy = population.energy.sample(rng);
        Self::new(position, size, max_speed, color, energy, traits, rng)
    }

    /// Computes this tick's steering against the supplied peers and food.
    ///
    /// `peers` may contain `self`; it is skipped by identity. Draws exactly two
    /// values from `rng` for the wander term regardless of the weights.
    pub fn compute_steering<R: Rng + ?Sized>(
        &self,
        peers: &[Agent],
        food: &[Food],
        rng: &mut R,
    ) -> SteeringForces {
        let wander = Self::draw_wander(rng);
        self.steering_with_wander(peers, food, wander)
    }

    /// Unweighted wander direction; draws two values from `rng`.
    pub fn draw_wander<R: Rng + ?Sized>(rng: &mut R) -> Vec2 {
        Vec2::random_direction(rng, WANDER_SPREAD)
    }

    /// Same as [`Agent::compute_steering`] with a pre-drawn wander direction.
    #[must_use]
    pub fn steering_with_wander(
        &self,
        peers: &[Agent],
        food: &[Food],
        wander_direction: Vec2,
    ) -> SteeringForces {
        let traits = &self.traits;
        SteeringForces {
            separation: self.separate(peers) * traits.separation_weight,
            alignment: self.align(peers) * traits.alignment_weight,
            cohesion: self.cohere(peers) * traits.cohesion_weight,
            wander: wander_direction.with_length(traits.wander_strength) * traits.wander_weight,
            forage: self.forage(food) * traits.forage_weight,
        }
    }

    fn others<'a>(&'a self, peers: &'a [Agent]) -> impl Iterator<Item = &'a Agent> + 'a {
        peers.iter().filter(move |other| !std::ptr::eq(*other, self))
    }

    fn separate(&self, peers: &[Agent]) -> Vec2 {
        let radius = self.traits.separation_radius;
        let mut steering = Vec2::ZERO;
        let mut count = 0usize;
        for other in self.others(peers) {
            let d = self.position.distance(other.position);
            // Coincident peers give no usable direction.
            if d > 0.0 && d < radius {
                steering += (self.position - other.position).normalize_or_zero() / d;
                count += 1;
            }
        }
        if count > 0 {
            steering /= count as f32;
        }
        if steering.length_squared() > 0.0 {
            (steering.with_length(self.max_speed) - self.velocity).limit(self.traits.max_force)
        } else {
            Vec2::ZERO
        }
    }

    fn align(&self, peers: &[Agent]) -> Vec2 {
        let radius = self.traits.alignment_radius;
        let mut sum = Vec2::ZERO;
        let mut count = 0usize;
        for other in self.others(peers) {
            if self.position.distance(other.position) < radius {
                sum += other.velocity;
                count += 1;
            }
        }
        if count == 0 {
            return Vec2::ZERO;
        }
        let average = sum / count as f32;
        (average.with_length(self.max_speed) - self.velocity).limit(self.traits.max_force)
    }

    fn cohere(&self, peers: &[Agent]) -> Vec2 {
        let radius = self.traits.cohesion_radius;
        let mut centroid = Vec2::ZERO;
        let mut count = 0usize;
        for other in self.others(peers) {
            if self.position.distance(other.position) < radius {
                centroid += other.position;
                count += 1;
            }
        }
        if count == 0 {
            return Vec2::ZERO;
        }
        self.seek(centroid / count as f32)
    }

    fn forage(&self, food: &[Food]) -> Vec2 {
        if !self.is_hungry() {
            return Vec2::ZERO;
        }
        match self.nearest_food(food) {
            Some((_, item)) => self.seek(item.position),
            None => Vec2::ZERO,
        }
    }

    /// Closest food item by Euclidean distance; ties go to the earliest item.
    #[must_use]
    pub fn nearest_food<'a>(&self, food: &'a [Food]) -> Option<(usize, &'a Food)> {
        food.iter()
            .enumerate()
            .min_by_key(|(_, item)| OrderedFloat(self.position.distance_squared(item.position)))
    }

    /// Steering toward `target` at full speed, capped at `max_force`. Zero when already there.
    #[must_use]
    pub fn seek(&self, target: Vec2) -> Vec2 {
        let offset = target - self.position;
        if offset.length_squared() <= 0.0 {
            return Vec2::ZERO;
        }
        (offset.with_length(self.max_speed) - self.velocity).limit(self.traits.max_force)
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.acceleration += force;
    }

    pub fn apply_steering(&mut self, forces: &SteeringForces) {
        self.apply_force(forces.total());
    }

    /// Advances one step: velocity, speed clamp, position, bounce, metabolism.
    pub fn integrate(&mut self, arena: &Arena, margin: f32) {
        self.velocity += self.acceleration;
        self.velocity = self.velocity.limit(self.max_speed);
        self.position += self.velocity;
        self.acceleration = Vec2::ZERO;
        arena.reflect(&mut self.position, &mut self.velocity, margin);
        self.energy -= self.traits.metabolism_rate;
        self.age = self.age.saturating_add(1);
    }

    /// Eats the first food item within `size`, removing it from `food`.
    ///
    /// Returns whether a meal happened; nothing changes otherwise.
    pub fn feed(&mut self, food: &mut Vec<Food>) -> bool {
        let radius = self.size;
        let Some(index) = food
            .iter()
            .position(|item| self.position.distance(item.position) < radius)
        else {
            return false;
        };
        let item = food.remove(index);
        self.energy += item.energy;
        true
    }

    /// Produces a perturbed offspring and charges the parent.
    ///
    /// The parent keeps `energy * reproduction_cost`; the child receives the
    /// remainder. The energy threshold is the caller's concern.
    pub fn reproduce<R: Rng + ?Sized>(
        &mut self,
        inheritance: &InheritanceConfig,
        rng: &mut R,
    ) -> Agent {
        let jitter = inheritance.spawn_jitter;
        let offset = if jitter > 0.0 {
            Vec2::new(
                rng.random_range(-jitter..=jitter),
                rng.random_range(-jitter..=jitter),
            )
        } else {
            Vec2::ZERO
        };
        let band = inheritance.variation_band();
        let size = self.size * band.sample(rng);
        let max_speed = self.max_speed * band.sample(rng);
        let mut color = self.color;
        if inheritance.color_jitter > 0.0 {
            let bound = inheritance.color_jitter;
            for channel in &mut color {
                *channel = (*channel + rng.random_range(-bound..=bound)).clamp(0.0, 1.0);
            }
        }

        let before = self.energy;
        self.energy = before * self.traits.reproduction_cost;
        let endowment = before - self.energy;

        let mut child = Agent::new(
            self.position + offset,
            size,
            max_speed,
            color,
            endowment,
            self.traits,
            rng,
        );
        child.generation = self.generation.next();
        child
    }

    #[must_use]
    pub fn is_hungry(&self) -> bool {
        self.energy < self.traits.hungry_threshold
    }

    #[must_use]
    pub fn can_reproduce(&self) -> bool {
        self.energy >= self.traits.reproduction_threshold
    }

    /// Starved or past its lifespan.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.energy <= 0.0 || self.age >= self.traits.lifespan
    }

    /// Direction of travel in radians.
    #[must_use]
    pub fn heading(&self) -> f32 {
        self.velocity.heading()
    }
}
