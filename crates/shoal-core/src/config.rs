use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::WorldError;

/// Closed sampling interval `[min, max]` used for randomized construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Finite, ordered, and narrow enough that its width is finite too.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min <= self.max && (self.max - self.min).is_finite()
    }

    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Uniform draw from the interval. Callers validate the span first.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.min >= self.max {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }
}

/// Order in which agents observe each other during a tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOrder {
    /// Each agent feeds, steers and moves before the next one is visited, so later
    /// agents see the already-moved state of earlier ones.
    #[default]
    Interleaved,
    /// Feeding runs in order, then every agent steers against one frozen snapshot
    /// and all agents integrate together.
    Synchronous,
}

/// Which population policy the world installs at construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LifecycleMode {
    /// Nobody dies and nobody breeds; the population only changes through the host.
    #[default]
    Immortal,
    /// Starved or aged-out agents are removed; well-fed agents reproduce up to a cap.
    EnergyGated { max_population: usize },
}

/// Per-agent behaviour tunables, inherited unchanged by offspring.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentTraits {
    /// Magnitude cap applied to every steering correction.
    pub max_force: f32,
    pub separation_radius: f32,
    pub alignment_radius: f32,
    pub cohesion_radius: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub wander_weight: f32,
    /// Length of the raw wander vector before weighting.
    pub wander_strength: f32,
    /// Weight of the food-seeking force while hungry.
    pub forage_weight: f32,
    /// Energy drained per integration step.
    pub metabolism_rate: f32,
    /// Foraging activates while energy is strictly below this level.
    pub hungry_threshold: f32,
    pub reproduction_threshold: f32,
    /// Fraction of energy a parent keeps after reproducing.
    pub reproduction_cost: f32,
    /// Age in ticks at which the energy-gated policy retires an agent.
    pub lifespan: u32,
}

impl Default for AgentTraits {
    fn default() -> Self {
        Self {
            max_force: 0.1,
            separation_radius: 30.0,
            alignment_radius: 60.0,
            cohesion_radius: 80.0,
            separation_weight: 1.5,
            alignment_weight: 1.0,
            cohesion_weight: 1.0,
            wander_weight: 0.5,
            wander_strength: 0.1,
            forage_weight: 2.0,
            metabolism_rate: 0.05,
            hungry_threshold: 50.0,
            reproduction_threshold: 150.0,
            reproduction_cost: 0.5,
            lifespan: 6_000,
        }
    }
}

impl AgentTraits {
    pub fn validate(&self) -> Result<(), WorldError> {
        let radii = [
            self.separation_radius,
            self.alignment_radius,
            self.cohesion_radius,
        ];
        if radii.iter().any(|r| !r.is_finite() || *r < 0.0) {
            return Err(WorldError::InvalidConfig(
                "perception radii must be finite and non-negative",
            ));
        }
        let weights = [
            self.separation_weight,
            self.alignment_weight,
            self.cohesion_weight,
            self.wander_weight,
            self.wander_strength,
            self.forage_weight,
        ];
        if weights.iter().any(|w| !w.is_finite()) {
            return Err(WorldError::InvalidConfig("behaviour weights must be finite"));
        }
        if !self.max_force.is_finite() || self.max_force <= 0.0 {
            return Err(WorldError::InvalidConfig(
                "max_force must be positive and finite",
            ));
        }
        if !self.metabolism_rate.is_finite() || self.metabolism_rate < 0.0 {
            return Err(WorldError::InvalidConfig(
                "metabolism_rate must be non-negative",
            ));
        }
        if !self.hungry_threshold.is_finite() || !self.reproduction_threshold.is_finite() {
            return Err(WorldError::InvalidConfig(
                "energy thresholds must be finite",
            ));
        }
        if !(0.0..=1.0).contains(&self.reproduction_cost) {
            return Err(WorldError::InvalidConfig(
                "reproduction_cost must lie in [0, 1]",
            ));
        }
        if self.lifespan == 0 {
            return Err(WorldError::InvalidConfig("lifespan must be non-zero"));
        }
        Ok(())
    }

    /// True when radii follow the intended `separation < alignment < cohesion` ordering.
    #[must_use]
    pub fn radii_ordered(&self) -> bool {
        self.separation_radius < self.alignment_radius
            && self.alignment_radius < self.cohesion_radius
    }
}

/// Food spawning policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FoodConfig {
    /// Chance per tick that one food item appears while below capacity.
    pub spawn_probability: f32,
    /// Food count at which spawning stops.
    pub max_food: usize,
    /// Energy granted to the agent that eats an item.
    pub energy_value: f32,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            spawn_probability: 0.02,
            max_food: 30,
            energy_value: 80.0,
        }
    }
}

/// Ranges used when the world creates its initial population.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PopulationConfig {
    pub initial_count: usize,
    pub size: Span,
    pub max_speed: Span,
    /// Range of each RGB channel in `[0, 1]`.
    pub color: Span,
    pub energy: Span,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_count: 50,
            size: Span::new(8.0, 15.0),
            max_speed: Span::new(1.0, 3.0),
            color: Span::new(100.0 / 255.0, 1.0),
            energy: Span::new(60.0, 100.0),
        }
    }
}

/// Perturbations applied to offspring.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InheritanceConfig {
    /// Child offset per axis is drawn from `[-spawn_jitter, spawn_jitter]`.
    pub spawn_jitter: f32,
    /// Size and speed are multiplied by a factor drawn from `[1 - v, 1 + v]`.
    pub trait_variation: f32,
    /// Additive per-channel color perturbation bound.
    pub color_jitter: f32,
}

impl Default for InheritanceConfig {
    fn default() -> Self {
        Self {
            spawn_jitter: 10.0,
            trait_variation: 0.1,
            color_jitter: 0.05,
        }
    }
}

impl InheritanceConfig {
    /// Multiplicative band applied to size and speed.
    #[must_use]
    pub fn variation_band(&self) -> Span {
        Span::new(1.0 - self.trait_variation, 1.0 + self.trait_variation)
    }
}

/// Static configuration for a shoal world.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShoalConfig {
    /// Optional RNG seed for reproducible worlds.
    pub rng_seed: Option<u64>,
    /// Inward distance from every arena edge where agents bounce and food spawns.
    pub arena_margin: f32,
    pub update_order: UpdateOrder,
    pub lifecycle: LifecycleMode,
    /// Maximum number of recent tick summaries retained in memory.
    pub history_capacity: usize,
    pub food: FoodConfig,
    pub population: PopulationConfig,
    pub traits: AgentTraits,
    pub inheritance: InheritanceConfig,
}

impl Default for ShoalConfig {
    fn default() -> Self {
        Self {
            rng_seed: None,
            arena_margin: 20.0,
            update_order: UpdateOrder::default(),
            lifecycle: LifecycleMode::default(),
            history_capacity: 256,
            food: FoodConfig::default(),
            population: PopulationConfig::default(),
            traits: AgentTraits::default(),
            inheritance: InheritanceConfig::default(),
        }
    }
}

impl ShoalConfig {
    /// Checks every value range, returning the first violation found.
    pub fn validate(&self) -> Result<(), WorldError> {
        if !self.arena_margin.is_finite() || self.arena_margin < 0.0 {
            return Err(WorldError::InvalidConfig(
                "arena_margin must be finite and non-negative",
            ));
        }
        if self.history_capacity == 0 {
            return Err(WorldError::InvalidConfig(
                "history_capacity must be non-zero",
            ));
        }
        if self.food.max_food == 0 {
            return Err(WorldError::InvalidConfig("max_food must be positive"));
        }
        if !(0.0..=1.0).contains(&self.food.spawn_probability) {
            return Err(WorldError::InvalidConfig(
                "spawn_probability must lie in [0, 1]",
            ));
        }
        if !self.food.energy_value.is_finite() || self.food.energy_value < 0.0 {
            return Err(WorldError::InvalidConfig(
                "food energy_value must be non-negative",
            ));
        }
        let population = &self.population;
        if !population.size.is_valid() || population.size.min <= 0.0 {
            return Err(WorldError::InvalidConfig(
                "population size range must be positive and ordered",
            ));
        }
        if !population.max_speed.is_valid() || population.max_speed.min <= 0.0 {
            return Err(WorldError::InvalidConfig(
                "population max_speed range must be positive and ordered",
            ));
        }
        if !population.color.is_valid() || population.color.min < 0.0 || population.color.max > 1.0
        {
            return Err(WorldError::InvalidConfig(
                "population color range must be ordered within [0, 1]",
            ));
        }
        if !population.energy.is_valid() {
            return Err(WorldError::InvalidConfig(
                "population energy range must be ordered",
            ));
        }
        let inheritance = &self.inheritance;
        // Jitter is sampled from `[-j, j]`, so the doubled width must stay finite.
        let jitter_ok = |jitter: f32| jitter >= 0.0 && (2.0 * jitter).is_finite();
        if !jitter_ok(inheritance.spawn_jitter) || !jitter_ok(inheritance.color_jitter) {
            return Err(WorldError::InvalidConfig(
                "inheritance jitter must be finite and non-negative",
            ));
        }
        if !(0.0..1.0).contains(&inheritance.trait_variation) {
            return Err(WorldError::InvalidConfig(
                "trait_variation must lie in [0, 1)",
            ));
        }
        if let LifecycleMode::EnergyGated { max_population } = self.lifecycle
            && max_population == 0
        {
            return Err(WorldError::InvalidConfig(
                "energy-gated max_population must be positive",
            ));
        }
        self.traits.validate()
    }

    /// Parse a JSON document, reporting the offending field path on type errors.
    pub fn from_json_str(json: &str) -> Result<Self, WorldError> {
        let mut de = serde_json::Deserializer::from_str(json);
        let config: Self = serde_path_to_error::deserialize(&mut de).map_err(
            |err: serde_path_to_error::Error<serde_json::Error>| {
                WorldError::ConfigParse(format!("{} at {}", err.inner(), err.path()))
            },
        )?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        ShoalConfig::default().validate().expect("defaults are valid");
        assert!(AgentTraits::default().radii_ordered());
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = ShoalConfig::default();
        config.food.max_food = 0;
        assert_eq!(
            config.validate(),
            Err(WorldError::InvalidConfig("max_food must be positive"))
        );

        let mut config = ShoalConfig::default();
        config.traits.separation_radius = -1.0;
        assert!(matches!(
            config.validate(),
            Err(WorldError::InvalidConfig(_))
        ));

        let mut config = ShoalConfig::default();
        config.food.spawn_probability = 1.5;
        assert!(config.validate().is_err());

        let mut config = ShoalConfig::default();
        config.traits.reproduction_cost = 1.2;
        assert!(config.validate().is_err());

        let mut config = ShoalConfig::default();
        config.population.size = Span::new(15.0, 8.0);
        assert!(config.validate().is_err());

        let config = ShoalConfig {
            lifecycle: LifecycleMode::EnergyGated { max_population: 0 },
            ..ShoalConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn ranges_too_wide_to_sample_are_rejected() {
        let mut config = ShoalConfig::default();
        config.population.energy = Span::new(-3e38, 3e38);
        assert_eq!(
            config.validate(),
            Err(WorldError::InvalidConfig(
                "population energy range must be ordered"
            ))
        );

        let mut config = ShoalConfig::default();
        config.population.size = Span::new(1.0, f32::INFINITY);
        assert!(config.validate().is_err());
        assert!(!Span::new(f32::NAN, 1.0).is_valid());

        let mut config = ShoalConfig::default();
        config.inheritance.spawn_jitter = f32::MAX;
        assert!(matches!(
            config.validate(),
            Err(WorldError::InvalidConfig(_))
        ));

        let mut config = ShoalConfig::default();
        config.inheritance.color_jitter = f32::MAX;
        assert!(config.validate().is_err());

        let mut config = ShoalConfig::default();
        config.inheritance.spawn_jitter = 1e30;
        config.population.energy = Span::new(-1e30, 1e30);
        assert!(config.validate().is_ok());
    }

        #[test]
    fn unordered_radii_are_accepted() {
        let mut config = ShoalConfig::default();
        config.traits.separation_radius = 90.0;
        assert!(config.validate().is_ok());
        assert!(!config.traits.radii_ordered());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = ShoalConfig::from_json_str(
            r#"{
                "rng_seed": 7,
                "update_order": "synchronous",
                "lifecycle": { "kind": "energy_gated", "max_population": 120 },
                "food": { "max_food": 12 }
            }"#,
        )
        .expect("config parses");
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.update_order, UpdateOrder::Synchronous);
        assert_eq!(
            config.lifecycle,
            LifecycleMode::EnergyGated {
                max_population: 120
            }
        );
        assert_eq!(config.food.max_food, 12);
        assert_eq!(config.food.energy_value, FoodConfig::default().energy_value);
        assert_eq!(config.traits, AgentTraits::default());
    }

    #[test]
    fn json_type_errors_report_path() {
        let err = ShoalConfig::from_json_str(r#"{ "food": { "max_food": "many" } }"#)
            .expect_err("string is not a count");
        match err {
            WorldError::ConfigParse(message) => assert!(message.contains("food.max_food")),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn json_values_are_validated() {
        let err = ShoalConfig::from_json_str(r#"{ "food": { "max_food": 0 } }"#)
            .expect_err("zero capacity rejected");
        assert_eq!(err, WorldError::InvalidConfig("max_food must be positive"));
    }

    #[test]
    fn span_sampling_stays_in_range() {
        use rand::{SeedableRng, rngs::SmallRng};
        let mut rng = SmallRng::seed_from_u64(3);
        let span = Span::new(8.0, 15.0);
        for _ in 0..200 {
            assert!(span.contains(span.sample(&mut rng)));
        }
        assert_eq!(Span::new(2.0, 2.0).sample(&mut rng), 2.0);
    }
}
