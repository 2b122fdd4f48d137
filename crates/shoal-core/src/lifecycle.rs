//! Growth and death rules applied after each tick.

use crate::agent::Agent;
use crate::config::LifecycleMode;

/// Decides which agents leave the world and which ones breed.
///
/// The world consults the policy once per tick, after every agent has moved
/// and food has spawned: expired agents are removed first, then surviving
/// agents are asked in order whether they want offspring.
pub trait PopulationPolicy: Send {
    /// Stable identifier used in logs.
    fn name(&self) -> &'static str;

    /// Whether `agent` should be removed this tick.
    fn is_expired(&self, agent: &Agent) -> bool;

    /// Whether `agent` should reproduce now, given the population including
    /// children already scheduled this tick.
    fn wants_offspring(&self, agent: &Agent, population: usize) -> bool;
}

/// Fixed population: nobody dies, nobody breeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct Immortal;

impl PopulationPolicy for Immortal {
    fn name(&self) -> &'static str {
        "immortal"
    }

    fn is_expired(&self, _agent: &Agent) -> bool {
        false
    }

    fn wants_offspring(&self, _agent: &Agent, _population: usize) -> bool {
        false
    }
}

/// Starvation and old age remove agents; surplus energy buys offspring.
#[derive(Debug, Clone, Copy)]
pub struct EnergyGated {
    pub max_population: usize,
}

impl PopulationPolicy for EnergyGated {
    fn name(&self) -> &'static str {
        "energy_gated"
    }

    fn is_expired(&self, agent: &Agent) -> bool {
        agent.is_expired()
    }

    fn wants_offspring(&self, agent: &Agent, population: usize) -> bool {
        population < self.max_population && agent.can_reproduce()
    }
}

/// Builds the policy selected in configuration.
#[must_use]
pub fn policy_for(mode: LifecycleMode) -> Box<dyn PopulationPolicy> {
    match mode {
        LifecycleMode::Immortal => Box::new(Immortal),
        LifecycleMode::EnergyGated { max_population } => Box::new(EnergyGated { max_population }),
    }
}
