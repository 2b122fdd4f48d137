//! Read-only views handed to renderers and status displays.

use serde::Serialize;

use crate::Tick;
use crate::agent::Agent;
use crate::food::Food;
use crate::geometry::{Arena, Vec2};
use crate::population::AgentId;

/// Everything a renderer needs to draw one agent.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct AgentView {
    pub id: AgentId,
    pub position: Vec2,
    /// Direction of travel in radians.
    pub heading: f32,
    pub size: f32,
    pub color: [f32; 3],
}

impl AgentView {
    #[must_use]
    pub fn new(id: AgentId, agent: &Agent) -> Self {
        Self {
            id,
            position: agent.position,
            heading: agent.heading(),
            size: agent.size,
            color: agent.color,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct FoodView {
    pub position: Vec2,
}

impl From<&Food> for FoodView {
    fn from(food: &Food) -> Self {
        Self {
            position: food.position,
        }
    }
}

/// Owned copy of the drawable world state at one tick.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderFrame {
    pub tick: Tick,
    pub arena: Arena,
    pub agents: Vec<AgentView>,
    pub food: Vec<FoodView>,
}

impl RenderFrame {
    /// Agent count for status displays.
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }
}
