use slotmap::{SlotMap, new_key_type};
use std::collections::HashSet;

use crate::agent::Agent;

new_key_type! {
    /// Stable handle for agents backed by a generational slot map.
    pub struct AgentId;
}

/// Dense agent storage in insertion order with generational handles.
///
/// Iteration order is the update order of the world: initial population first,
/// later additions appended. Removals keep the relative order of survivors.
#[derive(Debug, Default, Clone)]
pub struct AgentArena {
    slots: SlotMap<AgentId, usize>,
    handles: Vec<AgentId>,
    agents: Vec<Agent>,
}

impl AgentArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an arena with reserved capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: SlotMap::with_capacity_and_key(capacity),
            handles: Vec::with_capacity(capacity),
            agents: Vec::with_capacity(capacity),
        }
    }

    /// Number of stored agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Append an agent and return its handle.
    pub fn insert(&mut self, agent: Agent) -> AgentId {
        let index = self.agents.len();
        self.agents.push(agent);
        let id = self.slots.insert(index);
        self.handles.push(id);
        id
    }

    /// Remove `id`, shifting later agents down by one to keep order.
    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        let index = self.slots.remove(id)?;
        let removed = self.agents.remove(index);
        let removed_handle = self.handles.remove(index);
        debug_assert_eq!(removed_handle, id);
        for (offset, handle) in self.handles[index..].iter().enumerate() {
            if let Some(slot) = self.slots.get_mut(*handle) {
                *slot = index + offset;
            }
        }
        Some(removed)
    }

    /// Remove all agents whose ids are contained in `dead`, preserving iteration order.
    pub fn remove_many(&mut self, dead: &HashSet<AgentId>) -> usize {
        if dead.is_empty() {
            return 0;
        }
        let before = self.agents.len();
        let mut keep = Vec::with_capacity(before);
        for id in &self.handles {
            keep.push(!dead.contains(id));
        }
        let mut flags = keep.iter();
        self.agents.retain(|_| flags.next().copied().unwrap_or(true));
        let mut write = 0;
        for read in 0..self.handles.len() {
            let id = self.handles[read];
            if !keep[read] {
                self.slots.remove(id);
                continue;
            }
            self.handles[write] = id;
            if let Some(slot) = self.slots.get_mut(id) {
                *slot = write;
            }
            write += 1;
        }
        self.handles.truncate(write);
        debug_assert_eq!(self.handles.len(), self.agents.len());
        before - self.agents.len()
    }

    /// Dense index of `id`, if present.
    #[must_use]
    pub fn index_of(&self, id: AgentId) -> Option<usize> {
        self.slots.get(id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: AgentId) -> bool {
        self.slots.contains_key(id)
    }

    #[must_use]
    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(self.index_of(id)?)
    }

    #[must_use]
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        let index = self.index_of(id)?;
        self.agents.get_mut(index)
    }

    /// Handles in iteration order.
    #[must_use]
    pub fn handles(&self) -> &[AgentId] {
        &self.handles
    }

    /// Agents in iteration order.
    #[must_use]
    pub fn as_slice(&self) -> &[Agent] {
        &self.agents
    }

    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [Agent] {
        &mut self.agents
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> + '_ {
        self.agents.iter()
    }

    pub fn iter_with_handles(&self) -> impl Iterator<Item = (AgentId, &Agent)> + '_ {
        self.handles.iter().copied().zip(self.agents.iter())
    }

    /// Clear all stored agents.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.handles.clear();
        self.agents.clear();
    }
}
