use serde::{Deserialize, Serialize};

use crate::geometry::Vec2;

/// Point resource consumed whole by the first agent that reaches it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Food {
    pub position: Vec2,
    pub energy: f32,
}

impl Food {
    #[must_use]
    pub const fn new(position: Vec2, energy: f32) -> Self {
        Self { position, energy }
    }
}
