//! Collision layer masks used by spatial queries.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Set of collision layers a query is allowed to hit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct LayerMask: u32 {
        /// Untagged level geometry
        const DEFAULT = 1 << 0;
        /// The player body
        const PLAYER = 1 << 1;
        /// Monster bodies
        const MONSTER = 1 << 2;
        /// Walls and props that block sight
        const OBSTACLE = 1 << 3;
        /// Geometry a resting monster hides behind
        const COVER = 1 << 4;
        /// Doors (block sight while closed)
        const DOOR = 1 << 5;
    }
}

impl LayerMask {
    /// Layers that block a monster's line of sight.
    pub const SIGHT_BLOCKERS: Self = Self::OBSTACLE.union(Self::DOOR).union(Self::COVER);
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::DEFAULT
    }
}
