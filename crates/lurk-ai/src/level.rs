//! Shared per-level registries.

use crate::sleep::SleepPointRegistry;
use crate::waypoint::WayPointRegistry;

/// Navigation targets shared by every monster in a level.
///
/// Lives outside any one entity and is passed in explicitly, so several
/// sessions can run side by side without sharing state.
#[derive(Debug, Clone, Default)]
pub struct Level {
    /// Named way-points
    pub way_points: WayPointRegistry,
    /// Sleep points and their occupants
    pub sleep_points: SleepPointRegistry,
}

impl Level {
    /// Creates an empty level.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}
