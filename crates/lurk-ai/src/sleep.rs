//! Sleep point registry and occupancy.
//!
//! A sleep point can be held by at most one entity. Choosing a point walks
//! a ladder that trades strictness for availability:
//!
//! 1. **Strict** - unoccupied, within the distance band from the player and
//!    hidden from the player's eye by cover.
//! 2. **Relaxed** - a bounded number of random draws accepting any
//!    unoccupied, covered point.
//! 3. **Unconditional** - any point. If it is occupied it becomes a walk
//!    target only and is never claimed.

use glam::Vec3;
use lurk_common::{EntityId, LayerMask, SleepPointId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AiError, AiResult};
use crate::host::{PlayerView, SpatialQuery};

/// A place a monster may rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepPoint {
    /// Registry ID
    pub id: SleepPointId,
    /// World position
    pub position: Vec3,
    /// Entity currently holding the point
    pub occupant: Option<EntityId>,
}

impl SleepPoint {
    /// Whether another entity holds the point.
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}

/// Constraints for choosing a sleep point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepSearch {
    /// Minimum distance from the player
    pub min_distance: f32,
    /// Maximum distance from the player
    pub max_distance: f32,
    /// Layers that count as cover
    pub cover_mask: LayerMask,
    /// Random draws in the relaxed tier
    pub relaxed_attempts: u32,
}

impl Default for SleepSearch {
    fn default() -> Self {
        Self {
            min_distance: 15.0,
            max_distance: 60.0,
            cover_mask: LayerMask::COVER.union(LayerMask::OBSTACLE),
            relaxed_attempts: 100,
        }
    }
}

/// Which rung of the ladder produced a choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SleepTier {
    /// All constraints met
    Strict,
    /// Distance band dropped
    Relaxed,
    /// Nothing dropped but existence
    Unconditional,
}

/// A chosen sleep point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepChoice {
    /// Point ID
    pub point: SleepPointId,
    /// Where to walk
    pub position: Vec3,
    /// Ladder rung
    pub tier: SleepTier,
    /// Whether the chooser may claim it
    pub claimable: bool,
}

/// Sleep points for one level.
#[derive(Debug, Clone, Default)]
pub struct SleepPointRegistry {
    points: Vec<SleepPoint>,
}

impl SleepPointRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sleep point.
    pub fn register(&mut self, position: Vec3) -> SleepPointId {
        let id = SleepPointId::new(self.points.len() as u32);
        self.points.push(SleepPoint {
            id,
            position,
            occupant: None,
        });
        id
    }

    /// Looks up a point.
    #[must_use]
    pub fn get(&self, id: SleepPointId) -> Option<&SleepPoint> {
        self.points.get(id.index())
    }

    /// All points in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SleepPoint> {
        self.points.iter()
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Current holder of a point.
    #[must_use]
    pub fn holder(&self, id: SleepPointId) -> Option<EntityId> {
        self.get(id).and_then(|p| p.occupant)
    }

    /// Takes exclusive hold of a point. Re-claiming one's own point succeeds.
    pub fn claim(&mut self, id: SleepPointId, entity: EntityId) -> AiResult<()> {
        let point = self
            .points
            .get_mut(id.index())
            .ok_or(AiError::UnknownSleepPoint(id))?;
        match point.occupant {
            Some(holder) if holder != entity => Err(AiError::SleepPointOccupied { point: id, holder }),
            _ => {
                point.occupant = Some(entity);
                debug!(%entity, point = %id, "sleep point claimed");
                Ok(())
            },
        }
    }

    /// Gives up a point. Only the holder may release it.
    pub fn release(&mut self, id: SleepPointId, entity: EntityId) -> AiResult<()> {
        let point = self
            .points
            .get_mut(id.index())
            .ok_or(AiError::UnknownSleepPoint(id))?;
        if point.occupant != Some(entity) {
            return Err(AiError::NotOccupant { point: id, entity });
        }
        point.occupant = None;
        debug!(%entity, point = %id, "sleep point released");
        Ok(())
    }

    /// Releases every point held by `entity`. Returns how many were freed.
    pub fn release_all(&mut self, entity: EntityId) -> usize {
        let mut freed = 0;
        for point in &mut self.points {
            if point.occupant == Some(entity) {
                point.occupant = None;
                freed += 1;
            }
        }
        freed
    }

    /// Whether cover blocks the player's view of `position`.
    #[must_use]
    pub fn is_covered(
        position: Vec3,
        player: &PlayerView,
        spatial: &dyn SpatialQuery,
        mask: LayerMask,
    ) -> bool {
        let eye = player.eye();
        let offset = position - eye;
        let distance = offset.length();
        let Some(direction) = offset.try_normalize() else {
            return false;
        };
        spatial.raycast(eye, direction, distance, mask).is_some()
    }

    /// Points satisfying every strict constraint.
    pub fn valid_points(
        &self,
        player: &PlayerView,
        search: &SleepSearch,
        spatial: &dyn SpatialQuery,
    ) -> Vec<SleepPointId> {
        self.points
            .iter()
            .filter(|p| !p.is_occupied())
            .filter(|p| {
                let d = p.position.distance(player.position);
                d >= search.min_distance && d <= search.max_distance
            })
            .filter(|p| Self::is_covered(p.position, player, spatial, search.cover_mask))
            .map(|p| p.id)
            .collect()
    }

    /// Walks the selection ladder. Returns `None` only when no points exist.
    pub fn choose(
        &self,
        player: &PlayerView,
        search: &SleepSearch,
        spatial: &dyn SpatialQuery,
        rng: &mut fastrand::Rng,
    ) -> Option<SleepChoice> {
        if self.points.is_empty() {
            return None;
        }

        let valid = self.valid_points(player, search, spatial);
        if !valid.is_empty() {
            let id = valid[rng.usize(..valid.len())];
            return self.get(id).map(|p| SleepChoice {
                point: p.id,
                position: p.position,
                tier: SleepTier::Strict,
                claimable: true,
            });
        }

        for _ in 0..search.relaxed_attempts {
            let p = &self.points[rng.usize(..self.points.len())];
            if !p.is_occupied() && Self::is_covered(p.position, player, spatial, search.cover_mask) {
                return Some(SleepChoice {
                    point: p.id,
                    position: p.position,
                    tier: SleepTier::Relaxed,
                    claimable: true,
                });
            }
        }

        let p = &self.points[rng.usize(..self.points.len())];
        if p.is_occupied() {
            warn!(point = %p.id, "falling back to an occupied sleep point as a walk target");
        }
        Some(SleepChoice {
            point: p.id,
            position: p.position,
            tier: SleepTier::Unconditional,
            claimable: !p.is_occupied(),
        })
    }
}
