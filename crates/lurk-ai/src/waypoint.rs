//! Way-point registry.
//!
//! Way-points are named positions placed by level designers. Search,
//! retreat and disappear pick their destinations from here. The registry
//! is append-only for the lifetime of a level.

use std::collections::HashMap;

use glam::Vec3;
use lurk_common::WayPointId;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{AiError, AiResult};

/// Radius at which [`WayPointRegistry::pick_random_within_radius`] stops
/// doubling and gives up.
pub const RADIUS_CEILING: f32 = 300.0;

/// Hard cap on doublings so degenerate inputs cannot loop forever.
const MAX_DOUBLINGS: u32 = 32;

/// A registered navigation target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WayPoint {
    /// Registry ID
    pub id: WayPointId,
    /// Unique designer-facing name
    pub name: String,
    /// World position
    pub position: Vec3,
    /// Distance from the last rescore origin
    pub debug_score: f32,
}

/// Outcome of a radius search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusPick<'a> {
    /// Chosen way-point, if any qualified
    pub way_point: Option<&'a WayPoint>,
    /// Radius in effect when the search ended
    pub radius: f32,
    /// Times the radius was doubled
    pub doublings: u32,
}

/// Ordered, append-only way-point store.
#[derive(Debug, Clone, Default)]
pub struct WayPointRegistry {
    points: Vec<WayPoint>,
    by_name: HashMap<String, WayPointId>,
}

impl WayPointRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a way-point. Names must be unique.
    pub fn register(&mut self, name: impl Into<String>, position: Vec3) -> AiResult<WayPointId> {
        let name = name.into();
        if self.by_name.contains_key(&name) {
            return Err(AiError::DuplicateWayPoint(name));
        }
        let id = WayPointId::new(self.points.len() as u32);
        debug!(%id, %name, ?position, "way-point registered");
        self.by_name.insert(name.clone(), id);
        self.points.push(WayPoint {
            id,
            name,
            position,
            debug_score: 0.0,
        });
        Ok(id)
    }

    /// Looks up a way-point by ID.
    #[must_use]
    pub fn get(&self, id: WayPointId) -> Option<&WayPoint> {
        self.points.get(id.index())
    }

    /// Looks up a way-point by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&WayPoint> {
        self.by_name.get(name).and_then(|id| self.get(*id))
    }

    /// All way-points in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &WayPoint> {
        self.points.iter()
    }

    /// Number of way-points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Picks a random way-point strictly inside `radius` of `center` and
    /// farther than `min_distance` from `caller`, doubling the radius until one qualifies
    /// or the radius reaches [`RADIUS_CEILING`].
    pub fn pick_random_within_radius(
        &self,
        center: Vec3,
        caller: Vec3,
        radius: f32,
        min_distance: f32,
        rng: &mut fastrand::Rng,
    ) -> RadiusPick<'_> {
        self.pick_random_within_radius_capped(center, caller, radius, min_distance, RADIUS_CEILING, rng)
    }

    /// [`Self::pick_random_within_radius`] with an explicit ceiling.
    pub fn pick_random_within_radius_capped(
        &self,
        center: Vec3,
        caller: Vec3,
        radius: f32,
        min_distance: f32,
        ceiling: f32,
        rng: &mut fastrand::Rng,
    ) -> RadiusPick<'_> {
        let mut radius = if radius.is_finite() && radius > 0.0 {
            radius
        } else {
            1.0
        };
        let mut doublings = 0;
        let mut candidates = Vec::new();

        loop {
            candidates.clear();
            candidates.extend(self.points.iter().filter(|wp| {
                wp.position.distance(center) < radius && wp.position.distance(caller) > min_distance
            }));

            if !candidates.is_empty() {
                let chosen = candidates[rng.usize(..candidates.len())];
                trace!(id = %chosen.id, radius, doublings, "way-point picked");
                return RadiusPick {
                    way_point: Some(chosen),
                    radius,
                    doublings,
                };
            }
            if radius >= ceiling || doublings >= MAX_DOUBLINGS {
                debug!(radius, doublings, "no way-point within ceiling");
                return RadiusPick {
                    way_point: None,
                    radius,
                    doublings,
                };
            }
            radius *= 2.0;
            doublings += 1;
        }
    }

    /// Picks uniformly among the `n` way-points farthest from `from`.
    pub fn pick_farthest(&self, from: Vec3, n: usize, rng: &mut fastrand::Rng) -> Option<&WayPoint> {
        if self.points.is_empty() {
            return None;
        }
        let mut ranked: Vec<(f32, &WayPoint)> = self
            .points
            .iter()
            .map(|wp| (wp.position.distance(from), wp))
            .collect();
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));
        let pool = n.clamp(1, ranked.len());
        Some(ranked[rng.usize(..pool)].1)
    }

    /// Stores each way-point's distance from `from` in its debug score.
    pub fn rescore(&mut self, from: Vec3) {
        for wp in &mut self.points {
            wp.debug_score = wp.position.distance(from);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_registry(count: usize, spacing: f32) -> WayPointRegistry {
        let mut registry = WayPointRegistry::new();
        for i in 0..count {
            registry
                .register(format!("wp{i}"), Vec3::new(i as f32 * spacing, 0.0, 0.0))
                .expect("unique name");
        }
        registry
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let mut registry = WayPointRegistry::new();
        let id = registry.register("hall", Vec3::ZERO).expect("first insert");
        assert_eq!(id.raw(), 0);
        assert!(matches!(
            registry.register("hall", Vec3::ONE),
            Err(AiError::DuplicateWayPoint(_))
        ));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find("hall").map(|wp| wp.id), Some(id));
    }

    #[test]
    fn test_empty_registry_doubles_to_ceiling() {
        let registry = WayPointRegistry::new();
        let mut rng = fastrand::Rng::with_seed(1);
        let pick = registry.pick_random_within_radius(Vec3::ZERO, Vec3::ZERO, 10.0, 0.0, &mut rng);
        assert!(pick.way_point.is_none());
        assert_eq!(pick.doublings, 5);
        assert_eq!(pick.radius, 320.0);
    }

    #[test]
    fn test_radius_widens_until_found() {
        let mut registry = WayPointRegistry::new();
        registry.register("far", Vec3::new(35.0, 0.0, 0.0)).expect("insert");
        let mut rng = fastrand::Rng::with_seed(1);
        let pick = registry.pick_random_within_radius(Vec3::ZERO, Vec3::ZERO, 10.0, 0.0, &mut rng);
        assert_eq!(pick.way_point.map(|wp| wp.name.as_str()), Some("far"));
        assert_eq!(pick.radius, 40.0);
        assert_eq!(pick.doublings, 2);
    }

    #[test]
    fn test_point_on_radius_needs_a_doubling() {
        let mut registry = WayPointRegistry::new();
        registry.register("rim", Vec3::new(10.0, 0.0, 0.0)).expect("insert");
        let mut rng = fastrand::Rng::with_seed(1);
        let pick = registry.pick_random_within_radius(Vec3::ZERO, Vec3::ZERO, 10.0, 0.0, &mut rng);
        assert_eq!(pick.way_point.map(|wp| wp.name.as_str()), Some("rim"));
        assert_eq!(pick.radius, 20.0);
        assert_eq!(pick.doublings, 1);
    }

    #[test]
    fn test_point_under_caller_is_never_picked() {
        let mut registry = WayPointRegistry::new();
        let here = Vec3::new(3.0, 0.0, 0.0);
        registry.register("underfoot", here).expect("insert");
        let mut rng = fastrand::Rng::with_seed(1);
        let pick = registry.pick_random_within_radius(Vec3::ZERO, here, 10.0, 0.0, &mut rng);
        assert!(pick.way_point.is_none());
        assert!(pick.radius >= RADIUS_CEILING);
    }

    #[test]
    fn test_min_distance_excludes_near_caller() {
        let registry = line_registry(3, 5.0);
        let mut rng = fastrand::Rng::with_seed(9);
        for _ in 0..50 {
            let pick = registry.pick_random_within_radius(Vec3::ZERO, Vec3::ZERO, 20.0, 6.0, &mut rng);
            let wp = pick.way_point.expect("one qualifies");
            assert_eq!(wp.name, "wp2");
        }
    }

    #[test]
    fn test_degenerate_radius_terminates() {
        let registry = WayPointRegistry::new();
        let mut rng = fastrand::Rng::with_seed(1);
        let pick = registry.pick_random_within_radius(Vec3::ZERO, Vec3::ZERO, f32::NAN, 0.0, &mut rng);
        assert!(pick.way_point.is_none());
        assert!(pick.radius >= RADIUS_CEILING);
    }

    #[test]
    fn test_pick_farthest_draws_from_top_n() {
        let registry = line_registry(10, 1.0);
        let mut rng = fastrand::Rng::with_seed(4);
        for _ in 0..100 {
            let wp = registry
                .pick_farthest(Vec3::ZERO, 3, &mut rng)
                .expect("non-empty registry");
            assert!(wp.position.x >= 7.0);
        }
        assert!(WayPointRegistry::new()
            .pick_farthest(Vec3::ZERO, 3, &mut rng)
            .is_none());
    }

    #[test]
    fn test_rescore_records_distance() {
        let mut registry = line_registry(3, 2.0);
        registry.rescore(Vec3::new(4.0, 0.0, 0.0));
        let scores: Vec<f32> = registry.iter().map(|wp| wp.debug_score).collect();
        assert_eq!(scores, vec![4.0, 2.0, 0.0]);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn radius_search_always_terminates(
                start in 0.01f32..500.0,
                xs in prop::collection::vec(-400.0f32..400.0, 0..12),
                seed in any::<u64>(),
            ) {
                let mut registry = WayPointRegistry::new();
                for (i, x) in xs.iter().enumerate() {
                    registry.register(format!("p{i}"), Vec3::new(*x, 0.0, 0.0)).expect("unique");
                }
                let mut rng = fastrand::Rng::with_seed(seed);
                let pick = registry.pick_random_within_radius(Vec3::ZERO, Vec3::ZERO, start, 0.0, &mut rng);
                match pick.way_point {
                    Some(wp) => prop_assert!(wp.position.distance(Vec3::ZERO) < pick.radius),
                    None => prop_assert!(pick.radius >= RADIUS_CEILING),
                }
                prop_assert!(pick.doublings <= MAX_DOUBLINGS);
            }
        }
    }
}
