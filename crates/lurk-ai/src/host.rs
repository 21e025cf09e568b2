//! Host engine seams.
//!
//! The behavior core never touches an engine directly. Navigation, physics
//! queries and the player position arrive through these traits, and the
//! simple implementations at the bottom of this module drive tests and the
//! headless simulator.

use glam::Vec3;
use lurk_common::{flatten, planar_distance, polyline_length, ray_sphere, LayerMask};
use serde::{Deserialize, Serialize};

// ============================================================================
// Query Results
// ============================================================================

/// Tag attached to a collider by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ColliderTag {
    /// The player body
    Player,
    /// Another monster
    Monster,
    /// Level prop or wall
    Prop,
    /// No tag
    #[default]
    Untagged,
}

/// A collider returned by an overlap query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderHit {
    /// Collider tag
    pub tag: ColliderTag,
    /// Layer the collider lives on
    pub layer: LayerMask,
    /// Collider center
    pub position: Vec3,
}

/// First obstruction along a raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin
    pub distance: f32,
    /// World-space hit point
    pub point: Vec3,
    /// Tag of the collider hit
    pub tag: ColliderTag,
}

/// What a monster knows about the player this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerView {
    /// Feet position
    pub position: Vec3,
    /// Facing direction
    pub forward: Vec3,
    /// Eye height above the feet
    pub eye_height: f32,
}

impl PlayerView {
    /// Creates a view with the default eye height.
    #[must_use]
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            forward: Vec3::Z,
            eye_height: 1.7,
        }
    }

    /// Sets the facing direction.
    #[must_use]
    pub fn facing(mut self, forward: Vec3) -> Self {
        self.forward = forward;
        self
    }

    /// World-space eye position.
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        self.position + Vec3::Y * self.eye_height
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Path planning on the walkable surface.
pub trait PathOracle {
    /// Computes a path between two points as a list of corners.
    ///
    /// Returns `None` when no complete path exists.
    fn compute_path(&self, from: Vec3, to: Vec3) -> Option<Vec<Vec3>>;

    /// Finds the closest navigable point within `max_distance` of `near`.
    fn sample_navigable(&self, near: Vec3, max_distance: f32) -> Option<Vec3>;

    /// Total path length, or 0 when the target is unreachable.
    fn path_length(&self, from: Vec3, to: Vec3) -> f32 {
        self.compute_path(from, to)
            .map_or(0.0, |corners| polyline_length(&corners))
    }
}

/// Physics queries against level geometry.
pub trait SpatialQuery {
    /// Returns every collider on `mask` overlapping the sphere.
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<ColliderHit>;

    /// Casts a ray and returns the first hit on `mask` within `max_distance`.
    ///
    /// `direction` must be normalized.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit>;
}

/// Handle to the host's navigation agent for one monster.
pub trait NavAgent: std::fmt::Debug {
    /// Current position.
    fn position(&self) -> Vec3;
    /// Current facing direction.
    fn forward(&self) -> Vec3;
    /// Overrides the facing direction.
    fn set_forward(&mut self, forward: Vec3);
    /// Requests a path to `target`. Returns false if the request was refused.
    fn set_destination(&mut self, target: Vec3) -> bool;
    /// Moves instantly, cancelling the current path.
    fn warp(&mut self, position: Vec3);
    /// True while the host is still computing a requested path.
    fn path_pending(&self) -> bool;
    /// Distance left along the current path.
    fn remaining_distance(&self) -> f32;
    /// Distance at which the agent considers itself arrived.
    fn stopping_distance(&self) -> f32;
    /// Current velocity.
    fn velocity(&self) -> Vec3;
    /// Maximum movement speed.
    fn speed(&self) -> f32;
    /// Sets the maximum movement speed.
    fn set_speed(&mut self, speed: f32);
    /// Acceleration toward max speed.
    fn acceleration(&self) -> f32;
    /// Sets the acceleration.
    fn set_acceleration(&mut self, acceleration: f32);

    /// Advances the agent by one physics step.
    ///
    /// Engine-backed agents move on their own and keep the default.
    fn integrate(&mut self, _dt: f32) {}
}

/// Borrowed host services for one tick.
#[derive(Clone, Copy)]
pub struct Host<'a> {
    /// Navigation
    pub paths: &'a dyn PathOracle,
    /// Physics queries
    pub spatial: &'a dyn SpatialQuery,
}

impl<'a> Host<'a> {
    /// Bundles host services.
    #[must_use]
    pub fn new(paths: &'a dyn PathOracle, spatial: &'a dyn SpatialQuery) -> Self {
        Self { paths, spatial }
    }
}

impl std::fmt::Debug for Host<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host").finish_non_exhaustive()
    }
}

// ============================================================================
// Open Floor
// ============================================================================

/// Flat navigable floor with optional bounds and unreachable zones.
///
/// Paths are straight lines. Points outside the bounds or inside a blocked
/// zone cannot be reached.
#[derive(Debug, Clone, Default)]
pub struct OpenFloor {
    bounds: Option<(Vec3, Vec3)>,
    blocked: Vec<(Vec3, f32)>,
}

impl OpenFloor {
    /// Creates an unbounded floor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the floor to an axis-aligned rectangle.
    #[must_use]
    pub fn with_bounds(mut self, min: Vec3, max: Vec3) -> Self {
        self.bounds = Some((min.min(max), min.max(max)));
        self
    }

    /// Marks a disc as unreachable.
    #[must_use]
    pub fn with_blocked_zone(mut self, center: Vec3, radius: f32) -> Self {
        self.blocked.push((center, radius));
        self
    }

    fn clamp(&self, point: Vec3) -> Vec3 {
        let point = flatten(point);
        match self.bounds {
            Some((min, max)) => Vec3::new(point.x.clamp(min.x, max.x), 0.0, point.z.clamp(min.z, max.z)),
            None => point,
        }
    }

    fn is_blocked(&self, point: Vec3) -> bool {
        self.blocked
            .iter()
            .any(|(center, radius)| planar_distance(*center, point) <= *radius)
    }

    fn contains(&self, point: Vec3) -> bool {
        let flat = flatten(point);
        self.clamp(flat).distance_squared(flat) <= f32::EPSILON && !self.is_blocked(flat)
    }
}

impl PathOracle for OpenFloor {
    fn compute_path(&self, from: Vec3, to: Vec3) -> Option<Vec<Vec3>> {
        if self.contains(to) {
            Some(vec![from, to])
        } else {
            None
        }
    }

    fn sample_navigable(&self, near: Vec3, max_distance: f32) -> Option<Vec3> {
        let snapped = self.clamp(near);
        if self.is_blocked(snapped) || planar_distance(near, snapped) > max_distance {
            return None;
        }
        Some(snapped)
    }
}

// ============================================================================
// Mock Spatial
// ============================================================================

/// Sphere collider in a [`MockSpatial`] scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MockCollider {
    /// Collider tag
    pub tag: ColliderTag,
    /// Collider layer
    pub layer: LayerMask,
    /// Sphere center
    pub center: Vec3,
    /// Sphere radius
    pub radius: f32,
}

/// Spatial query backend made of spheres.
#[derive(Debug, Clone, Default)]
pub struct MockSpatial {
    colliders: Vec<MockCollider>,
}

impl MockSpatial {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a collider and returns its handle.
    pub fn add(&mut self, tag: ColliderTag, layer: LayerMask, center: Vec3, radius: f32) -> usize {
        self.colliders.push(MockCollider {
            tag,
            layer,
            center,
            radius,
        });
        self.colliders.len() - 1
    }

    /// Adds the player body at a feet position.
    pub fn add_player(&mut self, feet: Vec3) -> usize {
        self.add(ColliderTag::Player, LayerMask::PLAYER, feet + Vec3::Y, 0.5)
    }

    /// Adds a sight-blocking wall segment approximated by a sphere.
    pub fn add_obstacle(&mut self, center: Vec3, radius: f32) -> usize {
        self.add(ColliderTag::Prop, LayerMask::OBSTACLE, center, radius)
    }

    /// Moves a collider so its base sits at `feet`.
    pub fn move_player(&mut self, handle: usize, feet: Vec3) {
        if let Some(collider) = self.colliders.get_mut(handle) {
            collider.center = feet + Vec3::Y;
        }
    }

    /// Moves a collider center.
    pub fn set_center(&mut self, handle: usize, center: Vec3) {
        if let Some(collider) = self.colliders.get_mut(handle) {
            collider.center = center;
        }
    }

    /// Read access to all colliders.
    #[must_use]
    pub fn colliders(&self) -> &[MockCollider] {
        &self.colliders
    }
}

impl SpatialQuery for MockSpatial {
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<ColliderHit> {
        self.colliders
            .iter()
            .filter(|c| mask.intersects(c.layer))
            .filter(|c| c.center.distance(center) <= radius + c.radius)
            .map(|c| ColliderHit {
                tag: c.tag,
                layer: c.layer,
                position: c.center,
            })
            .collect()
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        self.colliders
            .iter()
            .filter(|c| mask.intersects(c.layer))
            .filter_map(|c| {
                ray_sphere(origin, direction, c.center, c.radius).map(|distance| (distance, c.tag))
            })
            .filter(|(distance, _)| *distance <= max_distance)
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(distance, tag)| RayHit {
                distance,
                point: origin + direction * distance,
                tag,
            })
    }
}

// ============================================================================
// Simulated Agent
// ============================================================================

/// Navigation agent that walks straight lines with linear acceleration.
#[derive(Debug, Clone)]
pub struct SimulatedAgent {
    position: Vec3,
    forward: Vec3,
    destination: Option<Vec3>,
    speed: f32,
    acceleration: f32,
    stopping_distance: f32,
    current_speed: f32,
    velocity: Vec3,
}

impl SimulatedAgent {
    /// Creates an agent standing at `position`.
    #[must_use]
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            forward: Vec3::Z,
            destination: None,
            speed: 3.5,
            acceleration: 8.0,
            stopping_distance: 0.5,
            current_speed: 0.0,
            velocity: Vec3::ZERO,
        }
    }

    /// Sets max speed and acceleration.
    #[must_use]
    pub fn with_motion(mut self, speed: f32, acceleration: f32) -> Self {
        self.speed = speed;
        self.acceleration = acceleration;
        self
    }

    /// Sets the arrival distance.
    #[must_use]
    pub fn with_stopping_distance(mut self, stopping_distance: f32) -> Self {
        self.stopping_distance = stopping_distance;
        self
    }

    /// Current destination, if any.
    #[must_use]
    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    fn halt(&mut self) {
        self.current_speed = 0.0;
        self.velocity = Vec3::ZERO;
    }
}

impl NavAgent for SimulatedAgent {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }

    fn set_forward(&mut self, forward: Vec3) {
        if let Some(forward) = flatten(forward).try_normalize() {
            self.forward = forward;
        }
    }

    fn set_destination(&mut self, target: Vec3) -> bool {
        self.destination = Some(target);
        true
    }

    fn warp(&mut self, position: Vec3) {
        self.position = position;
        self.destination = None;
        self.halt();
    }

    fn path_pending(&self) -> bool {
        false
    }

    fn remaining_distance(&self) -> f32 {
        self.destination
            .map_or(0.0, |target| planar_distance(self.position, target))
    }

    fn stopping_distance(&self) -> f32 {
        self.stopping_distance
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
        self.current_speed = self.current_speed.min(speed);
    }

    fn acceleration(&self) -> f32 {
        self.acceleration
    }

    fn set_acceleration(&mut self, acceleration: f32) {
        self.acceleration = acceleration;
    }

    fn integrate(&mut self, dt: f32) {
        let Some(target) = self.destination else {
            self.halt();
            return;
        };
        let offset = flatten(target - self.position);
        let distance = offset.length();
        if distance <= self.stopping_distance {
            self.halt();
            return;
        }
        let direction = offset / distance;
        self.current_speed = (self.current_speed + self.acceleration * dt).min(self.speed);
        let step = (self.current_speed * dt).min(distance);
        self.position += direction * step;
        self.forward = direction;
        if distance - step <= self.stopping_distance {
            self.halt();
        } else {
            self.velocity = direction * self.current_speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_floor_bounds_and_blocked_zone() {
        let floor = OpenFloor::new()
            .with_bounds(Vec3::new(-10.0, 0.0, -10.0), Vec3::new(10.0, 0.0, 10.0))
            .with_blocked_zone(Vec3::new(5.0, 0.0, 5.0), 1.0);

        assert!(floor.compute_path(Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0)).is_some());
        assert!(floor.compute_path(Vec3::ZERO, Vec3::new(30.0, 0.0, 0.0)).is_none());
        assert!(floor.compute_path(Vec3::ZERO, Vec3::new(5.0, 0.0, 5.0)).is_none());
        assert_eq!(floor.path_length(Vec3::ZERO, Vec3::new(30.0, 0.0, 0.0)), 0.0);
        assert!((floor.path_length(Vec3::ZERO, Vec3::new(3.0, 0.0, 4.0)) - 5.0).abs() < 1e-5);

        let snapped = floor
            .sample_navigable(Vec3::new(11.0, 0.0, 0.0), 2.0)
            .expect("should snap inside bounds");
        assert!((snapped.x - 10.0).abs() < 1e-5);
        assert!(floor.sample_navigable(Vec3::new(20.0, 0.0, 0.0), 2.0).is_none());
    }

    #[test]
    fn test_mock_spatial_raycast_finds_nearest() {
        let mut scene = MockSpatial::new();
        scene.add_obstacle(Vec3::new(0.0, 0.0, 10.0), 1.0);
        scene.add_obstacle(Vec3::new(0.0, 0.0, 5.0), 1.0);

        let hit = scene
            .raycast(Vec3::ZERO, Vec3::Z, 20.0, LayerMask::OBSTACLE)
            .expect("should hit");
        assert!((hit.distance - 4.0).abs() < 1e-4);

        assert!(scene.raycast(Vec3::ZERO, Vec3::Z, 3.0, LayerMask::OBSTACLE).is_none());
        assert!(scene.raycast(Vec3::ZERO, Vec3::Z, 20.0, LayerMask::COVER).is_none());
    }

    #[test]
    fn test_mock_spatial_overlap_filters_mask() {
        let mut scene = MockSpatial::new();
        scene.add_player(Vec3::new(3.0, 0.0, 0.0));
        scene.add_obstacle(Vec3::new(3.0, 0.0, 0.0), 1.0);

        let hits = scene.overlap_sphere(Vec3::ZERO, 5.0, LayerMask::PLAYER);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].tag, ColliderTag::Player);
    }

    #[test]
    fn test_simulated_agent_arrives_and_stops() {
        let mut agent = SimulatedAgent::new(Vec3::ZERO).with_motion(4.0, 100.0);
        agent.set_destination(Vec3::new(4.0, 0.0, 0.0));

        agent.integrate(0.5);
        assert!(agent.velocity().length() > 0.0);
        assert!(agent.remaining_distance() < 4.0);

        for _ in 0..10 {
            agent.integrate(0.5);
        }
        assert!(agent.remaining_distance() <= agent.stopping_distance());
        assert_eq!(agent.velocity(), Vec3::ZERO);
    }

    #[test]
    fn test_warp_cancels_destination() {
        let mut agent = SimulatedAgent::new(Vec3::ZERO);
        agent.set_destination(Vec3::new(10.0, 0.0, 0.0));
        agent.warp(Vec3::new(-5.0, 0.0, 0.0));
        assert!(agent.destination().is_none());
        assert_eq!(agent.position(), Vec3::new(-5.0, 0.0, 0.0));
    }
}
