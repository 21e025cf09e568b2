//! Physical presence of a monster: movement, animation, gaze and memory.

use std::collections::HashSet;

use glam::Vec3;
use lurk_common::rotate_towards;
use serde::{Deserialize, Serialize};

use crate::events::AiEventKind;
use crate::host::{NavAgent, PathOracle};

/// Slack added to the agent's stopping distance when testing arrival.
pub const ARRIVAL_EPSILON: f32 = 0.1;

/// Squared speed under which an agent counts as stationary.
pub const STATIONARY_SPEED_SQ: f32 = 0.1;

// ============================================================================
// Motor
// ============================================================================

/// Wraps the host nav agent with enable/disable and speed multipliers.
///
/// Multipliers scale the current value and stack; a reset restores the
/// baseline captured at construction.
#[derive(Debug)]
pub struct Motor {
    agent: Box<dyn NavAgent>,
    enabled: bool,
    base_speed: f32,
    base_acceleration: f32,
}

impl Motor {
    /// Wraps an agent, capturing its current speed and acceleration.
    #[must_use]
    pub fn new(agent: Box<dyn NavAgent>) -> Self {
        let base_speed = agent.speed();
        let base_acceleration = agent.acceleration();
        Self {
            agent,
            enabled: true,
            base_speed,
            base_acceleration,
        }
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.agent.position()
    }

    /// Current facing.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.agent.forward()
    }

    /// Whether movement requests are accepted.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables movement requests.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Requests a path. Ignored while disabled.
    pub fn move_to(&mut self, target: Vec3) -> bool {
        if !self.enabled {
            return false;
        }
        self.agent.set_destination(target)
    }

    /// Stops in place by targeting the current position.
    pub fn stop(&mut self) {
        let here = self.agent.position();
        self.agent.set_destination(here);
    }

    /// Moves instantly.
    pub fn teleport(&mut self, position: Vec3) {
        self.agent.warp(position);
    }

    /// Whether the agent has arrived and come to rest.
    #[must_use]
    pub fn at_destination(&self) -> bool {
        !self.agent.path_pending()
            && self.agent.remaining_distance() <= self.agent.stopping_distance() + ARRIVAL_EPSILON
            && self.agent.velocity().length_squared() < STATIONARY_SPEED_SQ
    }

    /// Walking distance to `target`, or 0 when unreachable.
    #[must_use]
    pub fn path_length(&self, paths: &dyn PathOracle, target: Vec3) -> f32 {
        paths.path_length(self.position(), target)
    }

    /// Turns toward a point by at most `max_degrees`.
    pub fn face_towards(&mut self, point: Vec3, max_degrees: f32) {
        let forward = rotate_towards(self.forward(), point - self.position(), max_degrees);
        self.agent.set_forward(forward);
    }

    /// Scales the current speed by `multiplier`.
    pub fn speed_multiplier(&mut self, multiplier: f32) {
        let speed = self.agent.speed();
        self.agent.set_speed(speed * multiplier);
    }

    /// Scales the current acceleration by `multiplier`.
    pub fn acceleration_multiplier(&mut self, multiplier: f32) {
        let acceleration = self.agent.acceleration();
        self.agent.set_acceleration(acceleration * multiplier);
    }

    /// Restores baseline speed.
    pub fn reset_speed(&mut self) {
        self.agent.set_speed(self.base_speed);
    }

    /// Restores baseline acceleration.
    pub fn reset_acceleration(&mut self) {
        self.agent.set_acceleration(self.base_acceleration);
    }

    /// Effective speed.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.agent.speed()
    }

    /// Effective acceleration.
    #[must_use]
    pub fn acceleration(&self) -> f32 {
        self.agent.acceleration()
    }

    /// Baseline speed.
    #[must_use]
    pub fn base_speed(&self) -> f32 {
        self.base_speed
    }

    /// Read access to the agent.
    #[must_use]
    pub fn agent(&self) -> &dyn NavAgent {
        self.agent.as_ref()
    }

    /// Advances the agent by one physics step.
    pub fn integrate(&mut self, dt: f32) {
        self.agent.integrate(dt);
    }
}

// ============================================================================
// Animator
// ============================================================================

/// Boolean animation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimFlag {
    /// Walking loop
    Walking,
    /// Running loop
    Running,
    /// Frozen pose
    Frozen,
    /// Stagger
    Stunned,
    /// Resting pose
    Sleeping,
    /// Kill animation
    Caught,
}

/// Animation parameters the host reads each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Animator {
    flags: HashSet<AnimFlag>,
    variant: i32,
    speed: f32,
}

impl Default for Animator {
    fn default() -> Self {
        Self {
            flags: HashSet::new(),
            variant: 0,
            speed: 1.0,
        }
    }
}

impl Animator {
    /// Sets or clears a flag.
    pub fn set_flag(&mut self, flag: AnimFlag, on: bool) {
        if on {
            self.flags.insert(flag);
        } else {
            self.flags.remove(&flag);
        }
    }

    /// Reads a flag.
    #[must_use]
    pub fn flag(&self, flag: AnimFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Sets the pose variant.
    pub fn set_variant(&mut self, variant: i32) {
        self.variant = variant;
    }

    /// Current pose variant.
    #[must_use]
    pub fn variant(&self) -> i32 {
        self.variant
    }

    /// Scales the current playback speed.
    pub fn speed_multiplier(&mut self, multiplier: f32) {
        self.speed *= multiplier;
    }

    /// Restores normal playback speed.
    pub fn reset_speed(&mut self) {
        self.speed = 1.0;
    }

    /// Playback speed.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.speed
    }
}

// ============================================================================
// Look-At Rig
// ============================================================================

/// Where the head rig points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LookTarget {
    /// Free look
    #[default]
    None,
    /// Track the player
    Player,
    /// Fixed world point
    Point(Vec3),
}

/// Head-tracking rig state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LookAtRig {
    /// Whether the rig drives the head
    pub enabled: bool,
    /// Tracking target
    pub target: LookTarget,
}

// ============================================================================
// Body
// ============================================================================

/// What the monster remembers about the player.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Senses {
    /// Player in view right now
    pub player_visible: bool,
    /// Last position the player was seen at
    pub last_known_player: Option<Vec3>,
    /// Last footstep heard
    pub heard_at: Option<Vec3>,
}

/// Mutable parts of a monster that behaviors act on.
#[derive(Debug)]
pub struct Body {
    /// Navigation
    pub motor: Motor,
    /// Animation parameters
    pub animator: Animator,
    /// Head rig
    pub look_at: LookAtRig,
    /// Perception memory
    pub senses: Senses,
    /// Point the next investigation targets
    pub point_of_interest: Option<Vec3>,
    outbox: Vec<AiEventKind>,
}

impl Body {
    /// Creates a body around a nav agent.
    #[must_use]
    pub fn new(agent: Box<dyn NavAgent>) -> Self {
        Self {
            motor: Motor::new(agent),
            animator: Animator::default(),
            look_at: LookAtRig::default(),
            senses: Senses::default(),
            point_of_interest: None,
            outbox: Vec::new(),
        }
    }

    /// Records an event for the session to publish.
    pub fn emit(&mut self, kind: AiEventKind) {
        self.outbox.push(kind);
    }

    /// Takes recorded events.
    pub fn drain_events(&mut self) -> Vec<AiEventKind> {
        std::mem::take(&mut self.outbox)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{OpenFloor, SimulatedAgent};

    fn motor(speed: f32, acceleration: f32) -> Motor {
        Motor::new(Box::new(SimulatedAgent::new(Vec3::ZERO).with_motion(speed, acceleration)))
    }

    #[test]
    fn test_multipliers_stack_and_reset() {
        let mut motor = motor(5.0, 8.0);
        motor.speed_multiplier(3.0);
        motor.speed_multiplier(2.0);
        assert_eq!(motor.speed(), 30.0);
        motor.reset_speed();
        assert_eq!(motor.speed(), 5.0);

        motor.acceleration_multiplier(2.0);
        motor.acceleration_multiplier(1.5);
        assert_eq!(motor.acceleration(), 24.0);
        motor.reset_acceleration();
        assert_eq!(motor.acceleration(), 8.0);
        assert_eq!(motor.base_speed(), 5.0);
    }

    #[test]
    fn test_disabled_motor_ignores_move() {
        let mut motor = motor(5.0, 8.0);
        motor.set_enabled(false);
        assert!(!motor.move_to(Vec3::new(10.0, 0.0, 0.0)));
        assert!(motor.at_destination());
    }

    #[test]
    fn test_at_destination_after_walk() {
        let mut motor = motor(5.0, 100.0);
        assert!(motor.move_to(Vec3::new(3.0, 0.0, 0.0)));
        assert!(!motor.at_destination());
        for _ in 0..20 {
            motor.integrate(0.1);
        }
        assert!(motor.at_destination());
    }

    #[test]
    fn test_stop_targets_current_position() {
        let mut motor = motor(5.0, 100.0);
        motor.move_to(Vec3::new(10.0, 0.0, 0.0));
        motor.integrate(0.2);
        motor.stop();
        motor.integrate(0.1);
        assert!(motor.at_destination());
    }

    #[test]
    fn test_path_length_unreachable_is_zero() {
        let floor = OpenFloor::new().with_bounds(Vec3::splat(-5.0), Vec3::splat(5.0));
        let motor = motor(5.0, 8.0);
        assert_eq!(motor.path_length(&floor, Vec3::new(50.0, 0.0, 0.0)), 0.0);
        assert!((motor.path_length(&floor, Vec3::new(3.0, 0.0, 4.0)) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_face_towards_turns() {
        let mut motor = motor(5.0, 8.0);
        motor.face_towards(Vec3::new(10.0, 0.0, 0.0), 180.0);
        assert!((motor.forward() - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn test_animator_flags_and_speed() {
        let mut animator = Animator::default();
        animator.set_flag(AnimFlag::Frozen, true);
        assert!(animator.flag(AnimFlag::Frozen));
        animator.set_flag(AnimFlag::Frozen, false);
        assert!(!animator.flag(AnimFlag::Frozen));
        animator.speed_multiplier(1.5);
        animator.speed_multiplier(2.0);
        assert_eq!(animator.speed(), 3.0);
        animator.reset_speed();
        assert_eq!(animator.speed(), 1.0);
    }
}
