//! Perception.
//!
//! Sensors turn raw host queries and player stimuli into edge events.
//! None of them decide what the monster does; the entity maps their
//! outputs onto state changes.

use glam::Vec3;
use lurk_common::{within_cone, LayerMask};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{AiError, AiResult};
use crate::host::{ColliderTag, SpatialQuery};
use crate::timer::Countdown;

// ============================================================================
// Sight
// ============================================================================

/// Vision cone configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOfView {
    /// View distance
    pub radius: f32,
    /// Full cone aperture in degrees
    pub angle: f32,
    /// Eye height above the body origin
    pub vertical_offset: f32,
    /// Layers searched for the player
    pub target_mask: LayerMask,
    /// Layers that block line of sight
    pub obstruction_mask: LayerMask,
}

impl Default for FieldOfView {
    fn default() -> Self {
        Self {
            radius: 20.0,
            angle: 110.0,
            vertical_offset: 1.6,
            target_mask: LayerMask::PLAYER,
            obstruction_mask: LayerMask::SIGHT_BLOCKERS,
        }
    }
}

impl FieldOfView {
    /// Rejects cones that can never see anything.
    pub fn validate(&self) -> AiResult<()> {
        if self.radius <= 0.0 || self.angle <= 0.0 || self.angle > 360.0 {
            return Err(AiError::InvalidConfig(format!(
                "field of view radius {} / angle {} out of range",
                self.radius, self.angle
            )));
        }
        Ok(())
    }

    /// Returns the player's position if visible from `origin` facing `forward`.
    ///
    /// The player must overlap the view sphere, lie inside the cone and have
    /// no obstruction between the eye and its center.
    pub fn can_see(&self, origin: Vec3, forward: Vec3, spatial: &dyn SpatialQuery) -> Option<Vec3> {
        let eye = origin + Vec3::Y * self.vertical_offset;
        let target = spatial
            .overlap_sphere(eye, self.radius, self.target_mask)
            .into_iter()
            .find(|hit| hit.tag == ColliderTag::Player)?;

        let to_target = target.position - eye;
        let distance = to_target.length();
        if distance > self.radius {
            return None;
        }
        let Some(direction) = to_target.try_normalize() else {
            return Some(target.position);
        };
        if !within_cone(forward, direction, self.angle) {
            return None;
        }
        if spatial
            .raycast(eye, direction, distance, self.obstruction_mask)
            .is_some()
        {
            return None;
        }
        Some(target.position)
    }
}

/// Change in visibility since the previous tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SightEdge {
    /// Player became visible at this position
    Spotted(Vec3),
    /// Player was lost; last seen here
    Lost(Vec3),
}

/// Edge-detecting wrapper around a [`FieldOfView`].
#[derive(Debug, Clone, Default)]
pub struct SightSensor {
    fov: FieldOfView,
    seeing: bool,
    last_seen: Option<Vec3>,
}

impl SightSensor {
    /// Creates a sensor.
    #[must_use]
    pub fn new(fov: FieldOfView) -> Self {
        Self {
            fov,
            seeing: false,
            last_seen: None,
        }
    }

    /// Cone configuration.
    #[must_use]
    pub fn fov(&self) -> &FieldOfView {
        &self.fov
    }

    /// Whether the player was visible last tick.
    #[must_use]
    pub fn is_seeing(&self) -> bool {
        self.seeing
    }

    /// Last position the player was seen at.
    #[must_use]
    pub fn last_seen(&self) -> Option<Vec3> {
        self.last_seen
    }

    /// Runs the cone check and reports a rising or falling edge.
    pub fn update(
        &mut self,
        origin: Vec3,
        forward: Vec3,
        spatial: &dyn SpatialQuery,
    ) -> Option<SightEdge> {
        let visible = self.fov.can_see(origin, forward, spatial);
        self.observe(visible)
    }

    /// Feeds one visibility sample.
    pub fn observe(&mut self, visible: Option<Vec3>) -> Option<SightEdge> {
        match (self.seeing, visible) {
            (false, Some(position)) => {
                self.seeing = true;
                self.last_seen = Some(position);
                Some(SightEdge::Spotted(position))
            },
            (true, Some(position)) => {
                self.last_seen = Some(position);
                None
            },
            (true, None) => {
                self.seeing = false;
                self.last_seen.map(SightEdge::Lost)
            },
            (false, None) => None,
        }
    }
}

// ============================================================================
// Flashlight
// ============================================================================

/// Flashlight exposure tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashlightConfig {
    /// Seconds of continuous exposure before the detector fires
    pub threshold: f32,
    /// Exposure lost per second while unlit
    pub decay_rate: f32,
    /// Seconds after firing before it can fire again
    pub cooldown: f32,
}

impl Default for FlashlightConfig {
    fn default() -> Self {
        Self {
            threshold: 1.5,
            decay_rate: 1.0,
            cooldown: 5.0,
        }
    }
}

/// Accumulates exposure while lit and fires once per threshold crossing.
#[derive(Debug, Clone, Default)]
pub struct FlashlightDetector {
    config: FlashlightConfig,
    lit: bool,
    exposure: f32,
    cooldown: Countdown,
}

impl FlashlightDetector {
    /// Creates a detector.
    #[must_use]
    pub fn new(config: FlashlightConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Marks whether the flashlight is on the monster this tick.
    pub fn set_lit(&mut self, lit: bool) {
        self.lit = lit;
    }

    /// Accumulated exposure in seconds.
    #[must_use]
    pub fn exposure(&self) -> f32 {
        self.exposure
    }

    /// Whether the detector is waiting out its cooldown.
    #[must_use]
    pub fn cooling_down(&self) -> bool {
        self.cooldown.is_running()
    }

    /// Advances exposure. Returns true on the tick the threshold is crossed.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.cooldown.tick(dt);
        if self.lit {
            self.exposure += dt;
        } else {
            self.exposure = (self.exposure - self.config.decay_rate * dt).max(0.0);
        }
        if self.exposure >= self.config.threshold && !self.cooldown.is_running() {
            trace!(exposure = self.exposure, "flashlight threshold crossed");
            self.exposure = 0.0;
            self.cooldown.restart(self.config.cooldown);
            return true;
        }
        false
    }
}

// ============================================================================
// Flash Counter
// ============================================================================

/// Camera-flash counting tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashCounterConfig {
    /// Flashes needed to trigger
    pub required: u32,
    /// Milliseconds without a flash before the count resets
    pub window_ms: u32,
}

impl Default for FlashCounterConfig {
    fn default() -> Self {
        Self {
            required: 3,
            window_ms: 2000,
        }
    }
}

/// Counts discrete flashes inside a rolling timeout.
#[derive(Debug, Clone, Default)]
pub struct FlashCounter {
    config: FlashCounterConfig,
    count: u32,
    since_last: f32,
}

impl FlashCounter {
    /// Creates a counter.
    #[must_use]
    pub fn new(config: FlashCounterConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Flashes counted in the current window.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Registers a flash. Returns true when the required count is reached,
    /// after which the count starts over.
    pub fn register(&mut self) -> bool {
        self.count += 1;
        self.since_last = 0.0;
        if self.count >= self.config.required.max(1) {
            self.count = 0;
            return true;
        }
        false
    }

    /// Expires the window once no flash arrived for too long.
    pub fn tick(&mut self, dt: f32) {
        if self.count == 0 {
            return;
        }
        self.since_last += dt;
        if self.since_last * 1000.0 > self.config.window_ms as f32 {
            self.count = 0;
            self.since_last = 0.0;
        }
    }
}

// ============================================================================
// Hearing
// ============================================================================

/// Footstep hearing tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootstepConfig {
    /// Hearing radius for a footstep of loudness 1
    pub radius: f32,
    /// Seconds after hearing before another footstep registers
    pub cooldown: f32,
}

impl Default for FootstepConfig {
    fn default() -> Self {
        Self {
            radius: 12.0,
            cooldown: 1.0,
        }
    }
}

/// Fires when a footstep lands within range.
#[derive(Debug, Clone, Default)]
pub struct FootstepDetector {
    config: FootstepConfig,
    cooldown: Countdown,
}

impl FootstepDetector {
    /// Creates a detector.
    #[must_use]
    pub fn new(config: FootstepConfig) -> Self {
        Self {
            config,
            cooldown: Countdown::idle(),
        }
    }

    /// Checks a footstep at `source`. Louder steps carry further.
    pub fn hear(&mut self, listener: Vec3, source: Vec3, loudness: f32) -> bool {
        if self.cooldown.is_running() {
            return false;
        }
        if listener.distance(source) <= self.config.radius * loudness.max(0.0) {
            self.cooldown.restart(self.config.cooldown);
            return true;
        }
        false
    }

    /// Advances the cooldown.
    pub fn tick(&mut self, dt: f32) {
        self.cooldown.tick(dt);
    }
}

/// All perception an entity carries. Any sensor may be absent.
#[derive(Debug, Clone, Default)]
pub struct SensorSuite {
    /// Sight
    pub sight: Option<SightSensor>,
    /// Flashlight exposure
    pub flashlight: Option<FlashlightDetector>,
    /// Camera flash counting
    pub flash_counter: Option<FlashCounter>,
    /// Footstep hearing
    pub hearing: Option<FootstepDetector>,
}
