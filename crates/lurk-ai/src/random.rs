//! Randomized durations and positions.
//!
//! All randomness flows through a caller-owned `fastrand::Rng` so a seeded
//! entity replays identically.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{AiError, AiResult};

// ============================================================================
// Ranges
// ============================================================================

/// Uniform float range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationRange {
    /// Lower bound
    pub min: f32,
    /// Upper bound
    pub max: f32,
}

impl DurationRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Range that always yields `value`.
    #[must_use]
    pub const fn fixed(value: f32) -> Self {
        Self::new(value, value)
    }

    /// Draws a value.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> f32 {
        self.min + rng.f32() * (self.max - self.min)
    }

    /// Midpoint, the mean of a uniform draw.
    #[must_use]
    pub fn mean(&self) -> f32 {
        (self.min + self.max) * 0.5
    }

    /// Rejects negative or inverted ranges.
    pub fn validate(&self, what: &str) -> AiResult<()> {
        if self.min < 0.0 || self.max < self.min || !self.max.is_finite() {
            return Err(AiError::InvalidConfig(format!(
                "{what}: range [{}, {}] is not a valid duration",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Inclusive integer range, used for animation variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRange {
    /// Lowest variant
    pub min: i32,
    /// Highest variant
    pub max: i32,
}

impl VariantRange {
    /// Creates an inclusive range.
    #[must_use]
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Draws a variant in `[min, max]`.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> i32 {
        if self.max <= self.min {
            return self.min;
        }
        rng.i32(self.min..=self.max)
    }
}

// ============================================================================
// Curves
// ============================================================================

/// Piecewise-linear curve over `(time, value)` keys.
///
/// Sampling draws a uniform time across the key span and evaluates the
/// curve there, which lets designers shape a duration distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CurveKeys")]
pub struct DurationCurve {
    keys: Vec<(f32, f32)>,
}

#[derive(Deserialize)]
struct CurveKeys {
    keys: Vec<(f32, f32)>,
}

impl TryFrom<CurveKeys> for DurationCurve {
    type Error = AiError;

    fn try_from(raw: CurveKeys) -> AiResult<Self> {
        Self::new(raw.keys)
    }
}

impl DurationCurve {
    /// Builds a curve. Keys are sorted by time.
    pub fn new(mut keys: Vec<(f32, f32)>) -> AiResult<Self> {
        if keys.is_empty() {
            return Err(AiError::InvalidConfig("duration curve has no keys".into()));
        }
        if keys.iter().any(|(t, v)| !t.is_finite() || !v.is_finite() || *v < 0.0) {
            return Err(AiError::InvalidConfig(
                "duration curve keys must be finite and non-negative".into(),
            ));
        }
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(Self { keys })
    }

    /// Key frames in time order.
    #[must_use]
    pub fn keys(&self) -> &[(f32, f32)] {
        &self.keys
    }

    /// Evaluates the curve at `time`, clamping outside the key span.
    #[must_use]
    pub fn evaluate(&self, time: f32) -> f32 {
        let Some(&(first_t, first_v)) = self.keys.first() else {
            return 0.0;
        };
        if time <= first_t {
            return first_v;
        }
        for pair in self.keys.windows(2) {
            let (t0, v0) = pair[0];
            let (t1, v1) = pair[1];
            if time <= t1 {
                let span = t1 - t0;
                if span <= f32::EPSILON {
                    return v1;
                }
                return v0 + (v1 - v0) * ((time - t0) / span);
            }
        }
        self.keys.last().map_or(first_v, |&(_, v)| v)
    }

    /// Draws a value by evaluating at a uniform time.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> f32 {
        let start = self.keys.first().map_or(0.0, |k| k.0);
        let end = self.keys.last().map_or(0.0, |k| k.0);
        self.evaluate(start + rng.f32() * (end - start))
    }
}

// ============================================================================
// Positions
// ============================================================================

/// Uniform point inside a horizontal disc.
pub fn point_in_disc(rng: &mut fastrand::Rng, center: Vec3, radius: f32) -> Vec3 {
    let distance = radius * rng.f32().sqrt();
    let angle = rng.f32() * std::f32::consts::TAU;
    center + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance)
}
