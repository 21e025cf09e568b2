//! Idle: stand still for a drawn duration.

use serde::{Deserialize, Serialize};

use crate::body::AnimFlag;
use crate::error::AiResult;
use crate::random::{DurationCurve, DurationRange};
use crate::state::{State, StateContext, StateSlot, Transition};

const NEXT: [StateSlot; 3] = [StateSlot::Stalk, StateSlot::Search, StateSlot::Patrol];

/// How the idle duration is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdleDuration {
    /// Uniform in a range
    Uniform(DurationRange),
    /// Shaped by a curve
    Curve(DurationCurve),
}

impl IdleDuration {
    fn sample(&self, rng: &mut fastrand::Rng) -> f32 {
        match self {
            Self::Uniform(range) => range.sample(rng),
            Self::Curve(curve) => curve.sample(rng),
        }
    }
}

/// Idle tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    /// Duration distribution
    pub duration: IdleDuration,
    /// Turn toward the last known player position while idle
    pub face_player: bool,
    /// Turn rate in degrees per second
    pub turn_speed: f32,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            duration: IdleDuration::Uniform(DurationRange::new(0.5, 2.0)),
            face_player: false,
            turn_speed: 180.0,
        }
    }
}

impl IdleConfig {
    /// Rejects unusable durations.
    pub fn validate(&self) -> AiResult<()> {
        match &self.duration {
            IdleDuration::Uniform(range) => range.validate("idle duration"),
            IdleDuration::Curve(_) => Ok(()),
        }
    }
}

/// Stands still, then hands over to stalk, search or patrol.
#[derive(Debug, Clone, Default)]
pub struct IdleState {
    config: IdleConfig,
    duration: f32,
    elapsed: f32,
}

impl IdleState {
    /// Creates the behavior.
    #[must_use]
    pub fn new(config: IdleConfig) -> Self {
        Self {
            config,
            duration: 0.0,
            elapsed: 0.0,
        }
    }

    /// Duration drawn on the last enter.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }
}

impl State for IdleState {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        self.duration = self.config.duration.sample(ctx.rng);
        self.elapsed = 0.0;
        ctx.body.motor.stop();
        ctx.body.animator.set_flag(AnimFlag::Walking, false);
    }

    fn frame_update(&mut self, ctx: &mut StateContext<'_>) -> Transition {
        self.elapsed += ctx.dt;
        if self.config.face_player {
            if let Some(target) = ctx.body.senses.last_known_player {
                let step = self.config.turn_speed * ctx.dt;
                ctx.body.motor.face_towards(target, step);
            }
        }
        if self.elapsed >= self.duration {
            return ctx.fallback(&NEXT);
        }
        Transition::Stay
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::state::Capabilities;
    use crate::states::testing::Rig;

    #[test]
    fn test_uniform_duration_mean() {
        let mut rig = Rig::at(Vec3::ZERO);
        let mut idle = IdleState::new(IdleConfig::default());
        let samples = 10_000;
        let mut total = 0.0;
        for _ in 0..samples {
            let mut ctx = rig.ctx(0.0);
            idle.enter(&mut ctx);
            let d = idle.duration();
            assert!((0.5..=2.0).contains(&d));
            total += d;
        }
        let mean = total / samples as f32;
        assert!((mean - 1.25).abs() < 0.05, "mean was {mean}");
    }

    #[test]
    fn test_finishes_into_first_supported() {
        let mut rig = Rig::at(Vec3::ZERO);
        rig.capabilities = Capabilities::IDLE | Capabilities::PATROL | Capabilities::SEARCH;
        let mut idle = IdleState::new(IdleConfig {
            duration: IdleDuration::Uniform(DurationRange::fixed(0.3)),
            ..IdleConfig::default()
        });
        idle.enter(&mut rig.ctx(0.0));
        assert_eq!(rig.run(&mut idle, 0.1, 10), Some(StateSlot::Search));
    }

    #[test]
    fn test_stays_when_nothing_supported() {
        let mut rig = Rig::at(Vec3::ZERO);
        rig.capabilities = Capabilities::IDLE;
        let mut idle = IdleState::new(IdleConfig {
            duration: IdleDuration::Uniform(DurationRange::fixed(0.0)),
            ..IdleConfig::default()
        });
        idle.enter(&mut rig.ctx(0.0));
        assert_eq!(rig.run(&mut idle, 0.1, 5), None);
    }

    #[test]
    fn test_faces_last_known_player() {
        let mut rig = Rig::at(Vec3::ZERO);
        rig.body.senses.last_known_player = Some(Vec3::new(10.0, 0.0, 0.0));
        let mut idle = IdleState::new(IdleConfig {
            face_player: true,
            turn_speed: 900.0,
            ..IdleConfig::default()
        });
        idle.enter(&mut rig.ctx(0.0));
        rig.step(&mut idle, 0.1);
        assert!((rig.body.motor.forward() - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn test_curve_duration_in_key_span() {
        let mut rig = Rig::at(Vec3::ZERO);
        let curve = DurationCurve::new(vec![(0.0, 1.0), (1.0, 3.0)]).expect("valid");
        let mut idle = IdleState::new(IdleConfig {
            duration: IdleDuration::Curve(curve),
            ..IdleConfig::default()
        });
        for _ in 0..100 {
            idle.enter(&mut rig.ctx(0.0));
            assert!((1.0..=3.0).contains(&idle.duration()));
        }
    }
}
