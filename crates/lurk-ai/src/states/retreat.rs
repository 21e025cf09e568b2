//! Retreat: sprint to one of the farthest way-points.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::body::AnimFlag;
use crate::error::{AiError, AiResult};
use crate::events::AiEventKind;
use crate::state::{State, StateContext, StateSlot, Transition};

const NEXT: [StateSlot; 3] = [StateSlot::Idle, StateSlot::Stalk, StateSlot::Patrol];

/// Retreat tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetreatConfig {
    /// Pool size when picking among the farthest way-points
    pub farthest_candidates: usize,
    /// Speed relative to baseline
    pub speed_multiplier: f32,
    /// Acceleration relative to baseline
    pub acceleration_multiplier: f32,
    /// Animation playback speed
    pub animation_speed_multiplier: f32,
    /// Seconds before arrival can end the retreat
    pub min_duration: f32,
}

impl Default for RetreatConfig {
    fn default() -> Self {
        Self {
            farthest_candidates: 3,
            speed_multiplier: 2.0,
            acceleration_multiplier: 2.0,
            animation_speed_multiplier: 1.5,
            min_duration: 1.0,
        }
    }
}

impl RetreatConfig {
    /// Rejects unusable tuning.
    pub fn validate(&self) -> AiResult<()> {
        if self.farthest_candidates == 0 || self.speed_multiplier <= 0.0 || self.min_duration < 0.0 {
            return Err(AiError::InvalidConfig(
                "retreat needs at least one candidate and a positive speed".into(),
            ));
        }
        Ok(())
    }
}

/// Runs to a far way-point at boosted speed, then resumes.
///
/// Multipliers are applied on enter and reset on exit, even if the retreat
/// is interrupted.
#[derive(Debug, Clone, Default)]
pub struct RetreatState {
    config: RetreatConfig,
    elapsed: f32,
    destination: Option<Vec3>,
}

impl RetreatState {
    /// Creates the behavior.
    #[must_use]
    pub fn new(config: RetreatConfig) -> Self {
        Self {
            config,
            elapsed: 0.0,
            destination: None,
        }
    }

    /// Way-point being fled to.
    #[must_use]
    pub fn destination(&self) -> Option<Vec3> {
        self.destination
    }

    fn pick(&mut self, ctx: &mut StateContext<'_>) {
        let position = ctx.position();
        let target = ctx
            .level
            .way_points
            .pick_farthest(position, self.config.farthest_candidates, ctx.rng)
            .map(|wp| wp.position);
        if let Some(target) = target {
            if ctx.body.motor.move_to(target) {
                debug!(entity = %ctx.entity, ?target, "retreating");
                self.destination = Some(target);
            }
        }
    }
}

impl State for RetreatState {
    fn name(&self) -> &'static str {
        "retreat"
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        self.elapsed = 0.0;
        self.destination = None;
        ctx.body.motor.speed_multiplier(self.config.speed_multiplier);
        ctx.body
            .motor
            .acceleration_multiplier(self.config.acceleration_multiplier);
        ctx.body
            .animator
            .speed_multiplier(self.config.animation_speed_multiplier);
        ctx.body.animator.set_flag(AnimFlag::Running, true);
        self.pick(ctx);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        ctx.body.motor.reset_speed();
        ctx.body.motor.reset_acceleration();
        ctx.body.animator.reset_speed();
        ctx.body.animator.set_flag(AnimFlag::Running, false);
    }

    fn frame_update(&mut self, ctx: &mut StateContext<'_>) -> Transition {
        self.elapsed += ctx.dt;
        if self.destination.is_none() {
            self.pick(ctx);
        }
        if self.elapsed >= self.config.min_duration && ctx.body.motor.at_destination() {
            ctx.body.emit(AiEventKind::RetreatEnded);
            return ctx.fallback(&NEXT);
        }
        Transition::Stay
    }

    fn needs_way_points(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use lurk_common::planar_distance;

    use super::*;
    use crate::states::testing::Rig;

    fn rig_with_points() -> Rig {
        let mut rig = Rig::at(Vec3::ZERO);
        for (i, x) in [2.0, 4.0, 20.0, 25.0].iter().enumerate() {
            rig.level
                .way_points
                .register(format!("wp{i}"), Vec3::new(*x, 0.0, 0.0))
                .expect("register");
        }
        rig
    }

    #[test]
    fn test_multipliers_applied_and_reset() {
        let mut rig = rig_with_points();
        let mut retreat = RetreatState::new(RetreatConfig {
            speed_multiplier: 3.0,
            acceleration_multiplier: 2.0,
            ..RetreatConfig::default()
        });
        retreat.enter(&mut rig.ctx(0.0));
        assert_eq!(rig.body.motor.speed(), 15.0);
        assert_eq!(rig.body.motor.acceleration(), 100.0);
        assert_eq!(rig.body.animator.speed(), 1.5);

        rig.step(&mut retreat, 0.1);
        retreat.exit(&mut rig.ctx(0.0));
        assert_eq!(rig.body.motor.speed(), 5.0);
        assert_eq!(rig.body.motor.acceleration(), 50.0);
        assert_eq!(rig.body.animator.speed(), 1.0);
    }

    #[test]
    fn test_flees_to_far_point_and_reports() {
        let mut rig = rig_with_points();
        let mut retreat = RetreatState::new(RetreatConfig {
            farthest_candidates: 2,
            ..RetreatConfig::default()
        });
        retreat.enter(&mut rig.ctx(0.0));
        let target = retreat.destination().expect("picked");
        assert!(target.x >= 20.0);

        assert_eq!(rig.run(&mut retreat, 0.1, 300), Some(StateSlot::Idle));
        assert!(planar_distance(rig.body.motor.position(), target) <= 0.6);
        assert!(rig
            .body
            .drain_events()
            .contains(&AiEventKind::RetreatEnded));
    }

    #[test]
    fn test_min_duration_floor() {
        let mut rig = Rig::at(Vec3::ZERO);
        rig.level
            .way_points
            .register("here", Vec3::ZERO)
            .expect("register");
        let mut retreat = RetreatState::new(RetreatConfig {
            min_duration: 1.0,
            ..RetreatConfig::default()
        });
        retreat.enter(&mut rig.ctx(0.0));
        for _ in 0..9 {
            assert_eq!(rig.step(&mut retreat, 0.1), Transition::Stay);
        }
        assert_eq!(rig.run(&mut retreat, 0.1, 3), Some(StateSlot::Idle));
    }
}
