//! Disappear: vanish to the farthest way-point.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::body::AnimFlag;
use crate::state::{State, StateContext, StateSlot, Transition};

const NEXT: [StateSlot; 4] = [
    StateSlot::Search,
    StateSlot::Idle,
    StateSlot::Stalk,
    StateSlot::Patrol,
];

/// Disappear tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisappearConfig {
    /// Seconds to stay put after reappearing
    pub settle_time: f32,
}

impl Default for DisappearConfig {
    fn default() -> Self {
        Self { settle_time: 2.0 }
    }
}

/// Teleports to the single farthest way-point and settles there.
#[derive(Debug, Clone, Default)]
pub struct DisappearState {
    config: DisappearConfig,
    elapsed: f32,
}

impl DisappearState {
    /// Creates the behavior.
    #[must_use]
    pub fn new(config: DisappearConfig) -> Self {
        Self {
            config,
            elapsed: 0.0,
        }
    }
}

impl State for DisappearState {
    fn name(&self) -> &'static str {
        "disappear"
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        self.elapsed = 0.0;
        let position = ctx.position();
        let target = ctx
            .level
            .way_points
            .pick_farthest(position, 1, ctx.rng)
            .map(|wp| wp.position);
        if let Some(target) = target {
            debug!(entity = %ctx.entity, ?target, "disappearing");
            ctx.body.motor.teleport(target);
        }
        ctx.body.motor.stop();
        ctx.body.animator.set_flag(AnimFlag::Walking, false);
        ctx.body.animator.set_flag(AnimFlag::Running, false);
    }

    fn frame_update(&mut self, ctx: &mut StateContext<'_>) -> Transition {
        self.elapsed += ctx.dt;
        if self.elapsed >= self.config.settle_time {
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
    use glam::Vec3;

    use super::*;
    use crate::state::Capabilities;
    use crate::states::testing::Rig;

    #[test]
    fn test_teleports_to_farthest() {
        let mut rig = Rig::at(Vec3::ZERO);
        rig.level
            .way_points
            .register("near", Vec3::new(3.0, 0.0, 0.0))
            .expect("register");
        rig.level
            .way_points
            .register("far", Vec3::new(-40.0, 0.0, 0.0))
            .expect("register");

        let mut disappear = DisappearState::default();
        disappear.enter(&mut rig.ctx(0.0));
        assert_eq!(rig.body.motor.position(), Vec3::new(-40.0, 0.0, 0.0));
    }

    #[test]
    fn test_settles_then_resumes() {
        let mut rig = Rig::at(Vec3::ZERO);
        rig.capabilities = Capabilities::DISAPPEAR | Capabilities::PATROL;
        rig.level
            .way_points
            .register("far", Vec3::new(10.0, 0.0, 0.0))
            .expect("register");
        let mut disappear = DisappearState::new(DisappearConfig { settle_time: 0.5 });
        disappear.enter(&mut rig.ctx(0.0));
        assert_eq!(rig.run(&mut disappear, 0.1, 10), Some(StateSlot::Patrol));
    }
}
