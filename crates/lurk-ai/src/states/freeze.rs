//! Freeze: hold a pose until released.

use serde::{Deserialize, Serialize};

use crate::body::AnimFlag;
use crate::events::AiEventKind;
use crate::random::VariantRange;
use crate::state::{Signal, State, StateContext, StateSlot, Transition};
use crate::timer::Countdown;

/// Freeze tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreezeConfig {
    /// Pose variants drawn on entry
    pub variants: VariantRange,
    /// Seconds until the freeze ends by itself; `None` waits for a signal
    pub duration: Option<f32>,
    /// Slots to resume into, in priority order
    pub resume: Vec<StateSlot>,
}

impl Default for FreezeConfig {
    fn default() -> Self {
        Self {
            variants: VariantRange::new(0, 2),
            duration: None,
            resume: vec![StateSlot::Search, StateSlot::Patrol, StateSlot::Idle],
        }
    }
}

/// Stops dead with movement disabled until a timer or signal ends it.
#[derive(Debug, Clone, Default)]
pub struct FreezeState {
    config: FreezeConfig,
    timer: Countdown,
}

impl FreezeState {
    /// Creates the behavior.
    #[must_use]
    pub fn new(config: FreezeConfig) -> Self {
        Self {
            config,
            timer: Countdown::idle(),
        }
    }

    fn finish(&self, ctx: &mut StateContext<'_>) -> Transition {
        ctx.body.emit(AiEventKind::FreezeEnded);
        ctx.fallback(&self.config.resume)
    }
}

impl State for FreezeState {
    fn name(&self) -> &'static str {
        "freeze"
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        ctx.body.motor.stop();
        ctx.body.motor.set_enabled(false);
        let variant = self.config.variants.sample(ctx.rng);
        ctx.body.animator.set_variant(variant);
        ctx.body.animator.set_flag(AnimFlag::Walking, false);
        ctx.body.animator.set_flag(AnimFlag::Frozen, true);
        match self.config.duration {
            Some(seconds) => self.timer.restart(seconds),
            None => self.timer.stop(),
        }
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        self.timer.stop();
        ctx.body.motor.set_enabled(true);
        ctx.body.animator.set_flag(AnimFlag::Frozen, false);
    }

    fn frame_update(&mut self, ctx: &mut StateContext<'_>) -> Transition {
        if self.timer.tick(ctx.dt) {
            return self.finish(ctx);
        }
        Transition::Stay
    }

    fn signal(&mut self, ctx: &mut StateContext<'_>, signal: Signal) -> Transition {
        match signal {
            Signal::FreezeEnded => self.finish(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::states::testing::Rig;

    #[test]
    fn test_enter_disables_motion_and_sets_pose() {
        let mut rig = Rig::at(Vec3::ZERO);
        let mut freeze = FreezeState::new(FreezeConfig::default());
        freeze.enter(&mut rig.ctx(0.0));

        assert!(!rig.body.motor.is_enabled());
        assert!(rig.body.animator.flag(AnimFlag::Frozen));
        assert!((0..=2).contains(&rig.body.animator.variant()));
        assert!(!rig.body.motor.move_to(Vec3::new(5.0, 0.0, 0.0)));

        freeze.exit(&mut rig.ctx(0.0));
        assert!(rig.body.motor.is_enabled());
        assert!(!rig.body.animator.flag(AnimFlag::Frozen));
    }

    #[test]
    fn test_waits_for_signal_without_duration() {
        let mut rig = Rig::at(Vec3::ZERO);
        let mut freeze = FreezeState::new(FreezeConfig::default());
        freeze.enter(&mut rig.ctx(0.0));
        assert_eq!(rig.run(&mut freeze, 0.5, 100), None);

        let next = freeze.signal(&mut rig.ctx(0.0), Signal::FreezeEnded);
        assert_eq!(next, Transition::To(StateSlot::Search));
        assert_eq!(rig.body.drain_events(), vec![AiEventKind::FreezeEnded]);
    }

    #[test]
    fn test_timed_freeze_resumes() {
        let mut rig = Rig::at(Vec3::ZERO);
        let mut freeze = FreezeState::new(FreezeConfig {
            duration: Some(1.0),
            resume: vec![StateSlot::Idle],
            ..FreezeConfig::default()
        });
        freeze.enter(&mut rig.ctx(0.0));
        assert_eq!(rig.run(&mut freeze, 0.25, 10), Some(StateSlot::Idle));
    }
}
