//! Stun: stagger in place.

use serde::{Deserialize, Serialize};

use crate::body::AnimFlag;
use crate::random::VariantRange;
use crate::state::{AnimationTrigger, State, StateContext, StateSlot, Transition};
use crate::timer::Countdown;

const NEXT: [StateSlot; 3] = [StateSlot::Search, StateSlot::Idle, StateSlot::Patrol];

/// Stun tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StunConfig {
    /// Stagger variants drawn on entry
    pub variants: VariantRange,
    /// Seconds the stagger lasts if the animation never reports back
    pub duration: f32,
}

impl Default for StunConfig {
    fn default() -> Self {
        Self {
            variants: VariantRange::new(0, 1),
            duration: 3.0,
        }
    }
}

/// Stops and plays the stagger until it times out or the animation ends.
#[derive(Debug, Clone, Default)]
pub struct StunState {
    config: StunConfig,
    timer: Countdown,
}

impl StunState {
    /// Creates the behavior.
    #[must_use]
    pub fn new(config: StunConfig) -> Self {
        Self {
            config,
            timer: Countdown::idle(),
        }
    }
}

impl State for StunState {
    fn name(&self) -> &'static str {
        "stun"
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        ctx.body.motor.stop();
        ctx.body.motor.set_enabled(false);
        let variant = self.config.variants.sample(ctx.rng);
        ctx.body.animator.set_variant(variant);
        ctx.body.animator.set_flag(AnimFlag::Walking, false);
        ctx.body.animator.set_flag(AnimFlag::Stunned, true);
        self.timer.restart(self.config.duration);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        ctx.body.motor.set_enabled(true);
        ctx.body.animator.set_flag(AnimFlag::Stunned, false);
    }

    fn frame_update(&mut self, ctx: &mut StateContext<'_>) -> Transition {
        if self.timer.tick(ctx.dt) {
            return ctx.fallback(&NEXT);
        }
        Transition::Stay
    }

    fn animation_trigger(
        &mut self,
        ctx: &mut StateContext<'_>,
        trigger: AnimationTrigger,
    ) -> Transition {
        if trigger == AnimationTrigger::StunRecovered {
            self.timer.stop();
            return ctx.fallback(&NEXT);
        }
        Transition::Stay
    }
}
