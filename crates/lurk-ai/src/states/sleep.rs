//! Sleep: walk to a hidden sleep point and rest there.

use lurk_common::SleepPointId;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::body::AnimFlag;
use crate::events::AiEventKind;
use crate::random::DurationRange;
use crate::sleep::SleepSearch;
use crate::state::{AnimationTrigger, State, StateContext, StateSlot, Transition};
use crate::timer::Countdown;

/// Sleep tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SleepConfig {
    /// Constraints on where to rest
    pub search: SleepSearch,
    /// Rest length; `None` sleeps until woken
    pub duration: Option<DurationRange>,
    /// Slots to resume into, in priority order
    pub resume: Vec<StateSlot>,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            search: SleepSearch::default(),
            duration: Some(DurationRange::new(8.0, 15.0)),
            resume: vec![StateSlot::Patrol, StateSlot::Idle],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Choosing,
    Walking,
    Resting(Countdown),
    Done,
}

/// Claims a sleep point, walks there and rests.
///
/// The claim is released on exit no matter how the state ends.
#[derive(Debug, Clone, Default)]
pub struct SleepState {
    config: SleepConfig,
    claim: Option<SleepPointId>,
    phase: Option<Phase>,
}

impl SleepState {
    /// Creates the behavior.
    #[must_use]
    pub fn new(config: SleepConfig) -> Self {
        Self {
            config,
            claim: None,
            phase: None,
        }
    }

    /// Point currently held.
    #[must_use]
    pub fn claim(&self) -> Option<SleepPointId> {
        self.claim
    }

    /// Whether the monster has lain down.
    #[must_use]
    pub fn is_resting(&self) -> bool {
        matches!(self.phase, Some(Phase::Resting(_)))
    }

    fn choose(&mut self, ctx: &mut StateContext<'_>) -> Phase {
        let Some(player) = ctx.player else {
            return Phase::Choosing;
        };
        let Some(choice) = ctx.level.sleep_points.choose(
            &player,
            &self.config.search,
            ctx.host.spatial,
            ctx.rng,
        ) else {
            return Phase::Done;
        };

        if choice.claimable {
            match ctx.level.sleep_points.claim(choice.point, ctx.entity) {
                Ok(()) => {
                    self.claim = Some(choice.point);
                    ctx.body
                        .emit(AiEventKind::SleepPointClaimed { point: choice.point });
                },
                Err(err) => warn!(entity = %ctx.entity, %err, "sleep point claim failed"),
            }
        }
        debug!(entity = %ctx.entity, point = %choice.point, tier = ?choice.tier, "sleep point chosen");
        ctx.body.motor.move_to(choice.position);
        ctx.body.animator.set_flag(AnimFlag::Walking, true);
        Phase::Walking
    }

    fn lie_down(&self, ctx: &mut StateContext<'_>) -> Phase {
        ctx.body.animator.set_flag(AnimFlag::Walking, false);
        ctx.body.animator.set_flag(AnimFlag::Sleeping, true);
        let timer = match self.config.duration {
            Some(range) => Countdown::started(range.sample(ctx.rng)),
            None => Countdown::idle(),
        };
        Phase::Resting(timer)
    }
}

impl State for SleepState {
    fn name(&self) -> &'static str {
        "sleep"
    }

    fn enter(&mut self, _ctx: &mut StateContext<'_>) {
        self.claim = None;
        self.phase = Some(Phase::Choosing);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        if let Some(point) = self.claim.take() {
            if let Err(err) = ctx.level.sleep_points.release(point, ctx.entity) {
                warn!(entity = %ctx.entity, %err, "sleep point release failed");
            }
        }
        ctx.body.animator.set_flag(AnimFlag::Sleeping, false);
        ctx.body.animator.set_flag(AnimFlag::Walking, false);
        self.phase = None;
    }

    fn frame_update(&mut self, ctx: &mut StateContext<'_>) -> Transition {
        let phase = match self.phase {
            None | Some(Phase::Done) => Phase::Done,
            Some(Phase::Choosing) => self.choose(ctx),
            Some(Phase::Walking) => {
                if ctx.body.motor.at_destination() {
                    self.lie_down(ctx)
                } else {
                    Phase::Walking
                }
            },
            Some(Phase::Resting(mut timer)) => {
                if timer.tick(ctx.dt) {
                    Phase::Done
                } else {
                    Phase::Resting(timer)
                }
            },
        };
        self.phase = Some(phase);
        if phase == Phase::Done {
            return ctx.fallback(&self.config.resume);
        }
        Transition::Stay
    }

    fn animation_trigger(
        &mut self,
        ctx: &mut StateContext<'_>,
        trigger: AnimationTrigger,
    ) -> Transition {
        if trigger == AnimationTrigger::WokeUp && self.is_resting() {
            self.phase = Some(Phase::Done);
            return ctx.fallback(&self.config.resume);
        }
        Transition::Stay
    }

    fn needs_sleep_points(&self) -> bool {
        true
    }
}
