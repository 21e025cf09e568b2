//! Investigate: look at a point of interest, optionally walk over.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::body::{AnimFlag, LookAtRig, LookTarget};
use crate::error::AiResult;
use crate::random::DurationRange;
use crate::state::{State, StateContext, StateSlot, Transition};
use crate::timer::Countdown;

const NEXT: [StateSlot; 3] = [StateSlot::Search, StateSlot::Idle, StateSlot::Patrol];

/// Whether the monster approaches what it looked at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvestigateMode {
    /// Look, then walk to the point and linger
    #[default]
    LookThenMove,
    /// Only turn and look
    LookOnly,
}

/// Investigate tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestigateConfig {
    /// Look-only or look-then-move
    pub mode: InvestigateMode,
    /// Seconds spent looking before moving
    pub look_duration: f32,
    /// Seconds spent at the point after arriving
    pub linger: DurationRange,
    /// Turn rate in degrees per second
    pub turn_speed: f32,
}

impl Default for InvestigateConfig {
    fn default() -> Self {
        Self {
            mode: InvestigateMode::LookThenMove,
            look_duration: 1.5,
            linger: DurationRange::new(1.0, 2.0),
            turn_speed: 240.0,
        }
    }
}

impl InvestigateConfig {
    /// Rejects unusable tuning.
    pub fn validate(&self) -> AiResult<()> {
        DurationRange::fixed(self.look_duration).validate("investigate look")?;
        self.linger.validate("investigate linger")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Looking(Countdown),
    Moving,
    Lingering(Countdown),
    Done,
}

/// Turns the head rig to a point, walks there if configured, then resumes.
///
/// The rig is snapshotted on enter and restored exactly on exit.
#[derive(Debug, Clone)]
pub struct InvestigateState {
    config: InvestigateConfig,
    saved_rig: Option<LookAtRig>,
    point: Option<Vec3>,
    phase: Phase,
}

impl Default for InvestigateState {
    fn default() -> Self {
        Self::new(InvestigateConfig::default())
    }
}

impl InvestigateState {
    /// Creates the behavior.
    #[must_use]
    pub fn new(config: InvestigateConfig) -> Self {
        Self {
            config,
            saved_rig: None,
            point: None,
            phase: Phase::Done,
        }
    }

    /// Point being investigated.
    #[must_use]
    pub fn point(&self) -> Option<Vec3> {
        self.point
    }

    fn focus(&mut self, ctx: &mut StateContext<'_>, point: Option<Vec3>) {
        self.point = point;
        match point {
            Some(p) => {
                ctx.body.look_at = LookAtRig {
                    enabled: true,
                    target: LookTarget::Point(p),
                };
                ctx.body.motor.stop();
                ctx.body.animator.set_flag(AnimFlag::Walking, false);
                self.phase = Phase::Looking(Countdown::started(self.config.look_duration));
            },
            None => self.phase = Phase::Done,
        }
    }
}

impl State for InvestigateState {
    fn name(&self) -> &'static str {
        "investigate"
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        self.saved_rig = Some(ctx.body.look_at);
        let point = ctx.body.point_of_interest;
        self.focus(ctx, point);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        if let Some(saved) = self.saved_rig.take() {
            ctx.body.look_at = saved;
        }
        ctx.body.point_of_interest = None;
        ctx.body.animator.set_flag(AnimFlag::Walking, false);
        self.point = None;
    }

    fn frame_update(&mut self, ctx: &mut StateContext<'_>) -> Transition {
        // a new stimulus while investigating retargets in place
        if ctx.body.point_of_interest != self.point && ctx.body.point_of_interest.is_some() {
            let point = ctx.body.point_of_interest;
            self.focus(ctx, point);
        }

        let Some(point) = self.point else {
            return ctx.fallback(&NEXT);
        };
        ctx.body
            .motor
            .face_towards(point, self.config.turn_speed * ctx.dt);

        self.phase = match self.phase {
            Phase::Looking(mut timer) => {
                if !timer.tick(ctx.dt) {
                    Phase::Looking(timer)
                } else if self.config.mode == InvestigateMode::LookOnly {
                    Phase::Done
                } else {
                    ctx.body.motor.move_to(point);
                    ctx.body.animator.set_flag(AnimFlag::Walking, true);
                    Phase::Moving
                }
            },
            Phase::Moving => {
                if ctx.body.motor.at_destination() {
                    ctx.body.animator.set_flag(AnimFlag::Walking, false);
                    Phase::Lingering(Countdown::started(self.config.linger.sample(ctx.rng)))
                } else {
                    Phase::Moving
                }
            },
            Phase::Lingering(mut timer) => {
                if timer.tick(ctx.dt) {
                    Phase::Done
                } else {
                    Phase::Lingering(timer)
                }
            },
            Phase::Done => Phase::Done,
        };

        if self.phase == Phase::Done {
            return ctx.fallback(&NEXT);
        }
        Transition::Stay
    }
}

#[cfg(test)]
mod tests {
    use lurk_common::planar_distance;

    use super::*;
    use crate::states::testing::Rig;

    #[test]
    fn test_rig_restored_exactly_on_exit() {
        let mut rig = Rig::at(Vec3::ZERO);
        let original = LookAtRig {
            enabled: false,
            target: LookTarget::Player,
        };
        rig.body.look_at = original;
        rig.body.point_of_interest = Some(Vec3::new(5.0, 0.0, 5.0));

        let mut investigate = InvestigateState::default();
        investigate.enter(&mut rig.ctx(0.0));
        assert_eq!(
            rig.body.look_at,
            LookAtRig {
                enabled: true,
                target: LookTarget::Point(Vec3::new(5.0, 0.0, 5.0))
            }
        );

        rig.step(&mut investigate, 0.1);
        investigate.exit(&mut rig.ctx(0.0));
        assert_eq!(rig.body.look_at, original);
        assert!(rig.body.point_of_interest.is_none());
    }

    #[test]
    fn test_look_then_move_walks_to_point() {
        let mut rig = Rig::at(Vec3::ZERO);
        let point = Vec3::new(6.0, 0.0, 0.0);
        rig.body.point_of_interest = Some(point);
        let mut investigate = InvestigateState::default();
        investigate.enter(&mut rig.ctx(0.0));

        assert_eq!(rig.run(&mut investigate, 0.1, 200), Some(StateSlot::Search));
        assert!(planar_distance(rig.body.motor.position(), point) <= 0.6);
    }

    #[test]
    fn test_look_only_never_moves() {
        let mut rig = Rig::at(Vec3::ZERO);
        rig.body.point_of_interest = Some(Vec3::new(6.0, 0.0, 0.0));
        let mut investigate = InvestigateState::new(InvestigateConfig {
            mode: InvestigateMode::LookOnly,
            look_duration: 0.5,
            ..InvestigateConfig::default()
        });
        investigate.enter(&mut rig.ctx(0.0));
        assert_eq!(rig.run(&mut investigate, 0.1, 20), Some(StateSlot::Search));
        assert_eq!(rig.body.motor.position(), Vec3::ZERO);
        assert!((rig.body.motor.forward() - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn test_without_point_resumes_immediately() {
        let mut rig = Rig::at(Vec3::ZERO);
        let mut investigate = InvestigateState::default();
        investigate.enter(&mut rig.ctx(0.0));
        assert_eq!(rig.step(&mut investigate, 0.1), Transition::To(StateSlot::Search));
    }

    #[test]
    fn test_new_point_retargets() {
        let mut rig = Rig::at(Vec3::ZERO);
        rig.body.point_of_interest = Some(Vec3::new(6.0, 0.0, 0.0));
        let mut investigate = InvestigateState::default();
        investigate.enter(&mut rig.ctx(0.0));
        rig.step(&mut investigate, 0.1);

        let newer = Vec3::new(-4.0, 0.0, 0.0);
        rig.body.point_of_interest = Some(newer);
        rig.step(&mut investigate, 0.1);
        assert_eq!(investigate.point(), Some(newer));
        assert_eq!(rig.body.look_at.target, LookTarget::Point(newer));
    }
}
