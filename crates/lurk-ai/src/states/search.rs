//! Search: sweep way-points around the player with a shrinking radius.
//!
//! The radius starts wide and tightens every `decrement_interval` seconds
//! down to `min_radius`, so a long search closes in on the player. The
//! minimum travel distance shrinks alongside it by `decrement / min_travel`
//! per step, which keeps early hops long and late hops short.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::body::AnimFlag;
use crate::error::{AiError, AiResult};
use crate::random::DurationRange;
use crate::state::{State, StateContext, StateSlot, Transition};
use crate::timer::Countdown;

const GIVE_UP: [StateSlot; 2] = [StateSlot::Patrol, StateSlot::Idle];

/// Search tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Radius on entry
    pub starting_radius: f32,
    /// Floor for the shrinking radius
    pub min_radius: f32,
    /// Radius lost per step
    pub radius_decrement: f32,
    /// Seconds between steps
    pub decrement_interval: f32,
    /// Minimum hop length on entry
    pub starting_min_travel: f32,
    /// Pause at each way-point
    pub pause: DurationRange,
    /// Seconds before abandoning the search
    pub give_up_after: Option<f32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            starting_radius: 55.0,
            min_radius: 17.5,
            radius_decrement: 0.75,
            decrement_interval: 2.0,
            starting_min_travel: 10.0,
            pause: DurationRange::new(1.0, 3.0),
            give_up_after: None,
        }
    }
}

impl SearchConfig {
    /// Rejects unusable tuning.
    pub fn validate(&self) -> AiResult<()> {
        if self.starting_radius <= 0.0
            || self.min_radius < 0.0
            || self.radius_decrement < 0.0
            || self.decrement_interval <= 0.0
        {
            return Err(AiError::InvalidConfig(
                "search radius and decrement interval must be positive".into(),
            ));
        }
        self.pause.validate("search pause")
    }
}

/// Shrinking search radius with its coupled minimum travel distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchRadius {
    radius: f32,
    min_radius: f32,
    decrement: f32,
    interval: f32,
    min_travel: f32,
    since_step: f32,
}

impl SearchRadius {
    /// Starts from a config.
    #[must_use]
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            radius: config.starting_radius,
            min_radius: config.min_radius,
            decrement: config.radius_decrement,
            interval: config.decrement_interval,
            min_travel: config.starting_min_travel,
            since_step: 0.0,
        }
    }

    /// Current radius.
    #[must_use]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Current minimum hop length.
    #[must_use]
    pub fn min_travel(&self) -> f32 {
        self.min_travel
    }

    /// Advances time, stepping once per elapsed interval.
    pub fn advance(&mut self, dt: f32) {
        if self.interval <= 0.0 {
            return;
        }
        self.since_step += dt;
        while self.since_step >= self.interval {
            self.since_step -= self.interval;
            self.step();
        }
    }

    /// Applies one decrement.
    pub fn step(&mut self) {
        if self.radius <= self.min_radius {
            return;
        }
        self.radius = (self.radius - self.decrement).max(self.min_radius);
        if self.min_travel != 0.0 {
            self.min_travel -= self.decrement / self.min_travel;
        }
    }

    /// Adopts a radius widened by a fallback search.
    pub fn widen_to(&mut self, radius: f32) {
        if radius > self.radius {
            self.radius = radius;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Choosing,
    Moving(Vec3),
    Pausing(Countdown),
}

/// Hops between way-points near the player, pausing at each.
#[derive(Debug, Clone)]
pub struct SearchState {
    config: SearchConfig,
    radius: SearchRadius,
    phase: Phase,
    elapsed: f32,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl SearchState {
    /// Creates the behavior.
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self {
            radius: SearchRadius::new(&config),
            config,
            phase: Phase::Choosing,
            elapsed: 0.0,
        }
    }

    /// Radius state.
    #[must_use]
    pub fn radius(&self) -> &SearchRadius {
        &self.radius
    }

    /// Way-point being walked to.
    #[must_use]
    pub fn destination(&self) -> Option<Vec3> {
        match self.phase {
            Phase::Moving(target) => Some(target),
            _ => None,
        }
    }

    fn choose(&mut self, ctx: &mut StateContext<'_>) {
        let Some(player) = ctx.player else {
            return;
        };
        let position = ctx.position();
        let pick = ctx.level.way_points.pick_random_within_radius(
            player.position,
            position,
            self.radius.radius(),
            self.radius.min_travel(),
            ctx.rng,
        );
        match pick.way_point {
            Some(wp) => {
                let target = wp.position;
                trace!(entity = %ctx.entity, way_point = %wp.id, radius = pick.radius, "search hop");
                self.radius.widen_to(pick.radius);
                ctx.body.motor.move_to(target);
                self.phase = Phase::Moving(target);
            },
            None => {
                debug!(entity = %ctx.entity, "no way-point to search, pausing");
                self.pause(ctx);
            },
        }
    }

    fn pause(&mut self, ctx: &mut StateContext<'_>) {
        let seconds = self.config.pause.sample(ctx.rng);
        self.phase = Phase::Pausing(Countdown::started(seconds));
        ctx.body.animator.set_flag(AnimFlag::Walking, false);
    }
}

impl State for SearchState {
    fn name(&self) -> &'static str {
        "search"
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        self.radius = SearchRadius::new(&self.config);
        self.phase = Phase::Choosing;
        self.elapsed = 0.0;
        ctx.body.animator.set_flag(AnimFlag::Walking, true);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        ctx.body.animator.set_flag(AnimFlag::Walking, false);
    }

    fn frame_update(&mut self, ctx: &mut StateContext<'_>) -> Transition {
        self.elapsed += ctx.dt;
        self.radius.advance(ctx.dt);
        if self.config.give_up_after.is_some_and(|limit| self.elapsed >= limit) {
            return ctx.fallback(&GIVE_UP);
        }

        match self.phase {
            Phase::Choosing => self.choose(ctx),
            Phase::Moving(_) => {
                if ctx.body.motor.at_destination() {
                    self.pause(ctx);
                }
            },
            Phase::Pausing(mut timer) => {
                if timer.tick(ctx.dt) {
                    self.phase = Phase::Choosing;
                    ctx.body.animator.set_flag(AnimFlag::Walking, true);
                } else {
                    self.phase = Phase::Pausing(timer);
                }
            },
        }
        Transition::Stay
    }

    fn needs_way_points(&self) -> bool {
        true
    }
}
