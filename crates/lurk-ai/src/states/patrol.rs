//! Patrol: wander to random navigable points.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::body::AnimFlag;
use crate::error::{AiError, AiResult};
use crate::random::point_in_disc;
use crate::state::{State, StateContext, StateSlot, Transition};

/// Where patrol destinations are drawn around.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PatrolMode {
    /// Around the monster itself
    RandomPoint {
        /// Draw radius
        radius: f32,
    },
    /// Around the player
    TowardsPlayer {
        /// Draw radius
        radius: f32,
    },
}

impl PatrolMode {
    fn radius(self) -> f32 {
        match self {
            Self::RandomPoint { radius } | Self::TowardsPlayer { radius } => radius,
        }
    }
}

/// Patrol tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    /// Destination strategy
    pub mode: PatrolMode,
    /// How far a drawn point may be snapped onto the navigable surface
    pub sample_distance: f32,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            mode: PatrolMode::RandomPoint { radius: 20.0 },
            sample_distance: 4.0,
        }
    }
}

impl PatrolConfig {
    /// Rejects non-positive radii.
    pub fn validate(&self) -> AiResult<()> {
        if self.mode.radius() <= 0.0 || self.sample_distance < 0.0 {
            return Err(AiError::InvalidConfig(format!(
                "patrol radius {} must be positive",
                self.mode.radius()
            )));
        }
        Ok(())
    }
}

/// Walks to a random destination, then idles.
#[derive(Debug, Clone, Default)]
pub struct PatrolState {
    config: PatrolConfig,
    target: Option<Vec3>,
}

impl PatrolState {
    /// Creates the behavior.
    #[must_use]
    pub fn new(config: PatrolConfig) -> Self {
        Self {
            config,
            target: None,
        }
    }

    /// Destination strategy.
    #[must_use]
    pub fn mode(&self) -> PatrolMode {
        self.config.mode
    }

    /// Current destination.
    #[must_use]
    pub fn target(&self) -> Option<Vec3> {
        self.target
    }

    fn pick(&mut self, ctx: &mut StateContext<'_>) {
        let center = match self.config.mode {
            PatrolMode::RandomPoint { .. } => ctx.position(),
            PatrolMode::TowardsPlayer { .. } => match ctx.player {
                Some(player) => player.position,
                None => return,
            },
        };
        let candidate = point_in_disc(ctx.rng, center, self.config.mode.radius());
        let Some(point) = ctx
            .host
            .paths
            .sample_navigable(candidate, self.config.sample_distance)
        else {
            return;
        };
        if ctx.body.motor.move_to(point) {
            trace!(entity = %ctx.entity, ?point, "patrol destination");
            self.target = Some(point);
        }
    }
}

impl State for PatrolState {
    fn name(&self) -> &'static str {
        "patrol"
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        self.target = None;
        ctx.body.animator.set_flag(AnimFlag::Walking, true);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        ctx.body.animator.set_flag(AnimFlag::Walking, false);
    }

    fn frame_update(&mut self, ctx: &mut StateContext<'_>) -> Transition {
        if self.target.is_none() {
            self.pick(ctx);
            return Transition::Stay;
        }
        if ctx.body.motor.at_destination() {
            self.target = None;
            return ctx.fallback(&[StateSlot::Idle]);
        }
        Transition::Stay
    }
}
