//! Stalk: shadow the player from a fixed distance.

use glam::Vec3;
use lurk_common::flatten;
use serde::{Deserialize, Serialize};

use crate::body::AnimFlag;
use crate::error::{AiError, AiResult};
use crate::state::{State, StateContext, StateSlot, Transition};
use crate::timer::Countdown;

const NEXT: [StateSlot; 2] = [StateSlot::Search, StateSlot::Patrol];

/// Stalk tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StalkConfig {
    /// Distance kept from the player
    pub keep_distance: f32,
    /// Seconds between re-planning the follow point
    pub repath_interval: f32,
    /// Seconds before giving up
    pub max_duration: f32,
    /// Speed relative to baseline while stalking
    pub speed_multiplier: f32,
    /// How far the follow point may be snapped onto the navigable surface
    pub sample_distance: f32,
}

impl Default for StalkConfig {
    fn default() -> Self {
        Self {
            keep_distance: 8.0,
            repath_interval: 1.0,
            max_duration: 25.0,
            speed_multiplier: 0.8,
            sample_distance: 4.0,
        }
    }
}

impl StalkConfig {
    /// Rejects unusable tuning.
    pub fn validate(&self) -> AiResult<()> {
        if self.keep_distance < 0.0 || self.repath_interval <= 0.0 || self.max_duration <= 0.0 {
            return Err(AiError::InvalidConfig("stalk distances and intervals must be positive".into()));
        }
        Ok(())
    }
}

/// Follows the player at `keep_distance` until the stalk times out.
#[derive(Debug, Clone, Default)]
pub struct StalkState {
    config: StalkConfig,
    elapsed: f32,
    repath: Countdown,
}

impl StalkState {
    /// Creates the behavior.
    #[must_use]
    pub fn new(config: StalkConfig) -> Self {
        Self {
            config,
            elapsed: 0.0,
            repath: Countdown::idle(),
        }
    }

    fn follow_point(&self, position: Vec3, player: Vec3, player_forward: Vec3) -> Vec3 {
        let away = flatten(position - player)
            .try_normalize()
            .or_else(|| flatten(-player_forward).try_normalize())
            .unwrap_or(Vec3::NEG_Z);
        player + away * self.config.keep_distance
    }
}

impl State for StalkState {
    fn name(&self) -> &'static str {
        "stalk"
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        self.elapsed = 0.0;
        self.repath.stop();
        ctx.body.motor.speed_multiplier(self.config.speed_multiplier);
        ctx.body.animator.set_flag(AnimFlag::Walking, true);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        ctx.body.motor.reset_speed();
        ctx.body.animator.set_flag(AnimFlag::Walking, false);
    }

    fn frame_update(&mut self, ctx: &mut StateContext<'_>) -> Transition {
        self.elapsed += ctx.dt;
        if self.elapsed >= self.config.max_duration {
            return ctx.fallback(&NEXT);
        }
        let Some(player) = ctx.player else {
            return Transition::Stay;
        };

        let due = !self.repath.is_running() || self.repath.tick(ctx.dt);
        if due {
            let target = self.follow_point(ctx.position(), player.position, player.forward);
            if let Some(point) = ctx
                .host
                .paths
                .sample_navigable(target, self.config.sample_distance)
            {
                ctx.body.motor.move_to(point);
            }
            self.repath.restart(self.config.repath_interval);
        }
        ctx.body
            .motor
            .face_towards(player.position, 360.0 * ctx.dt);
        Transition::Stay
    }
}
