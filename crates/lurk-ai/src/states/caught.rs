//! Caught player: terminal pose once the player is reached.

use crate::body::AnimFlag;
use crate::events::AiEventKind;
use crate::state::{State, StateContext, Transition};

/// Stops the monster and plays the catch. Leaves only when forced.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaughtPlayerState;

impl State for CaughtPlayerState {
    fn name(&self) -> &'static str {
        "caught_player"
    }

    fn enter(&mut self, ctx: &mut StateContext<'_>) {
        ctx.body.motor.stop();
        ctx.body.motor.set_enabled(false);
        ctx.body.animator.set_flag(AnimFlag::Walking, false);
        ctx.body.animator.set_flag(AnimFlag::Running, false);
        ctx.body.animator.set_flag(AnimFlag::Caught, true);
        if let Some(player) = ctx.player {
            ctx.body.motor.face_towards(player.position, 180.0);
        }
        ctx.body.emit(AiEventKind::CaughtPlayer);
    }

    fn exit(&mut self, ctx: &mut StateContext<'_>) {
        ctx.body.motor.set_enabled(true);
        ctx.body.animator.set_flag(AnimFlag::Caught, false);
    }

    fn frame_update(&mut self, _ctx: &mut StateContext<'_>) -> Transition {
        Transition::Stay
    }
}
