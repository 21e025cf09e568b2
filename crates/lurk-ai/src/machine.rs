//! Finite state machine driving one entity's behaviors.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::error::{AiError, AiResult};
use crate::events::AiEventKind;
use crate::level::Level;
use crate::state::{AnimationTrigger, Capabilities, Signal, State, StateContext, StateSlot, Transition};

/// Holds one behavior per supported slot and tracks the current one.
///
/// Exactly one behavior is current after [`StateMachine::initialize`]. Every
/// change runs the old behavior's `exit` before the new one's `enter`, and
/// changing to the current slot does nothing.
#[derive(Debug, Default)]
pub struct StateMachine {
    behaviors: BTreeMap<StateSlot, Box<dyn State>>,
    current: Option<StateSlot>,
    transitions: u64,
}

impl StateMachine {
    /// Creates an empty machine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a behavior while building.
    #[must_use]
    pub fn with_behavior(mut self, slot: StateSlot, behavior: Box<dyn State>) -> Self {
        self.insert(slot, behavior);
        self
    }

    /// Adds or replaces a behavior without running hooks.
    pub fn insert(&mut self, slot: StateSlot, behavior: Box<dyn State>) -> Option<Box<dyn State>> {
        self.behaviors.insert(slot, behavior)
    }

    /// Slots that have a behavior.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.behaviors
            .keys()
            .fold(Capabilities::empty(), |acc, slot| acc | slot.capability())
    }

    /// Current slot, `None` before initialization.
    #[must_use]
    pub fn current(&self) -> Option<StateSlot> {
        self.current
    }

    /// Whether a starting state has been entered.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.current.is_some()
    }

    /// Behavior for a slot.
    #[must_use]
    pub fn behavior(&self, slot: StateSlot) -> Option<&dyn State> {
        self.behaviors.get(&slot).map(AsRef::as_ref)
    }

    /// Number of completed state changes.
    #[must_use]
    pub fn transition_count(&self) -> u64 {
        self.transitions
    }

    /// Checks that the level provides what each behavior needs.
    pub fn validate(&self, level: &Level) -> AiResult<()> {
        for (slot, behavior) in &self.behaviors {
            if behavior.needs_way_points() && level.way_points.is_empty() {
                return Err(AiError::MissingWayPoints(*slot));
            }
            if behavior.needs_sleep_points() && level.sleep_points.is_empty() {
                return Err(AiError::MissingSleepPoints);
            }
        }
        Ok(())
    }

    /// Enters the starting state.
    pub fn initialize(&mut self, start: StateSlot, ctx: &mut StateContext<'_>) -> AiResult<()> {
        if let Some(current) = self.current {
            return Err(AiError::AlreadyInitialized(current));
        }
        let behavior = self
            .behaviors
            .get_mut(&start)
            .ok_or(AiError::UnsupportedState(start))?;
        self.current = Some(start);
        info!(entity = %ctx.entity, state = %start, "state machine initialized");
        behavior.enter(ctx);
        Ok(())
    }

    /// Switches to `next`, running exit then enter. Same-slot is a no-op.
    pub fn change_state(&mut self, next: StateSlot, ctx: &mut StateContext<'_>) -> AiResult<()> {
        let current = self.current.ok_or(AiError::NotInitialized)?;
        if current == next {
            return Ok(());
        }
        if !self.behaviors.contains_key(&next) {
            return Err(AiError::UnsupportedState(next));
        }

        if let Some(old) = self.behaviors.get_mut(&current) {
            old.exit(ctx);
        }
        self.current = Some(next);
        self.transitions += 1;
        debug!(entity = %ctx.entity, from = %current, to = %next, "state change");
        ctx.body.emit(AiEventKind::StateChanged {
            from: current,
            to: next,
        });
        if let Some(new) = self.behaviors.get_mut(&next) {
            new.enter(ctx);
        }
        Ok(())
    }

    /// Exits the current behavior and leaves the machine uninitialized.
    ///
    /// Returns the slot that was active, `None` if nothing was.
    pub fn shutdown(&mut self, ctx: &mut StateContext<'_>) -> Option<StateSlot> {
        let current = self.current.take()?;
        if let Some(behavior) = self.behaviors.get_mut(&current) {
            behavior.exit(ctx);
        }
        debug!(entity = %ctx.entity, state = %current, "state machine shut down");
        Some(current)
    }

    /// Forwards the per-frame tick to the current behavior.
    pub fn frame_update(&mut self, ctx: &mut StateContext<'_>) -> AiResult<()> {
        self.dispatch(ctx, |behavior, ctx| behavior.frame_update(ctx))
    }

    /// Forwards the physics tick to the current behavior.
    pub fn physics_update(&mut self, ctx: &mut StateContext<'_>) -> AiResult<()> {
        self.dispatch(ctx, |behavior, ctx| behavior.physics_update(ctx))
    }

    /// Forwards an animation event to the current behavior.
    pub fn animation_trigger(
        &mut self,
        trigger: AnimationTrigger,
        ctx: &mut StateContext<'_>,
    ) -> AiResult<()> {
        self.dispatch(ctx, |behavior, ctx| behavior.animation_trigger(ctx, trigger))
    }

    /// Forwards a signal to the current behavior.
    pub fn signal(&mut self, signal: Signal, ctx: &mut StateContext<'_>) -> AiResult<()> {
        self.dispatch(ctx, |behavior, ctx| behavior.signal(ctx, signal))
    }

    /// Replaces the behavior bound to `slot` and returns the old one.
    ///
    /// If `slot` is current, the old behavior exits and the new one enters
    /// in place. No state change is recorded since the slot is unchanged.
    pub fn swap_behavior(
        &mut self,
        slot: StateSlot,
        behavior: Box<dyn State>,
        ctx: &mut StateContext<'_>,
    ) -> Option<Box<dyn State>> {
        let active = self.current == Some(slot);
        let mut old = self.behaviors.insert(slot, behavior);
        if active {
            if let Some(old) = old.as_mut() {
                old.exit(ctx);
            }
            if let Some(new) = self.behaviors.get_mut(&slot) {
                new.enter(ctx);
            }
        }
        debug!(entity = %ctx.entity, %slot, active, "behavior swapped");
        old
    }

    fn dispatch<F>(&mut self, ctx: &mut StateContext<'_>, hook: F) -> AiResult<()>
    where
        F: FnOnce(&mut dyn State, &mut StateContext<'_>) -> Transition,
    {
        let Some(slot) = self.current else {
            return Ok(());
        };
        let behavior = self
            .behaviors
            .get_mut(&slot)
            .ok_or(AiError::UnsupportedState(slot))?;
        match hook(behavior.as_mut(), &mut *ctx) {
            Transition::Stay => Ok(()),
            Transition::To(next) => self.change_state(next, ctx),
        }
    }
}
