//! Monster entity: body, sensors, state machine and stimulus reactions.
//!
//! Each tick an entity first runs its sensors, turns their edges into
//! reactions (state changes or signals), then lets the current behavior
//! update. Host-driven stimuli (flashlight on/off, camera flashes,
//! footsteps) are queued between ticks and consumed by the next update.

use glam::Vec3;
use lurk_common::{planar_distance, EntityId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::body::Body;
use crate::error::{AiError, AiResult};
use crate::events::AiEventKind;
use crate::host::{Host, NavAgent, PlayerView};
use crate::level::Level;
use crate::machine::StateMachine;
use crate::sensors::{
    FieldOfView, FlashCounter, FlashCounterConfig, FlashlightConfig, FlashlightDetector,
    FootstepConfig, FootstepDetector, SensorSuite, SightEdge, SightSensor,
};
use crate::state::{AnimationTrigger, Signal, State, StateContext, StateSlot};
use crate::states::{PatrolConfig, PatrolState};
use crate::timer::Countdown;

// ============================================================================
// Frame
// ============================================================================

/// World access for one entity tick.
#[derive(Debug)]
pub struct Frame<'a> {
    /// Shared registries
    pub level: &'a mut Level,
    /// Host services
    pub host: Host<'a>,
    /// Player, if present
    pub player: Option<PlayerView>,
    /// Seconds since the previous tick
    pub dt: f32,
}

impl<'a> Frame<'a> {
    /// Bundles a tick's inputs.
    #[must_use]
    pub fn new(level: &'a mut Level, host: Host<'a>, player: Option<PlayerView>, dt: f32) -> Self {
        Self {
            level,
            host,
            player,
            dt,
        }
    }
}

// ============================================================================
// Reactions
// ============================================================================

/// Which slot each sensor edge sends the entity to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Reactions {
    /// Player came into view
    pub on_spotted: Option<StateSlot>,
    /// Player left view
    pub on_lost: Option<StateSlot>,
    /// Flashlight exposure threshold crossed
    pub on_flashlight: Option<StateSlot>,
    /// Camera flash count reached
    pub on_flash_count: Option<StateSlot>,
    /// Footstep heard
    pub on_footstep: Option<StateSlot>,
    /// Seconds after the last freeze-inducing stimulus before unfreezing
    pub unfreeze_after: Option<f32>,
    /// Distance at which the player is caught
    pub catch_radius: Option<f32>,
}

impl Reactions {
    /// Every slot a reaction may change to.
    pub fn targets(&self) -> impl Iterator<Item = StateSlot> + '_ {
        [
            self.on_spotted,
            self.on_lost,
            self.on_flashlight,
            self.on_flash_count,
            self.on_footstep,
            self.catch_radius.map(|_| StateSlot::CaughtPlayer),
        ]
        .into_iter()
        .flatten()
    }
}

/// Switches patrol to player-seeking after a long search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatrolEscalation {
    /// Accumulated seconds in search before escalating
    pub after_search_seconds: f32,
    /// Patrol tuning installed on escalation
    pub patrol: PatrolConfig,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stimulus {
    Spotted,
    Lost,
    Flashlight,
    FlashCount,
    Footstep(Vec3),
    UnfreezeDue,
    InCatchRange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Reaction {
    Change(StateSlot),
    Signal(Signal),
}

// ============================================================================
// Entity
// ============================================================================

/// A monster.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    name: String,
    body: Body,
    machine: StateMachine,
    sensors: SensorSuite,
    reactions: Reactions,
    escalation: Option<PatrolEscalation>,
    search_time: f32,
    escalated: bool,
    unfreeze: Countdown,
    flashlight_lit: bool,
    pending_flashes: u32,
    pending_footsteps: Vec<(Vec3, f32)>,
    start: StateSlot,
    rng: fastrand::Rng,
}

impl Entity {
    /// Entity ID.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current slot, `None` before initialization.
    #[must_use]
    pub fn current_state(&self) -> Option<StateSlot> {
        self.machine.current()
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.body.motor.position()
    }

    /// Read access to the body.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Write access to the body.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Read access to the state machine.
    #[must_use]
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }

    /// Read access to the sensors.
    #[must_use]
    pub fn sensors(&self) -> &SensorSuite {
        &self.sensors
    }

    /// Whether patrol has switched to player-seeking.
    #[must_use]
    pub fn is_escalated(&self) -> bool {
        self.escalated
    }

    /// Whether the starting state has been entered.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.machine.is_initialized()
    }

    fn split<'s>(&'s mut self, frame: &'s mut Frame<'_>) -> (&'s mut StateMachine, StateContext<'s>) {
        let capabilities = self.machine.capabilities();
        let ctx = StateContext {
            entity: self.id,
            body: &mut self.body,
            level: &mut *frame.level,
            host: frame.host,
            player: frame.player,
            rng: &mut self.rng,
            dt: frame.dt,
            capabilities,
        };
        (&mut self.machine, ctx)
    }

    /// Enters the starting state.
    pub fn initialize(&mut self, frame: &mut Frame<'_>) -> AiResult<()> {
        let start = self.start;
        let (machine, mut ctx) = self.split(frame);
        machine.initialize(start, &mut ctx)
    }

    /// Forces a state change.
    pub fn change_state(&mut self, slot: StateSlot, frame: &mut Frame<'_>) -> AiResult<()> {
        let (machine, mut ctx) = self.split(frame);
        machine.change_state(slot, &mut ctx)
    }

    /// Sends the entity to investigate a point.
    pub fn investigate(&mut self, point: Vec3, frame: &mut Frame<'_>) -> AiResult<()> {
        self.body.point_of_interest = Some(point);
        self.change_state(StateSlot::Investigate, frame)
    }

    /// Ends a freeze from an external script.
    pub fn end_freeze(&mut self, frame: &mut Frame<'_>) -> AiResult<()> {
        self.unfreeze.stop();
        let (machine, mut ctx) = self.split(frame);
        machine.signal(Signal::FreezeEnded, &mut ctx)
    }

    /// Exits the current behavior and releases every level claim.
    pub fn shutdown(&mut self, frame: &mut Frame<'_>) -> Option<StateSlot> {
        self.unfreeze.stop();
        let (machine, mut ctx) = self.split(frame);
        let last = machine.shutdown(&mut ctx);
        self.release_claims(&mut *frame.level);
        last
    }

    /// Reports contact with the player.
    pub fn catch_player(&mut self, frame: &mut Frame<'_>) -> AiResult<()> {
        self.change_state(StateSlot::CaughtPlayer, frame)
    }

    /// Marks whether the player's flashlight is on this entity.
    pub fn set_flashlight_lit(&mut self, lit: bool) {
        self.flashlight_lit = lit;
    }

    /// Queues a camera flash for the next update.
    pub fn register_flash(&mut self) {
        self.pending_flashes += 1;
    }

    /// Queues a footstep for the next update.
    pub fn hear_footstep(&mut self, position: Vec3, loudness: f32) {
        self.pending_footsteps.push((position, loudness));
    }

    /// Replaces the behavior bound to a slot.
    pub fn swap_behavior(
        &mut self,
        slot: StateSlot,
        behavior: Box<dyn State>,
        frame: &mut Frame<'_>,
    ) -> Option<Box<dyn State>> {
        let (machine, mut ctx) = self.split(frame);
        machine.swap_behavior(slot, behavior, &mut ctx)
    }

    /// Per-frame tick: sense, react, then update the current behavior.
    pub fn frame_update(&mut self, frame: &mut Frame<'_>) -> AiResult<()> {
        if !self.machine.is_initialized() {
            return Ok(());
        }
        let stimuli = self.sense(frame);
        let reactions = self.react(&stimuli);
        let escalation = self.escalation_due(frame.dt);

        let (machine, mut ctx) = self.split(frame);
        if let Some(patrol) = escalation {
            machine.swap_behavior(StateSlot::Patrol, patrol, &mut ctx);
        }
        for reaction in reactions {
            match reaction {
                Reaction::Change(slot) => machine.change_state(slot, &mut ctx)?,
                Reaction::Signal(signal) => machine.signal(signal, &mut ctx)?,
            }
        }
        machine.frame_update(&mut ctx)
    }

    /// Physics tick: advance the nav agent, then the current behavior.
    pub fn physics_update(&mut self, frame: &mut Frame<'_>) -> AiResult<()> {
        self.body.motor.integrate(frame.dt);
        let (machine, mut ctx) = self.split(frame);
        machine.physics_update(&mut ctx)
    }

    /// Forwards an animation event.
    pub fn animation_trigger(
        &mut self,
        trigger: AnimationTrigger,
        frame: &mut Frame<'_>,
    ) -> AiResult<()> {
        let (machine, mut ctx) = self.split(frame);
        machine.animation_trigger(trigger, &mut ctx)
    }

    /// Takes events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<AiEventKind> {
        self.body.drain_events()
    }

    /// Frees every sleep point this entity holds.
    pub fn release_claims(&self, level: &mut Level) -> usize {
        level.sleep_points.release_all(self.id)
    }

    fn sense(&mut self, frame: &Frame<'_>) -> Vec<Stimulus> {
        let mut stimuli = Vec::new();
        let dt = frame.dt;
        let position = self.body.motor.position();
        let forward = self.body.motor.forward();

        if let Some(sight) = self.sensors.sight.as_mut() {
            match sight.update(position, forward, frame.host.spatial) {
                Some(SightEdge::Spotted(seen)) => {
                    self.body.senses.player_visible = true;
                    self.body.senses.last_known_player = Some(seen);
                    self.body.emit(AiEventKind::PlayerSpotted { position: seen });
                    stimuli.push(Stimulus::Spotted);
                },
                Some(SightEdge::Lost(last_seen)) => {
                    self.body.senses.player_visible = false;
                    self.body.senses.last_known_player = Some(last_seen);
                    self.body.emit(AiEventKind::PlayerLost { last_seen });
                    stimuli.push(Stimulus::Lost);
                },
                None => {
                    if sight.is_seeing() {
                        self.body.senses.last_known_player = sight.last_seen();
                    }
                },
            }
        }

        if let Some(flashlight) = self.sensors.flashlight.as_mut() {
            flashlight.set_lit(self.flashlight_lit);
            if flashlight.tick(dt) {
                self.body.emit(AiEventKind::FlashlightExposed);
                stimuli.push(Stimulus::Flashlight);
            }
        }

        let flashes = std::mem::take(&mut self.pending_flashes);
        if let Some(counter) = self.sensors.flash_counter.as_mut() {
            counter.tick(dt);
            for _ in 0..flashes {
                if counter.register() {
                    self.body.emit(AiEventKind::FlashCountReached);
                    stimuli.push(Stimulus::FlashCount);
                }
            }
        }

        let footsteps = std::mem::take(&mut self.pending_footsteps);
        if let Some(hearing) = self.sensors.hearing.as_mut() {
            hearing.tick(dt);
            for (source, loudness) in footsteps {
                if hearing.hear(position, source, loudness) {
                    self.body.senses.heard_at = Some(source);
                    self.body.emit(AiEventKind::FootstepHeard { position: source });
                    stimuli.push(Stimulus::Footstep(source));
                }
            }
        }

        if self.unfreeze.tick(dt) {
            stimuli.push(Stimulus::UnfreezeDue);
        }

        if let (Some(radius), Some(player)) = (self.reactions.catch_radius, frame.player) {
            if planar_distance(position, player.position) <= radius {
                stimuli.push(Stimulus::InCatchRange);
            }
        }

        stimuli
    }

    fn react(&mut self, stimuli: &[Stimulus]) -> Vec<Reaction> {
        let current = self.machine.current();
        if current == Some(StateSlot::CaughtPlayer) {
            return Vec::new();
        }
        let incapacitated = matches!(current, Some(StateSlot::Freeze | StateSlot::Stun));
        let capabilities = self.machine.capabilities();
        let mut reactions = Vec::new();

        for stimulus in stimuli {
            let target = match *stimulus {
                Stimulus::Flashlight => self.reactions.on_flashlight,
                Stimulus::FlashCount => self.reactions.on_flash_count,
                Stimulus::Footstep(source) => {
                    let target = self.reactions.on_footstep;
                    if target == Some(StateSlot::Investigate) {
                        self.body.point_of_interest = Some(source);
                    }
                    target
                },
                Stimulus::Spotted if !incapacitated => self.reactions.on_spotted,
                Stimulus::Lost if !incapacitated => self.reactions.on_lost,
                Stimulus::InCatchRange if !incapacitated => Some(StateSlot::CaughtPlayer),
                Stimulus::UnfreezeDue => {
                    if current == Some(StateSlot::Freeze) {
                        reactions.push(Reaction::Signal(Signal::FreezeEnded));
                    }
                    None
                },
                Stimulus::Spotted | Stimulus::Lost | Stimulus::InCatchRange => None,
            };
            let Some(slot) = target else {
                continue;
            };
            if !capabilities.supports(slot) {
                continue;
            }
            if slot == StateSlot::Freeze {
                if let Some(seconds) = self.reactions.unfreeze_after {
                    self.unfreeze.restart(seconds);
                }
            }
            reactions.push(Reaction::Change(slot));
        }
        reactions
    }

    fn escalation_due(&mut self, dt: f32) -> Option<Box<dyn State>> {
        let escalation = self.escalation?;
        if self.escalated {
            return None;
        }
        if self.machine.current() == Some(StateSlot::Search) {
            self.search_time += dt;
        }
        if self.search_time < escalation.after_search_seconds {
            return None;
        }
        self.escalated = true;
        info!(entity = %self.id, seconds = self.search_time, "patrol escalated toward the player");
        Some(Box::new(PatrolState::new(escalation.patrol)))
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles and validates an [`Entity`].
#[derive(Debug)]
pub struct EntityBuilder {
    name: String,
    agent: Box<dyn NavAgent>,
    machine: StateMachine,
    sensors: SensorSuite,
    reactions: Reactions,
    escalation: Option<PatrolEscalation>,
    start: Option<StateSlot>,
    seed: Option<u64>,
    id: Option<EntityId>,
}

impl EntityBuilder {
    /// Starts a builder around a nav agent.
    #[must_use]
    pub fn new(name: impl Into<String>, agent: Box<dyn NavAgent>) -> Self {
        Self {
            name: name.into(),
            agent,
            machine: StateMachine::new(),
            sensors: SensorSuite::default(),
            reactions: Reactions::default(),
            escalation: None,
            start: None,
            seed: None,
            id: None,
        }
    }

    /// Binds a behavior to a slot.
    #[must_use]
    pub fn with_behavior(mut self, slot: StateSlot, behavior: impl State + 'static) -> Self {
        self.machine.insert(slot, Box::new(behavior));
        self
    }

    /// Adds sight.
    #[must_use]
    pub fn with_sight(mut self, fov: FieldOfView) -> Self {
        self.sensors.sight = Some(SightSensor::new(fov));
        self
    }

    /// Adds flashlight sensitivity.
    #[must_use]
    pub fn with_flashlight(mut self, config: FlashlightConfig) -> Self {
        self.sensors.flashlight = Some(FlashlightDetector::new(config));
        self
    }

    /// Adds camera-flash counting.
    #[must_use]
    pub fn with_flash_counter(mut self, config: FlashCounterConfig) -> Self {
        self.sensors.flash_counter = Some(FlashCounter::new(config));
        self
    }

    /// Adds hearing.
    #[must_use]
    pub fn with_hearing(mut self, config: FootstepConfig) -> Self {
        self.sensors.hearing = Some(FootstepDetector::new(config));
        self
    }

    /// Sets sensor reactions.
    #[must_use]
    pub fn with_reactions(mut self, reactions: Reactions) -> Self {
        self.reactions = reactions;
        self
    }

    /// Enables patrol escalation.
    #[must_use]
    pub fn with_escalation(mut self, escalation: PatrolEscalation) -> Self {
        self.escalation = Some(escalation);
        self
    }

    /// Sets the starting slot.
    #[must_use]
    pub fn starting_in(mut self, slot: StateSlot) -> Self {
        self.start = Some(slot);
        self
    }

    /// Seeds the entity's random source.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Uses a fixed ID instead of allocating one.
    #[must_use]
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    /// Validates the configuration against a level and builds the entity.
    ///
    /// Fails on a missing or unsupported starting slot, reactions targeting
    /// unsupported slots, and behaviors whose level data is absent.
    pub fn build(self, level: &Level) -> AiResult<Entity> {
        let start = self
            .start
            .ok_or_else(|| AiError::InvalidConfig(format!("{} has no starting state", self.name)))?;
        let capabilities = self.machine.capabilities();
        if !capabilities.supports(start) {
            return Err(AiError::UnsupportedState(start));
        }
        if let Some(slot) = self.reactions.targets().find(|slot| !capabilities.supports(*slot)) {
            return Err(AiError::UnsupportedState(slot));
        }
        if let Some(escalation) = &self.escalation {
            if !capabilities.supports(StateSlot::Patrol) {
                return Err(AiError::UnsupportedState(StateSlot::Patrol));
            }
            escalation.patrol.validate()?;
        }
        if let Some(sight) = &self.sensors.sight {
            sight.fov().validate()?;
        }
        self.machine.validate(level)?;

        let id = self.id.unwrap_or_default();
        let rng = self
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        debug!(entity = %id, name = %self.name, ?capabilities, "entity built");

        Ok(Entity {
            id,
            name: self.name,
            body: Body::new(self.agent),
            machine: self.machine,
            sensors: self.sensors,
            reactions: self.reactions,
            escalation: self.escalation,
            search_time: 0.0,
            escalated: false,
            unfreeze: Countdown::idle(),
            flashlight_lit: false,
            pending_flashes: 0,
            pending_footsteps: Vec::new(),
            start,
            rng,
        })
    }
}
