//! State vocabulary shared by the machine and every behavior.

use std::fmt;

use bitflags::bitflags;
use glam::Vec3;
use lurk_common::EntityId;
use serde::{Deserialize, Serialize};

use crate::body::Body;
use crate::host::{Host, PlayerView};
use crate::level::Level;

// ============================================================================
// Slots
// ============================================================================

/// Named behavior slot. An entity supports the subset it has behaviors for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateSlot {
    /// Stand still
    Idle,
    /// Wander between random destinations
    Patrol,
    /// Shadow the player at a distance
    Stalk,
    /// Sweep way-points around the player
    Search,
    /// Look at, then approach, a point of interest
    Investigate,
    /// Hold still until released
    Freeze,
    /// Recover from a stagger
    Stun,
    /// Run to a far way-point
    Retreat,
    /// Teleport away
    Disappear,
    /// Rest at a sleep point
    Sleep,
    /// Player caught
    CaughtPlayer,
}

impl StateSlot {
    /// Every slot.
    pub const ALL: [Self; 11] = [
        Self::Idle,
        Self::Patrol,
        Self::Stalk,
        Self::Search,
        Self::Investigate,
        Self::Freeze,
        Self::Stun,
        Self::Retreat,
        Self::Disappear,
        Self::Sleep,
        Self::CaughtPlayer,
    ];

    /// Short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Patrol => "patrol",
            Self::Stalk => "stalk",
            Self::Search => "search",
            Self::Investigate => "investigate",
            Self::Freeze => "freeze",
            Self::Stun => "stun",
            Self::Retreat => "retreat",
            Self::Disappear => "disappear",
            Self::Sleep => "sleep",
            Self::CaughtPlayer => "caught_player",
        }
    }

    /// Capability bit for this slot.
    #[must_use]
    pub const fn capability(self) -> Capabilities {
        match self {
            Self::Idle => Capabilities::IDLE,
            Self::Patrol => Capabilities::PATROL,
            Self::Stalk => Capabilities::STALK,
            Self::Search => Capabilities::SEARCH,
            Self::Investigate => Capabilities::INVESTIGATE,
            Self::Freeze => Capabilities::FREEZE,
            Self::Stun => Capabilities::STUN,
            Self::Retreat => Capabilities::RETREAT,
            Self::Disappear => Capabilities::DISAPPEAR,
            Self::Sleep => Capabilities::SLEEP,
            Self::CaughtPlayer => Capabilities::CAUGHT_PLAYER,
        }
    }
}

impl fmt::Display for StateSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Set of slots an entity has behaviors for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Capabilities: u16 {
        /// Idle
        const IDLE = 1 << 0;
        /// Patrol
        const PATROL = 1 << 1;
        /// Stalk
        const STALK = 1 << 2;
        /// Search
        const SEARCH = 1 << 3;
        /// Investigate
        const INVESTIGATE = 1 << 4;
        /// Freeze
        const FREEZE = 1 << 5;
        /// Stun
        const STUN = 1 << 6;
        /// Retreat
        const RETREAT = 1 << 7;
        /// Disappear
        const DISAPPEAR = 1 << 8;
        /// Sleep
        const SLEEP = 1 << 9;
        /// Caught player
        const CAUGHT_PLAYER = 1 << 10;
    }
}

impl Capabilities {
    /// Whether `slot` is supported.
    #[must_use]
    pub fn supports(self, slot: StateSlot) -> bool {
        self.contains(slot.capability())
    }

    /// First supported slot in priority order.
    #[must_use]
    pub fn first_supported(self, order: &[StateSlot]) -> Option<StateSlot> {
        order.iter().copied().find(|slot| self.supports(*slot))
    }
}

// ============================================================================
// Hook Results
// ============================================================================

/// What a hook asks the machine to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Remain in the current state
    Stay,
    /// Change to another slot
    To(StateSlot),
}

/// Animation events forwarded from the host's animation timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimationTrigger {
    /// A foot touched the ground
    Footstep,
    /// Stagger animation finished
    StunRecovered,
    /// Wake-up animation finished
    WokeUp,
    /// Host-defined marker
    Custom(u32),
}

/// Out-of-band signals delivered to the current behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// An external script ended the freeze
    FreezeEnded,
}

// ============================================================================
// Context
// ============================================================================

/// Everything a behavior may touch during a hook.
pub struct StateContext<'a> {
    /// Entity running the behavior
    pub entity: EntityId,
    /// Entity's body
    pub body: &'a mut Body,
    /// Shared level registries
    pub level: &'a mut Level,
    /// Host services
    pub host: Host<'a>,
    /// Player, if present this tick
    pub player: Option<PlayerView>,
    /// Entity's random source
    pub rng: &'a mut fastrand::Rng,
    /// Seconds since the previous tick
    pub dt: f32,
    /// Slots the entity supports
    pub capabilities: Capabilities,
}

impl StateContext<'_> {
    /// Entity position.
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.body.motor.position()
    }

    /// Transition to the first supported slot in `order`, or stay put.
    #[must_use]
    pub fn fallback(&self, order: &[StateSlot]) -> Transition {
        self.capabilities
            .first_supported(order)
            .map_or(Transition::Stay, Transition::To)
    }
}

// ============================================================================
// Behavior Trait
// ============================================================================

/// One behavior. Hooks run only while it is the current state.
pub trait State: fmt::Debug {
    /// Display name.
    fn name(&self) -> &'static str;

    /// Runs once when the state becomes current.
    fn enter(&mut self, ctx: &mut StateContext<'_>);

    /// Runs once when the state stops being current.
    fn exit(&mut self, _ctx: &mut StateContext<'_>) {}

    /// Per-frame tick.
    fn frame_update(&mut self, ctx: &mut StateContext<'_>) -> Transition;

    /// Fixed-step physics tick.
    fn physics_update(&mut self, _ctx: &mut StateContext<'_>) -> Transition {
        Transition::Stay
    }

    /// Animation event from the host.
    fn animation_trigger(
        &mut self,
        _ctx: &mut StateContext<'_>,
        _trigger: AnimationTrigger,
    ) -> Transition {
        Transition::Stay
    }

    /// Out-of-band signal.
    fn signal(&mut self, _ctx: &mut StateContext<'_>, _signal: Signal) -> Transition {
        Transition::Stay
    }

    /// Whether the behavior picks destinations from way-points.
    fn needs_way_points(&self) -> bool {
        false
    }

    /// Whether the behavior needs sleep points.
    fn needs_sleep_points(&self) -> bool {
        false
    }
}
