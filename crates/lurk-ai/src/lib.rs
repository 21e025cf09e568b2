//! # Lurk AI
//!
//! Monster behavior core for Lurk.
//!
//! This crate provides the engine-independent half of the monster AI:
//! - Finite state machine with enter/exit/update hooks per behavior
//! - Behaviors: idle, patrol, stalk, search, investigate, freeze, stun,
//!   retreat, disappear, sleep, caught-player
//! - Sensors: field-of-view sight, flashlight exposure, flash counting,
//!   footstep hearing
//! - Way-point registry with radius backoff and farthest-point selection
//! - Sleep point occupancy with a graceful selection ladder
//! - Entities, archetype presets, and a session that ticks them
//!
//! The host engine supplies navigation, spatial queries and the player
//! through the traits in [`host`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod archetype;
pub mod body;
pub mod entity;
pub mod error;
pub mod events;
pub mod host;
pub mod level;
pub mod machine;
pub mod random;
pub mod sensors;
pub mod session;
pub mod sleep;
pub mod state;
pub mod states;
pub mod timer;
pub mod waypoint;

#[cfg(test)]
mod scenario_tests;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::archetype::*;
    pub use crate::body::*;
    pub use crate::entity::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::host::*;
    pub use crate::level::*;
    pub use crate::machine::*;
    pub use crate::random::*;
    pub use crate::sensors::*;
    pub use crate::session::*;
    pub use crate::sleep::*;
    pub use crate::state::*;
    pub use crate::states::*;
    pub use crate::timer::*;
    pub use crate::waypoint::*;
}

pub use prelude::*;
