//! Error types for the behavior core.

use lurk_common::{EntityId, SleepPointId};
use thiserror::Error;

use crate::state::StateSlot;

/// Errors raised by misconfiguration or misuse of the behavior core.
///
/// Transient conditions (no way-point within a radius, no free sleep point)
/// are never errors; they degrade through bounded fallbacks instead.
#[derive(Debug, Error)]
pub enum AiError {
    /// State machine used before a starting state was entered
    #[error("State machine used before initialization")]
    NotInitialized,
    /// Initialize called twice
    #[error("State machine already initialized in {0:?}")]
    AlreadyInitialized(StateSlot),
    /// Transition to a slot the entity has no behavior for
    #[error("Entity does not support state {0:?}")]
    UnsupportedState(StateSlot),
    /// Way-point name registered twice
    #[error("Way-point already registered: {0}")]
    DuplicateWayPoint(String),
    /// Behavior needs way-points but the level has none
    #[error("State {0:?} requires registered way-points")]
    MissingWayPoints(StateSlot),
    /// Sleep behavior configured but the level has no sleep points
    #[error("Sleep state requires registered sleep points")]
    MissingSleepPoints,
    /// Sleep point ID not in the registry
    #[error("Unknown sleep point: {0}")]
    UnknownSleepPoint(SleepPointId),
    /// Claim on a sleep point another entity holds
    #[error("Sleep point {point} already held by {holder}")]
    SleepPointOccupied {
        /// Contested point
        point: SleepPointId,
        /// Current holder
        holder: EntityId,
    },
    /// Release by an entity that does not hold the point
    #[error("{entity} does not hold sleep point {point}")]
    NotOccupant {
        /// Point being released
        point: SleepPointId,
        /// Entity attempting the release
        entity: EntityId,
    },
    /// Behavior or archetype configuration is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// Entity ID not present in the session
    #[error("Unknown entity: {0}")]
    UnknownEntity(EntityId),
}

/// Result type for behavior core operations.
pub type AiResult<T> = Result<T, AiError>;
