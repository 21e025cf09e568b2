//! Event bus for monster notifications.
//!
//! Entities record what happened during a tick in their body's outbox; the
//! session stamps each record with the entity ID and publishes it here.
//! Hosts drain the bus to play audio, drive UI or end the game.

use crossbeam_channel::{bounded, Receiver, Sender};
use glam::Vec3;
use lurk_common::{EntityId, SleepPointId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::StateSlot;

/// What happened to a monster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AiEventKind {
    /// State machine moved between slots
    StateChanged {
        /// Previous slot
        from: StateSlot,
        /// New slot
        to: StateSlot,
    },
    /// Player entered view
    PlayerSpotted {
        /// Where the player was seen
        position: Vec3,
    },
    /// Player left view
    PlayerLost {
        /// Last seen position
        last_seen: Vec3,
    },
    /// Flashlight exposure crossed its threshold
    FlashlightExposed,
    /// Enough camera flashes landed within the window
    FlashCountReached,
    /// A footstep was heard
    FootstepHeard {
        /// Footstep position
        position: Vec3,
    },
    /// Freeze finished
    FreezeEnded,
    /// Retreat finished
    RetreatEnded,
    /// Monster caught the player
    CaughtPlayer,
    /// Monster took a sleep point
    SleepPointClaimed {
        /// Claimed point
        point: SleepPointId,
    },
}

/// An event attributed to a monster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiEvent {
    /// Originating monster
    pub entity: EntityId,
    /// What happened
    pub kind: AiEventKind,
}

/// Bounded event bus. Publishing never blocks; when full, events drop.
#[derive(Debug)]
pub struct EventBus {
    sender: Sender<AiEvent>,
    receiver: Receiver<AiEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl EventBus {
    /// Creates a new event bus with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            capacity: capacity.max(1),
        }
    }

    /// Publishes an event to the bus.
    pub fn publish(&self, event: AiEvent) {
        if self.sender.try_send(event).is_err() {
            warn!(capacity = self.capacity, "event bus full, dropping event");
        }
    }

    /// Drains all pending events.
    pub fn drain(&self) -> Vec<AiEvent> {
        self.receiver.try_iter().collect()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns the channel capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Creates a new sender handle, e.g. for a host thread.
    #[must_use]
    pub fn sender(&self) -> Sender<AiEvent> {
        self.sender.clone()
    }
}
