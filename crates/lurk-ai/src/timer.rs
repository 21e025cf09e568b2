//! Restartable countdown timers.
//!
//! Behaviors that wait ("stand still for N seconds", "unfreeze after N
//! seconds") hold a [`Countdown`] and tick it from their update hook.
//! Restarting replaces the pending deadline, so at most one is ever live.

use serde::{Deserialize, Serialize};

/// Countdown that reports completion exactly once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Countdown {
    remaining: f32,
    running: bool,
}

impl Countdown {
    /// Creates an idle countdown.
    #[must_use]
    pub const fn idle() -> Self {
        Self {
            remaining: 0.0,
            running: false,
        }
    }

    /// Creates a countdown already running for `seconds`.
    #[must_use]
    pub fn started(seconds: f32) -> Self {
        let mut countdown = Self::idle();
        countdown.restart(seconds);
        countdown
    }

    /// Starts over with a new duration, discarding any pending deadline.
    pub fn restart(&mut self, seconds: f32) {
        self.remaining = seconds.max(0.0);
        self.running = true;
    }

    /// Cancels the pending deadline.
    pub fn stop(&mut self) {
        self.running = false;
        self.remaining = 0.0;
    }

    /// Advances time. Returns true on the tick the countdown finishes.
    pub fn tick(&mut self, dt: f32) -> bool {
        if !self.running {
            return false;
        }
        self.remaining -= dt;
        if self.remaining <= 0.0 {
            self.stop();
            return true;
        }
        false
    }

    /// Whether a deadline is pending.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds until the deadline, 0 when idle.
    #[must_use]
    pub const fn remaining(&self) -> f32 {
        self.remaining
    }
}
