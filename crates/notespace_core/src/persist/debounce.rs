//! Cancel-and-reschedule save deadline.

use std::time::{Duration, Instant};

/// Single pending deadline that every new request pushes back.
///
/// The clock is supplied by the caller so the host event loop (or a test)
/// decides when time advances.
#[derive(Debug, Clone)]
pub struct SaveDebouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl SaveDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancels any pending deadline and arms a new one at `now + delay`.
    pub fn schedule_at(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Disarms and returns `true` when the deadline has passed at `now`.
    pub fn take_due_at(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
