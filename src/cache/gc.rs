//! Debounced deferred reclamation timer.
//!
//! Unsubscribing is bursty: closing a window drops many subscriptions at
//! once, and the same images are often re-subscribed moments later. So a
//! count reaching zero never frees anything directly; it arms a one-shot
//! deadline, and all drops within the window coalesce into a single
//! reclamation pass.
//!
//! The timer is a pure state machine over `Instant`s. The host event loop
//! drives it by polling, which keeps the manager single-threaded and makes
//! the debounce testable without sleeping.

use std::time::{Duration, Instant};

/// Delay between the first drop-to-zero and the reclamation pass.
pub const RECLAIM_DELAY: Duration = Duration::from_secs(60);

/// Schedule-if-not-pending one-shot deadline.
#[derive(Debug)]
pub struct ReclaimTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl ReclaimTimer {
    pub fn new(delay: Duration) -> Self {
        ReclaimTimer {
            delay,
            deadline: None,
        }
    }

    /// Arm the timer unless one is already pending. Repeated requests
    /// while armed are no-ops: the deadline is debounced, not refreshed.
    pub fn request(&mut self, now: Instant) {
        if self.deadline.is_none() {
            self.deadline = Some(now + self.delay);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarm and report `true` if the deadline has elapsed. After firing
    /// the timer is idle again and the next request re-arms it.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending deadline (used when a pass runs unconditionally).
    pub fn disarm(&mut self) {
        self.deadline = None;
    }
}

impl Default for ReclaimTimer {
    fn default() -> Self {
        ReclaimTimer::new(RECLAIM_DELAY)
    }
}
