//! Frame-loop scheduling primitives.
//!
//! Nothing here sleeps or spawns: the host calls into the engine once per
//! frame with the current [`Instant`], and these types answer "is my deadline
//! due?" and "which driver is allowed to move the position?".  Every
//! started driver hands out a [`TaskToken`]; cancelling with a stale token,
//! or cancelling twice, is a no-op.

use std::time::Instant;

/// Identifies one started driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskToken(u64);

// ───────────────────────────────────────── timer ─────────────

/// A single re-armable deadline (e.g. the quiet period after the last input).
#[derive(Debug, Default)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the timer.  Any previous deadline is replaced.
    pub fn arm(&mut self, at: Instant) {
        self.deadline = Some(at);
    }

    /// Disarm the timer.  Safe to call when nothing is armed.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once when `now` reaches the deadline, disarming
    /// the timer in the process.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(at) if now >= at => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

// ───────────────────────────────────────── driver slot ───────

/// Holds the one animation driver allowed to mutate the scroll position.
///
/// Starting a driver cancels whatever was running, so two drivers can never
/// fight over the same frame.
#[derive(Debug)]
pub struct DriverSlot<D> {
    active: Option<(TaskToken, D)>,
    next_id: u64,
}

impl<D> Default for DriverSlot<D> {
    fn default() -> Self {
        Self {
            active: None,
            next_id: 0,
        }
    }
}

impl<D> DriverSlot<D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `driver`, cancelling the previous one first.
    pub fn start(&mut self, driver: D) -> TaskToken {
        self.cancel();
        self.next_id = self.next_id.wrapping_add(1);
        let token = TaskToken(self.next_id);
        self.active = Some((token, driver));
        token
    }

    /// Cancel whatever is running and hand it back.  Idempotent.
    pub fn cancel(&mut self) -> Option<D> {
        self.active.take().map(|(_, d)| d)
    }

    /// Cancel only if `token` still names the running driver.  Returns whether
    /// anything was cancelled.
    pub fn cancel_token(&mut self, token: TaskToken) -> bool {
        match self.active {
            Some((current, _)) if current == token => {
                self.active = None;
                true
            }
            _ => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn token(&self) -> Option<TaskToken> {
        self.active.as_ref().map(|(t, _)| *t)
    }

    pub fn get(&self) -> Option<&D> {
        self.active.as_ref().map(|(_, d)| d)
    }

    pub fn get_mut(&mut self) -> Option<&mut D> {
        self.active.as_mut().map(|(_, d)| d)
    }
}
