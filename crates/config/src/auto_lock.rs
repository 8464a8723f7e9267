// Passcode auto-lock deadlines
//
// Pure bookkeeping: the caller owns the real timer and the clock, feeds
// `now` in, and acts on the returned decision.

use std::time::{Duration, Instant};

/// Default grace period for a lock check that fired late (system sleep,
/// a busy main thread).
pub const DEFAULT_LATE_TOLERANCE: Duration = Duration::from_millis(3000);

/// Snapshot of the application state the lock check depends on.
#[derive(Debug, Clone, Copy)]
pub struct LockState {
    /// A local passcode is configured
    pub passcode_set: bool,
    /// The passcode lock is already showing
    pub locked: bool,
    /// Last user input
    pub last_non_idle: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockDecision {
    /// Nothing to track; timer cancelled.
    Idle,
    /// Show the passcode lock now.
    LockNow,
    /// Check again after this long.
    CheckIn(Duration),
}

#[derive(Debug, Clone)]
pub struct AutoLock {
    timeout: Duration,
    late_tolerance: Duration,
    should_lock_at: Option<Instant>,
    timer: Option<Instant>,
}

impl AutoLock {
    pub fn new(timeout: Duration, late_tolerance: Duration) -> Self {
        Self {
            timeout,
            late_tolerance,
            should_lock_at: None,
            timer: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// When the session expects to lock, if a check is pending.
    pub fn should_lock_at(&self) -> Option<Instant> {
        self.should_lock_at
    }

    /// When the armed timer fires.
    pub fn timer_deadline(&self) -> Option<Instant> {
        self.timer
    }

    fn reset(&mut self) {
        self.should_lock_at = None;
        self.timer = None;
    }

    pub fn check(&mut self, now: Instant, state: &LockState) -> LockDecision {
        if !state.passcode_set || state.locked {
            self.reset();
            return LockDecision::Idle;
        }

        let idle = now.saturating_duration_since(state.last_non_idle);
        let overdue = self
            .should_lock_at
            .and_then(|at| at.checked_add(self.late_tolerance))
            .is_some_and(|late| now > late);
        if idle >= self.timeout || overdue {
            self.reset();
            log::info!("Auto-locking after {:?} idle", idle);
            return LockDecision::LockNow;
        }

        // Deadlines past the clock's range never fire
        let remaining = self.timeout - idle;
        self.should_lock_at = now.checked_add(remaining);
        self.timer = self.should_lock_at;
        LockDecision::CheckIn(remaining)
    }

    /// Make sure a check happens within `after`. An armed timer that
    /// already fires sooner is left alone.
    pub fn check_in(&mut self, now: Instant, after: Duration) {
        if let Some(deadline) = self.timer {
            let remaining = deadline.saturating_duration_since(now);
            if !remaining.is_zero() && remaining <= after {
                return;
            }
        }
        self.timer = now.checked_add(after);
    }

    /// The local passcode was set, changed or removed.
    pub fn passcode_changed(&mut self, now: Instant, state: &LockState) -> LockDecision {
        self.reset();
        self.check(now, state)
    }

    /// The lock screen was shown or dismissed.
    pub fn lock_state_changed(&mut self) {
        self.should_lock_at = None;
    }

    /// Run the check if the timer is due.
    pub fn poll(&mut self, now: Instant, state: &LockState) -> Option<LockDecision> {
        match self.timer {
            Some(deadline) if now >= deadline => {
                self.timer = None;
                Some(self.check(now, state))
            }
            _ => None,
        }
    }
}
