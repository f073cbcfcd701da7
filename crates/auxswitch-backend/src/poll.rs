//! Bounded waiting.
//!
//! Every wait in a backend goes through a [`Deadline`]; nothing sleeps
//! without one.

use std::thread;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::Result;

/// Longest wait a single deadline covers. Larger timeouts are clamped.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// A point in time an operation must finish by.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout.min(MAX_TIMEOUT),
        }
    }

    /// Deadline `timeout` from now, but never sooner than `floor`.
    pub fn with_floor(timeout: Duration, floor: Duration) -> Self {
        Self::after(timeout.max(floor))
    }

    /// A deadline halfway to this one, for the primary leg of a fallback chain.
    pub fn halfway(&self) -> Self {
        Self::after(self.remaining() / 2)
    }

    /// This deadline, pushed out so at least `floor` remains.
    pub fn at_least(self, floor: Duration) -> Self {
        if self.remaining() < floor {
            Self::after(floor)
        } else {
            self
        }
    }

    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }

    pub fn expired(&self) -> bool {
        Instant::now() >= self.at
    }

    /// `budget` clamped to what is left, but never below `floor`.
    pub fn budget(&self, budget: Duration, floor: Duration) -> Duration {
        budget.min(self.remaining()).max(floor)
    }
}

/// Re-run `check` every `interval` until it reports `true` or `deadline`
/// passes.
///
/// `check` always runs at least once, even with an expired deadline. The
/// result is that of the last attempt: `Ok(true)` as soon as the condition
/// holds, otherwise the final `Ok(false)` or error.
pub fn poll_until<F>(deadline: &Deadline, interval: Duration, mut check: F) -> Result<bool>
where
    F: FnMut() -> Result<bool>,
{
    let mut attempts = 0u32;
    loop {
        attempts += 1;
        let outcome = check();
        if matches!(outcome, Ok(true)) {
            trace!(attempts, "poll condition met");
            return outcome;
        }
        if deadline.expired() {
            trace!(attempts, ?outcome, "poll deadline reached");
            return outcome;
        }
        thread::sleep(interval.min(deadline.remaining()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuxError;

    #[test]
    fn expired_deadline_still_checks_once() {
        let deadline = Deadline::after(Duration::ZERO);
        let mut calls = 0;
        let result = poll_until(&deadline, Duration::from_millis(10), || {
            calls += 1;
            Ok(false)
        });
        assert_eq!(result, Ok(false));
        assert_eq!(calls, 1);
    }

    #[test]
    fn stops_on_first_success() {
        let deadline = Deadline::after(Duration::from_secs(5));
        let mut calls = 0;
        let result = poll_until(&deadline, Duration::from_millis(1), || {
            calls += 1;
            Ok(calls == 3)
        });
        assert_eq!(result, Ok(true));
        assert_eq!(calls, 3);
    }

    #[test]
    fn returns_last_error_at_deadline() {
        let deadline = Deadline::after(Duration::from_millis(20));
        let result = poll_until(&deadline, Duration::from_millis(5), || {
            Err(AuxError::UnexpectedReply("nothing".into()))
        });
        assert_eq!(result, Err(AuxError::UnexpectedReply("nothing".into())));
    }

    #[test]
    fn never_overshoots_deadline_by_much() {
        let start = Instant::now();
        let deadline = Deadline::after(Duration::from_millis(50));
        let _ = poll_until(&deadline, Duration::from_millis(40), || Ok(false));
        assert!(start.elapsed() < Duration::from_millis(300));
    }

    #[test]
    fn oversized_timeout_is_clamped() {
        let deadline = Deadline::after(Duration::from_secs(u64::MAX));
        assert!(!deadline.expired());
        assert!(deadline.remaining() <= MAX_TIMEOUT);
        assert!(deadline.remaining() > MAX_TIMEOUT - Duration::from_secs(60));
    }

    #[test]
    fn floor_and_budget() {
        let deadline = Deadline::with_floor(Duration::ZERO, Duration::from_millis(200));
        assert!(deadline.remaining() > Duration::from_millis(100));
        assert_eq!(
            deadline.budget(Duration::from_millis(50), Duration::from_millis(10)),
            Duration::from_millis(50)
        );

        let expired = Deadline::after(Duration::ZERO);
        assert_eq!(
            expired.budget(Duration::from_millis(50), Duration::from_millis(10)),
            Duration::from_millis(10)
        );
    }
}
