//! Fixed-interval polling with a deadline
//!
//! Every wait in the login flow (client phase, patching, session, username)
//! is the same loop: check, sleep, re-check, stop at the deadline. This
//! module owns that loop so each call site only supplies the check.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

/// Point in time after which a loop must stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

impl Deadline {
    /// Deadline `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    pub fn instant(&self) -> Instant {
        self.0
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.0
    }

    /// Time left, zero once expired
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }
}

/// Result of a single check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<T> {
    Ready(T),
    Pending,
}

/// Result of a whole polling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome<T, E> {
    Succeeded(T),
    TimedOut,
    Failed(E),
}

impl<T, E> PollOutcome<T, E> {
    /// Collapse into a `Result`, mapping a timeout to `on_timeout()`
    pub fn into_result(self, on_timeout: impl FnOnce() -> E) -> Result<T, E> {
        match self {
            Self::Succeeded(value) => Ok(value),
            Self::TimedOut => Err(on_timeout()),
            Self::Failed(err) => Err(err),
        }
    }
}

/// Run `check` every `interval` until it is ready, fails, or `deadline` passes
///
/// The deadline is re-checked before every attempt and the final sleep is
/// clipped so the loop never oversleeps the deadline.
pub async fn poll_until<T, E, F, Fut>(
    interval: Duration,
    deadline: Deadline,
    mut check: F,
) -> PollOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Step<T>, E>>,
{
    let mut attempt: u32 = 0;
    loop {
        if deadline.is_expired() {
            debug!("Polling stopped at deadline after {} attempts", attempt);
            return PollOutcome::TimedOut;
        }

        attempt += 1;
        match check().await {
            Ok(Step::Ready(value)) => return PollOutcome::Succeeded(value),
            Ok(Step::Pending) => {}
            Err(err) => return PollOutcome::Failed(err),
        }

        let remaining = deadline.remaining();
        if remaining.is_zero() {
            return PollOutcome::TimedOut;
        }
        tokio::time::sleep(interval.min(remaining)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_pending_checks() {
        let calls = AtomicU32::new(0);

        let outcome: PollOutcome<u32, ()> =
            poll_until(Duration::from_secs(2), Deadline::after(Duration::from_secs(60)), || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Ok(if n == 3 { Step::Ready(n) } else { Step::Pending }) }
            })
            .await;

        assert_eq!(outcome, PollOutcome::Succeeded(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_when_never_ready() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let outcome: PollOutcome<(), ()> =
            poll_until(Duration::from_secs(2), Deadline::after(Duration::from_secs(7)), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(Step::Pending) }
            })
            .await;

        assert_eq!(outcome, PollOutcome::TimedOut);
        // checks at t=0,2,4,6; sleep clipped to the deadline at 7
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_stops_immediately() {
        let outcome: PollOutcome<(), &str> =
            poll_until(Duration::from_secs(1), Deadline::after(Duration::from_secs(10)), || async {
                Err("boom")
            })
            .await;

        assert_eq!(outcome, PollOutcome::Failed("boom"));
    }

    #[test]
    fn test_into_result() {
        let timed_out: PollOutcome<(), &str> = PollOutcome::TimedOut;
        assert_eq!(timed_out.into_result(|| "timeout"), Err("timeout"));

        let ok: PollOutcome<u8, &str> = PollOutcome::Succeeded(1);
        assert_eq!(ok.into_result(|| "timeout"), Ok(1));
    }
}
