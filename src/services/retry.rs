//! Bounded polling
//!
//! `poll_until` runs a probe at most `max_attempts` times, sleeping `interval`
//! between attempts, and stops at the first result accepted by the predicate.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use crate::config::PollConfig;

/// Result of a bounded poll
#[derive(Debug)]
pub enum PollResult<T> {
    /// Accepted on attempt `attempt` (1-based)
    Ready { value: T, attempt: u32 },
    /// Every attempt was rejected; carries the last probe result
    Exhausted { last: Option<T>, attempts: u32, elapsed: Duration },
}

impl<T> PollResult<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollResult::Ready { .. })
    }
}

/// Poll `probe` until `accept` returns true or the attempts run out.
///
/// `on_attempt` is called after each rejected attempt with the attempt number,
/// which callers use for progress output.
pub async fn poll_until<T, P, Fut, A, R>(
    config: PollConfig,
    mut probe: P,
    accept: A,
    mut on_attempt: R,
) -> PollResult<T>
where
    P: FnMut() -> Fut,
    Fut: Future<Output = T>,
    A: Fn(&T) -> bool,
    R: FnMut(u32, &T),
{
    let started = Instant::now();
    let mut last = None;

    for attempt in 1..=config.max_attempts {
        let value = probe().await;
        if accept(&value) {
            return PollResult::Ready { value, attempt };
        }
        on_attempt(attempt, &value);
        last = Some(value);

        if attempt < config.max_attempts {
            sleep(config.interval).await;
        }
    }

    PollResult::Exhausted {
        last,
        attempts: config.max_attempts,
        elapsed: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn config(attempts: u32, secs: u64) -> PollConfig {
        PollConfig {
            interval: Duration::from_secs(secs),
            max_attempts: attempts,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_on_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let started = Instant::now();

        let result = poll_until(
            config(60, 2),
            || {
                let counter = counter.clone();
                async move { counter.fetch_add(1, Ordering::SeqCst) + 1 }
            },
            |n| *n == 3,
            |_, _| {},
        )
        .await;

        assert!(matches!(result, PollResult::Ready { value: 3, attempt: 3 }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // two sleeps between three probes
        assert!(started.elapsed() >= Duration::from_secs(4));
        assert!(started.elapsed() < Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let mut reported = Vec::new();

        let result = poll_until(
            config(60, 2),
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    false
                }
            },
            |ok| *ok,
            |attempt, _| reported.push(attempt),
        )
        .await;

        match result {
            PollResult::Exhausted { attempts, elapsed, last } => {
                assert_eq!(attempts, 60);
                assert_eq!(last, Some(false));
                // 59 intervals of 2s, no trailing sleep
                assert!(elapsed >= Duration::from_secs(118));
                assert!(elapsed < Duration::from_secs(120));
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 60);
        assert_eq!(reported, (1..=60).collect::<Vec<_>>());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_does_not_sleep() {
        let started = Instant::now();
        let result = poll_until(config(5, 2), || async { "pong" }, |_| true, |_, _| {}).await;
        assert!(result.is_ready());
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
