//! Backoff arithmetic for the retry loop.
//!
//! The delay before attempt `n` (1-indexed for retries, so the first retry
//! is attempt 1) is `BASE_DELAY_MS * 2^(n-1)` plus uniform jitter in
//! `[0, MAX_JITTER_MS)`. Jitter is recomputed per retry so simultaneous
//! failing calls spread out instead of retrying in lockstep.

use std::time::Duration;

use rand::Rng;

/// Base delay for the first retry (milliseconds).
const BASE_DELAY_MS: u64 = 300;

/// Upper bound (exclusive) on random jitter added to each delay.
const MAX_JITTER_MS: u64 = 150;

/// Deterministic part of the backoff: `300ms * 2^(attempt-1)`.
///
/// `attempt` must be >= 1; attempt 0 is the initial try and never waits.
pub(crate) fn base_backoff(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(32);
    Duration::from_millis(BASE_DELAY_MS.saturating_mul(1u64 << exponent))
}

/// Full backoff delay for a retry attempt, jitter included.
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    base_backoff(attempt) + jitter()
}

fn jitter() -> Duration {
    let mut rng = rand::thread_rng();
    Duration::from_millis(rng.gen_range(0..MAX_JITTER_MS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_backoff_doubles() {
        assert_eq!(base_backoff(1), Duration::from_millis(300));
        assert_eq!(base_backoff(2), Duration::from_millis(600));
        assert_eq!(base_backoff(3), Duration::from_millis(1200));
        assert_eq!(base_backoff(4), Duration::from_millis(2400));
    }

    #[test]
    fn test_base_backoff_does_not_overflow() {
        // Very large attempt numbers must not panic, even if the delay
        // itself is absurd.
        let delay = base_backoff(u32::MAX);
        assert!(delay >= Duration::from_millis(300));
    }

    #[test]
    fn test_delay_within_jitter_bounds() {
        for _ in 0..100 {
            let delay = backoff_delay(1);
            assert!(delay >= Duration::from_millis(300), "got {delay:?}");
            assert!(delay < Duration::from_millis(450), "got {delay:?}");
        }
    }

    #[test]
    fn test_second_retry_bounds() {
        for _ in 0..100 {
            let delay = backoff_delay(2);
            assert!(delay >= Duration::from_millis(600), "got {delay:?}");
            assert!(delay < Duration::from_millis(750), "got {delay:?}");
        }
    }

    #[test]
    fn test_jitter_varies() {
        // 50 samples virtually never collide on all values if jitter is live.
        let samples: Vec<Duration> = (0..50).map(|_| backoff_delay(1)).collect();
        let first = samples[0];
        assert!(
            samples.iter().any(|d| *d != first),
            "jitter produced 50 identical delays"
        );
    }
}
