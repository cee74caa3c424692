//! Minimum spacing between external geocoding calls.

use std::sync::OnceLock;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Serializes callers so that consecutive [`RateLimiter::wait`] returns are
/// at least `min_interval` apart.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

static PROCESS_WIDE: OnceLock<RateLimiter> = OnceLock::new();

impl RateLimiter {
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    /// The limiter shared by every geocode cache in the process.
    ///
    /// The first caller fixes the interval; later callers asking for a
    /// different one get the existing limiter.
    pub fn process_wide(min_interval: Duration) -> &'static Self {
        let limiter = PROCESS_WIDE.get_or_init(|| Self::new(min_interval));
        if limiter.min_interval != min_interval {
            log::debug!(
                "Process-wide rate limiter already set to {:?}, ignoring {min_interval:?}",
                limiter.min_interval
            );
        }
        limiter
    }

    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Waits until a call is allowed and claims the slot.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spaces_consecutive_calls() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();

        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn first_call_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
