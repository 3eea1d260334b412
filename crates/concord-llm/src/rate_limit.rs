//! Fixed-delay throttling for providers with a requests-per-minute quota

use std::time::Duration;
use tracing::debug;

/// Waits a fixed delay before each oracle call
///
/// The delay is `60 / requests_per_minute` seconds. Providers without a
/// quota get no delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RateLimiter {
    delay: Option<Duration>,
}

impl RateLimiter {
    /// Limiter for a quota of `rpm` requests per minute (`None` or 0: unlimited)
    pub fn per_minute(rpm: Option<u32>) -> Self {
        let delay = rpm
            .filter(|rpm| *rpm > 0)
            .map(|rpm| Duration::from_secs_f64(60.0 / f64::from(rpm)));
        Self { delay }
    }

    /// Limiter that never waits
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Delay inserted before each call
    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// Wait before issuing the next call
    pub async fn wait(&self) {
        if let Some(delay) = self.delay {
            debug!("Rate limit: waiting {:?} before next request", delay);
            tokio::time::sleep(delay).await;
        }
    }
}
