use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::domain::models::RateLimitConfig;

/// Token bucket limiter shared by all requests of one upstream client.
///
/// Cloning shares the bucket.
#[derive(Clone)]
pub struct RequestRateLimiter {
    inner: Arc<DefaultDirectRateLimiter>,
}

impl RequestRateLimiter {
    /// Create a limiter allowing `requests_per_second` sustained with
    /// bursts of up to `burst_size`. Zero values are raised to 1.
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst_size).unwrap_or(rate);
        let quota = Quota::per_second(rate).allow_burst(burst);
        Self {
            inner: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_second, config.burst_size)
    }

    /// Wait until a request may be sent.
    pub async fn acquire(&self) {
        self.inner.until_ready().await;
    }
}

impl std::fmt::Debug for RequestRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRateLimiter").finish_non_exhaustive()
    }
}
