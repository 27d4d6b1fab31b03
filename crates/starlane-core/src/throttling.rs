use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::rate_limit::RateLimitState;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Caller-side pacer sized from the quota the server last reported.
///
/// The client never consults this on its own; page walks and automation
/// loops opt in by passing one along.
#[derive(Clone)]
pub struct Pacer {
    limiter: Arc<DirectRateLimiter>,
    clock: DefaultClock,
}

impl Pacer {
    /// `per_second` sustained requests with bursts of up to `burst`.
    pub fn new(per_second: u32, burst: u32) -> Self {
        let rate = NonZeroU32::new(per_second.max(1)).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst.max(1)).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rate).allow_burst(burst);
        let clock = DefaultClock::default();

        Self {
            limiter: Arc::new(RateLimiter::direct_with_clock(quota, &clock)),
            clock,
        }
    }

    pub fn from_state(state: &RateLimitState) -> Self {
        Self::new(state.per_second, state.burst)
    }

    /// Takes one cell of quota, or reports how long until one is available.
    pub fn acquire(&self) -> Result<(), Duration> {
        self.limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }

    /// Waits until a cell of quota is available, then takes it.
    pub async fn ready(&self) {
        while let Err(delay) = self.acquire() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::LimiterType;
    use crate::UtcDateTime;

    #[test]
    fn allows_burst_then_reports_delay() {
        let pacer = Pacer::new(1, 2);

        assert!(pacer.acquire().is_ok());
        assert!(pacer.acquire().is_ok());

        let delay = pacer.acquire().expect_err("burst exhausted");
        assert!(delay > Duration::ZERO);
        assert!(delay <= Duration::from_secs(1));
    }

    #[test]
    fn sized_from_reported_state() {
        let pacer = Pacer::from_state(&RateLimitState {
            limiter: LimiterType::Account,
            reset: UtcDateTime::now(),
            burst: 3,
            per_second: 2,
            remaining: 3,
        });

        for _ in 0..3 {
            assert!(pacer.acquire().is_ok());
        }
        assert!(pacer.acquire().is_err());
    }

    #[test]
    fn zero_quota_is_clamped_to_one() {
        let pacer = Pacer::new(0, 0);
        assert!(pacer.acquire().is_ok());
        assert!(pacer.acquire().is_err());
    }

    #[tokio::test]
    async fn ready_waits_for_quota() {
        let pacer = Pacer::new(50, 1);
        pacer.ready().await;
        let started = std::time::Instant::now();
        pacer.ready().await;
        assert!(started.elapsed() >= Duration::from_millis(10));
    }
}
