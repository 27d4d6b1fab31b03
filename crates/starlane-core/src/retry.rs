//! Retry and cancellation policy carried by every request.
//!
//! The transport performs one attempt per call. These policies are evaluated
//! between attempts by [`Client::call_with_retry`](crate::Client::call_with_retry).

use std::collections::BTreeSet;
use std::time::Duration;

use crate::error::ApiError;

/// Delay strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// The same delay before every retry.
    Fixed {
        /// Delay between retries.
        delay: Duration,
    },
    /// `base * factor^attempt`, capped at `max`, optionally jittered by +/- 50%.
    Exponential {
        /// The delay before the first retry.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum delay between retries, before jitter.
        max: Duration,
        /// Whether to apply random jitter (+/- 50%) to the delay.
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(500),
            factor: 2.0,
            max: Duration::from_secs(10),
            jitter: true,
        }
    }
}

impl Backoff {
    /// Calculates the delay before a retry.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The retry attempt number (0-based)
    ///
    /// # Returns
    ///
    /// The delay to sleep before the retry. Scaled delays that overflow a
    /// [`Duration`] saturate at `max`.
    pub fn delay(self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential {
                base,
                factor,
                max,
                jitter,
            } => {
                let scale = factor.powi(attempt.min(i32::MAX as u32) as i32);
                let seconds = (base.as_secs_f64() * scale).min(max.as_secs_f64());
                let delay = Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(max);

                if !jitter {
                    return delay;
                }

                let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                let spread = millis / 2;
                let offset = fastrand::u64(0..=spread.saturating_mul(2));
                Duration::from_millis(millis.saturating_add(offset).saturating_sub(spread))
            }
        }
    }
}

/// Whether and how often a failed call is repeated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Enables or disables retrying.
    pub enabled: bool,
    /// The number of retries after the first attempt. Total attempts = `retries + 1`.
    pub retries: u32,
    /// The delay strategy between attempts.
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::disabled()
    }
}

impl RetryPolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            retries: 0,
            backoff: Backoff::default(),
        }
    }

    /// `retries == 0` yields a disabled policy.
    pub fn with_retries(retries: u32) -> Self {
        Self {
            enabled: retries > 0,
            retries,
            backoff: Backoff::default(),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        if self.enabled {
            self.retries.saturating_add(1)
        } else {
            1
        }
    }

    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }
}

/// Predicates that stop a retry loop early.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CancelPolicy {
    /// HTTP statuses of transport errors that stop retrying.
    pub http_statuses: BTreeSet<u16>,
    /// Domain error codes that stop retrying.
    pub domain_codes: BTreeSet<i64>,
    /// Whether a rate-limited failure stops retrying.
    pub on_rate_limit: bool,
}

impl CancelPolicy {
    pub fn should_cancel(&self, error: &ApiError) -> bool {
        if self.on_rate_limit && error.is_rate_limited() {
            return true;
        }

        match error {
            ApiError::Transport(transport) => transport
                .status
                .is_some_and(|status| self.http_statuses.contains(&status)),
            ApiError::Domain(domain) => self.domain_codes.contains(&domain.code),
            ApiError::Decode { .. } => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::error::{DomainError, TransportError};

    fn transport(status: u16) -> ApiError {
        ApiError::Transport(TransportError {
            status: Some(status),
            message: String::from("failed"),
            error: String::from("Error"),
        })
    }

    fn domain(code: i64) -> ApiError {
        ApiError::Domain(DomainError {
            code,
            message: String::from("rejected"),
            data: Value::Null,
            request_id: String::from("req"),
        })
    }

    #[test]
    fn fixed_backoff_is_constant() {
        let backoff = Backoff::Fixed {
            delay: Duration::from_millis(100),
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(7), Duration::from_millis(100));
    }

    #[test]
    fn exponential_backoff_doubles_until_cap() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: false,
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(3), Duration::from_millis(800));
        assert_eq!(backoff.delay(4), Duration::from_secs(1));
    }

    #[test]
    fn jitter_stays_within_half_of_delay() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
            jitter: true,
        };

        for _ in 0..20 {
            let delay = backoff.delay(2).as_millis();
            assert!((200..=600).contains(&delay), "delay_ms={delay}");
        }
    }

    #[test]
    fn oversized_delays_saturate_at_max() {
        let backoff = Backoff::Exponential {
            base: Duration::from_secs(1),
            factor: 1e30,
            max: Duration::MAX,
            jitter: false,
        };

        assert_eq!(backoff.delay(3), Duration::MAX);

        let jittered = Backoff::Exponential {
            base: Duration::from_secs(1),
            factor: 1e30,
            max: Duration::MAX,
            jitter: true,
        };
        assert!(jittered.delay(3) >= Duration::from_millis(u64::MAX / 2));
    }

    #[test]
    fn zero_retries_disable_the_policy() {
        assert_eq!(RetryPolicy::with_retries(0), RetryPolicy::disabled());
        assert_eq!(RetryPolicy::with_retries(0).max_attempts(), 1);
        assert_eq!(RetryPolicy::with_retries(3).max_attempts(), 4);
    }

    #[test]
    fn cancel_policy_matches_statuses_and_codes() {
        let policy = CancelPolicy {
            http_statuses: BTreeSet::from([401]),
            domain_codes: BTreeSet::from([4214]),
            on_rate_limit: false,
        };

        assert!(policy.should_cancel(&transport(401)));
        assert!(!policy.should_cancel(&transport(500)));
        assert!(policy.should_cancel(&domain(4214)));
        assert!(!policy.should_cancel(&domain(4000)));
        assert!(!policy.should_cancel(&transport(429)));
    }

    #[test]
    fn cancel_on_rate_limit_covers_status_and_domain_code() {
        let policy = CancelPolicy {
            on_rate_limit: true,
            ..CancelPolicy::default()
        };

        assert!(policy.should_cancel(&transport(429)));
        assert!(policy.should_cancel(&domain(429)));
        assert!(!policy.should_cancel(&transport(503)));
    }

    #[test]
    fn timeouts_without_status_are_not_cancelled_by_status_set() {
        let policy = CancelPolicy {
            http_statuses: BTreeSet::from([408]),
            ..CancelPolicy::default()
        };

        assert!(!policy.should_cancel(&ApiError::Transport(TransportError::timeout("lapsed"))));
    }
}
