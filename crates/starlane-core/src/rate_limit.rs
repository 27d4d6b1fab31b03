//! Passive mirror of the server-reported rate limit.
//!
//! Every response (success or failure) carries five `X-Ratelimit-*` headers.
//! The tracker replaces its whole state from one complete header set; it
//! never merges fields from different responses and never throttles on its
//! own. Callers that want to pace bursts consult it, or build a
//! [`Pacer`](crate::throttling::Pacer) from its snapshot.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::RwLock;
use std::time::Duration;

use tracing::debug;

use crate::{UtcDateTime, ValidationError};

pub const HEADER_LIMIT_BURST: &str = "x-ratelimit-limit-burst";
pub const HEADER_LIMIT_PER_SECOND: &str = "x-ratelimit-limit-per-second";
pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_RESET: &str = "x-ratelimit-reset";
pub const HEADER_TYPE: &str = "x-ratelimit-type";

/// Headers routed to the HTTP-facing view of a response.
pub const RATE_LIMIT_HEADERS: [&str; 5] = [
    HEADER_LIMIT_BURST,
    HEADER_LIMIT_PER_SECOND,
    HEADER_REMAINING,
    HEADER_RESET,
    HEADER_TYPE,
];

pub fn is_rate_limit_header(name: &str) -> bool {
    RATE_LIMIT_HEADERS
        .iter()
        .any(|header| header.eq_ignore_ascii_case(name))
}

/// Which limiter produced the reported quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimiterType {
    IpAddress,
    Account,
    DdosProtection,
}

impl LimiterType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IpAddress => "IP Address",
            Self::Account => "Account",
            Self::DdosProtection => "DDoS Protection",
        }
    }
}

impl Display for LimiterType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LimiterType {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "ip" | "ipaddress" => Ok(Self::IpAddress),
            "account" => Ok(Self::Account),
            "ddos" | "ddosprotection" => Ok(Self::DdosProtection),
            _ => Err(ValidationError::UnknownLimiterType {
                value: value.to_owned(),
            }),
        }
    }
}

/// Quota state reported by one response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitState {
    pub limiter: LimiterType,
    pub reset: UtcDateTime,
    pub burst: u32,
    pub per_second: u32,
    pub remaining: u32,
}

impl RateLimitState {
    /// Parses a complete header set. Returns `None` unless all five headers
    /// are present and valid. Header names match case-insensitively.
    pub fn from_headers(headers: &BTreeMap<String, String>) -> Option<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .or_else(|| {
                    headers
                        .iter()
                        .find(|(key, _)| key.eq_ignore_ascii_case(name))
                        .map(|(_, value)| value)
                })
                .map(String::as_str)
        };
        let number = |name: &str| header(name)?.trim().parse::<u32>().ok();

        Some(Self {
            limiter: header(HEADER_TYPE)?.parse().ok()?,
            reset: UtcDateTime::parse(header(HEADER_RESET)?).ok()?,
            burst: number(HEADER_LIMIT_BURST)?,
            per_second: number(HEADER_LIMIT_PER_SECOND)?,
            remaining: number(HEADER_REMAINING)?,
        })
    }

    pub const fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Advisory wait before the next request: zero while tokens remain,
    /// otherwise the time until `reset`.
    pub fn wait_time(&self, now: UtcDateTime) -> Duration {
        if self.is_exhausted() {
            self.reset.duration_since(now)
        } else {
            Duration::ZERO
        }
    }
}

/// Last-write-wins holder of the most recent [`RateLimitState`].
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    state: RwLock<Option<RateLimitState>>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the state from `headers`. Incomplete header sets leave the
    /// previous state untouched. Returns whether the state was replaced.
    pub fn update(&self, headers: &BTreeMap<String, String>) -> bool {
        let Some(next) = RateLimitState::from_headers(headers) else {
            if headers.keys().any(|name| is_rate_limit_header(name)) {
                debug!("ignoring incomplete rate limit header set");
            }
            return false;
        };

        *self
            .state
            .write()
            .expect("rate limit state lock is not poisoned") = Some(next);
        true
    }

    pub fn snapshot(&self) -> Option<RateLimitState> {
        *self
            .state
            .read()
            .expect("rate limit state lock is not poisoned")
    }

    pub fn is_exhausted(&self) -> bool {
        self.snapshot().is_some_and(|state| state.is_exhausted())
    }

    pub fn wait_time(&self, now: UtcDateTime) -> Option<Duration> {
        self.snapshot().map(|state| state.wait_time(now))
    }
}
