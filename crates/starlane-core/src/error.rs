use std::fmt::{Display, Formatter};

use serde_json::Value;
use thiserror::Error;

use crate::endpoint::AuthKind;
use crate::shape::{PayloadShape, Shape};

/// Parse failures for the small value types of this crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("timestamp must be RFC3339: '{value}'")]
    InvalidTimestamp { value: String },
    #[error("unknown endpoint '{value}'")]
    UnknownEndpoint { value: String },
    #[error("unknown rate limiter type '{value}'")]
    UnknownLimiterType { value: String },
}

/// Request builder misuse. Raised by `RequestBuilder::build` before any I/O.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("an endpoint must be chosen before `{step}`")]
    EndpointNotChosen { step: &'static str },

    #[error("endpoint expects {expected} path parameter(s) but {actual} were supplied")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("endpoint requires a {expected} request body")]
    MissingBody { expected: Shape },
    #[error("endpoint expects a {expected} request body, got {actual}")]
    BodyShapeMismatch { expected: Shape, actual: Shape },
    #[error("request body could not be encoded: {message}")]
    BodyEncoding { message: String },

    #[error("paginated endpoint requires a paging strategy")]
    MissingPaging,
    #[error("a page window and all-pages paging cannot both be selected")]
    ConflictingPaging,
    #[error("page window [{start}, {end}] must satisfy 1 <= start <= end <= 20")]
    PageWindowOutOfRange { start: u32, end: u32 },
    #[error("page limit {limit} must be within 1..=20")]
    PageLimitOutOfRange { limit: u32 },

    #[error("endpoint requires {auth} authorization but no token was resolved")]
    MissingToken { auth: AuthKind },
}

/// Rule rejection reported by the game server.
///
/// Selected when the error body carries a `requestId`.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainError {
    pub code: i64,
    pub message: String,
    pub data: Value,
    pub request_id: String,
}

impl Display for DomainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (code {}, request {})",
            self.message, self.code, self.request_id
        )
    }
}

impl std::error::Error for DomainError {}

/// HTTP or infrastructure failure.
///
/// `status` is `None` when no HTTP status was ever received (timeouts,
/// refused connections).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub status: Option<u16>,
    pub message: String,
    pub error: String,
}

impl TransportError {
    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            error: String::from("Timeout"),
        }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
            error: String::from("ConnectionFailed"),
        }
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} {}: {}", status, self.error, self.message),
            None => write!(f, "{}: {}", self.error, self.message),
        }
    }
}

impl std::error::Error for TransportError {}

/// Outcome of a failed API call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("response could not be decoded as {expected}: {message}")]
    Decode {
        expected: PayloadShape,
        message: String,
    },
}

/// Domain code the server uses alongside HTTP 429.
pub const RATE_LIMIT_CODE: i64 = 429;

impl ApiError {
    pub fn decode(expected: PayloadShape, message: impl Into<String>) -> Self {
        Self::Decode {
            expected,
            message: message.into(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(error) => error.status,
            Self::Domain(_) | Self::Decode { .. } => None,
        }
    }

    pub fn domain_code(&self) -> Option<i64> {
        match self {
            Self::Domain(error) => Some(error.code),
            Self::Transport(_) | Self::Decode { .. } => None,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429) || self.domain_code() == Some(RATE_LIMIT_CODE)
    }

    /// Decode errors are deterministic; repeating the call cannot fix them.
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

/// Environment/configuration failures raised once at startup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("http client could not be constructed: {0}")]
    HttpClient(String),
}

/// Top-level error type for callers that want a single error.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
