//! # Starlane Core
//!
//! Typed request/response substrate for the SpaceTraders game API.
//!
//! ## Overview
//!
//! - **Endpoint catalog** mapping every operation to its path, method,
//!   authorization and payload shapes
//! - **Request builder** that rejects malformed calls before any I/O
//! - **Client** executing one validated request per call, with opt-in retry
//!   and pagination layered on top
//! - **Response envelope** and **error classification** for success and
//!   failure bodies
//! - **Rate limit tracking** mirrored from response headers
//! - **Freshness wrappers** reconciling API and stored copies by recency
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`classify`] | Domain vs transport classification of error bodies |
//! | [`client`] | Request execution, retry and pagination |
//! | [`config`] | Base URL, proxy, timeout and credentials |
//! | [`endpoint`] | Closed endpoint catalog and path substitution |
//! | [`envelope`] | Successful response decoding |
//! | [`error`] | Core error types |
//! | [`freshness`] | Provenance and recency wrappers |
//! | [`http_client`] | HTTP client abstraction |
//! | [`models`] | Request bodies and common payloads |
//! | [`rate_limit`] | Server-reported quota tracking |
//! | [`request`] | Request builder and validation |
//! | [`retry`] | Backoff and cancellation policies |
//! | [`shape`] | Named JSON shapes |
//! | [`throttling`] | Caller-side pacing |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use starlane_core::{Client, ClientConfig, Credentials, Endpoint, Request};
//! use starlane_core::models::Agent;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new(ClientConfig::from_env()?)?;
//!     let credentials = Credentials::from_env();
//!
//!     let request = Request::builder(Endpoint::GetMyAgent)
//!         .token_from(&credentials)
//!         .retries(2)
//!         .build()?;
//!
//!     let agent = client.call_with_retry(&request).await?.decode::<Agent>()?;
//!     println!("{agent:?}");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Request Builder │────▶│ Endpoint Catalog │
//! └────────┬────────┘     └──────────────────┘
//!          │ Request
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │     Client      │────▶│ HTTP Client      │
//! │ (retry, pages)  │     │ (reqwest/script) │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!    ┌─────┴──────┬────────────────┐
//!    ▼            ▼                ▼
//! ┌────────┐ ┌───────────┐ ┌──────────────────┐
//! │Response│ │ ApiError  │ │ RateLimitTracker │
//! └────────┘ └───────────┘ └──────────────────┘
//! ```
//!
//! ## Security
//!
//! - Tokens are read from the environment or supplied by the caller and are
//!   never logged
//! - `Credentials` redacts tokens in its `Debug` output

pub mod classify;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod envelope;
pub mod error;
pub mod freshness;
pub mod http_client;
pub mod models;
pub mod rate_limit;
pub mod request;
pub mod retry;
pub mod shape;
pub mod throttling;
pub mod timestamp;

pub use classify::classify;
pub use client::Client;
pub use config::{ClientConfig, Credentials};
pub use endpoint::{lookup, substitute_path, AuthKind, Endpoint, EndpointDescriptor};
pub use envelope::{PageMeta, PagedResponse, Response};
pub use error::{
    ApiError, BuildError, ConfigError, CoreError, DomainError, TransportError, ValidationError,
};
pub use freshness::{BackedData, BackingData, Newest, Source, Timestamped, Tracked};
pub use http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse,
    ReqwestHttpClient, ScriptedHttpClient,
};
pub use rate_limit::{LimiterType, RateLimitState, RateLimitTracker};
pub use request::{Body, Paging, Request, RequestBuilder};
pub use retry::{Backoff, CancelPolicy, RetryPolicy};
pub use shape::{ApiPayload, PayloadShape, RequestBody, Shape};
pub use throttling::Pacer;
pub use timestamp::UtcDateTime;
