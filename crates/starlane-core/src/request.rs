//! Validated, immutable requests.
//!
//! [`RequestBuilder`] is a plain accumulator: each step records what the
//! caller supplied, and [`RequestBuilder::build`] hands the accumulated state
//! to one pure validation function that checks it against the chosen
//! endpoint's descriptor. Nothing touches the network until a [`Request`]
//! exists.
//!
//! Validation order (first violation wins):
//!
//! 1. an endpoint was chosen before every other step
//! 2. declared request bodies are present and of the declared shape
//! 3. path parameter arity matches the template, blank entries ignored
//! 4. paginated endpoints have exactly one paging strategy within bounds
//! 5. authorized endpoints have a resolved token
//!
//! ```rust,ignore
//! let request = Request::builder(Endpoint::NavigateShip)
//!     .path_params(["SHIP-1"])
//!     .data(&NavigateShip { waypoint_symbol: "X1-DF55-20250Z".into() })
//!     .token_from(&credentials)
//!     .retries(3)
//!     .build()?;
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde_json::Value;

use crate::config::Credentials;
use crate::endpoint::{substitute_path, AuthKind, Endpoint, EndpointDescriptor, MAX_PAGE_LIMIT};
use crate::error::BuildError;
use crate::retry::{Backoff, CancelPolicy, RetryPolicy};
use crate::shape::{RequestBody, Shape};

pub const HEADER_AUTHORIZATION: &str = "authorization";
pub const HEADER_CONTENT_TYPE: &str = "content-type";

/// Request body as it will be sent.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Installed automatically for endpoints that declare no body.
    Empty,
    Json { shape: Shape, value: Value },
}

impl Body {
    pub fn shape(&self) -> Option<Shape> {
        match self {
            Self::Empty => None,
            Self::Json { shape, .. } => Some(*shape),
        }
    }

    pub fn to_json_string(&self) -> Option<String> {
        match self {
            Self::Empty => None,
            Self::Json { value, .. } => Some(value.to_string()),
        }
    }
}

/// Which pages of a paginated endpoint to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    None,
    Window { start: u32, end: u32, limit: u32 },
    All { limit: u32 },
}

impl Paging {
    pub const fn limit(self) -> Option<u32> {
        match self {
            Self::None => None,
            Self::Window { limit, .. } | Self::All { limit } => Some(limit),
        }
    }

    pub const fn first_page(self) -> Option<u32> {
        match self {
            Self::None => None,
            Self::Window { start, .. } => Some(start),
            Self::All { .. } => Some(1),
        }
    }
}

/// Token step as supplied by the caller; resolved at build time.
#[derive(Debug, Clone)]
enum TokenStep {
    Explicit(String),
    Defaults(Credentials),
}

/// Accumulates request configuration for validation by [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    endpoint: Option<Endpoint>,
    out_of_order: Option<&'static str>,
    path_params: Vec<String>,
    body: Option<Result<Body, String>>,
    window: Option<(u32, u32)>,
    all_pages: bool,
    page_limit: Option<u32>,
    token: Option<TokenStep>,
    headers: BTreeMap<String, String>,
    retry: RetryPolicy,
    cancel: CancelPolicy,
    timeout: Option<Duration>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn step(&mut self, name: &'static str) {
        if self.endpoint.is_none() && self.out_of_order.is_none() {
            self.out_of_order = Some(name);
        }
    }

    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Values for the path template placeholders, in template order.
    pub fn path_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.step("path_params");
        self.path_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn data<B: RequestBody>(mut self, body: &B) -> Self {
        self.step("data");
        self.body = Some(
            serde_json::to_value(body)
                .map(|value| Body::Json {
                    shape: B::SHAPE,
                    value,
                })
                .map_err(|e| e.to_string()),
        );
        self
    }

    /// Fetch pages `start..=end`.
    pub fn pages(mut self, start: u32, end: u32) -> Self {
        self.step("pages");
        self.window = Some((start, end));
        self
    }

    /// Fetch every page until the server reports the last one.
    pub fn all_pages(mut self) -> Self {
        self.step("all_pages");
        self.all_pages = true;
        self
    }

    /// Items per page, `1..=20`. Defaults to 20.
    pub fn page_limit(mut self, limit: u32) -> Self {
        self.step("page_limit");
        self.page_limit = Some(limit);
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.step("token");
        self.token = Some(TokenStep::Explicit(token.into()));
        self
    }

    /// Resolve the token from `credentials` by the endpoint's auth kind.
    pub fn token_from(mut self, credentials: &Credentials) -> Self {
        self.step("token_from");
        self.token = Some(TokenStep::Defaults(credentials.clone()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.step("header");
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Retry a failed call up to `retries` more times. Zero disables retries.
    pub fn retries(mut self, retries: u32) -> Self {
        self.step("retries");
        self.retry = RetryPolicy {
            backoff: self.retry.backoff,
            ..RetryPolicy::with_retries(retries)
        };
        self
    }

    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.step("backoff");
        self.retry.backoff = backoff;
        self
    }

    pub fn cancel_on_rate_limit(mut self) -> Self {
        self.step("cancel_on_rate_limit");
        self.cancel.on_rate_limit = true;
        self
    }

    pub fn cancel_on_http_errors(mut self, statuses: impl IntoIterator<Item = u16>) -> Self {
        self.step("cancel_on_http_errors");
        self.cancel.http_statuses.extend(statuses);
        self
    }

    pub fn cancel_on_domain_errors(mut self, codes: impl IntoIterator<Item = i64>) -> Self {
        self.step("cancel_on_domain_errors");
        self.cancel.domain_codes.extend(codes);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.step("timeout");
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout_secs(self, seconds: u64) -> Self {
        self.timeout(Duration::from_secs(seconds))
    }

    pub fn build(self) -> Result<Request, BuildError> {
        validate(self)
    }
}

fn validate(builder: RequestBuilder) -> Result<Request, BuildError> {
    let endpoint = match (builder.endpoint, builder.out_of_order) {
        (_, Some(step)) => return Err(BuildError::EndpointNotChosen { step }),
        (None, None) => return Err(BuildError::EndpointNotChosen { step: "build" }),
        (Some(endpoint), None) => endpoint,
    };
    let descriptor = endpoint.descriptor();

    let body = validate_body(&descriptor, builder.body)?;

    let path_params: Vec<String> = builder
        .path_params
        .into_iter()
        .filter(|param| !param.trim().is_empty())
        .collect();
    let path = substitute_path(&descriptor, &path_params, None)?;

    let paging = validate_paging(
        &descriptor,
        builder.window,
        builder.all_pages,
        builder.page_limit,
    )?;

    let token = resolve_token(descriptor.auth, builder.token);
    if descriptor.auth.is_required() && token.is_none() {
        return Err(BuildError::MissingToken {
            auth: descriptor.auth,
        });
    }

    let mut headers = builder.headers;
    if let Some(token) = &token {
        headers.insert(
            String::from(HEADER_AUTHORIZATION),
            format!("Bearer {token}"),
        );
    }
    if descriptor.body.is_some() {
        headers.insert(
            String::from(HEADER_CONTENT_TYPE),
            String::from("application/json"),
        );
    } else {
        headers.remove(HEADER_CONTENT_TYPE);
    }

    Ok(Request {
        endpoint,
        descriptor,
        headers,
        path,
        path_params,
        body,
        paging,
        retry: builder.retry,
        cancel: builder.cancel,
        timeout: builder.timeout,
        token,
    })
}

fn validate_body(
    descriptor: &EndpointDescriptor,
    supplied: Option<Result<Body, String>>,
) -> Result<Body, BuildError> {
    let supplied = supplied
        .transpose()
        .map_err(|message| BuildError::BodyEncoding { message })?;

    match (descriptor.body, supplied) {
        (Some(expected), None) => Err(BuildError::MissingBody { expected }),
        (Some(expected), Some(body)) => match body.shape() {
            Some(actual) if actual == expected => Ok(body),
            Some(actual) => Err(BuildError::BodyShapeMismatch { expected, actual }),
            None => Err(BuildError::MissingBody { expected }),
        },
        // kept as supplied; GET requests drop it on the wire
        (None, Some(body)) => Ok(body),
        (None, None) => Ok(Body::Empty),
    }
}

fn validate_paging(
    descriptor: &EndpointDescriptor,
    window: Option<(u32, u32)>,
    all_pages: bool,
    page_limit: Option<u32>,
) -> Result<Paging, BuildError> {
    let limit = page_limit.unwrap_or(MAX_PAGE_LIMIT);
    if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
        return Err(BuildError::PageLimitOutOfRange { limit });
    }

    let paging = match (window, all_pages) {
        (Some(_), true) => return Err(BuildError::ConflictingPaging),
        (Some((start, end)), false) => {
            if start < 1 || start > end || end > MAX_PAGE_LIMIT {
                return Err(BuildError::PageWindowOutOfRange { start, end });
            }
            Paging::Window { start, end, limit }
        }
        (None, true) => Paging::All { limit },
        (None, false) => Paging::None,
    };

    match (descriptor.paginated, paging) {
        (true, Paging::None) => Err(BuildError::MissingPaging),
        (true, paging) => Ok(paging),
        (false, _) => Ok(Paging::None),
    }
}

fn resolve_token(auth: AuthKind, step: Option<TokenStep>) -> Option<String> {
    let token = match step? {
        TokenStep::Explicit(token) => token,
        TokenStep::Defaults(credentials) => credentials.resolve(auth)?.to_owned(),
    };
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_owned())
}

/// A validated request. Built once, consumed by one call.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    endpoint: Endpoint,
    descriptor: EndpointDescriptor,
    headers: BTreeMap<String, String>,
    path: String,
    path_params: Vec<String>,
    body: Body,
    paging: Paging,
    retry: RetryPolicy,
    cancel: CancelPolicy,
    timeout: Option<Duration>,
    token: Option<String>,
}

impl Request {
    pub fn builder(endpoint: Endpoint) -> RequestBuilder {
        RequestBuilder::new().endpoint(endpoint)
    }

    pub const fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub const fn descriptor(&self) -> &EndpointDescriptor {
        &self.descriptor
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn path_params(&self) -> &[String] {
        &self.path_params
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub const fn paging(&self) -> Paging {
        self.paging
    }

    pub const fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    pub const fn cancel(&self) -> &CancelPolicy {
        &self.cancel
    }

    /// `None` means the client's configured default applies.
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Path of the first page this request targets.
    pub fn path(&self) -> String {
        self.path_for_page(self.paging.first_page())
    }

    /// Path with the `page`/`limit` query for `page`, when paginated.
    pub fn path_for_page(&self, page: Option<u32>) -> String {
        match (page, self.paging.limit()) {
            (Some(page), Some(limit)) if self.descriptor.paginated => {
                format!("{}?page={page}&limit={limit}", self.path)
            }
            _ => self.path.clone(),
        }
    }
}
