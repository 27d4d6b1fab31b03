use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{debug, warn};

use crate::classify::classify;
use crate::config::ClientConfig;
use crate::envelope::{PagedResponse, Response};
use crate::error::{ApiError, ConfigError, TransportError};
use crate::http_client::{
    HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, ReqwestHttpClient,
};
use crate::rate_limit::RateLimitTracker;
use crate::request::{Paging, Request};
use crate::throttling::Pacer;
use crate::UtcDateTime;

/// Executes validated requests against the game API.
///
/// One client owns one [`RateLimitTracker`]; clones share it.
#[derive(Clone)]
pub struct Client {
    config: ClientConfig,
    http: Arc<dyn HttpClient>,
    rate_limit: Arc<RateLimitTracker>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let http = ReqwestHttpClient::new(&config)?;
        Ok(Self::with_http_client(config, Arc::new(http)))
    }

    pub fn with_http_client(config: ClientConfig, http: Arc<dyn HttpClient>) -> Self {
        Self {
            config,
            http,
            rate_limit: Arc::new(RateLimitTracker::new()),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn rate_limit(&self) -> &RateLimitTracker {
        &self.rate_limit
    }

    /// A pacer sized from the last reported quota, if any was reported.
    pub fn pacer(&self) -> Option<Pacer> {
        self.rate_limit
            .snapshot()
            .map(|state| Pacer::from_state(&state))
    }

    /// Performs exactly one HTTP attempt.
    ///
    /// Failed calls come back as `Err`; the rate limit tracker is updated
    /// from every response that arrives, successful or not.
    pub async fn call(&self, request: &Request) -> Result<Response, ApiError> {
        self.attempt(request, request.path()).await
    }

    /// Calls `request` until it succeeds, its cancel predicates match, or its
    /// retry attempts run out.
    ///
    /// Rate-limited attempts wait at least until the reported reset.
    pub async fn call_with_retry(&self, request: &Request) -> Result<Response, ApiError> {
        self.retrying(request, request.path()).await
    }

    /// Walks the pages selected by the request's paging strategy.
    ///
    /// Every page goes through the retry policy. When a pacer is supplied,
    /// each page waits for quota first. Non-paginated requests are fetched
    /// once and their payload is returned as the items.
    pub async fn fetch_pages(
        &self,
        request: &Request,
        pacer: Option<&Pacer>,
    ) -> Result<PagedResponse, ApiError> {
        let (first, last) = match request.paging() {
            Paging::Window { start, end, .. } => (start, Some(end)),
            Paging::All { .. } => (1, None),
            Paging::None => return self.fetch_single(request, pacer).await,
        };
        let limit = request.paging().limit().unwrap_or(1) as usize;

        let mut paged = PagedResponse {
            endpoint: request.endpoint(),
            items: Vec::new(),
            meta: None,
            pages_fetched: 0,
        };

        let mut page = first;
        loop {
            if let Some(pacer) = pacer {
                pacer.ready().await;
            }

            let response = self
                .retrying(request, request.path_for_page(Some(page)))
                .await?;
            let meta = response.meta().copied();
            let items = payload_items(response);
            let received = items.len();

            paged.items.extend(items);
            paged.meta = meta;
            paged.pages_fetched += 1;

            let more = match paged.meta {
                Some(meta) => meta.has_next(),
                None => received == limit,
            };
            if !more || received == 0 || last.is_some_and(|end| page >= end) {
                break;
            }
            page += 1;
        }

        debug!(
            endpoint = %request.endpoint(),
            pages = paged.pages_fetched,
            items = paged.items.len(),
            "pagination finished"
        );
        Ok(paged)
    }

    async fn fetch_single(
        &self,
        request: &Request,
        pacer: Option<&Pacer>,
    ) -> Result<PagedResponse, ApiError> {
        if let Some(pacer) = pacer {
            pacer.ready().await;
        }

        let response = self.retrying(request, request.path()).await?;
        let meta = response.meta().copied();
        let items = payload_items(response);

        Ok(PagedResponse {
            endpoint: request.endpoint(),
            items,
            meta,
            pages_fetched: 1,
        })
    }

    async fn retrying(&self, request: &Request, path: String) -> Result<Response, ApiError> {
        let policy = request.retry();
        let max_attempts = policy.max_attempts();
        let mut attempt = 0;

        loop {
            let error = match self.attempt(request, path.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            attempt += 1;
            if attempt >= max_attempts {
                return Err(error);
            }
            if request.cancel().should_cancel(&error) {
                warn!(endpoint = %request.endpoint(), attempt, %error, "retry cancelled");
                return Err(error);
            }

            let mut delay = policy.delay_for_attempt(attempt - 1);
            if error.is_rate_limited() {
                let reset = self
                    .rate_limit
                    .wait_time(UtcDateTime::now())
                    .unwrap_or(Duration::ZERO);
                delay = delay.max(reset);
            }

            warn!(
                endpoint = %request.endpoint(),
                attempt,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                %error,
                "request failed; retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn attempt(&self, request: &Request, path: String) -> Result<Response, ApiError> {
        let method = request.descriptor().method;
        let body = match method {
            HttpMethod::Get => None,
            HttpMethod::Post | HttpMethod::Patch => request.body().to_json_string(),
        };
        let timeout = request.timeout().unwrap_or(self.config.default_timeout);
        let http_request = HttpRequest {
            method,
            url: format!("{}{}", self.config.base_url, path),
            headers: request.headers().clone(),
            body,
            timeout,
        };

        debug!(endpoint = %request.endpoint(), %method, %path, "sending request");
        let started = Instant::now();

        let response = match tokio::time::timeout(timeout, self.http.execute(http_request)).await {
            Err(_) => {
                return Err(TransportError::timeout(format!(
                    "no response within {}s",
                    timeout.as_secs_f64()
                ))
                .into())
            }
            Ok(Err(error)) => return Err(transport_failure(error).into()),
            Ok(Ok(response)) => response,
        };

        self.rate_limit.update(&response.headers);
        debug!(
            endpoint = %request.endpoint(),
            status = response.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "received response"
        );

        if response.is_success() {
            Response::from_http(request.endpoint(), response)
        } else {
            Err(classify(response.status, &response.body))
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .field("rate_limit", &self.rate_limit)
            .finish_non_exhaustive()
    }
}

fn payload_items(response: Response) -> Vec<Value> {
    match response.into_raw() {
        Some(Value::Array(items)) => items,
        Some(item) => vec![item],
        None => Vec::new(),
    }
}

fn transport_failure(error: HttpError) -> TransportError {
    match error.kind() {
        HttpErrorKind::Timeout => TransportError::timeout(error.message()),
        HttpErrorKind::Connect => TransportError::connection(error.message()),
        HttpErrorKind::Other => TransportError {
            status: None,
            message: error.message().to_owned(),
            error: String::from("RequestFailed"),
        },
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::endpoint::Endpoint;
    use crate::http_client::{HttpResponse, ScriptedHttpClient};
    use crate::models::Agent;

    fn client(http: Arc<ScriptedHttpClient>) -> Client {
        let config = ClientConfig::default().with_base_url("https://game.test/v2");
        Client::with_http_client(config, http)
    }

    #[tokio::test]
    async fn builds_url_from_base_and_path() {
        let http = Arc::new(ScriptedHttpClient::replying(HttpResponse::new(
            200,
            json!({"data": {"symbol": "ALPHA", "headquarters": "X1", "credits": 1, "startingFaction": "COSMIC"}})
                .to_string(),
        )));
        let request = Request::builder(Endpoint::GetMyAgent)
            .token("t")
            .build()
            .expect("valid");

        let agent = client(Arc::clone(&http))
            .call(&request)
            .await
            .expect("success")
            .decode::<Agent>()
            .expect("decodes");

        assert_eq!(agent.map(|agent| agent.symbol), Some(String::from("ALPHA")));
        let sent = http.requests();
        assert_eq!(sent[0].url, "https://game.test/v2/my/agent");
        assert_eq!(sent[0].method, HttpMethod::Get);
    }

    #[tokio::test]
    async fn transport_failures_map_to_transport_errors() {
        let http = Arc::new(ScriptedHttpClient::new(vec![Err(HttpError::connect(
            "connection refused",
        ))]));
        let request = Request::builder(Endpoint::GetStatus).build().expect("valid");

        let error = client(http).call(&request).await.expect_err("refused");
        assert_eq!(
            error,
            ApiError::Transport(TransportError::connection("connection refused"))
        );
    }

    #[tokio::test]
    async fn lapsed_timeout_is_a_transport_error() {
        let http = Arc::new(
            ScriptedHttpClient::replying(HttpResponse::new(200, "{}"))
                .with_delay(Duration::from_millis(200)),
        );
        let request = Request::builder(Endpoint::GetStatus)
            .timeout(Duration::from_millis(20))
            .build()
            .expect("valid");

        let error = client(http).call(&request).await.expect_err("times out");
        assert!(matches!(
            error,
            ApiError::Transport(TransportError { status: None, ref error, .. }) if error == "Timeout"
        ));
    }

    #[tokio::test]
    async fn configured_default_timeout_applies_when_request_sets_none() {
        let http = Arc::new(
            ScriptedHttpClient::replying(HttpResponse::new(200, "{}"))
                .with_delay(Duration::from_millis(200)),
        );
        let config = ClientConfig::default()
            .with_base_url("https://game.test/v2")
            .with_default_timeout(Duration::from_millis(20));
        let request = Request::builder(Endpoint::GetStatus).build().expect("valid");

        let error = Client::with_http_client(config, Arc::clone(&http) as Arc<dyn HttpClient>)
            .call(&request)
            .await
            .expect_err("times out");
        assert!(matches!(
            error,
            ApiError::Transport(TransportError { status: None, ref error, .. }) if error == "Timeout"
        ));
        assert_eq!(http.requests()[0].timeout, Duration::from_millis(20));
    }

    #[tokio::test]
    async fn pacer_appears_after_first_reported_quota() {
        let http = Arc::new(ScriptedHttpClient::replying(
            HttpResponse::new(204, "")
                .with_header("x-ratelimit-type", "Account")
                .with_header("x-ratelimit-reset", "2030-01-01T00:00:00Z")
                .with_header("x-ratelimit-limit-burst", "30")
                .with_header("x-ratelimit-limit-per-second", "2")
                .with_header("x-ratelimit-remaining", "29"),
        ));
        let client = client(http);
        assert!(client.pacer().is_none());

        let request = Request::builder(Endpoint::GetStatus).build().expect("valid");
        client.call(&request).await.expect("204");

        assert!(client.pacer().is_some());
    }
}
