use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::http_client::HttpResponse;
use crate::rate_limit::{is_rate_limit_header, RateLimitState};
use crate::shape::{ApiPayload, PayloadShape};

/// Pagination summary carried under a top-level `meta` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl PageMeta {
    pub fn page_count(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.page_count()
    }
}

/// Successful response, split into protocol metadata and payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    endpoint: Endpoint,
    status: u16,
    http_headers: BTreeMap<String, String>,
    domain_headers: BTreeMap<String, String>,
    payload: Option<Value>,
    meta: Option<PageMeta>,
}

impl Response {
    /// Builds the envelope from a 2xx response.
    ///
    /// A 204 or an empty body yields no payload. Otherwise the payload is the
    /// value under `data` when present, or the whole body.
    pub fn from_http(endpoint: Endpoint, response: HttpResponse) -> Result<Self, ApiError> {
        let (http_headers, domain_headers) = response
            .headers
            .into_iter()
            .partition(|(name, _)| is_rate_limit_header(name));

        let mut envelope = Self {
            endpoint,
            status: response.status,
            http_headers,
            domain_headers,
            payload: None,
            meta: None,
        };

        if response.status == 204 || response.body.trim().is_empty() {
            return Ok(envelope);
        }

        let Some(expected) = endpoint.descriptor().response else {
            debug!(%endpoint, "ignoring body of endpoint without a declared payload");
            return Ok(envelope);
        };

        let body: Value = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::decode(expected, e.to_string()))?;

        let (payload, meta) = match body {
            Value::Object(mut object) if object.contains_key("data") => {
                let meta = object.remove("meta");
                (object.remove("data").unwrap_or(Value::Null), meta)
            }
            Value::Object(mut object) => {
                let meta = object.remove("meta");
                (Value::Object(object), meta)
            }
            other => (other, None),
        };

        envelope.meta = meta.and_then(|meta| match serde_json::from_value(meta) {
            Ok(meta) => Some(meta),
            Err(error) => {
                debug!(%endpoint, %error, "ignoring malformed page meta");
                None
            }
        });
        envelope.payload = Some(payload);
        Ok(envelope)
    }

    pub const fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub const fn status(&self) -> u16 {
        self.status
    }

    /// The rate-limit headers.
    pub fn http_headers(&self) -> &BTreeMap<String, String> {
        &self.http_headers
    }

    /// Every header that is not a rate-limit header.
    pub fn domain_headers(&self) -> &BTreeMap<String, String> {
        &self.domain_headers
    }

    pub const fn meta(&self) -> Option<&PageMeta> {
        self.meta.as_ref()
    }

    /// Undecoded payload.
    pub fn raw(&self) -> Option<&Value> {
        self.payload.as_ref()
    }

    pub fn into_raw(self) -> Option<Value> {
        self.payload
    }

    pub fn rate_limit(&self) -> Option<RateLimitState> {
        RateLimitState::from_headers(&self.http_headers)
    }

    /// Decodes the payload as `T`.
    ///
    /// Fails when `T` is not the payload declared for the endpoint or when
    /// the JSON does not match `T`. An empty response decodes to `None`.
    pub fn decode<T: ApiPayload>(&self) -> Result<Option<T>, ApiError> {
        check_shape(self.endpoint, T::SHAPE)?;
        self.payload
            .as_ref()
            .map(|payload| decode_value(payload, T::SHAPE))
            .transpose()
    }
}

/// Items accumulated across the pages of a paginated endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResponse {
    pub endpoint: Endpoint,
    pub items: Vec<Value>,
    /// Meta of the last page fetched.
    pub meta: Option<PageMeta>,
    pub pages_fetched: u32,
}

impl PagedResponse {
    pub fn decode<T: ApiPayload>(&self) -> Result<Vec<T>, ApiError> {
        check_shape(self.endpoint, PayloadShape::list(T::SHAPE.shape))?;
        if T::SHAPE.list {
            return Err(ApiError::decode(T::SHAPE.item(), "items are single objects"));
        }
        self.items
            .iter()
            .map(|item| decode_value(item, T::SHAPE))
            .collect()
    }
}

fn check_shape(endpoint: Endpoint, requested: PayloadShape) -> Result<(), ApiError> {
    match endpoint.descriptor().response {
        Some(declared) if declared == requested => Ok(()),
        Some(declared) => Err(ApiError::decode(
            declared,
            format!("{endpoint} does not return {requested}"),
        )),
        None => Err(ApiError::decode(
            requested,
            format!("{endpoint} declares no payload"),
        )),
    }
}

fn decode_value<T: ApiPayload>(value: &Value, expected: PayloadShape) -> Result<T, ApiError> {
    T::deserialize(value).map_err(|e| ApiError::decode(expected, e.to_string()))
}
