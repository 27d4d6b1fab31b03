//! Classification of failing responses.
//!
//! The game server reuses HTTP statuses for rule rejections and for
//! infrastructure failures. The two carry different bodies:
//!
//! | Body                                                     | Classified as    |
//! |----------------------------------------------------------|------------------|
//! | `{"error": {"code", "message", "data", "requestId"}}`    | `DomainError`    |
//! | `{"status_code", "message", "error"}`                    | `TransportError` |
//! | anything else, including non-JSON                        | `TransportError` |

use serde_json::{Map, Value};

use crate::error::{ApiError, DomainError, TransportError};

const REQUEST_ID: &str = "requestId";

/// Classifies a non-2xx response from its status and body.
pub fn classify(status: u16, body: &str) -> ApiError {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let Some(Value::Object(object)) = parsed else {
        return transport_fallback(status, body);
    };

    if let Some(domain) = domain_object(&object) {
        return ApiError::Domain(decode_domain(status, domain));
    }

    ApiError::Transport(decode_transport(status, &object))
}

/// The object carrying `requestId`, nested under `error` or at the top level.
fn domain_object(object: &Map<String, Value>) -> Option<&Map<String, Value>> {
    match object.get("error") {
        Some(Value::Object(nested)) if nested.contains_key(REQUEST_ID) => Some(nested),
        _ if object.contains_key(REQUEST_ID) => Some(object),
        _ => None,
    }
}

fn decode_domain(status: u16, object: &Map<String, Value>) -> DomainError {
    DomainError {
        code: object
            .get("code")
            .and_then(Value::as_i64)
            .unwrap_or_else(|| i64::from(status)),
        message: string_field(object, "message").unwrap_or_else(|| reason(status)),
        data: object.get("data").cloned().unwrap_or(Value::Null),
        request_id: match object.get(REQUEST_ID) {
            Some(Value::String(id)) => id.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        },
    }
}

fn decode_transport(status: u16, object: &Map<String, Value>) -> TransportError {
    let nested_message = match object.get("error") {
        Some(Value::Object(nested)) => string_field(nested, "message"),
        _ => None,
    };

    TransportError {
        status: Some(
            ["status_code", "statusCode"]
                .iter()
                .find_map(|key| object.get(*key)?.as_u64())
                .and_then(|code| u16::try_from(code).ok())
                .unwrap_or(status),
        ),
        message: string_field(object, "message")
            .or(nested_message)
            .unwrap_or_else(|| reason(status)),
        error: string_field(object, "error").unwrap_or_else(|| reason(status)),
    }
}

fn transport_fallback(status: u16, body: &str) -> ApiError {
    let body = body.trim();
    ApiError::Transport(TransportError {
        status: Some(status),
        message: if body.is_empty() {
            reason(status)
        } else {
            body.to_owned()
        },
        error: reason(status),
    })
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .map(str::to_owned)
}

fn reason(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|code| code.canonical_reason())
        .unwrap_or("Unknown Error")
        .to_owned()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn nested_request_id_selects_domain_error() {
        let error = classify(
            400,
            r#"{"error":{"code":4000,"message":"x","data":{},"requestId":"abc"}}"#,
        );

        assert_eq!(
            error,
            ApiError::Domain(DomainError {
                code: 4000,
                message: String::from("x"),
                data: json!({}),
                request_id: String::from("abc"),
            })
        );
    }

    #[test]
    fn missing_request_id_selects_transport_error() {
        let error = classify(401, r#"{"status_code":401,"message":"y","error":"Unauthorized"}"#);

        assert_eq!(
            error,
            ApiError::Transport(TransportError {
                status: Some(401),
                message: String::from("y"),
                error: String::from("Unauthorized"),
            })
        );
    }

    #[test]
    fn top_level_request_id_also_selects_domain_error() {
        let error = classify(
            409,
            r#"{"code":4214,"message":"ship in transit","data":{"secondsToArrival":12},"requestId":"r-9"}"#,
        );

        assert_eq!(error.domain_code(), Some(4214));
    }

    #[test]
    fn rate_limit_domain_error_is_detected() {
        let error = classify(
            429,
            r#"{"error":{"code":429,"message":"slow down","data":{"retryAfter":1.2},"requestId":"r-1"}}"#,
        );
        assert!(error.is_rate_limited());
    }

    #[test]
    fn nested_error_without_request_id_is_transport() {
        let error = classify(502, r#"{"error":{"message":"upstream unavailable"}}"#);

        assert_eq!(
            error,
            ApiError::Transport(TransportError {
                status: Some(502),
                message: String::from("upstream unavailable"),
                error: String::from("Bad Gateway"),
            })
        );
    }

    #[test]
    fn non_json_body_falls_back_to_http_status() {
        let error = classify(503, "<html>maintenance</html>");
        assert_eq!(error.status(), Some(503));

        let empty = classify(500, "");
        assert_eq!(
            empty,
            ApiError::Transport(TransportError {
                status: Some(500),
                message: String::from("Internal Server Error"),
                error: String::from("Internal Server Error"),
            })
        );
    }
}
