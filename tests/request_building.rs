//! Behavior-driven tests for request building
//!
//! These tests verify that malformed calls are rejected before any I/O and
//! that valid calls produce complete, immutable requests.

use starlane_core::models::{NavigateShip, RefuelShip};
use starlane_core::{AuthKind, Body, BuildError, Endpoint, Paging, Request, RequestBuilder};
use starlane_tests::credentials;

// =============================================================================
// Path Parameters
// =============================================================================

#[test]
fn when_parameter_count_differs_from_placeholders_build_fails_with_arity_error() {
    // Given: An endpoint with two placeholders
    let descriptor = Endpoint::GetWaypoint.descriptor();
    assert_eq!(descriptor.placeholder_count(), 2);

    // When: One, two or three non-blank parameters are supplied
    let build = |params: &[&str]| {
        Request::builder(Endpoint::GetWaypoint)
            .path_params(params.iter().copied())
            .build()
    };

    // Then: Only the exact count succeeds
    assert_eq!(
        build(&["X1-DF55"]).map(|_| ()),
        Err(BuildError::ArityMismatch {
            expected: 2,
            actual: 1
        })
    );
    assert_eq!(
        build(&["X1-DF55", "X1-DF55-20250Z", "extra"]).map(|_| ()),
        Err(BuildError::ArityMismatch {
            expected: 2,
            actual: 3
        })
    );
    let request = build(&["X1-DF55", "X1-DF55-20250Z"]).expect("exact arity");
    assert_eq!(request.path(), "/systems/X1-DF55/waypoints/X1-DF55-20250Z");
}

#[test]
fn when_blank_parameters_are_supplied_they_are_not_counted() {
    // Given: One real parameter padded with blanks
    let request = Request::builder(Endpoint::GetAgent)
        .path_params(["", "ALPHA", "   "])
        .build();

    // Then: Arity matches the single placeholder
    let request = request.expect("blank entries are filtered");
    assert_eq!(request.path_params(), ["ALPHA"]);
    assert_eq!(request.path(), "/agents/ALPHA");
}

// =============================================================================
// Authorization
// =============================================================================

#[test]
fn when_endpoint_is_public_build_succeeds_without_token_step() {
    let request = Request::builder(Endpoint::GetStatus)
        .build()
        .expect("public endpoint");

    assert!(request.token().is_none());
    assert!(request.headers().is_empty());
}

#[test]
fn when_endpoint_requires_authorization_omitting_token_fails() {
    let error = Request::builder(Endpoint::GetShip)
        .path_params(["SHIP-1"])
        .build()
        .expect_err("agent token required");

    assert_eq!(
        error,
        BuildError::MissingToken {
            auth: AuthKind::Agent
        }
    );
}

#[test]
fn when_public_endpoint_gets_default_credentials_no_token_is_sent() {
    // Given: Default credentials on a public endpoint
    let request = Request::builder(Endpoint::GetFaction)
        .path_params(["COSMIC"])
        .token_from(&credentials())
        .build()
        .expect("public endpoint");

    // Then: Nothing resolves for AuthKind::None
    assert!(request.token().is_none());
    assert!(!request.headers().contains_key("authorization"));
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn when_a_step_precedes_endpoint_choice_build_reports_that_step() {
    let error = RequestBuilder::new()
        .retries(2)
        .timeout_secs(5)
        .endpoint(Endpoint::GetStatus)
        .build()
        .expect_err("retries came before endpoint");

    assert_eq!(error, BuildError::EndpointNotChosen { step: "retries" });
}

// =============================================================================
// Pagination
// =============================================================================

#[test]
fn when_all_pages_follows_a_window_build_fails() {
    let error = Request::builder(Endpoint::ListSystems)
        .pages(1, 3)
        .all_pages()
        .build()
        .expect_err("conflicting strategies");

    assert_eq!(error, BuildError::ConflictingPaging);
}

#[test]
fn when_page_limit_is_out_of_bounds_build_fails() {
    for limit in [0, 21, 100] {
        let error = Request::builder(Endpoint::ListSystems)
            .pages(1, 1)
            .page_limit(limit)
            .build()
            .expect_err("limit out of bounds");
        assert_eq!(error, BuildError::PageLimitOutOfRange { limit });
    }
}

#[test]
fn when_window_start_exceeds_end_build_fails() {
    let error = Request::builder(Endpoint::ListSystems)
        .pages(4, 2)
        .build()
        .expect_err("inverted window");

    assert_eq!(error, BuildError::PageWindowOutOfRange { start: 4, end: 2 });
}

#[test]
fn when_paging_is_selected_on_plain_endpoint_it_is_ignored() {
    let request = Request::builder(Endpoint::GetStatus)
        .pages(1, 2)
        .build()
        .expect("paging ignored on non-paginated endpoint");

    assert_eq!(request.paging(), Paging::None);
    assert_eq!(request.path(), "/");
}

// =============================================================================
// Bodies
// =============================================================================

#[test]
fn when_body_type_differs_from_declared_shape_build_fails() {
    let error = Request::builder(Endpoint::RefuelShip)
        .path_params(["SHIP-1"])
        .data(&NavigateShip {
            waypoint_symbol: String::from("X1-DF55-20250Z"),
        })
        .token("agent-token")
        .build()
        .expect_err("navigate body on refuel endpoint");

    assert!(matches!(error, BuildError::BodyShapeMismatch { .. }));
}

#[test]
fn when_body_is_optional_in_content_it_still_matches_shape() {
    let request = Request::builder(Endpoint::RefuelShip)
        .path_params(["SHIP-1"])
        .data(&RefuelShip {
            units: None,
            from_cargo: None,
        })
        .token("agent-token")
        .build()
        .expect("refuel body");

    assert_eq!(request.body().to_json_string().as_deref(), Some("{}"));
    assert_eq!(
        request.headers().get("content-type").map(String::as_str),
        Some("application/json")
    );
}

#[test]
fn when_body_is_supplied_for_get_endpoint_it_is_kept_on_the_request() {
    // Given: A body attached to a GET endpoint that declares none
    let request = Request::builder(Endpoint::GetShip)
        .path_params(["SHIP-1"])
        .data(&NavigateShip {
            waypoint_symbol: String::from("X1-DF55-20250Z"),
        })
        .token("agent-token")
        .build()
        .expect("unvalidated body is kept");

    // Then: The request still carries it, and no content type is declared
    assert!(matches!(request.body(), Body::Json { .. }));
    assert!(!request.headers().contains_key("content-type"));
}

// =============================================================================
// End-to-end
// =============================================================================

#[test]
fn when_agent_endpoint_has_one_param_and_token_request_is_complete() {
    // Given: An endpoint with one placeholder and agent authorization
    let request = Request::builder(Endpoint::GetShip)
        .path_params(["ALPHA-1"])
        .token_from(&credentials())
        .build()
        .expect("valid request");

    // Then: The path contains the parameter and authorization is installed
    assert!(request.path().contains("ALPHA-1"));
    let authorization = request
        .headers()
        .get("authorization")
        .expect("authorization header");
    assert!(!authorization.trim().is_empty());
    assert_eq!(authorization, "Bearer agent-token");
}
