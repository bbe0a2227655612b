//! Unit tests for relay error responses

use axum::http::StatusCode;
use axum::response::IntoResponse;
use starferry_tradingview::error::RelayError;

#[test]
fn relay_errors_map_to_http_status() {
    assert_eq!(
        RelayError::Unavailable("connection refused".into()).status_code(),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(
        RelayError::InvalidRequest("missing field".into()).status_code(),
        StatusCode::UNPROCESSABLE_ENTITY
    );
    assert_eq!(
        RelayError::MalformedUpstream("expected value".into()).status_code(),
        StatusCode::BAD_GATEWAY
    );
}

#[test]
fn relay_error_response_carries_status() {
    let response = RelayError::Unavailable("timed out".into()).into_response();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        response.headers()["content-type"],
        "application/json"
    );
}

#[test]
fn relay_error_messages_name_the_failure() {
    let err = RelayError::Unavailable("connection refused".into());
    assert_eq!(
        err.to_string(),
        "TradingView API unavailable: connection refused"
    );
}
