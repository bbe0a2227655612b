//! Error types for configuration, plugin lifecycle and request relaying

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },

    #[error("Invalid value for {name}: '{value}' is not a valid number")]
    InvalidNumber { name: String, value: String },

    #[error("{0} must be greater than zero")]
    ZeroDuration(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Invalid plugin name '{0}': use lowercase letters, digits and underscores")]
    InvalidName(String),

    #[error("Plugin already loaded: {0}")]
    AlreadyLoaded(String),

    #[error("Plugin setup failed: {0}")]
    Setup(String),

    #[error("Plugin shutdown failed: {0}")]
    Shutdown(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failures raised while forwarding a request to the TradingView API server.
///
/// A non-success status from the API server is not an error here: it is
/// passed back to the caller as-is.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("TradingView API unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("TradingView API returned a malformed response: {0}")]
    MalformedUpstream(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RelayError::MalformedUpstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RelayError::Unavailable(format!("request timed out: {}", e))
        } else if e.is_connect() {
            RelayError::Unavailable(format!("connection failed: {}", e))
        } else {
            RelayError::Unavailable(e.to_string())
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
