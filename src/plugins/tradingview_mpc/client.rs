//! HTTP client for the TradingView API server

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use axum::{
    body::Bytes,
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::de::IgnoredAny;
use tracing::{debug, warn};

use super::models::{ChartQuery, SymbolsQuery};
use crate::config::RelayConfig;
use crate::error::{ConfigError, RelayError};
use crate::metrics::{outcome, Metrics};

/// Raw reply from the API server, returned to the caller untouched.
#[derive(Clone, Debug)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = self
            .content_type
            .as_deref()
            .and_then(|ct| HeaderValue::from_str(ct).ok())
            .unwrap_or_else(|| HeaderValue::from_static("application/json"));

        (status, [(CONTENT_TYPE, content_type)], self.body).into_response()
    }
}

/// Operations the relay forwards to the API server.
#[async_trait]
pub trait TradingViewApi: Send + Sync {
    async fn status(&self) -> Result<UpstreamResponse, RelayError>;

    async fn symbols(&self, query: &SymbolsQuery) -> Result<UpstreamResponse, RelayError>;

    async fn chart(&self, query: &ChartQuery) -> Result<UpstreamResponse, RelayError>;
}

pub struct TradingViewClient {
    config: RelayConfig,
    http: reqwest::Client,
    metrics: Option<Arc<Metrics>>,
}

impl TradingViewClient {
    pub fn new(config: RelayConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self::with_client(config, http))
    }

    pub fn with_client(config: RelayConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    async fn forward(
        &self,
        endpoint: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<UpstreamResponse, RelayError> {
        let start = Instant::now();
        let result = self.execute(request).await;
        let elapsed = start.elapsed();

        let label = match &result {
            Ok(response) if response.is_success() => outcome::SUCCESS,
            Ok(_) => outcome::UPSTREAM_ERROR,
            Err(RelayError::MalformedUpstream(_)) => outcome::MALFORMED,
            Err(_) => outcome::UNAVAILABLE,
        };
        if let Some(metrics) = &self.metrics {
            metrics.observe_upstream(endpoint, label, elapsed);
        }

        match &result {
            Ok(response) if response.is_success() => debug!(
                endpoint = endpoint,
                status = response.status,
                duration_ms = elapsed.as_millis() as u64,
                "TradingView API request completed"
            ),
            Ok(response) => warn!(
                endpoint = endpoint,
                status = response.status,
                duration_ms = elapsed.as_millis() as u64,
                "TradingView API returned non-success status"
            ),
            Err(e) => warn!(
                endpoint = endpoint,
                error = %e,
                duration_ms = elapsed.as_millis() as u64,
                "TradingView API request failed"
            ),
        }

        result
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<UpstreamResponse, RelayError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        let upstream = UpstreamResponse {
            status,
            content_type,
            body,
        };

        if upstream.is_success() && status != 204 {
            serde_json::from_slice::<IgnoredAny>(&upstream.body)
                .map_err(|e| RelayError::MalformedUpstream(e.to_string()))?;
        }

        Ok(upstream)
    }
}

#[async_trait]
impl TradingViewApi for TradingViewClient {
    async fn status(&self) -> Result<UpstreamResponse, RelayError> {
        let request = self.http.get(self.config.endpoint_url("status"));
        self.forward("status", request).await
    }

    async fn symbols(&self, query: &SymbolsQuery) -> Result<UpstreamResponse, RelayError> {
        let request = self.http.post(self.config.endpoint_url("symbols")).json(query);
        self.forward("symbols", request).await
    }

    async fn chart(&self, query: &ChartQuery) -> Result<UpstreamResponse, RelayError> {
        let request = self.http.post(self.config.endpoint_url("chart")).json(query);
        self.forward("chart", request).await
    }
}
