//! TradingView MPC plugin
//!
//! Relays `status`, `symbols` and `chart` calls to the TradingView API
//! server configured by `TRADINGVIEW_API_URL`. Bodies come back exactly as
//! the API server sent them. The plugin keeps no state between requests.

pub mod client;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
    routing::{get, post},
    Router,
};
use tracing::{info, warn};

use crate::config::RelayConfig;
use crate::core::plugins::Plugin;
use crate::error::{ConfigError, PluginError, RelayError};
use crate::metrics::Metrics;

pub use client::{TradingViewApi, TradingViewClient, UpstreamResponse};
pub use models::{ChartQuery, SymbolsQuery};

pub const PLUGIN_NAME: &str = "tradingview_mpc";

#[derive(Clone)]
pub struct RelayState {
    pub api: Arc<dyn TradingViewApi>,
}

/// Connection status of the TradingView API server
async fn get_status(State(state): State<RelayState>) -> Result<UpstreamResponse, RelayError> {
    state.api.status().await
}

/// Available symbols for an exchange
async fn get_symbols(
    State(state): State<RelayState>,
    payload: Result<Json<SymbolsQuery>, JsonRejection>,
) -> Result<UpstreamResponse, RelayError> {
    let Json(query) = payload.map_err(|e| RelayError::InvalidRequest(e.body_text()))?;
    query.validate()?;
    state.api.symbols(&query).await
}

/// Chart data for a symbol
async fn get_chart(
    State(state): State<RelayState>,
    payload: Result<Json<ChartQuery>, JsonRejection>,
) -> Result<UpstreamResponse, RelayError> {
    let Json(query) = payload.map_err(|e| RelayError::InvalidRequest(e.body_text()))?;
    query.validate()?;
    state.api.chart(&query.normalized()).await
}

pub fn create_router(api: Arc<dyn TradingViewApi>) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/symbols", post(get_symbols))
        .route("/chart", post(get_chart))
        .with_state(RelayState { api })
}

pub struct TradingViewPlugin {
    api: Arc<dyn TradingViewApi>,
}

impl TradingViewPlugin {
    pub fn new(config: RelayConfig, metrics: Option<Arc<Metrics>>) -> Result<Self, ConfigError> {
        info!(api_url = %config.api_url(), "TradingView MPC plugin configured");
        let mut client = TradingViewClient::new(config)?;
        if let Some(metrics) = metrics {
            client = client.with_metrics(metrics);
        }
        Ok(Self::with_api(Arc::new(client)))
    }

    pub fn with_api(api: Arc<dyn TradingViewApi>) -> Self {
        Self { api }
    }

    pub fn router(&self) -> Router {
        create_router(self.api.clone())
    }
}

#[async_trait]
impl Plugin for TradingViewPlugin {
    fn name(&self) -> &str {
        PLUGIN_NAME
    }

    /// Probes the API server once. An unreachable server is logged but
    /// does not stop the plugin from serving.
    async fn setup(&self) -> Result<Option<Router>, PluginError> {
        match self.api.status().await {
            Ok(response) if response.is_success() => {
                info!("Connected to TradingView API");
            }
            Ok(response) => {
                warn!(
                    status = response.status,
                    "TradingView API status check returned non-success status"
                );
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Could not connect to TradingView API. Requests will fail until it is reachable."
                );
            }
        }

        Ok(Some(self.router()))
    }

    async fn shutdown(&self) -> Result<(), PluginError> {
        info!("TradingView MPC plugin shutdown complete");
        Ok(())
    }
}
