//! Host HTTP server using Axum

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{error, info, Level};

use crate::config::{RelayConfig, ServerConfig};
use crate::core::plugins::{PluginInfo, PluginManager};
use crate::metrics::Metrics;
use crate::plugins::builtin_plugins;

pub const SERVICE_NAME: &str = "starferry";

#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
    pub plugins: Arc<Vec<PluginInfo>>,
}

impl AppState {
    pub fn new(metrics: Arc<Metrics>, plugins: Vec<PluginInfo>) -> Self {
        Self {
            metrics,
            start_time: Arc::new(Instant::now()),
            plugins: Arc::new(plugins),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Json(json!({
        "status": "healthy",
        "uptime_seconds": uptime_seconds,
        "service": SERVICE_NAME,
        "plugins": state.plugins.as_slice(),
    }))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state.metrics.export().map_err(|e| {
        error!(error = %e, "Failed to export metrics");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();
    let response = next.run(request).await;
    state.metrics.http_requests_in_flight.dec();

    let status = response.status();
    let duration = start.elapsed();
    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis() as u64,
            "HTTP request error"
        );
    }

    response
}

/// Host routes plus every plugin router nested under its prefix.
pub fn create_router(state: AppState, plugin_routes: Vec<(String, Router)>) -> Router {
    let mut router: Router = Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(state.clone());

    for (prefix, plugin_router) in plugin_routes {
        router = router.nest(&prefix, plugin_router);
    }

    router.layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                    .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                    .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
            )
            .layer(axum::middleware::from_fn_with_state(
                state,
                metrics_middleware,
            ))
            .layer(CorsLayer::permissive()),
    )
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

pub async fn start_server(
    server_config: ServerConfig,
    relay_config: RelayConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Arc::new(Metrics::new()?);

    let mut manager = PluginManager::new();
    manager
        .load_all(builtin_plugins(relay_config, Some(metrics.clone()))?)
        .await;
    info!(plugins = ?manager.plugin_names(), "Plugins loaded");

    let state = AppState::new(metrics, manager.plugin_infos());
    let app = create_router(state, manager.routes());

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, "HTTP server listening on {}", address);
    info!("Metrics endpoint available at http://{}/metrics", address);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    manager.shutdown_all().await;
    served?;

    Ok(())
}
