//! Starferry host
//!
//! Loads the bundled plugins and serves them under `/plugins/{name}`,
//! alongside `/health` and `/metrics`.

use dotenvy::dotenv;
use starferry_tradingview::config::{self, RelayConfig, ServerConfig};
use starferry_tradingview::core::http::start_server;
use starferry_tradingview::logging;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let server_config = ServerConfig::from_env()?;
    let relay_config = RelayConfig::from_env()?;

    info!("Starting Starferry");
    info!(environment = %config::get_environment(), "Environment");
    info!(
        tradingview_api_url = %relay_config.api_url(),
        timeout_seconds = relay_config.timeout.as_secs(),
        "TradingView API server"
    );

    if let Err(e) = start_server(server_config, relay_config).await {
        error!(error = %e, "HTTP server error");
        return Err(e);
    }

    info!("Starferry stopped");
    Ok(())
}
