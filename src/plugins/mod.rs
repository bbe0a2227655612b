//! Plugins bundled with the host

pub mod tradingview_mpc;

use std::sync::Arc;

use crate::config::RelayConfig;
use crate::core::plugins::Plugin;
use crate::error::PluginError;
use crate::metrics::Metrics;

/// Every plugin compiled into the host, ready for `PluginManager::load_all`.
pub fn builtin_plugins(
    relay_config: RelayConfig,
    metrics: Option<Arc<Metrics>>,
) -> Result<Vec<Arc<dyn Plugin>>, PluginError> {
    let tradingview: Arc<dyn Plugin> = Arc::new(tradingview_mpc::TradingViewPlugin::new(
        relay_config,
        metrics,
    )?);
    Ok(vec![tradingview])
}
