//! Plugin hosting: setup, mounting under `/plugins/{name}`, shutdown

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info};

use crate::error::PluginError;

/// A unit of functionality the host mounts under `/plugins/{name}`.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Path segment the plugin is mounted under
    fn name(&self) -> &str;

    /// Prepare the plugin and hand back its routes, if it serves any.
    async fn setup(&self) -> Result<Option<Router>, PluginError>;

    async fn shutdown(&self) -> Result<(), PluginError> {
        Ok(())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub prefix: Option<String>,
    pub loaded_at: DateTime<Utc>,
}

struct LoadedPlugin {
    plugin: Arc<dyn Plugin>,
    info: PluginInfo,
    router: Option<Router>,
}

#[derive(Default)]
pub struct PluginManager {
    loaded: Vec<LoadedPlugin>,
}

pub fn plugin_prefix(name: &str) -> String {
    format!("/plugins/{}", name)
}

pub fn validate_plugin_name(name: &str) -> Result<(), PluginError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PluginError::InvalidName(name.to_string()))
    }
}

impl PluginManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set up `plugin` and keep its router for mounting.
    pub async fn load(&mut self, plugin: Arc<dyn Plugin>) -> Result<(), PluginError> {
        let name = plugin.name().to_string();
        validate_plugin_name(&name)?;
        if self.loaded.iter().any(|p| p.info.name == name) {
            return Err(PluginError::AlreadyLoaded(name));
        }

        let router = plugin.setup().await?;
        let prefix = router.as_ref().map(|_| plugin_prefix(&name));

        info!(plugin = %name, prefix = ?prefix, "Loaded plugin: {}", name);
        self.loaded.push(LoadedPlugin {
            plugin,
            info: PluginInfo {
                name,
                prefix,
                loaded_at: Utc::now(),
            },
            router,
        });
        Ok(())
    }

    /// Load every plugin, logging and skipping those that fail.
    pub async fn load_all(&mut self, plugins: Vec<Arc<dyn Plugin>>) {
        for plugin in plugins {
            let name = plugin.name().to_string();
            if let Err(e) = self.load(plugin).await {
                error!(plugin = %name, error = %e, "Failed to load plugin {}", name);
            }
        }
    }

    pub fn plugin_names(&self) -> Vec<String> {
        self.loaded.iter().map(|p| p.info.name.clone()).collect()
    }

    pub fn plugin_infos(&self) -> Vec<PluginInfo> {
        self.loaded.iter().map(|p| p.info.clone()).collect()
    }

    /// `(prefix, router)` for every plugin that serves routes
    pub fn routes(&self) -> Vec<(String, Router)> {
        self.loaded
            .iter()
            .filter_map(|p| {
                let prefix = p.info.prefix.clone()?;
                let router = p.router.clone()?;
                Some((prefix, router))
            })
            .collect()
    }

    /// Shut down every loaded plugin. Individual failures are logged.
    pub async fn shutdown_all(&self) {
        for loaded in &self.loaded {
            match loaded.plugin.shutdown().await {
                Ok(()) => info!(plugin = %loaded.info.name, "Shutdown plugin: {}", loaded.info.name),
                Err(e) => error!(
                    plugin = %loaded.info.name,
                    error = %e,
                    "Error shutting down plugin {}",
                    loaded.info.name
                ),
            }
        }
    }
}
