// Build lifecycle plugins and the driver that calls them

pub mod builtin;

use async_trait::async_trait;
use docpress_core::{BuildConfig, Result, Route};
use std::sync::Arc;

pub use builtin::{AdditionalRoutesPlugin, InjectHeadPlugin};

/// Hooks called at fixed points of a build. Every hook defaults to a no-op.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    async fn init(&self) -> Result<()> {
        Ok(())
    }

    async fn modify_config(&self, config: BuildConfig) -> Result<BuildConfig> {
        Ok(config)
    }

    async fn before_build(&self, _config: &BuildConfig) -> Result<()> {
        Ok(())
    }

    async fn after_build(&self, _config: &BuildConfig) -> Result<()> {
        Ok(())
    }

    /// Extra routes to pre-render, without the base prefix
    async fn add_ssg_routes(&self, _config: &BuildConfig) -> Result<Vec<Route>> {
        Ok(Vec::new())
    }
}

/// Calls plugin hooks in registration order
#[derive(Clone, Default)]
pub struct PluginDriver {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: impl Plugin + 'static) -> &mut Self {
        self.plugins.push(Arc::new(plugin));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name()).collect()
    }

    pub async fn init(&self) -> Result<()> {
        for plugin in &self.plugins {
            tracing::debug!(plugin = plugin.name(), "init");
            plugin.init().await?;
        }
        Ok(())
    }

    /// Thread the configuration through every plugin
    pub async fn modify_config(&self, mut config: BuildConfig) -> Result<BuildConfig> {
        for plugin in &self.plugins {
            tracing::debug!(plugin = plugin.name(), "modify_config");
            config = plugin.modify_config(config).await?;
        }
        Ok(config)
    }

    pub async fn before_build(&self, config: &BuildConfig) -> Result<()> {
        for plugin in &self.plugins {
            tracing::debug!(plugin = plugin.name(), "before_build");
            plugin.before_build(config).await?;
        }
        Ok(())
    }

    pub async fn after_build(&self, config: &BuildConfig) -> Result<()> {
        for plugin in &self.plugins {
            tracing::debug!(plugin = plugin.name(), "after_build");
            plugin.after_build(config).await?;
        }
        Ok(())
    }

    pub async fn add_ssg_routes(&self, config: &BuildConfig) -> Result<Vec<Route>> {
        let mut routes = Vec::new();
        for plugin in &self.plugins {
            let added = plugin.add_ssg_routes(config).await?;
            tracing::debug!(plugin = plugin.name(), count = added.len(), "add_ssg_routes");
            routes.extend(added);
        }
        Ok(routes)
    }
}
