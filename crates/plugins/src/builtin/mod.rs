// Plugins shipped with docpress

use crate::Plugin;
use async_trait::async_trait;
use docpress_core::{BuildConfig, Result, Route};

/// Pre-renders the config's `additional_routes`
#[derive(Debug, Clone, Copy, Default)]
pub struct AdditionalRoutesPlugin;

#[async_trait]
impl Plugin for AdditionalRoutesPlugin {
    fn name(&self) -> &str {
        "docpress:additional-routes"
    }

    async fn add_ssg_routes(&self, config: &BuildConfig) -> Result<Vec<Route>> {
        Ok(config.additional_routes.iter().map(Route::new).collect())
    }
}

/// Appends tags to the configured page head
#[derive(Debug, Clone)]
pub struct InjectHeadPlugin {
    name: String,
    tags: Vec<String>,
}

impl InjectHeadPlugin {
    pub fn new(name: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            name: name.into(),
            tags,
        }
    }
}

#[async_trait]
impl Plugin for InjectHeadPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    async fn modify_config(&self, mut config: BuildConfig) -> Result<BuildConfig> {
        config.head.extend(self.tags.iter().cloned());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_additional_routes() {
        let config = BuildConfig {
            additional_routes: vec!["/changelog/".to_string(), "/404".to_string()],
            ..BuildConfig::default()
        };
        let routes = AdditionalRoutesPlugin.add_ssg_routes(&config).await.unwrap();
        assert_eq!(routes, vec![Route::new("/changelog/"), Route::new("/404")]);
    }

    #[tokio::test]
    async fn test_inject_head_appends() {
        let config = BuildConfig {
            head: vec!["<meta a>".to_string()],
            ..BuildConfig::default()
        };
        let plugin = InjectHeadPlugin::new("reload", vec!["<script>r()</script>".to_string()]);
        let config = plugin.modify_config(config).await.unwrap();
        assert_eq!(config.head, vec!["<meta a>", "<script>r()</script>"]);
        assert_eq!(plugin.name(), "reload");
    }
}
