use crate::renderer::markdown::{first_heading, split_frontmatter};
use async_trait::async_trait;
use docpress_core::{BuildConfig, Result, RouteTable};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Directory under the output dir that receives the index
pub const STATIC_DIR: &str = "static";

#[async_trait]
pub trait SearchIndexWriter: Send + Sync {
    /// Write the index for `routes` and return the written file
    async fn write(&self, config: &BuildConfig, routes: &RouteTable) -> Result<PathBuf>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry {
    pub route_path: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    pub lang: String,
}

/// Writes `<out>/static/search_index.<hash>.json`, where `hash` is the
/// first eight hex digits of the SHA-256 of the content.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSearchIndex;

impl JsonSearchIndex {
    pub async fn entries(config: &BuildConfig, routes: &RouteTable) -> Vec<SearchEntry> {
        let root = config.root_path();
        let mut entries = Vec::with_capacity(routes.len());

        for route in routes {
            let title = match &route.source {
                Some(source) => page_title(&root.join(source)).await.unwrap_or_default(),
                None => String::new(),
            };
            entries.push(SearchEntry {
                route_path: route.path.clone(),
                title,
                source: route.source.clone(),
                lang: config.lang.clone(),
            });
        }

        entries
    }
}

#[async_trait]
impl SearchIndexWriter for JsonSearchIndex {
    async fn write(&self, config: &BuildConfig, routes: &RouteTable) -> Result<PathBuf> {
        let entries = Self::entries(config, routes).await;
        let content = serde_json::to_string(&entries)?;

        let digest = Sha256::digest(content.as_bytes());
        let hash: String = digest.iter().take(4).map(|b| format!("{:02x}", b)).collect();

        let dir = config.out_path().join(STATIC_DIR);
        fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("search_index.{}.json", hash));
        fs::write(&path, content).await?;

        tracing::info!(entries = entries.len(), path = %path.display(), "Wrote search index");
        Ok(path)
    }
}

/// Front matter title, else the first level-one heading
async fn page_title(file: &Path) -> Option<String> {
    let source = match fs::read_to_string(file).await {
        Ok(source) => source,
        Err(e) => {
            tracing::debug!(
                path = %file.display(),
                error = %e,
                "Skipping title for unreadable page"
            );
            return None;
        }
    };
    let (frontmatter, body) = split_frontmatter(&source).ok()?;
    frontmatter
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| first_heading(body))
}
