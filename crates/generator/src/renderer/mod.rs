//! Server-render entry points.
//!
//! The client/server bundlers leave a descriptor under `<out>/ssr/`;
//! [`load_renderer`] turns it into an [`SsrRenderer`]. An absent artifact
//! is `Ok(None)`, an unusable one is an error. Callers treat both as "render
//! on the client instead".

pub mod command;
pub mod markdown;

use async_trait::async_trait;
use docpress_core::layout::{self, SSR_ENTRY, SSR_MANIFEST, SsrManifest};
use docpress_core::{BuildConfig, Error, HeadTags, RenderResult, Result, RouteTable};
use docpress_router::TransitionOptions;
use std::sync::Arc;
use tokio::fs;

pub use command::CommandRenderer;
pub use markdown::MarkdownRenderer;

#[async_trait]
pub trait SsrRenderer: Send + Sync {
    /// Render one URL, recording head metadata into `head`
    async fn render(&self, url: &str, head: &mut HeadTags) -> Result<RenderResult>;
}

/// Resolve the server renderer left by the bundling step
pub async fn load_renderer(config: &BuildConfig) -> Result<Option<Arc<dyn SsrRenderer>>> {
    let ssr_dir = layout::ssr_dir(&config.out_path());
    let manifest_path = ssr_dir.join(SSR_MANIFEST);
    let entry_path = ssr_dir.join(SSR_ENTRY);

    if manifest_path.exists() {
        let content = fs::read_to_string(&manifest_path).await?;
        let manifest: SsrManifest = serde_json::from_str(&content)?;
        return match manifest {
            SsrManifest::Markdown { root, base, routes } => {
                let table = RouteTable::new(&base, routes)?;
                let renderer: Arc<dyn SsrRenderer> = Arc::new(MarkdownRenderer::new(
                    root,
                    &table,
                    config,
                    transition_options(config),
                ));
                tracing::debug!(routes = table.len(), "Loaded Markdown server renderer");
                Ok(Some(renderer))
            }
            SsrManifest::Command { entry, runtime } => {
                let entry = if entry.is_relative() {
                    config.out_path().join(entry)
                } else {
                    entry
                };
                let runtime = runtime.unwrap_or_else(|| config.renderer.runtime.clone());
                command_renderer(runtime, entry)
            }
        };
    }

    if entry_path.exists() {
        return command_renderer(config.renderer.runtime.clone(), entry_path);
    }

    Ok(None)
}

fn command_renderer(
    runtime: String,
    entry: std::path::PathBuf,
) -> Result<Option<Arc<dyn SsrRenderer>>> {
    if !entry.exists() {
        return Err(Error::render(
            "*",
            format!("server bundle not found: {}", entry.display()),
        ));
    }
    tracing::debug!(%runtime, entry = %entry.display(), "Loaded external server renderer");
    let renderer: Arc<dyn SsrRenderer> = Arc::new(CommandRenderer::javascript(runtime, entry));
    Ok(Some(renderer))
}

pub fn transition_options(config: &BuildConfig) -> TransitionOptions {
    TransitionOptions {
        enable_content_animation: config.theme.enable_content_animation,
        render_mode: config.theme.render_mode,
        server: true,
    }
}
