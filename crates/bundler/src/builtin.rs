use crate::{BundleTarget, Bundler};
use async_trait::async_trait;
use docpress_core::layout::{
    self, APP_HTML_MARKER, HEAD_MARKER, SSR_MANIFEST, SsrManifest,
};
use docpress_core::{BuildConfig, Result, RouteTable};
use docpress_router::node::escape_html;
use std::path::Path;
use tokio::fs;

/// Bundler that needs no JavaScript toolchain.
///
/// The client target emits the route table module and the HTML template;
/// the server target points the page renderer at the Markdown sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinBundler;

#[async_trait]
impl Bundler for BuiltinBundler {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn bundle(
        &self,
        target: BundleTarget,
        config: &BuildConfig,
        routes: &RouteTable,
    ) -> Result<()> {
        match target {
            BundleTarget::Client => {
                let routes_path = layout::routes_module_path(&config.temp_path());
                write_file(&routes_path, &routes.to_json()?).await?;

                let template_path = layout::template_path(&config.out_path());
                write_file(&template_path, &default_template(&config.lang)).await?;

                tracing::debug!(
                    routes = %routes_path.display(),
                    template = %template_path.display(),
                    "Client bundle written"
                );
            }
            BundleTarget::Server => {
                let manifest = SsrManifest::Markdown {
                    root: config.root_path(),
                    base: routes.base().to_string(),
                    routes: routes.routes().to_vec(),
                };
                let manifest_path = layout::ssr_dir(&config.out_path()).join(SSR_MANIFEST);
                write_file(&manifest_path, &serde_json::to_string_pretty(&manifest)?).await?;

                tracing::debug!(manifest = %manifest_path.display(), "Server bundle written");
            }
        }
        Ok(())
    }
}

async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content).await?;
    Ok(())
}

/// HTML template carrying the head and app-root markers
pub fn default_template(lang: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="{}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    {}
</head>
<body>
    <div id="root">{}</div>
</body>
</html>
"#,
        escape_html(lang),
        HEAD_MARKER,
        APP_HTML_MARKER
    )
}
