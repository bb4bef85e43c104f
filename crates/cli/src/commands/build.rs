use anyhow::{Context, Result};
use docpress_bundler::{BundleTarget, Bundler, copy_public_dir};
use docpress_core::{BuildConfig, RouteService, RouteTable, load_config};
use docpress_generator::{JsonSearchIndex, PageRenderer, RenderReport, SearchIndexWriter};
use docpress_plugins::{AdditionalRoutesPlugin, Plugin, PluginDriver};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Command-line overrides applied on top of docpress.toml
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub out_dir: Option<PathBuf>,
    pub ssg: Option<bool>,
}

/// State shared by the build steps once the configuration is final
pub struct BuildContext {
    pub config: Arc<BuildConfig>,
    pub routes: RouteTable,
}

/// Result of a finished build
#[derive(Debug)]
pub struct BuildSummary {
    pub routes: usize,
    pub report: RenderReport,
    pub search_index: PathBuf,
}

/// Runs the build pipeline:
/// plugins -> routes -> bundles -> public assets -> search index -> pages.
pub struct BuildOrchestrator {
    config: BuildConfig,
    plugins: PluginDriver,
    search: Box<dyn SearchIndexWriter>,
}

impl BuildOrchestrator {
    pub fn new(config: BuildConfig) -> Self {
        let mut plugins = PluginDriver::new();
        plugins.register(AdditionalRoutesPlugin);

        Self {
            config,
            plugins,
            search: Box::new(JsonSearchIndex),
        }
    }

    pub fn with_plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.register(plugin);
        self
    }

    pub async fn build(self) -> Result<BuildSummary> {
        let started = Instant::now();

        self.plugins.init().await.context("Plugin initialization failed")?;
        let config = self
            .plugins
            .modify_config(self.config)
            .await
            .context("Plugin failed to modify config")?;
        self.plugins
            .before_build(&config)
            .await
            .context("before_build hook failed")?;

        // Output is fully regenerated on every build
        for dir in [config.out_path(), config.temp_path()] {
            reset_dir(&dir).with_context(|| format!("Failed to clear {}", dir.display()))?;
        }

        let routes = RouteService::new(&config)
            .scan()
            .context("Failed to discover routes")?;
        println!("✓ Found {} routes", routes.len());

        let ctx = BuildContext {
            config: Arc::new(config),
            routes,
        };

        // Search index is written even when bundling fails
        let bundled = bundle(&ctx).await;
        let indexed = self.search.write(&ctx.config, &ctx.routes).await;
        bundled?;
        let search_index = indexed.context("Failed to write search index")?;
        println!("✓ Search index: {}", search_index.display());

        let extra = self
            .plugins
            .add_ssg_routes(&ctx.config)
            .await
            .context("Plugin failed to add routes")?;

        let pages = PageRenderer::load(Arc::clone(&ctx.config), ctx.config.ssg).await;
        let report = pages
            .render_pages(&ctx.routes, extra)
            .await
            .context("Failed to render pages")?;
        println!(
            "✓ Rendered {} pages ({} server, {} client)",
            report.rendered.len(),
            report.ssr,
            report.csr
        );

        self.plugins
            .after_build(&ctx.config)
            .await
            .context("after_build hook failed")?;

        tracing::info!(elapsed = ?started.elapsed(), "Build finished");
        Ok(BuildSummary {
            routes: ctx.routes.len(),
            report,
            search_index,
        })
    }
}

/// Client bundle, plus the server bundle alongside it when pre-rendering
async fn bundle(ctx: &BuildContext) -> Result<()> {
    let bundler = docpress_bundler::from_config(&ctx.config);
    println!("📦 Bundling with {}...", bundler.name());

    if ctx.config.ssg {
        let (client, server) = tokio::join!(
            bundler.bundle(BundleTarget::Client, &ctx.config, &ctx.routes),
            bundler.bundle(BundleTarget::Server, &ctx.config, &ctx.routes),
        );
        client.context("Client bundle failed")?;
        server.context("Server bundle failed")?;
    } else {
        bundler
            .bundle(BundleTarget::Client, &ctx.config, &ctx.routes)
            .await
            .context("Client bundle failed")?;
    }
    println!("   ✓ Bundled");

    let copied = copy_public_dir(&ctx.config.public_path(), &ctx.config.out_path())
        .context("Failed to copy public assets")?;
    if copied > 0 {
        println!("   ✓ Copied {} public files", copied);
    }
    Ok(())
}

fn reset_dir(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    std::fs::create_dir_all(path)
}

/// Load the project configuration and apply command-line overrides
pub fn load(path: &Path, options: &BuildOptions) -> Result<BuildConfig> {
    if !path.exists() {
        anyhow::bail!("Project directory does not exist: {}", path.display());
    }

    let mut config = load_config(path).context("Failed to load docpress.toml")?;
    if let Some(out_dir) = &options.out_dir {
        config.out_dir = out_dir.clone();
    }
    if let Some(ssg) = options.ssg {
        config.ssg = ssg;
    }
    let (out, root) = (config.out_path(), config.root_path());
    if out == root || root.starts_with(&out) || out == config.project_dir {
        anyhow::bail!(
            "Output directory {} would overwrite the project sources",
            out.display()
        );
    }
    Ok(config)
}

/// Build the site into the output directory
pub async fn run(path: PathBuf, options: BuildOptions) -> Result<()> {
    let config = load(&path, &options)?;

    println!("🔨 Building documentation site...");
    println!("   Source: {}", config.root_path().display());
    println!("   Output: {}", config.out_path().display());
    if !config.base.is_empty() {
        println!("   Base:   {}", config.base);
    }
    println!();

    let summary = match BuildOrchestrator::new(config.clone()).build().await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Build failed");
            return Err(e);
        }
    };

    println!();
    println!("✅ Build complete!");
    println!("   Routes: {}", summary.routes);
    println!("   Output: {}", config.out_path().display());
    println!();
    println!("To preview locally:");
    println!("   docpress preview {}", path.display());
    println!();

    Ok(())
}
