//! Static page output.
//!
//! Every static route is rendered on the server when a renderer is
//! available and written into the HTML template. A route that cannot be
//! server-rendered still gets its page, with an empty app root that the
//! client fills in at load time.

use crate::head::assemble_head;
use crate::output::output_file_for;
use crate::renderer::{SsrRenderer, load_renderer};
use crate::template::{HtmlTemplate, Slot};
use docpress_core::layout::{self, HTML_DIR};
use docpress_core::path::{normalize_route_path, with_base};
use docpress_core::{BuildConfig, Error, HeadTags, Result, Route, RouteTable};
use futures::FutureExt;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Outcome of a page rendering pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Written files, sorted
    pub rendered: Vec<PathBuf>,
    /// Pages with server-rendered content
    pub ssr: usize,
    /// Pages left for client rendering
    pub csr: usize,
}

pub struct PageRenderer {
    config: Arc<BuildConfig>,
    renderer: Option<Arc<dyn SsrRenderer>>,
    /// Upper bound on routes rendered at the same time
    concurrency: usize,
}

/// One render per available core
fn default_concurrency() -> usize {
    std::thread::available_parallelism().map_or(4, |n| n.get())
}

impl PageRenderer {
    pub fn new(config: Arc<BuildConfig>, renderer: Option<Arc<dyn SsrRenderer>>) -> Self {
        Self {
            config,
            renderer,
            concurrency: default_concurrency(),
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Resolve the server renderer from the build output.
    ///
    /// A missing or unusable server bundle is reported once and every page
    /// falls back to client rendering.
    pub async fn load(config: Arc<BuildConfig>, ssg: bool) -> Self {
        let renderer = if !ssg {
            tracing::debug!("Static generation disabled, rendering every page on the client");
            None
        } else {
            match load_renderer(&config).await {
                Ok(Some(renderer)) => Some(renderer),
                Ok(None) => {
                    tracing::warn!(
                        "No server bundle found in {}, falling back to client rendering",
                        layout::ssr_dir(&config.out_path()).display()
                    );
                    None
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to load server renderer, falling back to client rendering"
                    );
                    None
                }
            }
        };

        Self::new(config, renderer)
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// Render every static route plus `extra` into the output directory.
    ///
    /// Routes run concurrently, at most `concurrency` at a time, and all of
    /// them finish before the first fatal error, if any, is returned. The
    /// intermediate `ssr/` and `html/` directories are removed after a
    /// successful pass.
    pub async fn render_pages(
        &self,
        routes: &RouteTable,
        extra: Vec<Route>,
    ) -> Result<RenderReport> {
        let out_dir = self.config.out_path();
        let template_path = layout::template_path(&out_dir);

        let source = match fs::read_to_string(&template_path).await {
            Ok(source) => source,
            Err(e) => {
                tracing::error!(
                    path = %template_path.display(),
                    error = %e,
                    "Failed to read HTML template"
                );
                return Err(e.into());
            }
        };
        let template = Arc::new(HtmlTemplate::parse(&source));

        let urls = static_urls(routes, extra, &self.config.base);
        tracing::info!(pages = urls.len(), ssr = self.renderer.is_some(), "Rendering pages");

        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        for url in urls {
            let config = Arc::clone(&self.config);
            let renderer = self.renderer.clone();
            let template = Arc::clone(&template);
            let out_dir = out_dir.clone();
            let permits = Arc::clone(&permits);

            tasks.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::render(&url, e))?;
                render_page(&config, renderer.as_deref(), &template, &out_dir, url).await
            });
        }

        let mut report = RenderReport::default();
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((path, ssr))) => {
                    if ssr {
                        report.ssr += 1;
                    } else {
                        report.csr += 1;
                    }
                    report.rendered.push(path);
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Failed to write page");
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Page task aborted");
                    first_error.get_or_insert(Error::render("*", e));
                }
            }
        }
        if let Some(e) = first_error {
            return Err(e);
        }

        remove_dir_if_exists(&layout::ssr_dir(&out_dir)).await?;
        remove_dir_if_exists(&out_dir.join(HTML_DIR)).await?;

        report.rendered.sort();
        tracing::info!(ssr = report.ssr, csr = report.csr, "Pages written");
        Ok(report)
    }
}

/// Base-prefixed URLs of every pre-renderable route, deduplicated
fn static_urls(routes: &RouteTable, extra: Vec<Route>, base: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    routes
        .static_routes()
        .map(|route| route.path.clone())
        .chain(extra.into_iter().filter(|r| !r.is_dynamic()).map(|r| r.path))
        .map(|path| with_base(&path, base))
        .filter(|url| seen.insert(normalize_route_path(url, base)))
        .collect()
}

async fn render_page(
    config: &BuildConfig,
    renderer: Option<&dyn SsrRenderer>,
    template: &HtmlTemplate,
    out_dir: &Path,
    url: String,
) -> Result<(PathBuf, bool)> {
    let mut head = HeadTags::default();
    let mut app_html = String::new();
    let mut ssr = false;

    if let Some(renderer) = renderer {
        let outcome = AssertUnwindSafe(renderer.render(&url, &mut head))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(result)) => {
                app_html = result.app_html;
                ssr = true;
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    route = %url,
                    error = %e,
                    "Server render failed, falling back to client rendering"
                );
                head = HeadTags::default();
            }
            Err(_) => {
                tracing::warn!(
                    route = %url,
                    "Server renderer panicked, falling back to client rendering"
                );
                head = HeadTags::default();
            }
        }
    }

    let html = template.render(|slot| match slot {
        Slot::Head => assemble_head(&config.head, &head, &config.theme.appearance_key),
        Slot::AppHtml => app_html.clone(),
        Slot::HtmlAttributes => head.html_attributes.clone(),
        Slot::BodyAttributes => head.body_attributes.clone(),
    });

    let path = out_dir.join(output_file_for(&url, &config.base)?);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(&path, html).await?;
    tracing::debug!(route = %url, path = %path.display(), ssr, "Wrote page");

    Ok((path, ssr))
}

async fn remove_dir_if_exists(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docpress_core::layout::SSR_MANIFEST;
    use docpress_core::{PageData, RenderResult};
    use std::sync::Mutex;
    use tempfile::TempDir;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    const TEMPLATE: &str = "<!DOCTYPE html><html lang=\"en\"><head><!--<?- HEAD ?>--></head><body><div id=\"root\"><!--<?- DOC_CONTENT ?>--></div></body></html>";

    /// Renders `<p>{url}</p>`, fails for `/x` and panics for `/panic`
    struct FakeRenderer;

    #[async_trait]
    impl SsrRenderer for FakeRenderer {
        async fn render(&self, url: &str, head: &mut HeadTags) -> Result<RenderResult> {
            head.title = format!("<title>{}</title>", url);
            match url {
                "/x" => Err(Error::render(url, "window is not defined")),
                "/panic" => panic!("renderer bug"),
                "/dollar" => Ok(RenderResult {
                    app_html: "<p>cost: $& and $1</p>".to_string(),
                    page_data: PageData::default(),
                }),
                "/attrs" => {
                    head.html_attributes = "data-theme=\"dark\"".to_string();
                    head.body_attributes = "class=\"home\"".to_string();
                    Ok(RenderResult::default())
                }
                _ => Ok(RenderResult {
                    app_html: format!("<p>{}</p>", url),
                    page_data: PageData::default(),
                }),
            }
        }
    }

    fn setup(base: &str) -> (TempDir, Arc<BuildConfig>) {
        let dir = TempDir::new().unwrap();
        let config = BuildConfig {
            project_dir: dir.path().to_path_buf(),
            base: base.to_string(),
            ..BuildConfig::default()
        };
        let template = layout::template_path(&config.out_path());
        std::fs::create_dir_all(template.parent().unwrap()).unwrap();
        std::fs::write(&template, TEMPLATE).unwrap();
        (dir, Arc::new(config))
    }

    fn table(base: &str, paths: &[&str]) -> RouteTable {
        RouteTable::new(base, paths.iter().map(|p| Route::new(*p)).collect()).unwrap()
    }

    fn read(config: &BuildConfig, relative: &str) -> String {
        std::fs::read_to_string(config.out_path().join(relative)).unwrap()
    }

    fn fake(config: &Arc<BuildConfig>) -> PageRenderer {
        PageRenderer::new(Arc::clone(config), Some(Arc::new(FakeRenderer)))
    }

    #[tokio::test]
    async fn test_one_file_per_static_route() {
        let (_dir, config) = setup("");
        let routes = table("", &["/", "/guide/", "/guide/start", "/user/:id"]);

        let report = fake(&config).render_pages(&routes, vec![]).await.unwrap();

        let out = config.out_path();
        assert_eq!(
            report.rendered,
            vec![
                out.join("guide/index.html"),
                out.join("guide/start.html"),
                out.join("index.html"),
            ]
        );
        assert_eq!(report.ssr, 3);
        assert_eq!(report.csr, 0);
        assert!(
            read(&config, "guide/start.html")
                .contains("<div id=\"root\"><p>/guide/start</p></div>")
        );
        assert!(!out.join("user").exists());
    }

    #[tokio::test]
    async fn test_base_is_stripped_from_output_paths() {
        let (_dir, config) = setup("/docs");
        let routes = table("/docs", &["/docs/", "/docs/guide/"]);

        fake(&config).render_pages(&routes, vec![]).await.unwrap();

        assert!(read(&config, "index.html").contains("<p>/docs/</p>"));
        assert!(read(&config, "guide/index.html").contains("<p>/docs/guide/</p>"));
        assert!(!config.out_path().join("docs").exists());
    }

    #[tokio::test]
    async fn test_extra_routes_get_base_and_are_deduplicated() {
        let (_dir, config) = setup("/docs");
        let routes = table("/docs", &["/docs/guide/"]);
        let extra = vec![
            Route::new("/extra"),
            Route::new("/guide/"),
            Route::new("/blog/:slug"),
        ];

        let report = fake(&config).render_pages(&routes, extra).await.unwrap();

        assert_eq!(report.rendered.len(), 2);
        assert!(read(&config, "extra.html").contains("<p>/docs/extra</p>"));
    }

    #[tokio::test]
    async fn test_render_failure_falls_back_to_client_rendering() {
        let (_dir, config) = setup("");
        let routes = table("", &["/x", "/panic", "/ok"]);

        let report = fake(&config).render_pages(&routes, vec![]).await.unwrap();

        assert_eq!(report.ssr, 1);
        assert_eq!(report.csr, 2);
        for page in ["x.html", "panic.html"] {
            let html = read(&config, page);
            assert!(html.contains("<div id=\"root\"></div>"));
            // Head from the failed attempt is discarded
            assert!(!html.contains("<title>"));
        }
        assert!(read(&config, "ok.html").contains("<p>/ok</p>"));
    }

    /// Records the level of every event emitted while installed
    struct LogCapture {
        levels: Arc<Mutex<Vec<String>>>,
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            self.levels
                .lock()
                .unwrap()
                .push(event.metadata().level().to_string());
        }
    }

    /// Load the renderer from disk, render `/`, `/a` and `/b/`, and check
    /// every page fell back to an empty root with a single warning
    async fn assert_client_fallback(config: &Arc<BuildConfig>) {
        let levels = Arc::new(Mutex::new(Vec::new()));
        let capture = LogCapture {
            levels: levels.clone(),
        };
        let _guard = tracing_subscriber::registry().with(capture).set_default();

        let routes = table("", &["/", "/a", "/b/"]);
        let pages = PageRenderer::load(Arc::clone(config), true).await;
        assert!(!pages.has_renderer());
        let report = pages.render_pages(&routes, vec![]).await.unwrap();

        assert_eq!(report.ssr, 0);
        assert_eq!(report.csr, 3);
        for page in ["index.html", "a.html", "b/index.html"] {
            assert!(read(config, page).contains("<div id=\"root\"></div>"));
        }
        let warnings = levels.lock().unwrap().iter().filter(|l| *l == "WARN").count();
        assert_eq!(warnings, 1);
    }

    fn write_manifest(config: &BuildConfig, content: &str) {
        let manifest = layout::ssr_dir(&config.out_path()).join(SSR_MANIFEST);
        std::fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        std::fs::write(&manifest, content).unwrap();
    }

    #[tokio::test]
    async fn test_absent_bundle_warns_once_and_renders_empty_roots() {
        let (_dir, config) = setup("");
        assert_client_fallback(&config).await;
    }

    #[tokio::test]
    async fn test_malformed_bundle_warns_once_and_renders_empty_roots() {
        let (_dir, config) = setup("");
        write_manifest(&config, "{");
        assert_client_fallback(&config).await;
    }

    #[tokio::test]
    async fn test_command_bundle_without_entry_warns_once() {
        let (_dir, config) = setup("");
        write_manifest(&config, r#"{"kind":"command","entry":"ssr/missing.cjs"}"#);
        assert_client_fallback(&config).await;
    }

    /// Tracks how many renders are in flight at once
    #[derive(Default)]
    struct SlowRenderer {
        in_flight: std::sync::atomic::AtomicUsize,
        peak: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl SsrRenderer for SlowRenderer {
        async fn render(&self, url: &str, _head: &mut HeadTags) -> Result<RenderResult> {
            use std::sync::atomic::Ordering;

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            Ok(RenderResult {
                app_html: format!("<p>{}</p>", url),
                page_data: PageData::default(),
            })
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_renders_are_bounded() {
        let (_dir, config) = setup("");
        let paths: Vec<String> = (0..12).map(|i| format!("/page-{}", i)).collect();
        let routes = RouteTable::new("", paths.iter().map(Route::new).collect()).unwrap();
        let renderer = Arc::new(SlowRenderer::default());

        let report = PageRenderer::new(Arc::clone(&config), Some(renderer.clone()))
            .with_concurrency(2)
            .render_pages(&routes, vec![])
            .await
            .unwrap();

        assert_eq!(report.ssr, 12);
        let peak = renderer.peak.load(std::sync::atomic::Ordering::SeqCst);
        assert!((1..=2).contains(&peak), "peak concurrency {}", peak);
    }

    #[tokio::test]
    async fn test_head_order_and_literal_dollar_patterns() {
        let (_dir, config) = setup("");
        let config = Arc::new(BuildConfig {
            head: vec!["<meta a>".to_string()],
            ..(*config).clone()
        });
        let routes = table("", &["/dollar"]);

        fake(&config).render_pages(&routes, vec![]).await.unwrap();

        let html = read(&config, "dollar.html");
        assert!(html.contains("<p>cost: $& and $1</p>"));
        let meta = html.find("<meta a>").unwrap();
        let title = html.find("<title>/dollar</title>").unwrap();
        let script = html.find("<script id=\"check-dark-mode\">").unwrap();
        assert!(meta < title);
        assert!(title < script);
    }

    #[tokio::test]
    async fn test_helmet_attributes_injected() {
        let (_dir, config) = setup("");
        let routes = table("", &["/attrs"]);

        fake(&config).render_pages(&routes, vec![]).await.unwrap();

        let html = read(&config, "attrs.html");
        assert!(html.contains("<html data-theme=\"dark\" lang=\"en\">"));
        assert!(html.contains("<body class=\"home\">"));
    }

    #[tokio::test]
    async fn test_intermediate_directories_removed() {
        let (_dir, config) = setup("");
        let ssr = layout::ssr_dir(&config.out_path());
        std::fs::create_dir_all(&ssr).unwrap();
        std::fs::write(ssr.join("main.cjs"), "").unwrap();

        fake(&config).render_pages(&table("", &["/"]), vec![]).await.unwrap();

        assert!(!ssr.exists());
        assert!(!config.out_path().join(HTML_DIR).exists());
        assert!(config.out_path().join("index.html").exists());
    }

    #[tokio::test]
    async fn test_missing_template_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = Arc::new(BuildConfig {
            project_dir: dir.path().to_path_buf(),
            ..BuildConfig::default()
        });
        let result = fake(&config).render_pages(&table("", &["/"]), vec![]).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
