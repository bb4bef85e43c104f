use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Request, State},
    middleware,
    response::{
        Redirect,
        sse::{Event, KeepAlive, Sse},
    },
    routing::get,
};
use docpress_core::BuildConfig;
use docpress_core::path::strip_base;
use docpress_plugins::InjectHeadPlugin;
use notify::{Event as NotifyEvent, EventKind, RecursiveMode, Watcher};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};
use tokio::sync::{broadcast, mpsc};
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::build::{self, BuildOptions, BuildOrchestrator};

const RELOAD_ROUTE: &str = "/_reload";

/// Injected into every page head while watching
const RELOAD_SCRIPT: &str = r#"<script>(()=>{const es=new EventSource('/_reload');es.onmessage=()=>location.reload();es.onerror=()=>es.close();})();</script>"#;

#[derive(Clone)]
struct AppState {
    out_dir: PathBuf,
    base: String,
    reload_tx: broadcast::Sender<()>,
}

/// Build the site and serve the output locally.
///
/// With `watch`, source changes trigger a rebuild and connected browsers
/// reload through server-sent events.
///
/// # Arguments
///
/// * `path` - Project directory containing docpress.toml
/// * `port` - Port to serve on (default: 8080)
/// * `watch` - Rebuild on changes
pub async fn run(path: PathBuf, port: u16, watch: bool) -> Result<()> {
    println!("📚 Starting preview server...");
    println!("   Project: {}", path.display());

    let config = rebuild(&path, watch).await?;

    let (reload_tx, _) = broadcast::channel::<()>(100);
    let state = AppState {
        out_dir: config.out_path(),
        base: config.base.clone(),
        reload_tx: reload_tx.clone(),
    };

    if watch {
        let watcher_path = path.clone();
        let watch_dirs = vec![config.root_path(), path.join(docpress_core::config::CONFIG_FILE)];
        tokio::spawn(async move {
            if let Err(e) = watch_files(watcher_path, watch_dirs, reload_tx).await {
                tracing::error!(error = %e, "File watcher stopped");
            }
        });
    }

    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    println!(
        "\n🚀 Preview ready at: http://localhost:{}{}/",
        port, config.base
    );
    if watch {
        println!("   Watching {} for changes", config.root_path().display());
    }
    println!("   Press Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to port")?;

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn router(state: AppState) -> Router {
    let files = ServeDir::new(&state.out_dir);

    let router = Router::new().route(RELOAD_ROUTE, get(sse_handler));
    let router = if state.base.is_empty() {
        router.fallback_service(files)
    } else {
        let home = format!("{}/", state.base);
        router
            .route("/", get(move || async move { Redirect::temporary(&home) }))
            .nest_service(&state.base, files)
    };

    router
        .layer(middleware::map_request_with_state(state.clone(), resolve_html))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn rebuild(path: &Path, watch: bool) -> Result<BuildConfig> {
    let config = build::load(path, &BuildOptions::default())?;
    let mut orchestrator = BuildOrchestrator::new(config.clone());
    if watch {
        orchestrator = orchestrator.with_plugin(InjectHeadPlugin::new(
            "docpress:live-reload",
            vec![RELOAD_SCRIPT.to_string()],
        ));
    }

    let summary = orchestrator.build().await?;
    println!("   ✓ Built {} pages", summary.report.rendered.len());
    Ok(config)
}

/// Serve `/guide/start` from `guide/start.html`
async fn resolve_html(State(state): State<AppState>, mut request: Request) -> Request {
    if let Some(rewritten) = html_path(&state.out_dir, &state.base, request.uri().path()) {
        let rewritten = match request.uri().query() {
            Some(query) => format!("{}?{}", rewritten, query),
            None => rewritten,
        };
        if let Ok(uri) = rewritten.parse() {
            *request.uri_mut() = uri;
        }
    }
    request
}

/// The `.html` form of an extension-less request path, when that file exists
fn html_path(out_dir: &Path, base: &str, path: &str) -> Option<String> {
    if path.ends_with('/') || path.rsplit('/').next().is_some_and(|name| name.contains('.')) {
        return None;
    }

    let relative = strip_base(path, base).trim_start_matches('/');
    if relative.is_empty() || relative.split('/').any(|segment| segment == "..") {
        return None;
    }

    out_dir
        .join(format!("{}.html", relative))
        .is_file()
        .then(|| format!("{}.html", path))
}

/// Rebuild on source changes and notify connected browsers
async fn watch_files(
    project: PathBuf,
    paths: Vec<PathBuf>,
    reload_tx: broadcast::Sender<()>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(100);

    let mut watcher =
        notify::recommended_watcher(move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.blocking_send(event);
            }
        })?;

    for path in &paths {
        if path.exists() {
            watcher.watch(path, RecursiveMode::Recursive)?;
        }
    }

    while let Some(event) = rx.recv().await {
        if !is_relevant(&event) {
            continue;
        }
        // Coalesce bursts from editors writing several files
        while rx.try_recv().is_ok() {}

        println!("   📝 Change detected, rebuilding...");
        match rebuild(&project, true).await {
            Ok(_) => {
                let _ = reload_tx.send(());
            }
            Err(e) => tracing::error!(error = %format!("{:#}", e), "Rebuild failed"),
        }
    }

    Ok(())
}

fn is_relevant(event: &NotifyEvent) -> bool {
    match event.kind {
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_) => {
            // Filter out temporary files and hidden files
            event.paths.iter().any(|p| {
                let filename = p.file_name().unwrap_or_default().to_string_lossy();
                !filename.starts_with('.') && !filename.ends_with('~')
            })
        }
        _ => false,
    }
}

/// SSE endpoint for hot reload
async fn sse_handler(
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>> {
    let mut rx = state.reload_tx.subscribe();

    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(()) => yield Ok(Event::default().data("reload")),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}
