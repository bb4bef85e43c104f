use crate::config::BuildConfig;
use crate::error::Result;
use crate::path::with_base;
use crate::types::{Route, RouteTable};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Document extensions that become routes
pub const PAGE_EXTENSIONS: &[&str] = &["md", "mdx"];

/// Discovers page routes from the documentation root
#[derive(Debug, Clone)]
pub struct RouteService {
    root: PathBuf,
    base: String,
    exclude: Vec<PathBuf>,
}

impl RouteService {
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            root: config.root_path(),
            base: config.base.clone(),
            exclude: vec![config.public_path()],
        }
    }

    /// Walk the root and build the route table.
    ///
    /// Static routes come before dynamic ones so that first-match lookups
    /// prefer a concrete page over a parameterized sibling.
    pub fn scan(&self) -> Result<RouteTable> {
        let mut routes = Vec::new();

        if !self.root.exists() {
            tracing::warn!(root = %self.root.display(), "Documentation root does not exist");
            return RouteTable::new(&self.base, routes);
        }

        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e.path()));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() || !is_page(entry.path()) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path());
            let path = with_base(&route_path_for(relative), &self.base);
            tracing::debug!(route = %path, source = %relative.display(), "Discovered route");
            routes.push(Route::new(path).with_source(relative));
        }

        routes.sort_by(|a, b| {
            a.is_dynamic()
                .cmp(&b.is_dynamic())
                .then_with(|| a.path.cmp(&b.path))
        });

        RouteTable::new(&self.base, routes)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        if path == self.root {
            return false;
        }
        if self.exclude.iter().any(|e| e == path) {
            return true;
        }
        // Hidden files and `_partials` style directories never become pages
        path.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.') || n.starts_with('_'))
    }
}

fn is_page(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| PAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Map a document path (relative to the root) to its route path.
///
/// ```text
/// index.md         -> /
/// guide/index.md   -> /guide/
/// guide/start.md   -> /guide/start
/// user/[id].md     -> /user/:id
/// files/[...rest]  -> /files/*
/// ```
pub fn route_path_for(relative: &Path) -> String {
    let stem_path = relative.with_extension("");
    let segments: Vec<String> = stem_path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    let mut path = String::from("/");
    let last = segments.len().saturating_sub(1);
    for (i, segment) in segments.iter().enumerate() {
        if i == last && segment == "index" {
            break;
        }
        path.push_str(&dynamic_segment(segment));
        if i != last {
            path.push('/');
        }
    }

    path
}

fn dynamic_segment(segment: &str) -> String {
    match segment
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
    {
        Some(inner) if inner.starts_with("...") => "*".to_string(),
        Some(inner) => format!(":{}", inner),
        None => segment.to_string(),
    }
}
