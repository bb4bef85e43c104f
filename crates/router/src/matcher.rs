use crate::node::Node;
use docpress_core::path::normalize_route_path;
use docpress_core::{Route, RouteTable};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A route pattern paired with the content it renders
#[derive(Debug)]
pub struct RouteEntry<C> {
    pub pattern: String,
    pub content: Arc<C>,
}

impl<C> RouteEntry<C> {
    pub fn new(pattern: impl Into<String>, content: Arc<C>) -> Self {
        Self {
            pattern: pattern.into(),
            content,
        }
    }
}

/// Result of a successful lookup
#[derive(Debug)]
pub struct RouteMatch<C> {
    pub pattern: String,
    pub content: Arc<C>,
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Static(String),
    Param(String),
    Splat,
}

fn segments(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split('/').filter(|s| !s.is_empty())
}

fn compile(normalized: &str) -> Vec<Segment> {
    segments(normalized)
        .map(|s| {
            if s == "*" {
                Segment::Splat
            } else if let Some(name) = s.strip_prefix(':') {
                Segment::Param(name.to_string())
            } else {
                Segment::Static(s.to_string())
            }
        })
        .collect()
}

/// First-match router over a build-time route table.
///
/// Both stored patterns and requested paths go through
/// [`normalize_route_path`] before comparison, so trailing slashes, `.html`
/// suffixes and the base prefix never affect the outcome.
#[derive(Debug)]
pub struct RouteMatcher<C> {
    base: String,
    entries: Vec<(Vec<Segment>, RouteEntry<C>)>,
}

impl<C> RouteMatcher<C> {
    pub fn new(base: &str, entries: Vec<RouteEntry<C>>) -> Self {
        let entries = entries
            .into_iter()
            .map(|entry| (compile(&normalize_route_path(&entry.pattern, base)), entry))
            .collect();

        Self {
            base: base.to_string(),
            entries,
        }
    }

    /// Build a matcher from a route table, creating content per route
    pub fn from_table(table: &RouteTable, mut content: impl FnMut(&Route) -> C) -> Self {
        let entries = table
            .iter()
            .map(|route| RouteEntry::new(route.path.clone(), Arc::new(content(route))))
            .collect();
        Self::new(table.base(), entries)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the first entry, in table order, that matches `path`
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<C>> {
        let normalized = normalize_route_path(path, &self.base);
        let requested: Vec<&str> = segments(&normalized).collect();

        self.entries.iter().find_map(|(pattern, entry)| {
            match_segments(pattern, &requested).map(|params| RouteMatch {
                pattern: entry.pattern.clone(),
                content: Arc::clone(&entry.content),
                params,
            })
        })
    }

    /// Content of the first matching route
    pub fn resolve(&self, path: &str) -> Option<Arc<C>> {
        self.match_path(path).map(|m| m.content)
    }

    /// Render the matching content, or the empty placeholder when nothing
    /// matches
    pub fn render(&self, path: &str, view: impl FnOnce(&C) -> Node) -> Node {
        match self.resolve(path) {
            Some(content) => view(&content),
            None => {
                tracing::debug!(path, "No route matched");
                Node::Empty
            }
        }
    }
}

fn match_segments(pattern: &[Segment], requested: &[&str]) -> Option<BTreeMap<String, String>> {
    let mut params = BTreeMap::new();

    for (i, segment) in pattern.iter().enumerate() {
        match segment {
            Segment::Splat => {
                params.insert("*".to_string(), requested.get(i..)?.join("/"));
                return Some(params);
            }
            Segment::Static(expected) => {
                if requested.get(i) != Some(&expected.as_str()) {
                    return None;
                }
            }
            Segment::Param(name) => {
                params.insert(name.clone(), (*requested.get(i)?).to_string());
            }
        }
    }

    (pattern.len() == requested.len()).then_some(params)
}
