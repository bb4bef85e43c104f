use crate::error::{Error, Result};
use crate::path::normalize_route_path;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

/// A page route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Route path including the base prefix (e.g. "/docs/guide/")
    pub path: String,
    /// Source document the route was discovered from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
    /// Dynamic parameter names (`:id` segments, `*` for a splat)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
}

impl Route {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let params = dynamic_params(&path);
        Self {
            path,
            source: None,
            params,
        }
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Dynamic routes cannot be pre-rendered
    pub fn is_dynamic(&self) -> bool {
        !self.params.is_empty()
    }
}

/// Collect dynamic parameter names from a route path
pub fn dynamic_params(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|segment| {
            if let Some(name) = segment.strip_prefix(':') {
                Some(name.to_string())
            } else if segment == "*" {
                Some("*".to_string())
            } else {
                None
            }
        })
        .collect()
}

/// Ordered, immutable route table generated at build time
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RouteTable {
    base: String,
    routes: Vec<Route>,
}

impl RouteTable {
    /// Build a table, rejecting paths that collide after base normalization
    pub fn new(base: &str, routes: Vec<Route>) -> Result<Self> {
        let mut seen = HashSet::new();
        for route in &routes {
            if !route.path.starts_with('/') {
                return Err(Error::InvalidRoute {
                    path: route.path.clone(),
                    reason: "route paths must start with '/'".to_string(),
                });
            }
            if !seen.insert(normalize_route_path(&route.path, base)) {
                return Err(Error::DuplicateRoute(route.path.clone()));
            }
        }

        Ok(Self {
            base: base.to_string(),
            routes,
        })
    }

    /// Parse the JSON form written by the route-compilation step
    pub fn from_json(content: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct RawTable {
            #[serde(default)]
            base: String,
            routes: Vec<Route>,
        }

        let raw: RawTable = serde_json::from_str(content)?;
        Self::new(&raw.base, raw.routes)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Routes that can be pre-rendered
    pub fn static_routes(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter().filter(|r| !r.is_dynamic())
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

/// Per-page metadata produced while rendering
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageData {
    pub route_path: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub frontmatter: serde_json::Map<String, serde_json::Value>,
    /// Last modification time of the source document (RFC 3339)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// Head metadata collected during a server render.
///
/// Every field holds pre-rendered markup; attribute fields hold
/// `key="value"` pairs for the `<html>` and `<body>` opening tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HeadTags {
    pub title: String,
    pub meta: String,
    pub link: String,
    pub style: String,
    pub script: String,
    pub html_attributes: String,
    pub body_attributes: String,
}

impl HeadTags {
    /// Rendered tags in document order: title, meta, link, style, script
    pub fn tags(&self) -> String {
        [
            &self.title,
            &self.meta,
            &self.link,
            &self.style,
            &self.script,
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("")
    }
}

/// Output of the server-render entry point for one route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    pub app_html: String,
    #[serde(default)]
    pub page_data: PageData,
}

/// Rendering mode of the target UI runtime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    #[default]
    Concurrent,
    Legacy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_dynamic_params() {
        assert!(!Route::new("/guide/start").is_dynamic());
        assert_eq!(Route::new("/user/:id").params, vec!["id"]);
        assert_eq!(Route::new("/blog/:year/:slug").params, vec!["year", "slug"]);
        assert_eq!(Route::new("/files/*").params, vec!["*"]);
    }

    #[test]
    fn test_route_table_rejects_duplicates_after_normalization() {
        let result = RouteTable::new(
            "/docs",
            vec![Route::new("/docs/guide/"), Route::new("/docs/guide")],
        );
        assert!(matches!(result, Err(Error::DuplicateRoute(p)) if p == "/docs/guide"));
    }

    #[test]
    fn test_route_table_rejects_relative_paths() {
        let result = RouteTable::new("", vec![Route::new("guide")]);
        assert!(matches!(result, Err(Error::InvalidRoute { .. })));
    }

    #[test]
    fn test_route_table_keeps_order_and_filters_dynamic() {
        let table = RouteTable::new(
            "",
            vec![
                Route::new("/"),
                Route::new("/user/:id"),
                Route::new("/guide/"),
            ],
        )
        .unwrap();

        assert_eq!(table.len(), 3);
        let statics: Vec<_> = table.static_routes().map(|r| r.path.as_str()).collect();
        assert_eq!(statics, vec!["/", "/guide/"]);
    }

    #[test]
    fn test_route_table_json() {
        let table = RouteTable::new(
            "/docs",
            vec![Route::new("/docs/").with_source("index.md")],
        )
        .unwrap();
        let json = table.to_json().unwrap();
        let parsed = RouteTable::from_json(&json).unwrap();
        assert_eq!(parsed, table);
        assert!(json.contains("\"source\": \"index.md\""));
    }

    #[test]
    fn test_head_tags_order() {
        let head = HeadTags {
            title: "<title>T</title>".into(),
            meta: "<meta name=\"a\">".into(),
            script: "<script></script>".into(),
            ..Default::default()
        };
        assert_eq!(
            head.tags(),
            "<title>T</title><meta name=\"a\"><script></script>"
        );
        assert_eq!(HeadTags::default().tags(), "");
    }

    #[test]
    fn test_render_result_accepts_camel_case() {
        let json = r#"{"appHtml":"<p>hi</p>","pageData":{"routePath":"/","title":"Home"}}"#;
        let result: RenderResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.app_html, "<p>hi</p>");
        assert_eq!(result.page_data.title, "Home");
    }
}
