//! Base-path and route-path helpers shared by route discovery, matching and
//! output path derivation.
//!
//! A normalized base is either empty (site served from the root) or a prefix
//! with a leading slash and no trailing slash, e.g. `/docs`.

/// Normalize a user-supplied base path.
///
/// ```text
/// "/"      -> ""
/// "docs"   -> "/docs"
/// "/docs/" -> "/docs"
/// ```
pub fn normalize_base(base: &str) -> String {
    let trimmed = base.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// Prefix `path` with `base` unless it already carries it.
pub fn with_base(path: &str, base: &str) -> String {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    if base.is_empty() || has_base(&path, base) {
        path
    } else {
        format!("{}{}", base, path)
    }
}

/// Remove the base prefix from `path`. Paths outside the base are returned
/// unchanged.
pub fn strip_base<'a>(path: &'a str, base: &str) -> &'a str {
    if base.is_empty() || !has_base(path, base) {
        return path;
    }
    &path[base.len()..]
}

fn has_base(path: &str, base: &str) -> bool {
    match path.strip_prefix(base) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Canonical form of a route path used for matching and uniqueness checks.
///
/// Drops query and hash, strips the base prefix, a `.html` suffix, a final
/// `index` segment and the trailing slash. The root is always `/`.
pub fn normalize_route_path(path: &str, base: &str) -> String {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    let mut normalized = strip_base(&path, base).to_string();

    if let Some(stripped) = normalized.strip_suffix(".html") {
        normalized = stripped.to_string();
    }
    if let Some(stripped) = normalized.strip_suffix("/index") {
        normalized = format!("{}/", stripped);
    }
    while normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    if normalized.is_empty() {
        normalized.push('/');
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base() {
        assert_eq!(normalize_base("/"), "");
        assert_eq!(normalize_base(""), "");
        assert_eq!(normalize_base("docs"), "/docs");
        assert_eq!(normalize_base("/docs/"), "/docs");
        assert_eq!(normalize_base("/a/b/"), "/a/b");
    }

    #[test]
    fn test_with_base() {
        assert_eq!(with_base("/guide/", ""), "/guide/");
        assert_eq!(with_base("/guide/", "/docs"), "/docs/guide/");
        assert_eq!(with_base("guide", "/docs"), "/docs/guide");
        // Already prefixed
        assert_eq!(with_base("/docs/guide", "/docs"), "/docs/guide");
        // A sibling that merely shares the prefix text still gets the base
        assert_eq!(with_base("/docsify", "/docs"), "/docs/docsify");
    }

    #[test]
    fn test_strip_base() {
        assert_eq!(strip_base("/docs/guide/", "/docs"), "/guide/");
        assert_eq!(strip_base("/docs", "/docs"), "");
        assert_eq!(strip_base("/other/guide", "/docs"), "/other/guide");
        assert_eq!(strip_base("/docsify", "/docs"), "/docsify");
        assert_eq!(strip_base("/guide", ""), "/guide");
    }

    #[test]
    fn test_normalize_route_path() {
        assert_eq!(normalize_route_path("/guide/", ""), "/guide");
        assert_eq!(normalize_route_path("/guide", ""), "/guide");
        assert_eq!(normalize_route_path("/docs/guide/", "/docs"), "/guide");
        assert_eq!(normalize_route_path("/docs/", "/docs"), "/");
        assert_eq!(normalize_route_path("/docs", "/docs"), "/");
        assert_eq!(normalize_route_path("/guide/index.html", ""), "/guide");
        assert_eq!(normalize_route_path("/guide/start.html", ""), "/guide/start");
        assert_eq!(normalize_route_path("/guide?x=1#top", ""), "/guide");
        assert_eq!(normalize_route_path("", ""), "/");
        assert_eq!(normalize_route_path("guide", ""), "/guide");
    }
}
