use docpress_core::path::strip_base;
use docpress_core::{Error, Result};
use std::path::PathBuf;

/// Output file (relative to the output directory) for a route path.
///
/// `/guide/` maps to `guide/index.html`, `/guide` to `guide.html`. The base
/// prefix is removed first so `/docs/guide/` under base `/docs` also lands at
/// `guide/index.html`.
pub fn output_file_for(route_path: &str, base: &str) -> Result<PathBuf> {
    let relative = match strip_base(route_path, base) {
        "" => "/",
        rest => rest,
    };

    if relative.split('/').any(|segment| segment == ".." || segment == ".") {
        return Err(Error::InvalidRoute {
            path: route_path.to_string(),
            reason: "relative segments are not allowed".to_string(),
        });
    }

    let file = if relative.ends_with('/') {
        format!("{}index.html", relative)
    } else {
        format!("{}.html", relative)
    };

    Ok(PathBuf::from(file.trim_start_matches('/')))
}
