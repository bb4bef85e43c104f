//! Build artifact layout shared by the bundlers and the page renderer.
//!
//! ```text
//! <out>/html/main/index.html   HTML template written by the client bundle
//! <out>/ssr/manifest.json      server renderer descriptor
//! <out>/ssr/main.cjs           external server bundle
//! <temp>/routes.json           generated route table module
//! ```

use crate::types::Route;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const HTML_DIR: &str = "html";
pub const SSR_DIR: &str = "ssr";
pub const SSR_MANIFEST: &str = "manifest.json";
pub const SSR_ENTRY: &str = "main.cjs";
pub const ROUTES_MODULE: &str = "routes.json";

/// Replaced with the server-rendered app markup
pub const APP_HTML_MARKER: &str = "<!--<?- DOC_CONTENT ?>-->";
/// Replaced with the assembled head tags
pub const HEAD_MARKER: &str = "<!--<?- HEAD ?>-->";
pub const HTML_START_TAG: &str = "<html";
pub const BODY_START_TAG: &str = "<body";

pub fn template_path(out_dir: &Path) -> PathBuf {
    out_dir.join(HTML_DIR).join("main").join("index.html")
}

pub fn ssr_dir(out_dir: &Path) -> PathBuf {
    out_dir.join(SSR_DIR)
}

pub fn routes_module_path(temp_dir: &Path) -> PathBuf {
    temp_dir.join(ROUTES_MODULE)
}

/// Describes which server renderer a build produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SsrManifest {
    /// Render Markdown sources natively
    Markdown {
        root: PathBuf,
        #[serde(default)]
        base: String,
        routes: Vec<Route>,
    },
    /// Execute an external server bundle with a JavaScript runtime
    Command {
        entry: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        runtime: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let out = Path::new("/site/out");
        assert_eq!(
            template_path(out),
            PathBuf::from("/site/out/html/main/index.html")
        );
        assert_eq!(ssr_dir(out), PathBuf::from("/site/out/ssr"));
        assert_eq!(
            routes_module_path(Path::new(".docpress")),
            PathBuf::from(".docpress/routes.json")
        );
    }

    #[test]
    fn test_manifest_tagging() {
        let json = r#"{"kind":"command","entry":"ssr/main.cjs"}"#;
        let manifest: SsrManifest = serde_json::from_str(json).unwrap();
        assert_eq!(
            manifest,
            SsrManifest::Command {
                entry: PathBuf::from("ssr/main.cjs"),
                runtime: None
            }
        );

        let manifest = SsrManifest::Markdown {
            root: PathBuf::from("docs"),
            base: String::new(),
            routes: vec![Route::new("/")],
        };
        let json = serde_json::to_string(&manifest).unwrap();
        assert!(json.starts_with(r#"{"kind":"markdown""#));
    }
}
