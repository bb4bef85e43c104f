use crate::error::{Error, Result};
use crate::path::normalize_base;
use crate::types::RenderMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "docpress.toml";

/// Default localStorage key used to persist the theme appearance
pub const DEFAULT_APPEARANCE_KEY: &str = "docpress-theme-appearance";

/// Validated build configuration.
///
/// Directory fields are relative to `project_dir`; use the `*_path`
/// accessors to get absolute locations.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub project_dir: PathBuf,
    /// Documentation source directory
    pub root: PathBuf,
    pub out_dir: PathBuf,
    /// Scratch directory for generated build inputs, cleared on every build
    pub temp_dir: PathBuf,
    /// Static assets copied verbatim into the output (relative to `root`)
    pub public_dir: PathBuf,
    /// Normalized base prefix ("" for the site root, otherwise "/docs")
    pub base: String,
    /// Pre-render pages at build time
    pub ssg: bool,
    pub title: String,
    pub description: Option<String>,
    pub lang: String,
    /// Raw tags injected at the top of every page head
    pub head: Vec<String>,
    /// Extra routes to pre-render that have no source document
    pub additional_routes: Vec<String>,
    pub theme: ThemeConfig,
    pub bundler: BundlerCommands,
    pub renderer: RendererConfig,
}

/// Theme options relevant to the build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeConfig {
    pub appearance_key: String,
    pub enable_content_animation: bool,
    pub render_mode: RenderMode,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            appearance_key: DEFAULT_APPEARANCE_KEY.to_string(),
            enable_content_animation: false,
            render_mode: RenderMode::default(),
        }
    }
}

/// External bundler commands, run through `sh -c`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BundlerCommands {
    pub client: Option<String>,
    pub server: Option<String>,
}

impl BundlerCommands {
    pub fn is_external(&self) -> bool {
        self.client.is_some() || self.server.is_some()
    }
}

/// Runtime used to execute external server bundles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    pub runtime: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            runtime: "node".to_string(),
        }
    }
}

/// Raw TOML configuration structure
/// This matches the docpress.toml file structure exactly
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    root: Option<String>,
    out_dir: Option<String>,
    temp_dir: Option<String>,
    public_dir: Option<String>,
    base: Option<String>,
    ssg: Option<bool>,
    title: Option<String>,
    description: Option<String>,
    lang: Option<String>,
    #[serde(default)]
    head: Vec<String>,
    #[serde(default)]
    additional_routes: Vec<String>,
    #[serde(default)]
    theme: ThemeConfig,
    #[serde(default)]
    bundler: BundlerCommands,
    #[serde(default)]
    renderer: RendererConfig,
}

impl BuildConfig {
    pub fn root_path(&self) -> PathBuf {
        self.project_dir.join(&self.root)
    }

    pub fn out_path(&self) -> PathBuf {
        self.project_dir.join(&self.out_dir)
    }

    pub fn temp_path(&self) -> PathBuf {
        self.project_dir.join(&self.temp_dir)
    }

    pub fn public_path(&self) -> PathBuf {
        self.root_path().join(&self.public_dir)
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            root: PathBuf::from("docs"),
            out_dir: PathBuf::from("doc_build"),
            temp_dir: PathBuf::from(".docpress"),
            public_dir: PathBuf::from("public"),
            base: String::new(),
            ssg: true,
            title: "Docpress".to_string(),
            description: None,
            lang: "en".to_string(),
            head: Vec::new(),
            additional_routes: Vec::new(),
            theme: ThemeConfig::default(),
            bundler: BundlerCommands::default(),
            renderer: RendererConfig::default(),
        }
    }
}

/// Load `docpress.toml` from a project directory.
///
/// A missing file yields the default configuration.
pub fn load_config<P: AsRef<Path>>(project_dir: P) -> Result<BuildConfig> {
    let project_dir = project_dir.as_ref();
    let path = project_dir.join(CONFIG_FILE);

    let mut config = if path.exists() {
        let content = fs::read_to_string(&path)?;
        parse_config_str(&content)?
    } else {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        BuildConfig::default()
    };

    config.project_dir = project_dir.to_path_buf();
    Ok(config)
}

/// Parse docpress.toml from a string (useful for testing)
pub fn parse_config_str(content: &str) -> Result<BuildConfig> {
    let raw: RawConfig = toml::from_str(content)?;
    let defaults = BuildConfig::default();

    let root = match raw.root {
        Some(root) => validate_path(&root, "root")?,
        None => defaults.root,
    };
    let out_dir = match raw.out_dir {
        Some(out_dir) => validate_path(&out_dir, "out_dir")?,
        None => defaults.out_dir,
    };
    let temp_dir = match raw.temp_dir {
        Some(temp_dir) => validate_path(&temp_dir, "temp_dir")?,
        None => defaults.temp_dir,
    };
    let public_dir = match raw.public_dir {
        Some(public_dir) => validate_path(&public_dir, "public_dir")?,
        None => defaults.public_dir,
    };

    if out_dir == root {
        return Err(Error::Config(
            "'out_dir' must differ from 'root'".to_string(),
        ));
    }

    let base = normalize_base(raw.base.as_deref().unwrap_or("/"));
    if base.contains(char::is_whitespace) {
        return Err(Error::Config(format!(
            "Invalid base '{}': whitespace is not allowed",
            base
        )));
    }

    if raw.theme.appearance_key.trim().is_empty() {
        return Err(Error::Config(
            "'theme.appearance_key' must not be empty".to_string(),
        ));
    }

    for route in &raw.additional_routes {
        if !route.starts_with('/') {
            return Err(Error::Config(format!(
                "Additional route '{}' must start with '/'",
                route
            )));
        }
    }

    Ok(BuildConfig {
        project_dir: defaults.project_dir,
        root,
        out_dir,
        temp_dir,
        public_dir,
        base,
        ssg: raw.ssg.unwrap_or(defaults.ssg),
        title: raw.title.unwrap_or(defaults.title),
        description: raw.description,
        lang: raw.lang.unwrap_or(defaults.lang),
        head: raw.head,
        additional_routes: raw.additional_routes,
        theme: raw.theme,
        bundler: raw.bundler,
        renderer: raw.renderer,
    })
}

/// Validate and convert a path string to PathBuf.
///
/// Rejects absolute paths and parent directory references so that every
/// configured directory stays inside the project. Build steps delete and
/// recreate some of these directories.
fn validate_path(path_str: &str, field_name: &str) -> Result<PathBuf> {
    let path = Path::new(path_str);

    if path.is_absolute() {
        return Err(Error::Config(format!(
            "Absolute paths not allowed in '{}': '{}'. Use relative paths only.",
            field_name, path_str
        )));
    }

    for component in path.components() {
        if component == std::path::Component::ParentDir {
            return Err(Error::Config(format!(
                "Parent directory references (..) not allowed in '{}': '{}'",
                field_name, path_str
            )));
        }
    }

    if path_str.trim().is_empty() || path_str.trim() == "." {
        return Err(Error::Config(format!(
            "Empty path in '{}' field",
            field_name
        )));
    }

    Ok(path.to_path_buf())
}
