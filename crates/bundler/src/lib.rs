// Client and server bundling for a build

pub mod builtin;
pub mod command;
pub mod public;

use async_trait::async_trait;
use docpress_core::{BuildConfig, Result, RouteTable};
use std::fmt;

pub use builtin::{BuiltinBundler, default_template};
pub use command::CommandBundler;
pub use public::copy_public_dir;

/// Which bundle to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundleTarget {
    /// Browser bundle plus the HTML template
    Client,
    /// Server-render entry point used for static generation
    Server,
}

impl BundleTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleTarget::Client => "client",
            BundleTarget::Server => "server",
        }
    }
}

impl fmt::Display for BundleTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait Bundler: Send + Sync {
    fn name(&self) -> &str;

    async fn bundle(
        &self,
        target: BundleTarget,
        config: &BuildConfig,
        routes: &RouteTable,
    ) -> Result<()>;
}

/// Pick the bundler described by the configuration
pub fn from_config(config: &BuildConfig) -> Box<dyn Bundler> {
    if config.bundler.is_external() {
        Box::new(CommandBundler::new(config.bundler.clone()))
    } else {
        Box::new(BuiltinBundler)
    }
}
