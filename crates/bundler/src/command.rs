use crate::builtin::BuiltinBundler;
use crate::{BundleTarget, Bundler};
use async_trait::async_trait;
use docpress_core::config::BundlerCommands;
use docpress_core::{BuildConfig, Error, Result, RouteTable};
use tokio::process::Command;

/// Runs user-configured shell commands to produce bundles.
///
/// A target without a command falls back to the built-in bundler for that
/// target. The command runs in the project directory with
/// `DOCPRESS_TARGET`, `DOCPRESS_OUT_DIR`, `DOCPRESS_TEMP_DIR` and
/// `DOCPRESS_BASE` set.
#[derive(Debug, Clone)]
pub struct CommandBundler {
    commands: BundlerCommands,
}

impl CommandBundler {
    pub fn new(commands: BundlerCommands) -> Self {
        Self { commands }
    }

    fn command_for(&self, target: BundleTarget) -> Option<&str> {
        match target {
            BundleTarget::Client => self.commands.client.as_deref(),
            BundleTarget::Server => self.commands.server.as_deref(),
        }
    }
}

#[async_trait]
impl Bundler for CommandBundler {
    fn name(&self) -> &str {
        "command"
    }

    async fn bundle(
        &self,
        target: BundleTarget,
        config: &BuildConfig,
        routes: &RouteTable,
    ) -> Result<()> {
        let Some(command) = self.command_for(target) else {
            return BuiltinBundler.bundle(target, config, routes).await;
        };

        tracing::info!(%target, command, "Running bundler command");
        let output = Command::new("sh")
            .args(["-c", command])
            .current_dir(&config.project_dir)
            .env("DOCPRESS_TARGET", target.as_str())
            .env("DOCPRESS_OUT_DIR", config.out_path())
            .env("DOCPRESS_TEMP_DIR", config.temp_path())
            .env("DOCPRESS_BASE", &config.base)
            .output()
            .await
            .map_err(|e| Error::Bundle {
                target: target.to_string(),
                message: format!("failed to run '{}': {}", command, e),
            })?;

        if !output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut message = format!("'{}' exited with status {}", command, output.status);
            if !stderr.is_empty() {
                message.push('\n');
                message.push_str(&stderr);
            }
            if !stdout.is_empty() {
                message.push('\n');
                message.push_str(&stdout);
            }
            return Err(Error::Bundle {
                target: target.to_string(),
                message,
            });
        }

        Ok(())
    }
}
