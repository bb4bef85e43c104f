use super::SsrRenderer;
use async_trait::async_trait;
use docpress_core::{Error, HeadTags, PageData, RenderResult, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tokio::process::Command;

/// Imports the server bundle, calls `render(url, helmetContext)` and prints
/// the result as JSON on stdout.
const BOOTSTRAP: &str = r#"
const { pathToFileURL } = require('node:url');
(async () => {
  const [entry, url] = process.argv.slice(-2);
  const mod = await import(pathToFileURL(entry).href);
  const ssr = mod.default ?? mod;
  const helmetContext = {};
  const { appHtml, pageData } = await ssr.render(url, helmetContext);
  const helmet = helmetContext.helmet ?? {};
  const str = (key) => (helmet[key] ? helmet[key].toString() : '');
  process.stdout.write(JSON.stringify({
    appHtml: appHtml ?? '',
    pageData: pageData ?? {},
    helmet: {
      title: str('title'),
      meta: str('meta'),
      link: str('link'),
      style: str('style'),
      script: str('script'),
      htmlAttributes: str('htmlAttributes'),
      bodyAttributes: str('bodyAttributes'),
    },
  }));
})().catch((err) => {
  console.error((err && err.stack) || String(err));
  process.exit(1);
});
"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommandOutput {
    app_html: String,
    #[serde(default)]
    page_data: PageData,
    #[serde(default)]
    helmet: HeadTags,
}

/// Server renderer backed by an external process, one invocation per URL.
///
/// The process receives the URL as its last argument and must print
/// `{ "appHtml", "pageData", "helmet" }` as JSON.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: String,
    args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Run a JavaScript server bundle with `runtime` (node, bun, ...)
    pub fn javascript(runtime: impl Into<String>, entry: PathBuf) -> Self {
        Self::new(
            runtime,
            vec![
                "-e".to_string(),
                BOOTSTRAP.to_string(),
                entry.to_string_lossy().into_owned(),
            ],
        )
    }
}

#[async_trait]
impl SsrRenderer for CommandRenderer {
    async fn render(&self, url: &str, head: &mut HeadTags) -> Result<RenderResult> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .output()
            .await
            .map_err(|e| Error::render(url, format!("failed to run {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::render(
                url,
                format!("{} exited with status {}: {}", self.program, output.status, stderr.trim()),
            ));
        }

        let parsed: CommandOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| Error::render(url, format!("invalid renderer output: {}", e)))?;

        *head = parsed.helmet;
        Ok(RenderResult {
            app_html: parsed.app_html,
            page_data: parsed.page_data,
        })
    }
}
