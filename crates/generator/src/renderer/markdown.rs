use super::SsrRenderer;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docpress_core::{BuildConfig, Error, HeadTags, PageData, RenderResult, Result, RouteTable};
use docpress_router::node::escape_html;
use docpress_router::{Node, RouteMatcher, TransitionContent, TransitionOptions};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Route content: the page's route and its source document
#[derive(Debug)]
struct PageSource {
    route_path: String,
    file: Option<PathBuf>,
}

/// A page read from disk
#[derive(Debug, Default)]
struct LoadedPage {
    html: String,
    title: Option<String>,
    frontmatter: Map<String, Value>,
    last_updated: Option<String>,
}

/// Native server renderer for Markdown documents
pub struct MarkdownRenderer {
    matcher: RouteMatcher<PageSource>,
    options: TransitionOptions,
    site_title: String,
    site_description: Option<String>,
}

impl MarkdownRenderer {
    pub fn new(
        root: PathBuf,
        table: &RouteTable,
        config: &BuildConfig,
        options: TransitionOptions,
    ) -> Self {
        let matcher = RouteMatcher::from_table(table, |route| PageSource {
            route_path: route.path.clone(),
            file: route.source.as_ref().map(|s| root.join(s)),
        });

        Self {
            matcher,
            options,
            site_title: config.title.clone(),
            site_description: config.description.clone(),
        }
    }
}

#[async_trait]
impl SsrRenderer for MarkdownRenderer {
    async fn render(&self, url: &str, head: &mut HeadTags) -> Result<RenderResult> {
        let content = self.matcher.resolve(url);

        // Lazily load the document behind the matched route
        let page = match content.as_ref().and_then(|c| c.file.as_deref()) {
            Some(file) => load_page(file).await.map_err(|e| Error::render(url, e))?,
            None => LoadedPage::default(),
        };

        let body = page.html.clone();
        // Server renders are one-shot per URL and run concurrently, so each
        // gets its own transition state; memoization only pays off across
        // re-renders on the client.
        let mut transition = TransitionContent::new(self.options);
        let node = transition.render(content.clone(), |source| {
            Node::element(
                "main",
                vec![
                    ("class".to_string(), "docpress-doc".to_string()),
                    ("data-route".to_string(), source.route_path.clone()),
                ],
                vec![Node::Raw(body)],
            )
        });

        let title = match page.title.as_deref() {
            Some(t) if t != self.site_title => format!("{} | {}", t, self.site_title),
            _ => self.site_title.clone(),
        };
        head.title = format!("<title>{}</title>", escape_html(&title));

        let description = page
            .frontmatter
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.site_description.clone());
        if let Some(description) = &description {
            head.meta = format!(
                r#"<meta name="description" content="{}">"#,
                escape_html(description)
            );
        }

        if content.is_some() {
            let page_type = page
                .frontmatter
                .get("page_type")
                .and_then(Value::as_str)
                .unwrap_or("doc");
            head.body_attributes = format!(r#"data-page-type="{}""#, escape_html(page_type));
        }

        Ok(RenderResult {
            app_html: node.to_html(),
            page_data: PageData {
                route_path: content
                    .as_ref()
                    .map(|c| c.route_path.clone())
                    .unwrap_or_else(|| url.to_string()),
                title: page.title.unwrap_or_else(|| self.site_title.clone()),
                description,
                frontmatter: page.frontmatter,
                last_updated: page.last_updated,
            },
        })
    }
}

async fn load_page(file: &Path) -> Result<LoadedPage> {
    let source = fs::read_to_string(file).await?;
    let (frontmatter, body) = split_frontmatter(&source)?;

    let last_updated = fs::metadata(file)
        .await?
        .modified()
        .ok()
        .map(|t| DateTime::<Utc>::from(t).to_rfc3339());

    let title = frontmatter
        .get("title")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| first_heading(body));

    Ok(LoadedPage {
        html: render_markdown(body),
        title,
        frontmatter,
        last_updated,
    })
}

/// Split a leading `+++` TOML front matter block from the document body
pub fn split_frontmatter(source: &str) -> Result<(Map<String, Value>, &str)> {
    let Some(rest) = source
        .strip_prefix("+++\n")
        .or_else(|| source.strip_prefix("+++\r\n"))
    else {
        return Ok((Map::new(), source));
    };

    let (raw, body) = if let Some(body) = rest.strip_prefix("+++") {
        ("", body)
    } else {
        let end = rest
            .find("\n+++")
            .ok_or_else(|| Error::Config("unterminated front matter block".to_string()))?;
        (&rest[..end], &rest[end + 4..])
    };
    let body = body.trim_start_matches(['\r', '\n']);

    let table: toml::Table = toml::from_str(raw)?;
    match serde_json::to_value(table)? {
        Value::Object(map) => Ok((map, body)),
        _ => Ok((Map::new(), body)),
    }
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
}

pub fn render_markdown(body: &str) -> String {
    let mut out = String::with_capacity(body.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(body, markdown_options()));
    out
}

/// Plain text of the first level-one heading
pub fn first_heading(body: &str) -> Option<String> {
    let mut in_heading = false;
    let mut text = String::new();

    for event in Parser::new_ext(body, markdown_options()) {
        match event {
            Event::Start(Tag::Heading {
                level: HeadingLevel::H1,
                ..
            }) => in_heading = true,
            Event::Text(t) | Event::Code(t) if in_heading => text.push_str(&t),
            Event::End(TagEnd::Heading(HeadingLevel::H1)) if in_heading => {
                return Some(text.trim().to_string());
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpress_core::{RenderMode, Route};
    use tempfile::TempDir;

    const PAGE: &str = r#"+++
title = "Getting Started"
description = "First steps"
page_type = "home"
+++

# Ignored Heading

Some *text* with `$&`.
"#;

    fn renderer(dir: &TempDir, options: TransitionOptions) -> MarkdownRenderer {
        let root = dir.path().join("docs");
        std::fs::create_dir_all(root.join("guide")).unwrap();
        std::fs::write(root.join("guide").join("start.md"), PAGE).unwrap();
        std::fs::write(root.join("index.md"), "# Home\n\nWelcome").unwrap();

        let table = RouteTable::new(
            "/docs",
            vec![
                Route::new("/docs/").with_source("index.md"),
                Route::new("/docs/guide/start").with_source("guide/start.md"),
                Route::new("/docs/broken").with_source("missing.md"),
                Route::new("/docs/changelog/"),
            ],
        )
        .unwrap();
        let config = BuildConfig {
            title: "Site".to_string(),
            ..BuildConfig::default()
        };
        MarkdownRenderer::new(root, &table, &config, options)
    }

    fn server(render_mode: RenderMode) -> TransitionOptions {
        TransitionOptions {
            enable_content_animation: false,
            render_mode,
            server: true,
        }
    }

    #[test]
    fn test_split_frontmatter() {
        let (fm, body) = split_frontmatter(PAGE).unwrap();
        assert_eq!(fm.get("title").and_then(Value::as_str), Some("Getting Started"));
        assert!(body.starts_with("# Ignored Heading"));

        let (fm, body) = split_frontmatter("# Plain").unwrap();
        assert!(fm.is_empty());
        assert_eq!(body, "# Plain");

        assert!(split_frontmatter("+++\ntitle = \"x\"\n").is_err());
    }

    #[test]
    fn test_first_heading() {
        assert_eq!(
            first_heading("intro\n\n# The `API` Guide\n\n# Second"),
            Some("The API Guide".to_string())
        );
        assert_eq!(first_heading("## Only h2"), None);
    }

    #[tokio::test]
    async fn test_renders_page_with_frontmatter() {
        let dir = TempDir::new().unwrap();
        let renderer = renderer(&dir, server(RenderMode::Concurrent));
        let mut head = HeadTags::default();

        let result = renderer.render("/docs/guide/start/", &mut head).await.unwrap();

        assert!(result.app_html.starts_with(
            "<!--$--><main class=\"docpress-doc\" data-route=\"/docs/guide/start\">"
        ));
        assert!(result.app_html.contains("<em>text</em>"));
        assert!(result.app_html.contains("<code>$&amp;</code>"));
        assert_eq!(head.title, "<title>Getting Started | Site</title>");
        assert_eq!(head.meta, r#"<meta name="description" content="First steps">"#);
        assert_eq!(head.body_attributes, r#"data-page-type="home""#);
        assert_eq!(result.page_data.title, "Getting Started");
        assert_eq!(result.page_data.route_path, "/docs/guide/start");
        assert!(result.page_data.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_title_from_heading() {
        let dir = TempDir::new().unwrap();
        let renderer = renderer(&dir, server(RenderMode::Concurrent));
        let mut head = HeadTags::default();
        let result = renderer.render("/docs/", &mut head).await.unwrap();
        assert_eq!(result.page_data.title, "Home");
        assert_eq!(head.title, "<title>Home | Site</title>");
    }

    #[tokio::test]
    async fn test_legacy_mode_has_no_suspense_markers() {
        let dir = TempDir::new().unwrap();
        let renderer = renderer(&dir, server(RenderMode::Legacy));
        let mut head = HeadTags::default();
        let result = renderer.render("/docs/", &mut head).await.unwrap();
        assert!(result.app_html.starts_with("<main"));
        assert!(!result.app_html.contains("<!--$-->"));
    }

    #[tokio::test]
    async fn test_route_without_source_renders_empty_main() {
        let dir = TempDir::new().unwrap();
        let renderer = renderer(&dir, server(RenderMode::Legacy));
        let mut head = HeadTags::default();
        let result = renderer.render("/docs/changelog/", &mut head).await.unwrap();
        assert_eq!(
            result.app_html,
            r#"<main class="docpress-doc" data-route="/docs/changelog/"></main>"#
        );
        assert_eq!(head.title, "<title>Site</title>");
    }

    #[tokio::test]
    async fn test_unmatched_url_renders_placeholder() {
        let dir = TempDir::new().unwrap();
        let renderer = renderer(&dir, server(RenderMode::Concurrent));
        let mut head = HeadTags::default();
        let result = renderer.render("/docs/nowhere", &mut head).await.unwrap();
        assert_eq!(result.app_html, "");
        assert_eq!(result.page_data.route_path, "/docs/nowhere");
        assert!(head.body_attributes.is_empty());
    }

    #[tokio::test]
    async fn test_renders_do_not_share_state() {
        let dir = TempDir::new().unwrap();
        let renderer = renderer(&dir, server(RenderMode::Concurrent));

        let mut head = HeadTags::default();
        let home = renderer.render("/docs/", &mut head).await.unwrap();
        let mut head = HeadTags::default();
        let start = renderer.render("/docs/guide/start", &mut head).await.unwrap();
        let mut head = HeadTags::default();
        let again = renderer.render("/docs/", &mut head).await.unwrap();

        assert_eq!(home.app_html, again.app_html);
        assert_ne!(home.app_html, start.app_html);
        assert_eq!(head.title, "<title>Home | Site</title>");

        // Edits on disk are picked up by the next render of the same URL
        std::fs::write(dir.path().join("docs").join("index.md"), "# Changed").unwrap();
        let mut head = HeadTags::default();
        let changed = renderer.render("/docs/", &mut head).await.unwrap();
        assert!(changed.app_html.contains("<h1>Changed</h1>"));
    }

    #[tokio::test]
    async fn test_missing_source_is_render_error() {
        let dir = TempDir::new().unwrap();
        let renderer = renderer(&dir, server(RenderMode::Concurrent));
        let mut head = HeadTags::default();
        let err = renderer.render("/docs/broken", &mut head).await.unwrap_err();
        assert!(matches!(err, Error::Render { .. }));
    }
}
