//! `html` plugin: derive entries from a directory of HTML pages.

use std::path::Path;
use std::sync::LazyLock;

use async_trait::async_trait;
use docsetbuilder_core::{Plugin, PluginContext};
use docsetbuilder_shared::{DocsetEntries, DocsetError, PluginOutput, Result};
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::parse_options;

const NAME: &str = "html";

fn default_selector() -> String {
    "title".into()
}

fn default_type() -> String {
    "Guide".into()
}

#[derive(Debug, Deserialize)]
struct HtmlOptions {
    /// Directory of pages, relative to the working directory.
    path: String,
    root_dir_name: Option<String>,
    /// CSS selector whose first match titles the page.
    #[serde(default = "default_selector")]
    selector: String,
    /// Entry type for pages.
    #[serde(default = "default_type", rename = "type")]
    entry_type: String,
    /// Also emit a `Section` entry for every `h2[id]`.
    #[serde(default)]
    sections: bool,
}

/// Walks `options.path` for `*.html` files, includes the tree, and emits one
/// entry per page.
#[derive(Debug, Default)]
pub struct HtmlPlugin;

#[async_trait]
impl Plugin for HtmlPlugin {
    fn name(&self) -> &str {
        NAME
    }

    async fn execute(&self, ctx: &PluginContext<'_>) -> Result<PluginOutput> {
        let options: HtmlOptions = parse_options(NAME, ctx.plugin_options)?;
        let title_sel = Selector::parse(&options.selector).map_err(|e| {
            DocsetError::plugin(NAME, format!("invalid selector '{}': {e}", options.selector))
        })?;

        let root = ctx.resolve_path(&options.path);
        if !root.is_dir() {
            return Err(DocsetError::plugin(
                NAME,
                format!("{} is not a directory", root.display()),
            ));
        }

        let prefix = options
            .root_dir_name
            .as_deref()
            .map(|r| r.trim_matches('/'))
            .filter(|r| !r.is_empty());

        let mut entries = DocsetEntries::new();
        for rel in html_files(&root)? {
            let file = root.join(&rel);
            let content = tokio::fs::read_to_string(&file)
                .await
                .map_err(|e| DocsetError::io(&file, e))?;
            let page_path = match prefix {
                Some(prefix) => format!("{prefix}/{rel}"),
                None => rel.clone(),
            };

            let page = parse_page(&content, &title_sel, options.sections);
            let title = page.title.unwrap_or_else(|| file_stem(&rel));
            debug!(path = %page_path, %title, sections = page.sections.len(), "page scanned");

            if rel == "index.html" {
                entries.index = Some(page_path.clone());
            }
            entries.push(options.entry_type.as_str(), title, page_path.as_str());
            for (name, id) in page.sections {
                entries.push("Section", name, format!("{page_path}#{id}"));
            }
        }

        ctx.include(&root, prefix).await?;
        info!(pages = entries.len(), root = %root.display(), "html pages indexed");
        Ok(PluginOutput::new(entries))
    }
}

/// `/`-separated paths of every HTML file under `root`, in sorted order.
fn html_files(root: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| DocsetError::io(root, e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_html = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
        if !is_html {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            let parts: Vec<_> = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect();
            files.push(parts.join("/"));
        }
    }
    Ok(files)
}

#[derive(Debug, Default)]
struct ScannedPage {
    title: Option<String>,
    /// `(heading text, id)` of every `h2[id]`.
    sections: Vec<(String, String)>,
}

fn parse_page(content: &str, title_sel: &Selector, sections: bool) -> ScannedPage {
    static H1: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("h1").expect("valid selector"));
    static H2_ID: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("h2[id]").expect("valid selector"));

    let doc = Html::parse_document(content);
    let title = first_text(&doc, title_sel).or_else(|| first_text(&doc, &H1));

    let sections = if sections {
        doc.select(&H2_ID)
            .filter_map(|el| {
                let id = el.value().attr("id")?.trim();
                let text = fold_whitespace(&el.text().collect::<String>());
                (!id.is_empty() && !text.is_empty()).then(|| (text, id.to_string()))
            })
            .collect()
    } else {
        Vec::new()
    };

    ScannedPage { title, sections }
}

fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .map(|el| fold_whitespace(&el.text().collect::<String>()))
        .find(|t| !t.is_empty())
}

/// Collapse runs of whitespace to one space and trim.
fn fold_whitespace(text: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
    WS_RE.replace_all(text.trim(), " ").into_owned()
}

fn file_stem(rel: &str) -> String {
    Path::new(rel)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| rel.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    const INDEX: &str = "<html><head><title>\n  Welcome   Home\n</title></head><body></body></html>";
    const GUIDE: &str = r#"<html><body>
        <h1>Getting Started</h1>
        <h2 id="install">Install</h2>
        <h2>No id</h2>
        <h2 id="usage">Basic
            usage</h2>
    </body></html>"#;

    #[test]
    fn folds_whitespace() {
        assert_eq!(fold_whitespace("  a \n\t b  "), "a b");
    }

    #[test]
    fn title_falls_back_to_h1() {
        let sel = Selector::parse("title").unwrap();
        let page = parse_page(GUIDE, &sel, true);
        assert_eq!(page.title.as_deref(), Some("Getting Started"));
        assert_eq!(
            page.sections,
            vec![
                ("Install".to_string(), "install".to_string()),
                ("Basic usage".to_string(), "usage".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn scans_pages_and_sections() {
        let harness = Harness::new(
            "html",
            serde_json::json!({ "path": "site", "root_dir_name": "guide", "sections": true }),
        );
        harness.write("site/index.html", INDEX);
        harness.write("site/start/guide.html", GUIDE);
        harness.write("site/untitled.html", "<html><body><p>x</p></body></html>");
        harness.write("site/style.css", "body {}");

        let output = HtmlPlugin.execute(&harness.ctx()).await.unwrap();
        let entries = output.entries;
        assert_eq!(entries.index.as_deref(), Some("guide/index.html"));

        let all: Vec<_> = entries.iter().map(|(t, n, p)| (t.as_str(), n, p)).collect();
        assert!(all.contains(&("Guide", "Welcome Home", "guide/index.html")));
        assert!(all.contains(&("Guide", "Getting Started", "guide/start/guide.html")));
        assert!(all.contains(&("Guide", "untitled", "guide/untitled.html")));
        assert!(all.contains(&("Section", "Install", "guide/start/guide.html#install")));
        assert_eq!(entries.len(), 5);

        assert!(harness.documents.join("guide/start/guide.html").is_file());
        assert!(harness.documents.join("guide/style.css").is_file());
    }

    #[tokio::test]
    async fn custom_selector_and_type() {
        let harness = Harness::new(
            "html-custom",
            serde_json::json!({ "path": "site", "selector": "h2", "type": "Chapter" }),
        );
        harness.write("site/guide.html", GUIDE);

        let output = HtmlPlugin.execute(&harness.ctx()).await.unwrap();
        let (ty, name, path) = output.entries.iter().next().unwrap();
        assert_eq!(ty.as_str(), "Chapter");
        assert_eq!(name, "Install");
        assert_eq!(path, "guide.html");
        assert!(output.entries.index.is_none());
    }

    #[tokio::test]
    async fn missing_directory_is_plugin_error() {
        let harness = Harness::new("html-missing", serde_json::json!({ "path": "nowhere" }));
        let err = HtmlPlugin.execute(&harness.ctx()).await.unwrap_err();
        assert!(matches!(err, DocsetError::PluginExecution { ref plugin, .. } if plugin == "html"));
    }
}
