//! `static` plugin: ship a prepared directory with a hand-written entry list.

use async_trait::async_trait;
use docsetbuilder_core::{Plugin, PluginContext};
use docsetbuilder_shared::{DocsetEntries, ManifestFragment, PluginOutput, Result};
use serde::Deserialize;
use tracing::debug;

use crate::parse_options;

const NAME: &str = "static";

#[derive(Debug, Default, Deserialize)]
struct StaticOptions {
    /// Directory (or file) to include, relative to the working directory.
    path: Option<String>,
    root_dir_name: Option<String>,
    #[serde(default)]
    entries: DocsetEntries,
    #[serde(default)]
    manifest: ManifestFragment,
}

/// Includes `options.path` and returns `options.entries` / `options.manifest`
/// as they are.
#[derive(Debug, Default)]
pub struct StaticPlugin;

#[async_trait]
impl Plugin for StaticPlugin {
    fn name(&self) -> &str {
        NAME
    }

    async fn execute(&self, ctx: &PluginContext<'_>) -> Result<PluginOutput> {
        let options: StaticOptions = parse_options(NAME, ctx.plugin_options)?;

        if let Some(path) = &options.path {
            let source = ctx.resolve_path(path);
            ctx.include(&source, options.root_dir_name.as_deref()).await?;
        }

        debug!(entries = options.entries.len(), "static entries");
        Ok(PluginOutput {
            entries: options.entries,
            manifest: (!options.manifest.is_empty()).then_some(options.manifest),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;

    #[tokio::test]
    async fn returns_configured_entries_and_includes_path() {
        let harness = Harness::new(
            "static",
            serde_json::json!({
                "path": "extra",
                "root_dir_name": "static",
                "entries": { "index": "static/page.html", "Guide": { "Page": "static/page.html" } },
                "manifest": { "DashDocSetFamily": "dashtoc" }
            }),
        );
        harness.write("extra/page.html", "<html></html>");

        let output = StaticPlugin.execute(&harness.ctx()).await.unwrap();
        assert_eq!(output.entries.index.as_deref(), Some("static/page.html"));
        assert_eq!(output.entries.len(), 1);
        assert_eq!(
            output.manifest.and_then(|m| m.get("DashDocSetFamily").cloned()),
            Some("dashtoc".to_string())
        );
        assert!(harness.documents.join("static/page.html").is_file());
    }

    #[tokio::test]
    async fn entries_only_without_path() {
        let harness = Harness::new(
            "static-entries",
            serde_json::json!({ "entries": { "Class": { "Foo": "Foo.html" } } }),
        );
        let output = StaticPlugin.execute(&harness.ctx()).await.unwrap();
        assert_eq!(output.entries.len(), 1);
        assert!(output.manifest.is_none());
        assert!(!harness.documents.exists());
    }

    #[tokio::test]
    async fn rejects_malformed_options() {
        let harness = Harness::new(
            "static-bad",
            serde_json::json!({ "entries": ["not", "a", "map"] }),
        );
        let err = StaticPlugin.execute(&harness.ctx()).await.unwrap_err();
        assert!(err.to_string().contains("plugin 'static' failed"));
    }
}
