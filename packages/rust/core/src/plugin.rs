//! Plugin capability and the per-build services handed to each plugin.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use docsetbuilder_shared::{BuildConfig, DocsetError, PluginOutput, Result};
use tracing::{debug, info};

use crate::assembler::copy_tree;

/// Name of the temp root created under the working directory.
pub const TEMP_DIR_NAME: &str = "._docset_tmp";

/// A unit of work that contributes entries, content, and manifest additions.
///
/// Plugins run one at a time, in configured order. Returning an error aborts
/// the build.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    async fn execute(&self, ctx: &PluginContext<'_>) -> Result<PluginOutput>;
}

/// A configured plugin instance.
pub struct PluginDescriptor {
    pub plugin: Box<dyn Plugin>,
    pub options: serde_json::Value,
    pub use_as_index: bool,
}

impl PluginDescriptor {
    pub fn new(plugin: impl Plugin + 'static) -> Self {
        Self {
            plugin: Box::new(plugin),
            options: serde_json::Value::Object(serde_json::Map::new()),
            use_as_index: false,
        }
    }

    pub fn with_options(mut self, options: serde_json::Value) -> Self {
        self.options = options;
        self
    }

    pub fn use_as_index(mut self, use_as_index: bool) -> Self {
        self.use_as_index = use_as_index;
        self
    }

    pub fn name(&self) -> &str {
        self.plugin.name()
    }
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("name", &self.plugin.name())
            .field("options", &self.options)
            .field("use_as_index", &self.use_as_index)
            .finish()
    }
}

/// Everything a plugin may use while it runs.
pub struct PluginContext<'a> {
    /// Free-form `key=value` arguments from the command line.
    pub cli_args: &'a BTreeMap<String, String>,
    /// This plugin's own options.
    pub plugin_options: &'a serde_json::Value,
    /// The resolved build configuration.
    pub main_options: &'a BuildConfig,
    pub working_dir: &'a Path,
    pub temp: &'a TempFolders,
    pub includer: &'a ContentIncluder,
}

impl PluginContext<'_> {
    /// Allocate a fresh scratch directory path (not created).
    pub fn create_tmp_folder(&self) -> PathBuf {
        self.temp.allocate()
    }

    /// Copy `path` into the package documents, optionally under
    /// `root_dir_name`. No-op in dry-run.
    pub async fn include(&self, path: &Path, root_dir_name: Option<&str>) -> Result<usize> {
        self.includer.include(path, root_dir_name).await
    }

    pub fn dry_run(&self) -> bool {
        self.main_options.dry_run
    }

    /// Resolve an option path against the working directory.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        self.working_dir.join(path)
    }
}

// ---------------------------------------------------------------------------
// Temp folders
// ---------------------------------------------------------------------------

/// Hands out unique scratch directories under one root for a single build.
#[derive(Debug)]
pub struct TempFolders {
    root: PathBuf,
    counter: AtomicU32,
}

impl TempFolders {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            counter: AtomicU32::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<n>`; distinct on every call within this allocator.
    pub fn allocate(&self) -> PathBuf {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        self.root.join(n.to_string())
    }

    /// Remove the whole temp root if it exists.
    pub async fn cleanup(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.root).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(&self.root)
                .await
                .map_err(|e| DocsetError::io(&self.root, e))?;
            debug!(path = %self.root.display(), "removed temp root");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Content inclusion
// ---------------------------------------------------------------------------

/// Copies plugin content into the package's `Documents` directory.
#[derive(Debug, Clone)]
pub struct ContentIncluder {
    documents_dir: PathBuf,
    dry_run: bool,
}

impl ContentIncluder {
    pub fn new(documents_dir: impl Into<PathBuf>, dry_run: bool) -> Self {
        Self {
            documents_dir: documents_dir.into(),
            dry_run,
        }
    }

    /// Copy the tree at `source` into `Documents[/root_dir_name]`. Existing
    /// files are overwritten. Returns the number of files copied.
    pub async fn include(&self, source: &Path, root_dir_name: Option<&str>) -> Result<usize> {
        let dest = match root_dir_name {
            Some(name) if !name.is_empty() => {
                let rel = Path::new(name);
                if rel
                    .components()
                    .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
                {
                    return Err(DocsetError::validation(format!(
                        "root_dir_name '{name}' must be a relative path inside the package"
                    )));
                }
                self.documents_dir.join(rel)
            }
            _ => self.documents_dir.clone(),
        };

        if self.dry_run {
            debug!(source = %source.display(), dest = %dest.display(), "dry run, skipping include");
            return Ok(0);
        }

        let copied = copy_tree(source, &dest).await?;
        info!(source = %source.display(), dest = %dest.display(), files = copied, "included content");
        Ok(copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dsb-{label}-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn temp_folders_are_unique() {
        let temp = TempFolders::new("/work/._docset_tmp");
        let a = temp.allocate();
        let b = temp.allocate();
        assert_ne!(a, b);
        assert_eq!(a, PathBuf::from("/work/._docset_tmp/0"));
        assert!(b.starts_with(temp.root()));
    }

    #[test]
    fn counter_is_per_allocator() {
        let first = TempFolders::new("/a");
        first.allocate();
        let second = TempFolders::new("/b");
        assert_eq!(second.allocate(), PathBuf::from("/b/0"));
    }

    #[tokio::test]
    async fn cleanup_removes_root() {
        let root = temp_dir("tmp-root");
        let temp = TempFolders::new(root.join(TEMP_DIR_NAME));
        let scratch = temp.allocate();
        std::fs::create_dir_all(&scratch).unwrap();
        std::fs::write(scratch.join("f.txt"), "x").unwrap();

        temp.cleanup().await.unwrap();
        assert!(!temp.root().exists());
        temp.cleanup().await.unwrap();

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn include_copies_under_root_dir_name() {
        let src = temp_dir("include-src");
        std::fs::create_dir_all(src.join("sub")).unwrap();
        std::fs::write(src.join("a.html"), "a").unwrap();
        std::fs::write(src.join("sub/b.html"), "b").unwrap();
        let docs = temp_dir("include-docs");

        let includer = ContentIncluder::new(&docs, false);
        let copied = includer.include(&src, Some("api")).await.unwrap();
        assert_eq!(copied, 2);
        assert!(docs.join("api/a.html").is_file());
        assert!(docs.join("api/sub/b.html").is_file());

        std::fs::write(src.join("a.html"), "newer").unwrap();
        includer.include(&src, Some("api")).await.unwrap();
        assert_eq!(std::fs::read_to_string(docs.join("api/a.html")).unwrap(), "newer");

        let _ = std::fs::remove_dir_all(&src);
        let _ = std::fs::remove_dir_all(&docs);
    }

    #[tokio::test]
    async fn include_is_noop_in_dry_run() {
        let src = temp_dir("dry-src");
        std::fs::write(src.join("a.html"), "a").unwrap();
        let docs = temp_dir("dry-docs");

        let includer = ContentIncluder::new(&docs, true);
        assert_eq!(includer.include(&src, None).await.unwrap(), 0);
        assert!(!docs.join("a.html").exists());

        let _ = std::fs::remove_dir_all(&src);
        let _ = std::fs::remove_dir_all(&docs);
    }

    #[tokio::test]
    async fn include_rejects_escaping_root_dir_name() {
        let includer = ContentIncluder::new("/nonexistent/docs", false);
        let err = includer
            .include(Path::new("/nonexistent/src"), Some("../outside"))
            .await
            .unwrap_err();
        assert!(matches!(err, DocsetError::Validation { .. }));
    }
}
