//! Docset package assembler.
//!
//! Owns the on-disk layout of `<identifier>.docset` and writes its pieces:
//! documents, search index, manifest, and icons.

use std::path::{Path, PathBuf};

use docsetbuilder_plist::InfoPlist;
use docsetbuilder_shared::{DocsetError, Entry, Result};
use docsetbuilder_storage::{InsertStats, SearchIndex};
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// Icon files copied from `icons_path` when present.
pub const ICON_FILES: [&str; 2] = ["icon.png", "icon@2x.png"];

/// Paths of a docset package.
///
/// ```text
/// <output>/<identifier>.docset/
/// ├── icon.png, icon@2x.png
/// └── Contents/
///     ├── Info.plist
///     └── Resources/
///         ├── docSet.dsidx
///         └── Documents/
/// ```
#[derive(Debug, Clone)]
pub struct DocsetLayout {
    pub root: PathBuf,
    pub contents: PathBuf,
    pub resources: PathBuf,
    pub documents: PathBuf,
    pub search_index: PathBuf,
    pub info_plist: PathBuf,
}

impl DocsetLayout {
    pub fn new(output_path: &Path, identifier: &str) -> Self {
        Self::from_root(output_path.join(format!("{identifier}.docset")))
    }

    /// Layout of an existing package directory.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let contents = root.join("Contents");
        let resources = contents.join("Resources");
        Self {
            documents: resources.join("Documents"),
            search_index: resources.join("docSet.dsidx"),
            info_plist: contents.join("Info.plist"),
            root,
            contents,
            resources,
        }
    }

    /// Sibling archive path (`<identifier>.docset.tgz`).
    pub fn archive(&self) -> PathBuf {
        let mut name = self.root.as_os_str().to_owned();
        name.push(".tgz");
        PathBuf::from(name)
    }

    /// Remove any previous package and archive, then create the empty
    /// directory skeleton.
    pub async fn reset(&self) -> Result<()> {
        if tokio::fs::try_exists(&self.root).await.unwrap_or(false) {
            tokio::fs::remove_dir_all(&self.root)
                .await
                .map_err(|e| DocsetError::io(&self.root, e))?;
            debug!(path = %self.root.display(), "removed previous package");
        }
        let archive = self.archive();
        if tokio::fs::try_exists(&archive).await.unwrap_or(false) {
            tokio::fs::remove_file(&archive)
                .await
                .map_err(|e| DocsetError::io(&archive, e))?;
            debug!(path = %archive.display(), "removed previous archive");
        }
        tokio::fs::create_dir_all(&self.documents)
            .await
            .map_err(|e| DocsetError::io(&self.documents, e))?;
        Ok(())
    }

    /// Best-effort removal of a half-built package.
    pub async fn discard(&self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.root).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.root.display(), error = %e, "failed to remove partial package");
            }
        }
    }
}

/// Copy the tree at `source` into `dest`, overwriting existing files.
/// A plain file is copied into `dest` under its own name.
pub async fn copy_tree(source: &Path, dest: &Path) -> Result<usize> {
    let metadata = tokio::fs::metadata(source)
        .await
        .map_err(|e| DocsetError::io(source, e))?;

    if metadata.is_file() {
        let file_name = source
            .file_name()
            .ok_or_else(|| DocsetError::validation(format!("{} has no file name", source.display())))?;
        tokio::fs::create_dir_all(dest)
            .await
            .map_err(|e| DocsetError::io(dest, e))?;
        let target = dest.join(file_name);
        tokio::fs::copy(source, &target)
            .await
            .map_err(|e| DocsetError::io(&target, e))?;
        return Ok(1);
    }

    let mut copied = 0;
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| DocsetError::io(source, e.into()))?;
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| DocsetError::validation(e.to_string()))?;
        let target = dest.join(rel);

        if entry.file_type().is_dir() {
            tokio::fs::create_dir_all(&target)
                .await
                .map_err(|e| DocsetError::io(&target, e))?;
        } else {
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| DocsetError::io(parent, e))?;
            }
            tokio::fs::copy(entry.path(), &target)
                .await
                .map_err(|e| DocsetError::io(&target, e))?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Copy the raw documentation tree into `Documents/`.
#[instrument(skip_all, fields(source = %docs_path.display()))]
pub async fn copy_docs(layout: &DocsetLayout, docs_path: &Path) -> Result<usize> {
    let copied = copy_tree(docs_path, &layout.documents).await?;
    info!(files = copied, "copied documentation tree");
    Ok(copied)
}

/// Copy `icon.png` / `icon@2x.png` into the package root. Missing icons are
/// logged and skipped.
pub async fn copy_icons(layout: &DocsetLayout, icons_path: &Path) -> Result<usize> {
    let mut copied = 0;
    for name in ICON_FILES {
        let source = icons_path.join(name);
        if !source.is_file() {
            warn!(path = %source.display(), "icon not found, skipping");
            continue;
        }
        let target = layout.root.join(name);
        tokio::fs::copy(&source, &target)
            .await
            .map_err(|e| DocsetError::io(&target, e))?;
        copied += 1;
    }
    Ok(copied)
}

/// Create `docSet.dsidx` and fill it with every typed entry.
#[instrument(skip_all)]
pub async fn write_search_index<'a>(
    layout: &DocsetLayout,
    entries: impl IntoIterator<Item = &'a Entry>,
) -> Result<InsertStats> {
    let index = SearchIndex::create(&layout.search_index).await?;
    let stats = index.insert_entries(entries).await?;
    info!(
        rows = stats.inserted,
        ignored = stats.ignored,
        path = %layout.search_index.display(),
        "search index written"
    );
    Ok(stats)
}

/// Write `Contents/Info.plist`.
pub fn write_manifest(layout: &DocsetLayout, plist: &InfoPlist) -> Result<()> {
    plist.write_to(&layout.info_plist)?;
    info!(path = %layout.info_plist.display(), "manifest written");
    Ok(())
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
    fn layout_paths() {
        let layout = DocsetLayout::new(Path::new("/out"), "mylib");
        assert_eq!(layout.root, PathBuf::from("/out/mylib.docset"));
        assert_eq!(
            layout.documents,
            PathBuf::from("/out/mylib.docset/Contents/Resources/Documents")
        );
        assert_eq!(
            layout.search_index,
            PathBuf::from("/out/mylib.docset/Contents/Resources/docSet.dsidx")
        );
        assert_eq!(layout.info_plist, PathBuf::from("/out/mylib.docset/Contents/Info.plist"));
        assert_eq!(layout.archive(), PathBuf::from("/out/mylib.docset.tgz"));
        assert_eq!(
            DocsetLayout::from_root("/out/mylib.docset").search_index,
            layout.search_index
        );
    }

    #[tokio::test]
    async fn reset_clears_previous_output() {
        let out = temp_dir("reset");
        let layout = DocsetLayout::new(&out, "mylib");
        std::fs::create_dir_all(&layout.documents).unwrap();
        std::fs::write(layout.documents.join("stale.html"), "old").unwrap();
        std::fs::write(layout.archive(), "tgz").unwrap();

        layout.reset().await.unwrap();
        assert!(layout.documents.is_dir());
        assert!(!layout.documents.join("stale.html").exists());
        assert!(!layout.archive().exists());

        layout.discard().await;
        assert!(!layout.root.exists());
        layout.discard().await;

        let _ = std::fs::remove_dir_all(&out);
    }

    #[tokio::test]
    async fn copy_tree_handles_files_and_dirs() {
        let src = temp_dir("copy-src");
        std::fs::create_dir_all(src.join("nested/deep")).unwrap();
        std::fs::write(src.join("nested/deep/page.html"), "p").unwrap();
        std::fs::write(src.join("top.html"), "t").unwrap();
        let dest = temp_dir("copy-dest");

        assert_eq!(copy_tree(&src, &dest).await.unwrap(), 2);
        assert!(dest.join("nested/deep/page.html").is_file());

        let single = temp_dir("copy-single");
        assert_eq!(copy_tree(&src.join("top.html"), &single).await.unwrap(), 1);
        assert!(single.join("top.html").is_file());

        assert!(copy_tree(&src.join("absent"), &dest).await.is_err());

        for dir in [src, dest, single] {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[tokio::test]
    async fn icons_are_optional() {
        let out = temp_dir("icons-out");
        let icons = temp_dir("icons-src");
        std::fs::write(icons.join("icon.png"), [0x89, b'P', b'N', b'G']).unwrap();
        let layout = DocsetLayout::new(&out, "mylib");
        layout.reset().await.unwrap();

        assert_eq!(copy_icons(&layout, &icons).await.unwrap(), 1);
        assert!(layout.root.join("icon.png").is_file());
        assert!(!layout.root.join("icon@2x.png").exists());

        let _ = std::fs::remove_dir_all(&out);
        let _ = std::fs::remove_dir_all(&icons);
    }
}
