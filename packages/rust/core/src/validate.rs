//! Reference validation: every entry must point at a file in the package.

use std::path::{Path, PathBuf};

use docsetbuilder_shared::{DocsetError, Entry, Result};
use tracing::{debug, instrument};
use url::Url;

use crate::entries::EntryStore;
use crate::path::split_anchor;

/// An entry whose target was found on disk.
#[derive(Debug, Clone)]
pub struct ResolvedReference {
    pub name: String,
    pub entry_type: Option<String>,
    /// Path as written to the search index (anchor kept).
    pub path: String,
    /// File the path points at.
    pub file: PathBuf,
    /// `file://` URL of the target, anchor included.
    pub url: Option<Url>,
}

/// Check every reference in `store` (index first) against `documents_dir`.
///
/// Paths starting with `#` are anchors into the landing page and get
/// `index_path` prepended. The first missing target aborts validation.
#[instrument(skip_all, fields(references = store.len() + usize::from(store.index_entry().is_some())))]
pub fn validate(
    store: &EntryStore,
    documents_dir: &Path,
    index_path: &str,
) -> Result<Vec<ResolvedReference>> {
    store
        .references()
        .map(|entry| resolve(entry, documents_dir, index_path))
        .collect()
}

fn resolve(entry: &Entry, documents_dir: &Path, index_path: &str) -> Result<ResolvedReference> {
    let path = if entry.canonical_path.starts_with('#') {
        format!("{index_path}{}", entry.canonical_path)
    } else {
        entry.canonical_path.clone()
    };

    let (page, anchor) = split_anchor(&path);
    let file = documents_dir.join(page);
    if page.is_empty() || !file.is_file() {
        return Err(DocsetError::MissingReference {
            name: entry.name.clone(),
            entry_type: entry.entry_type.as_ref().map(|t| t.to_string()),
            path: page.to_string(),
        });
    }

    let url = file_url(&file, anchor);
    debug!(
        entry_type = entry.type_label(),
        name = %entry.name,
        url = url.as_ref().map(Url::as_str).unwrap_or(path.as_str()),
        "reference resolved"
    );

    Ok(ResolvedReference {
        name: entry.name.clone(),
        entry_type: entry.entry_type.as_ref().map(|t| t.to_string()),
        path,
        file,
        url,
    })
}

fn file_url(file: &Path, anchor: Option<&str>) -> Option<Url> {
    let absolute = std::path::absolute(file).ok()?;
    let mut url = Url::from_file_path(absolute).ok()?;
    url.set_fragment(anchor);
    Some(url)
}
