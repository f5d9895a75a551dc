//! Landing-page selection.
//!
//! Precedence: an explicitly configured file name, then the index captured
//! from the first eligible plugin, then `index.html` at the package root.

use docsetbuilder_shared::DEFAULT_INDEX_FILE_NAME;

use crate::path::{PathResolver, split_anchor};

/// Index location reported by a plugin, split into file name and directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedIndex {
    /// `None` when the plugin reported a directory (`guide/`).
    pub file_name: Option<String>,
    pub dir: String,
}

impl CapturedIndex {
    pub fn from_raw(raw: &str) -> Self {
        let path = raw.replace('\\', "/");
        let (page, _) = split_anchor(&path);
        let page = page.strip_prefix("./").unwrap_or(page);

        if let Some(dir) = page.strip_suffix('/') {
            return Self {
                file_name: None,
                dir: dir.to_string(),
            };
        }
        match page.rsplit_once('/') {
            Some((dir, file)) => Self {
                file_name: Some(file.to_string()),
                dir: dir.to_string(),
            },
            None => Self {
                file_name: Some(page.to_string()),
                dir: String::new(),
            },
        }
    }
}

/// The selected landing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLocation {
    pub file_name: String,
    pub dir: String,
}

impl IndexLocation {
    /// Package-relative path of the landing page, resolved the same way as
    /// entry paths.
    pub fn path(&self, base_dir: Option<&str>) -> String {
        let joined = if self.dir.is_empty() {
            self.file_name.clone()
        } else {
            format!("{}/{}", self.dir.trim_end_matches('/'), self.file_name)
        };
        PathResolver::new(self.file_name.clone(), base_dir).normalize(&joined)
    }
}

/// Pick the landing page. An empty explicit name counts as unset; an
/// explicit name ignores anything captured and sits at the base dir.
pub fn select(explicit: Option<&str>, captured: Option<&CapturedIndex>) -> IndexLocation {
    if let Some(name) = explicit.filter(|n| !n.is_empty()) {
        return IndexLocation {
            file_name: name.to_string(),
            dir: String::new(),
        };
    }
    match captured {
        Some(c) => IndexLocation {
            file_name: c
                .file_name
                .clone()
                .unwrap_or_else(|| DEFAULT_INDEX_FILE_NAME.to_string()),
            dir: c.dir.clone(),
        },
        None => IndexLocation {
            file_name: DEFAULT_INDEX_FILE_NAME.to_string(),
            dir: String::new(),
        },
    }
}
