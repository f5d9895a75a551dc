//! Deduplicated, ordered store of canonicalized entries.

use std::collections::HashSet;

use docsetbuilder_shared::{DocsetEntries, Entry, TypeTag};
use tracing::debug;

use crate::path::PathResolver;

/// Name given to the synthetic landing-page entry.
pub const INDEX_ENTRY_NAME: &str = "index";

/// Entries keyed by `(name, type, canonical path)`, kept in insertion order.
///
/// The index slot is separate: it has no type, is never persisted to the
/// search index, and is replaced rather than deduplicated.
#[derive(Debug, Default)]
pub struct EntryStore {
    index: Option<Entry>,
    entries: Vec<Entry>,
    seen: HashSet<(String, TypeTag, String)>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalize every raw entry of `raw` through `resolver`.
    pub fn from_raw(raw: &DocsetEntries, resolver: &PathResolver) -> Self {
        let mut store = Self::new();
        if let Some(index) = &raw.index {
            store.set_index(index.clone(), resolver.normalize(index));
        }
        for (entry_type, name, path) in raw.iter() {
            let canonical = resolver.normalize(path);
            if !store.insert(entry_type.clone(), name, path, canonical) {
                debug!(%entry_type, name, path, "duplicate entry ignored");
            }
        }
        store
    }

    /// Add a typed entry. Returns `false` when the triple was already present.
    pub fn insert(
        &mut self,
        entry_type: TypeTag,
        name: impl Into<String>,
        raw_path: impl Into<String>,
        canonical_path: impl Into<String>,
    ) -> bool {
        let name = name.into();
        let canonical_path = canonical_path.into();
        let key = (name.clone(), entry_type.clone(), canonical_path.clone());
        if !self.seen.insert(key) {
            return false;
        }
        self.entries.push(Entry {
            entry_type: Some(entry_type),
            name,
            raw_path: raw_path.into(),
            canonical_path,
        });
        true
    }

    /// Set (or replace) the landing-page entry.
    pub fn set_index(&mut self, raw_path: impl Into<String>, canonical_path: impl Into<String>) {
        self.index = Some(Entry {
            entry_type: None,
            name: INDEX_ENTRY_NAME.to_string(),
            raw_path: raw_path.into(),
            canonical_path: canonical_path.into(),
        });
    }

    pub fn index_entry(&self) -> Option<&Entry> {
        self.index.as_ref()
    }

    /// Typed entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Everything that must resolve to a file: the index first, then every
    /// typed entry.
    pub fn references(&self) -> impl Iterator<Item = &Entry> {
        self.index.iter().chain(self.entries.iter())
    }

    /// Number of typed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct types in first-seen order.
    pub fn types(&self) -> Vec<&TypeTag> {
        let mut types: Vec<&TypeTag> = Vec::new();
        for entry in &self.entries {
            if let Some(tag) = &entry.entry_type {
                if !types.contains(&tag) {
                    types.push(tag);
                }
            }
        }
        types
    }
}
