//! SQL schema of the docset search index.
//!
//! The layout is fixed by the docset format: readers (Dash, Zeal) query the
//! `searchIndex` table directly, so it is created as-is with no version table.

/// `searchIndex` table plus the `(name, type, path)` uniqueness constraint.
pub(crate) const SEARCH_INDEX_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS searchIndex (
    id   INTEGER PRIMARY KEY,
    name TEXT,
    type TEXT,
    path TEXT
);

CREATE UNIQUE INDEX IF NOT EXISTS anchor ON searchIndex (name, type, path);
"#;

/// Insert that silently skips rows violating the `anchor` index.
pub(crate) const INSERT_OR_IGNORE: &str =
    "INSERT OR IGNORE INTO searchIndex (name, type, path) VALUES (?1, ?2, ?3)";
