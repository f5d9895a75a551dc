//! libSQL storage for the docset search index (`docSet.dsidx`).
//!
//! The [`SearchIndex`] struct wraps a local libSQL database holding the
//! `searchIndex` table that docset readers query by name, type, and path.
//!
//! **Access rules:**
//! - The build pipeline creates the file from scratch via [`SearchIndex::create`]
//! - Inspection tooling reads an existing package via [`SearchIndex::open_readonly`]

mod schema;

use std::path::Path;

use docsetbuilder_shared::{DocsetError, Entry, Result};
use libsql::{Connection, Database, params};

/// Search index handle wrapping a libSQL database.
pub struct SearchIndex {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// One row of the `searchIndex` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRow {
    pub name: String,
    pub entry_type: String,
    pub path: String,
}

/// Outcome of a bulk insert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertStats {
    /// Rows written.
    pub inserted: usize,
    /// Rows dropped by the `(name, type, path)` constraint.
    pub ignored: usize,
    /// Untyped entries (the index page), never persisted.
    pub skipped: usize,
}

impl SearchIndex {
    /// Create a fresh index at `path`, replacing any existing file.
    pub async fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DocsetError::io(parent, e))?;
        }
        if path.exists() {
            std::fs::remove_file(path).map_err(|e| DocsetError::io(path, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DocsetError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| DocsetError::Storage(e.to_string()))?;

        conn.execute_batch(schema::SEARCH_INDEX_SCHEMA)
            .await
            .map_err(|e| DocsetError::Storage(format!("creating searchIndex failed: {e}")))?;

        tracing::debug!(path = %path.display(), "created search index");

        Ok(Self {
            db,
            conn,
            readonly: false,
        })
    }

    /// Open an existing index at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(DocsetError::Storage(format!(
                "no search index at {}",
                path.display()
            )));
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DocsetError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| DocsetError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(DocsetError::Storage(
                "search index is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Insert one row. Returns `false` when the row already existed.
    pub async fn insert(&self, name: &str, entry_type: &str, path: &str) -> Result<bool> {
        self.check_writable()?;
        let affected = self
            .conn
            .execute(schema::INSERT_OR_IGNORE, params![name, entry_type, path])
            .await
            .map_err(|e| DocsetError::Storage(e.to_string()))?;
        Ok(affected > 0)
    }

    /// Insert every typed entry inside a single transaction.
    pub async fn insert_entries<'a>(
        &self,
        entries: impl IntoIterator<Item = &'a Entry>,
    ) -> Result<InsertStats> {
        self.check_writable()?;
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DocsetError::Storage(e.to_string()))?;

        let mut stats = InsertStats::default();
        for entry in entries {
            let Some(entry_type) = &entry.entry_type else {
                stats.skipped += 1;
                continue;
            };
            let affected = tx
                .execute(
                    schema::INSERT_OR_IGNORE,
                    params![
                        entry.name.as_str(),
                        entry_type.as_str(),
                        entry.canonical_path.as_str()
                    ],
                )
                .await
                .map_err(|e| DocsetError::Storage(e.to_string()))?;
            if affected > 0 {
                stats.inserted += 1;
            } else {
                stats.ignored += 1;
            }
        }

        tx.commit()
            .await
            .map_err(|e| DocsetError::Storage(e.to_string()))?;

        tracing::debug!(
            inserted = stats.inserted,
            ignored = stats.ignored,
            "search index populated"
        );
        Ok(stats)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Rows with the given name, optionally restricted to one type.
    pub async fn lookup(&self, name: &str, entry_type: Option<&str>) -> Result<Vec<SearchRow>> {
        let rows = self
            .conn
            .query(
                "SELECT name, type, path FROM searchIndex
                 WHERE name = ?1 AND (?2 IS NULL OR type = ?2)
                 ORDER BY id",
                params![name, entry_type],
            )
            .await
            .map_err(|e| DocsetError::Storage(e.to_string()))?;
        collect_rows(rows).await
    }

    /// Rows pointing at `path` (anchor included).
    pub async fn entries_at_path(&self, path: &str) -> Result<Vec<SearchRow>> {
        let rows = self
            .conn
            .query(
                "SELECT name, type, path FROM searchIndex WHERE path = ?1 ORDER BY id",
                params![path],
            )
            .await
            .map_err(|e| DocsetError::Storage(e.to_string()))?;
        collect_rows(rows).await
    }

    /// Total number of rows.
    pub async fn count(&self) -> Result<u64> {
        let mut rows = self
            .conn
            .query("SELECT COUNT(*) FROM searchIndex", params![])
            .await
            .map_err(|e| DocsetError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<i64>(0)
                .map(|n| n as u64)
                .map_err(|e| DocsetError::Storage(e.to_string())),
            Ok(None) => Ok(0),
            Err(e) => Err(DocsetError::Storage(e.to_string())),
        }
    }
}

/// Drain a `SELECT name, type, path` result set.
async fn collect_rows(mut rows: libsql::Rows) -> Result<Vec<SearchRow>> {
    let mut results = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DocsetError::Storage(e.to_string()))?
    {
        results.push(SearchRow {
            name: row
                .get::<String>(0)
                .map_err(|e| DocsetError::Storage(e.to_string()))?,
            entry_type: row
                .get::<String>(1)
                .map_err(|e| DocsetError::Storage(e.to_string()))?,
            path: row
                .get::<String>(2)
                .map_err(|e| DocsetError::Storage(e.to_string()))?,
        });
    }
    Ok(results)
}
