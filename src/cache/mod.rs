pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::{CacheStats, ProcedureCount};

/// A cached response together with when it was fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry<T> {
    pub value: T,
    pub fetched_at: String,
}

/// Last successful response per request shape, on disk.
pub struct CacheStore {
    pub conn: Connection,
    pub path: PathBuf,
}

impl CacheStore {
    /// Open (or create) the cache database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open cache: {}", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::create_schema(&conn)?;
        migrations::run_migrations(&conn)?;

        info!("Opened cache: {}", path.display());

        Ok(CacheStore {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Default cache path: ~/.qbrowse/cache.db
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".qbrowse").join("cache.db"))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<CachedEntry<T>>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT response, fetched_at FROM query_cache WHERE key = ?1",
                [key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((response, fetched_at)) = row else {
            debug!("cache miss");
            return Ok(None);
        };

        self.conn.execute(
            "UPDATE query_cache SET hits = hits + 1 WHERE key = ?1",
            [key],
        )?;

        let value = serde_json::from_str(&response).context("Corrupt cache entry")?;
        Ok(Some(CachedEntry { value, fetched_at }))
    }

    pub fn put<T: Serialize>(&self, procedure: &str, key: &str, value: &T) -> Result<()> {
        let response = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO query_cache (key, procedure, response, fetched_at, hits)
             VALUES (?1, ?2, ?3, strftime('%Y-%m-%dT%H:%M:%SZ', 'now'), 0)
             ON CONFLICT(key) DO UPDATE SET
                response = ?3,
                fetched_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')",
            rusqlite::params![key, procedure, response],
        )?;
        Ok(())
    }

    /// Drop every entry cached for a procedure. Returns how many were removed.
    pub fn invalidate(&self, procedure: &str) -> Result<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM query_cache WHERE procedure = ?1", [procedure])?;
        info!("Invalidated {removed} cached {procedure} entries");
        Ok(removed)
    }

    pub fn clear(&self) -> Result<usize> {
        let removed = self.conn.execute("DELETE FROM query_cache", [])?;
        Ok(removed)
    }

    pub fn schema_version(&self) -> Result<Option<String>> {
        let version = self
            .conn
            .query_row(
                "SELECT value FROM qbrowse_meta WHERE key = 'schema_version'",
                [],
                |r| r.get(0),
            )
            .optional()?;
        Ok(version)
    }

    pub fn stats(&self) -> Result<CacheStats> {
        let (entries, hits, oldest, newest): (i64, i64, Option<String>, Option<String>) =
            self.conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(hits), 0), MIN(fetched_at), MAX(fetched_at)
                 FROM query_cache",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)),
            )?;

        let mut stmt = self.conn.prepare(
            "SELECT procedure, COUNT(*) FROM query_cache GROUP BY procedure ORDER BY procedure",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProcedureCount {
                procedure: row.get(0)?,
                count: row.get(1)?,
            })
        })?;
        let mut procedures = Vec::new();
        for row in rows {
            procedures.push(row?);
        }

        let db_size_bytes = std::fs::metadata(&self.path)
            .map(|m| m.len())
            .unwrap_or(0);

        Ok(CacheStats {
            entries,
            hits,
            procedures,
            oldest,
            newest,
            db_size_bytes,
        })
    }
}
