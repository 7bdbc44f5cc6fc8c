use anyhow::Result;
use rusqlite::Connection;

pub const SCHEMA_VERSION: &str = "1";

pub fn create_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Version tracking
        CREATE TABLE IF NOT EXISTS qbrowse_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        -- Last successful response per request shape
        CREATE TABLE IF NOT EXISTS query_cache (
            key TEXT PRIMARY KEY,
            procedure TEXT NOT NULL,
            response TEXT NOT NULL,
            fetched_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );

        CREATE INDEX IF NOT EXISTS idx_query_cache_procedure ON query_cache(procedure);
        ",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO qbrowse_meta (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}
