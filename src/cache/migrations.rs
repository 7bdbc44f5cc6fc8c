use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Run all pending migrations. The v1 schema is created fresh by schema.rs;
/// numbered migrations after that are applied here in order.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS qbrowse_migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        );",
    )?;

    run_migration(conn, 1, "add_query_cache_hits", |c| {
        c.execute_batch("ALTER TABLE query_cache ADD COLUMN hits INTEGER NOT NULL DEFAULT 0;")?;
        Ok(())
    })?;

    Ok(())
}

fn run_migration<F>(conn: &Connection, id: i64, name: &str, f: F) -> Result<()>
where
    F: FnOnce(&Connection) -> Result<()>,
{
    let already_applied: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM qbrowse_migrations WHERE id = ?1",
        [id],
        |row| row.get(0),
    )?;

    if already_applied {
        return Ok(());
    }

    f(conn)?;

    conn.execute(
        "INSERT INTO qbrowse_migrations (id, name) VALUES (?1, ?2)",
        rusqlite::params![id, name],
    )?;

    info!("Applied migration {id}: {name}");
    Ok(())
}
