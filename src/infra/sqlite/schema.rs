use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const GRID_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS dataset (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        row_count   INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS dataset_column (
        dataset_id  INTEGER NOT NULL REFERENCES dataset(id) ON DELETE CASCADE,
        position    INTEGER NOT NULL,
        data_key    TEXT NOT NULL,
        PRIMARY KEY (dataset_id, position),
        UNIQUE (dataset_id, data_key)
    );

    CREATE TABLE IF NOT EXISTS dataset_cell (
        dataset_id  INTEGER NOT NULL REFERENCES dataset(id) ON DELETE CASCADE,
        row_id      INTEGER NOT NULL,
        position    INTEGER NOT NULL,
        value       TEXT NOT NULL,
        PRIMARY KEY (dataset_id, row_id, position)
    );

    CREATE INDEX IF NOT EXISTS idx_dataset_cell_sort
        ON dataset_cell(dataset_id, position, value);

    CREATE TABLE IF NOT EXISTS preference (
        key         TEXT PRIMARY KEY,
        value       TEXT NOT NULL,
        expires_at  TEXT NOT NULL
    );
";

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open grid db: {}", db_path.display()))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .context("failed to set busy timeout")?;
    conn.pragma_update(None, "foreign_keys", true)
        .context("failed to enable foreign keys")?;
    Ok(conn)
}

pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create db dir: {}", parent.display()))?;
    }

    open_connection(db_path)?
        .execute_batch(GRID_SCHEMA)
        .context("failed to initialize grid schema")
}
