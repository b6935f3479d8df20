use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, OptionalExtension};

use crate::error::{GridError, GridResult};
use crate::infra::sqlite::schema::{init_db, open_connection};
use crate::usecase::ports::preferences::PreferenceStore;

pub fn load_preference(db_path: &Path, key: &str, now: DateTime<Utc>) -> Result<Option<String>> {
    let conn = open_connection(db_path)?;
    let row = conn
        .query_row(
            "SELECT value, expires_at FROM preference WHERE key = ?1",
            [key],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()
        .with_context(|| format!("failed to query preference `{key}`"))?;

    let Some((value, expires_at)) = row else {
        return Ok(None);
    };
    let expires_at = DateTime::parse_from_rfc3339(&expires_at)
        .with_context(|| format!("invalid expiry for preference `{key}`: {expires_at}"))?;
    if expires_at.with_timezone(&Utc) <= now {
        return Ok(None);
    }
    Ok(Some(value))
}

pub fn upsert_preference(
    db_path: &Path,
    key: &str,
    value: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    let conn = open_connection(db_path)?;
    conn.execute(
        "INSERT INTO preference(key, value, expires_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, expires_at = excluded.expires_at",
        params![key, value, expires_at.to_rfc3339()],
    )
    .with_context(|| format!("failed to upsert preference `{key}`"))?;
    Ok(())
}

pub fn purge_expired(db_path: &Path, now: DateTime<Utc>) -> Result<usize> {
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare("SELECT key, expires_at FROM preference")
        .context("failed to prepare preference expiry query")?;
    let expired = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .context("failed to query preference expiry")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect preference expiry")?
        .into_iter()
        .filter(|(_, expires_at)| {
            DateTime::parse_from_rfc3339(expires_at)
                .map(|at| at.with_timezone(&Utc) <= now)
                .unwrap_or(true)
        })
        .map(|(key, _)| key)
        .collect::<Vec<_>>();
    drop(stmt);

    for key in &expired {
        conn.execute("DELETE FROM preference WHERE key = ?1", [key])
            .with_context(|| format!("failed to delete preference `{key}`"))?;
    }
    Ok(expired.len())
}

pub struct SqlitePreferenceStore {
    pub db_path: PathBuf,
}

impl SqlitePreferenceStore {
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        init_db(&db_path)?;
        Ok(Self { db_path })
    }
}

impl PreferenceStore for SqlitePreferenceStore {
    fn get(&self, key: &str) -> GridResult<Option<String>> {
        load_preference(&self.db_path, key, Utc::now())
            .map_err(|err| GridError::Store(format!("{err:#}")))
    }

    fn set(&mut self, key: &str, value: &str, ttl: Duration) -> GridResult<()> {
        upsert_preference(&self.db_path, key, value, Utc::now() + ttl)
            .map_err(|err| GridError::Store(format!("{err:#}")))
    }
}
