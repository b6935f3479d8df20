use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, types::Value, Transaction};

use crate::domain::entities::entry::Row;
use crate::infra::sqlite::schema::open_connection;

pub const ROW_ID_KEY: &str = "row_id";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowQuery {
    pub global_search: String,
    pub sort_position: Option<i64>,
    pub sort_desc: bool,
    pub limit: Option<i64>,
    pub offset: i64,
}

pub fn insert_columns(tx: &Transaction<'_>, dataset_id: i64, data_keys: &[String]) -> Result<()> {
    let mut insert_column = tx
        .prepare("INSERT INTO dataset_column(dataset_id, position, data_key) VALUES (?1, ?2, ?3)")
        .context("failed to prepare column insert")?;

    for (position, data_key) in data_keys.iter().enumerate() {
        insert_column
            .execute(params![dataset_id, position as i64, data_key])
            .with_context(|| format!("failed to insert column `{data_key}`"))?;
    }

    Ok(())
}

pub fn load_columns(db_path: &Path, dataset_id: i64) -> Result<Vec<String>> {
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare(
            "SELECT data_key
             FROM dataset_column
             WHERE dataset_id = ?1
             ORDER BY position ASC",
        )
        .context("failed to prepare columns query")?;
    let columns = stmt
        .query_map([dataset_id], |row| row.get::<_, String>(0))
        .context("failed to query columns")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect columns")?;
    Ok(columns)
}

fn filter_clause(dataset_id: i64, global_search: &str) -> (String, Vec<Value>) {
    let mut values = vec![Value::Integer(dataset_id)];
    let global_search = global_search.trim();
    if global_search.is_empty() {
        return ("base.dataset_id = ?".to_string(), values);
    }

    values.push(Value::Integer(dataset_id));
    values.push(Value::Text(format!("%{global_search}%")));
    (
        "base.dataset_id = ?
         AND EXISTS (
             SELECT 1 FROM dataset_cell hit
             WHERE hit.dataset_id = ?
               AND hit.row_id = base.row_id
               AND hit.value LIKE ?
         )"
        .to_string(),
        values,
    )
}

pub fn count_rows(db_path: &Path, dataset_id: i64, global_search: &str) -> Result<i64> {
    let conn = open_connection(db_path)?;
    let (where_sql, values) = filter_clause(dataset_id, global_search);
    let count_sql = format!(
        "SELECT COUNT(DISTINCT base.row_id)
         FROM dataset_cell base
         WHERE {where_sql}"
    );
    conn.query_row(&count_sql, rusqlite::params_from_iter(values), |row| {
        row.get(0)
    })
    .context("failed to count dataset rows")
}

fn matching_row_ids(
    conn: &rusqlite::Connection,
    dataset_id: i64,
    query: &RowQuery,
) -> Result<Vec<i64>> {
    let (where_sql, filter_values) = filter_clause(dataset_id, &query.global_search);
    let mut values = Vec::<Value>::new();
    let mut sql = String::from("SELECT base.row_id FROM dataset_cell base ");

    if let Some(position) = query.sort_position {
        sql.push_str(
            "LEFT JOIN dataset_cell sort_cell
               ON sort_cell.dataset_id = base.dataset_id
              AND sort_cell.row_id = base.row_id
              AND sort_cell.position = ? ",
        );
        values.push(Value::Integer(position));
    }
    sql.push_str(&format!("WHERE {where_sql} GROUP BY base.row_id ORDER BY "));
    if query.sort_position.is_some() {
        let direction = if query.sort_desc { "DESC" } else { "ASC" };
        sql.push_str(&format!("COALESCE(sort_cell.value, '') {direction}, "));
    }
    // a negative LIMIT is unbounded in sqlite
    sql.push_str("base.row_id ASC LIMIT ? OFFSET ?");

    values.extend(filter_values);
    values.push(Value::Integer(query.limit.unwrap_or(-1)));
    values.push(Value::Integer(query.offset.max(0)));

    let mut stmt = conn
        .prepare(&sql)
        .context("failed to prepare row id query")?;
    let row_ids = stmt
        .query_map(rusqlite::params_from_iter(values), |row| row.get::<_, i64>(0))
        .context("failed to query row ids")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("failed to collect row ids")?;
    Ok(row_ids)
}

pub fn query_rows(db_path: &Path, dataset_id: i64, query: &RowQuery) -> Result<Vec<Row>> {
    let columns = load_columns(db_path, dataset_id)?;
    if columns.is_empty() {
        return Ok(Vec::new());
    }
    if let Some(position) = query.sort_position {
        if usize::try_from(position).map_or(true, |idx| idx >= columns.len()) {
            anyhow::bail!("sort position {position} is outside {} columns", columns.len());
        }
    }

    let conn = open_connection(db_path)?;
    let row_ids = matching_row_ids(&conn, dataset_id, query)?;
    if row_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut rows: Vec<Row> = row_ids
        .iter()
        .map(|row_id| Row::from([(ROW_ID_KEY.to_string(), row_id.to_string())]))
        .collect();
    let slot: HashMap<i64, usize> = row_ids
        .iter()
        .enumerate()
        .map(|(idx, row_id)| (*row_id, idx))
        .collect();

    let placeholders = vec!["?"; row_ids.len()].join(",");
    let hydrate_sql = format!(
        "SELECT row_id, position, value
         FROM dataset_cell
         WHERE dataset_id = ? AND row_id IN ({placeholders})"
    );
    let mut values = vec![Value::Integer(dataset_id)];
    values.extend(row_ids.iter().copied().map(Value::Integer));

    let mut stmt = conn
        .prepare(&hydrate_sql)
        .context("failed to prepare row hydration query")?;
    let mut cells = stmt
        .query(rusqlite::params_from_iter(values))
        .context("failed to run row hydration query")?;
    while let Some(cell) = cells.next().context("failed to read dataset cell")? {
        let row_id: i64 = cell.get(0).context("failed to read row_id")?;
        let position: i64 = cell.get(1).context("failed to read position")?;
        let value: String = cell.get(2).context("failed to read value")?;

        let data_key = usize::try_from(position).ok().and_then(|idx| columns.get(idx));
        if let (Some(&idx), Some(data_key)) = (slot.get(&row_id), data_key) {
            rows[idx].insert(data_key.clone(), value);
        }
    }

    Ok(rows)
}

pub fn delete_rows(db_path: &Path, dataset_id: i64, row_ids: &[i64]) -> Result<usize> {
    if row_ids.is_empty() {
        return Ok(0);
    }

    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start delete transaction")?;

    let mut removed = 0_usize;
    {
        let mut delete_row = tx
            .prepare("DELETE FROM dataset_cell WHERE dataset_id = ?1 AND row_id = ?2")
            .context("failed to prepare row delete")?;
        for row_id in row_ids {
            let cells = delete_row
                .execute(params![dataset_id, row_id])
                .with_context(|| format!("failed to delete row #{row_id}"))?;
            if cells > 0 {
                removed += 1;
            }
        }
    }

    tx.execute(
        "UPDATE dataset SET row_count = row_count - ?1 WHERE id = ?2",
        params![removed as i64, dataset_id],
    )
    .context("failed to update dataset row_count")?;
    tx.commit().context("failed to commit delete transaction")?;
    Ok(removed)
}

pub fn dataset_row_count(db_path: &Path, dataset_id: i64) -> Result<i64> {
    let conn = open_connection(db_path)?;
    conn.query_row(
        "SELECT row_count FROM dataset WHERE id = ?1",
        [dataset_id],
        |row| row.get(0),
    )
    .with_context(|| format!("failed to read row_count of dataset #{dataset_id}"))
}
