use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use csv::{ReaderBuilder, Trim};
use rusqlite::params;
use tracing::{info, warn};

use crate::infra::sqlite::queries::{insert_columns, ROW_ID_KEY};
use crate::infra::sqlite::schema::{init_db, open_connection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedDataset {
    pub dataset_id: i64,
    pub data_keys: Vec<String>,
    pub row_count: i64,
}

pub fn import_csv_to_sqlite(db_path: &Path, csv_path: &Path) -> Result<ImportedDataset> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::Headers)
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read csv header: {}", csv_path.display()))?
        .clone();
    if headers.iter().all(str::is_empty) {
        anyhow::bail!("csv has no header row: {}", csv_path.display())
    }
    let data_keys = data_keys(headers.iter());

    init_db(db_path)?;
    let mut conn = open_connection(db_path)?;
    let tx = conn.transaction().context("failed to start import transaction")?;

    tx.execute(
        "INSERT INTO dataset(name) VALUES (?1)",
        params![dataset_name(csv_path)],
    )
    .context("failed to create dataset")?;
    let dataset_id = tx.last_insert_rowid();
    insert_columns(&tx, dataset_id, &data_keys)?;

    let mut row_count = 0_i64;
    {
        let mut insert_cell = tx
            .prepare(
                "INSERT INTO dataset_cell(dataset_id, row_id, position, value)
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .context("failed to prepare cell insert")?;

        for record in reader.records() {
            let row_id = row_count + 1;
            let record = record.with_context(|| format!("failed to parse csv row {row_id}"))?;
            if record.len() > data_keys.len() {
                warn!(
                    row_id,
                    dropped = record.len() - data_keys.len(),
                    "csv row is wider than its header"
                );
            }
            for position in 0..data_keys.len() {
                insert_cell
                    .execute(params![
                        dataset_id,
                        row_id,
                        position as i64,
                        record.get(position).unwrap_or("")
                    ])
                    .with_context(|| format!("failed to store csv row {row_id}"))?;
            }
            row_count = row_id;
        }
    }

    tx.execute(
        "UPDATE dataset SET row_count = ?1 WHERE id = ?2",
        params![row_count, dataset_id],
    )
    .context("failed to record dataset row_count")?;
    tx.commit().context("failed to commit import transaction")?;

    info!(dataset_id, row_count, path = %csv_path.display(), "imported csv dataset");
    Ok(ImportedDataset {
        dataset_id,
        data_keys,
        row_count,
    })
}

fn dataset_name(csv_path: &Path) -> String {
    csv_path
        .file_stem()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("dataset")
        .to_string()
}

/// Headers become data keys: blanks are named by position, and duplicates
/// or the reserved `row_id` get a numeric suffix.
fn data_keys<'h>(headers: impl Iterator<Item = &'h str>) -> Vec<String> {
    let mut taken = HashSet::from([ROW_ID_KEY.to_string()]);
    headers
        .enumerate()
        .map(|(position, header)| {
            let base = if header.is_empty() {
                format!("column_{}", position + 1)
            } else {
                header.to_string()
            };
            let mut key = base.clone();
            let mut suffix = 2;
            while !taken.insert(key.clone()) {
                key = format!("{base}_{suffix}");
                suffix += 1;
            }
            key
        })
        .collect()
}
