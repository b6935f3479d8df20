use std::path::PathBuf;

use crate::domain::entities::entry::Row;
use crate::error::{GridError, GridResult};
use crate::infra::sqlite::queries::{count_rows, load_columns, query_rows, RowQuery};
use crate::usecase::ports::filter::{FilterCriteria, GridStateHints};

pub struct SqliteFilterCriteria {
    pub db_path: PathBuf,
    pub dataset_id: i64,
    columns: Vec<String>,
    query: RowQuery,
}

impl SqliteFilterCriteria {
    pub fn open(db_path: impl Into<PathBuf>, dataset_id: i64) -> GridResult<Self> {
        let db_path = db_path.into();
        let columns = load_columns(&db_path, dataset_id).map_err(source_error)?;
        Ok(Self {
            db_path,
            dataset_id,
            columns,
            query: RowQuery::default(),
        })
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.query.global_search = term.into();
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

fn source_error(err: anyhow::Error) -> GridError {
    GridError::Source(format!("{err:#}"))
}

impl FilterCriteria for SqliteFilterCriteria {
    fn count_items(&self) -> GridResult<usize> {
        count_rows(&self.db_path, self.dataset_id, &self.query.global_search)
            .map(|count| count.max(0) as usize)
            .map_err(source_error)
    }

    fn count_unfiltered(&self) -> GridResult<usize> {
        count_rows(&self.db_path, self.dataset_id, "")
            .map(|count| count.max(0) as usize)
            .map_err(source_error)
    }

    fn set_limit(&mut self, limit: Option<usize>, offset: usize) {
        self.query.limit = limit.map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));
        self.query.offset = i64::try_from(offset).unwrap_or(i64::MAX);
    }

    fn get_items(&self) -> GridResult<Vec<Row>> {
        query_rows(&self.db_path, self.dataset_id, &self.query).map_err(source_error)
    }

    fn configure(&mut self, hints: &GridStateHints) {
        match &hints.sort {
            Some((data_key, direction)) => {
                self.query.sort_position = self
                    .columns
                    .iter()
                    .position(|name| name == data_key)
                    .map(|idx| idx as i64);
                self.query.sort_desc = direction.is_desc();
            }
            None => {
                self.query.sort_position = None;
                self.query.sort_desc = false;
            }
        }
    }
}
