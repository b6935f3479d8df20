use std::cell::Cell;

use crate::domain::entities::entry::Row;
use crate::domain::entities::grid_state::SortDirection;
use crate::error::GridResult;
use crate::usecase::ports::filter::{FilterCriteria, GridStateHints};

#[derive(Debug, Clone, Default)]
pub struct MemoryFilterCriteria {
    rows: Vec<Row>,
    search: Option<String>,
    sort: Option<(String, SortDirection)>,
    limit: Option<usize>,
    offset: usize,
    fetches: Cell<usize>,
}

impl MemoryFilterCriteria {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = (!term.trim().is_empty()).then(|| term.trim().to_lowercase());
        self
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }

    fn matching(&self) -> Vec<&Row> {
        self.rows
            .iter()
            .filter(|row| match &self.search {
                Some(term) => row.values().any(|v| v.to_lowercase().contains(term)),
                None => true,
            })
            .collect()
    }
}

impl FilterCriteria for MemoryFilterCriteria {
    fn count_items(&self) -> GridResult<usize> {
        Ok(self.matching().len())
    }

    fn count_unfiltered(&self) -> GridResult<usize> {
        Ok(self.rows.len())
    }

    fn set_limit(&mut self, limit: Option<usize>, offset: usize) {
        self.limit = limit;
        self.offset = offset;
    }

    fn get_items(&self) -> GridResult<Vec<Row>> {
        self.fetches.set(self.fetches.get() + 1);
        let mut rows = self.matching();
        if let Some((key, direction)) = &self.sort {
            rows.sort_by(|a, b| {
                let ordering = a
                    .get(key)
                    .map(String::as_str)
                    .unwrap_or("")
                    .cmp(b.get(key).map(String::as_str).unwrap_or(""));
                if direction.is_desc() {
                    ordering.reverse()
                } else {
                    ordering
                }
            });
        }
        Ok(rows
            .into_iter()
            .skip(self.offset)
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn configure(&mut self, hints: &GridStateHints) {
        self.sort = hints.sort.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Row> {
        ["Cleo", "anna", "Bob", "annika"]
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                Row::from([
                    ("id".to_string(), (idx + 1).to_string()),
                    ("name".to_string(), name.to_string()),
                ])
            })
            .collect()
    }

    #[test]
    fn search_limit_and_sort_compose() {
        let mut filter = MemoryFilterCriteria::new(rows()).search("ANN");
        assert_eq!(filter.count_items().expect("count"), 2);
        assert_eq!(filter.count_unfiltered().expect("count"), 4);

        filter.configure(&GridStateHints {
            sort: Some(("name".to_string(), SortDirection::Desc)),
            primary_key: None,
        });
        filter.set_limit(Some(1), 0);
        let page = filter.get_items().expect("items");
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].get("name").map(String::as_str), Some("annika"));

        filter.set_limit(None, 1);
        assert_eq!(filter.get_items().expect("items").len(), 1);
        assert_eq!(filter.fetch_count(), 2);
    }
}
