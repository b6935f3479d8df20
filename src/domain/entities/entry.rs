use std::collections::{BTreeMap, BTreeSet};

use crate::domain::entities::column::ColumnRegistry;
use crate::domain::entities::grid_state::GridState;

pub type Row = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub data: Row,
    pub countable: bool,
    pub css_classes: BTreeSet<String>,
}

impl Entry {
    pub fn row(data: Row) -> Self {
        Self {
            data,
            countable: true,
            css_classes: BTreeSet::new(),
        }
    }

    pub fn heading(data: Row) -> Self {
        Self {
            data,
            countable: false,
            css_classes: BTreeSet::from(["heading".to_string()]),
        }
    }

    pub fn value(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntrySet {
    pub entries: Vec<Entry>,
    pub total: usize,
    pub unfiltered_total: usize,
}

impl EntrySet {
    pub fn countable_len(&self) -> usize {
        self.entries.iter().filter(|e| e.countable).count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn show_duplicate_header(&self, threshold: usize) -> bool {
        self.countable_len() > threshold
    }

    pub fn from_supplied(
        mut entries: Vec<Entry>,
        state: &GridState,
        columns: &ColumnRegistry,
    ) -> Self {
        let total = count_countable(&entries);

        let position_bound = entries.iter().any(|e| !e.countable);
        if let Some(sort) = state.sort.as_ref().filter(|_| !position_bound) {
            if let Some(column) = columns.find_by_order_key(&sort.order_key) {
                entries.sort_by(|a, b| {
                    let ordering = column.compare(
                        a.value(&sort.data_key).unwrap_or(""),
                        b.value(&sort.data_key).unwrap_or(""),
                    );
                    if sort.direction.is_desc() {
                        ordering.reverse()
                    } else {
                        ordering
                    }
                });
            }
        }

        let entries = match state.limit() {
            Some(limit) => page_window(entries, state.offset(), limit),
            None => entries,
        };

        Self {
            entries,
            total,
            unfiltered_total: total,
        }
    }
}

fn count_countable(entries: &[Entry]) -> usize {
    entries.iter().filter(|e| e.countable).count()
}

/// Keeps countable rows `offset..offset + limit`. A non-countable row travels
/// with the next countable row, or with the previous one when it trails the list.
fn page_window(entries: Vec<Entry>, offset: usize, limit: usize) -> Vec<Entry> {
    let total = count_countable(&entries);
    let end = offset.saturating_add(limit);
    let mut seen = 0_usize;

    entries
        .into_iter()
        .filter(|entry| {
            let anchor = if entry.countable {
                seen += 1;
                seen - 1
            } else if seen < total {
                seen
            } else {
                total.saturating_sub(1)
            };
            (offset..end).contains(&anchor)
        })
        .collect()
}
