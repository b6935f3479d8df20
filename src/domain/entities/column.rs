use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

pub type SortComparator = Arc<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnWidth {
    Percent(u32),
    Pixels(u32),
}

#[derive(Clone)]
pub struct Column {
    pub order_index: usize,
    pub data_key: String,
    pub order_key: String,
    pub label: String,
    pub width: Option<ColumnWidth>,
    pub sortable: bool,
    pub hidden: bool,
    pub is_action: bool,
    pub sort_comparator: Option<SortComparator>,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("order_index", &self.order_index)
            .field("data_key", &self.data_key)
            .field("order_key", &self.order_key)
            .field("label", &self.label)
            .field("width", &self.width)
            .field("sortable", &self.sortable)
            .field("hidden", &self.hidden)
            .field("is_action", &self.is_action)
            .field("sort_comparator", &self.sort_comparator.is_some())
            .finish()
    }
}

impl Column {
    pub fn new(data_key: impl Into<String>, label: impl Into<String>) -> Self {
        let data_key = data_key.into();
        Self {
            order_index: 0,
            order_key: data_key.clone(),
            data_key,
            label: label.into(),
            width: None,
            sortable: false,
            hidden: false,
            is_action: false,
            sort_comparator: None,
        }
    }

    pub fn action(order_key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            order_index: 0,
            data_key: String::new(),
            order_key: order_key.into(),
            label: label.into(),
            width: None,
            sortable: false,
            hidden: false,
            is_action: true,
            sort_comparator: None,
        }
    }

    pub fn order_key(mut self, order_key: impl Into<String>) -> Self {
        self.order_key = order_key.into();
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn width(mut self, width: ColumnWidth) -> Self {
        self.width = Some(width);
        self
    }

    pub fn comparator<F>(mut self, compare: F) -> Self
    where
        F: Fn(&str, &str) -> Ordering + Send + Sync + 'static,
    {
        self.sort_comparator = Some(Arc::new(compare));
        self
    }

    pub fn is_valid(&self) -> bool {
        self.is_action || !self.data_key.is_empty()
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable && !self.is_action && self.is_valid()
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.sort_comparator {
            Some(compare) => compare(a, b),
            None => a.cmp(b),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    columns: Vec<Column>,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mut column: Column) -> &mut Self {
        column.order_index = self.columns.len() + 1;
        self.columns.push(column);
        self
    }

    pub fn with(mut self, column: Column) -> Self {
        self.add(column);
        self
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_valid() && !c.hidden)
    }

    pub fn find_by_order_key(&self, order_key: &str) -> Option<&Column> {
        let mut matches = self.columns.iter().filter(|c| c.order_key == order_key);
        let found = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(found)
    }

    pub fn sortable(&self, order_key: &str) -> Option<&Column> {
        self.find_by_order_key(order_key)
            .filter(|column| column.is_sortable())
    }

    pub fn first_sortable(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.is_sortable())
    }

    pub fn move_column(&mut self, order_key: &str, new_index: usize) -> bool {
        let Some(pos) = self.columns.iter().position(|c| c.order_key == order_key) else {
            return false;
        };
        let column = self.columns.remove(pos);
        let target = new_index.saturating_sub(1).min(self.columns.len());
        self.columns.insert(target, column);
        self.reindex();
        true
    }

    pub fn remove(&mut self, order_key: &str) -> Option<Column> {
        let pos = self.columns.iter().position(|c| c.order_key == order_key)?;
        let column = self.columns.remove(pos);
        self.reindex();
        Some(column)
    }

    pub fn set_hidden(&mut self, order_key: &str, hidden: bool) -> bool {
        match self.columns.iter_mut().find(|c| c.order_key == order_key) {
            Some(column) => {
                column.hidden = hidden;
                true
            }
            None => false,
        }
    }

    pub fn apply_visibility(&mut self, visible: &[String]) {
        for column in self.columns.iter_mut().filter(|c| !c.is_action) {
            column.hidden = !visible.iter().any(|key| *key == column.order_key);
        }
    }

    pub fn visible_order_keys(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| !c.is_action && !c.hidden)
            .map(|c| c.order_key.clone())
            .collect()
    }

    pub fn distribute_widths(&mut self, overwrite: bool) {
        let indices: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_valid() && !c.hidden)
            .map(|(idx, _)| idx)
            .collect();

        for &idx in &indices {
            let column = &mut self.columns[idx];
            match column.width {
                _ if overwrite => column.width = None,
                // pixel widths cannot share a pass with auto percentages
                Some(ColumnWidth::Pixels(_)) => column.width = None,
                _ => {}
            }
        }

        let fixed = indices
            .iter()
            .filter_map(|&idx| match self.columns[idx].width {
                Some(ColumnWidth::Percent(p)) => Some(p),
                _ => None,
            })
            .fold(0_u32, u32::saturating_add);
        let lacking: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&idx| self.columns[idx].width.is_none())
            .collect();
        if lacking.is_empty() {
            return;
        }

        let share = 100_u32.saturating_sub(fixed) / lacking.len() as u32;
        for idx in lacking {
            self.columns[idx].width = Some(ColumnWidth::Percent(share));
        }
    }

    fn reindex(&mut self) {
        for (idx, column) in self.columns.iter_mut().enumerate() {
            column.order_index = idx + 1;
        }
    }
}
