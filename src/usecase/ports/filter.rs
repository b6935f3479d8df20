use crate::domain::entities::entry::Row;
use crate::domain::entities::grid_state::SortDirection;
use crate::error::GridResult;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridStateHints {
    pub sort: Option<(String, SortDirection)>,
    pub primary_key: Option<String>,
}

pub trait FilterCriteria {
    fn count_items(&self) -> GridResult<usize>;
    fn count_unfiltered(&self) -> GridResult<usize>;
    /// `None` removes the bound.
    fn set_limit(&mut self, limit: Option<usize>, offset: usize);
    fn get_items(&self) -> GridResult<Vec<Row>>;
    fn configure(&mut self, hints: &GridStateHints);
}
