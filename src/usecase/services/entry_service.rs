use crate::config::GridConfig;
use crate::domain::entities::column::ColumnRegistry;
use crate::domain::entities::entry::{Entry, EntrySet};
use crate::domain::entities::grid_state::GridState;
use crate::error::GridResult;
use crate::usecase::ports::filter::{FilterCriteria, GridStateHints};

pub enum EntrySource {
    Supplied(Vec<Entry>),
    Filter(Box<dyn FilterCriteria>),
}

impl EntrySource {
    pub fn has_filter(&self) -> bool {
        matches!(self, EntrySource::Filter(_))
    }

    pub fn count_items(&self) -> GridResult<usize> {
        match self {
            EntrySource::Supplied(entries) => Ok(entries.iter().filter(|e| e.countable).count()),
            EntrySource::Filter(filter) => filter.count_items(),
        }
    }

    pub fn load(
        &mut self,
        state: &GridState,
        columns: &ColumnRegistry,
        config: &GridConfig,
    ) -> GridResult<EntrySet> {
        match self {
            EntrySource::Supplied(entries) => {
                Ok(EntrySet::from_supplied(entries.clone(), state, columns))
            }
            EntrySource::Filter(filter) => load_page(filter.as_mut(), state, config),
        }
    }
}

pub fn hints_for(state: &GridState, config: &GridConfig) -> GridStateHints {
    GridStateHints {
        sort: state
            .sort
            .as_ref()
            .map(|sort| (sort.data_key.clone(), sort.direction)),
        primary_key: config.primary_key_name.clone(),
    }
}

pub fn load_page(
    filter: &mut dyn FilterCriteria,
    state: &GridState,
    config: &GridConfig,
) -> GridResult<EntrySet> {
    filter.configure(&hints_for(state, config));
    filter.set_limit(state.limit(), state.offset());
    let entries = filter.get_items()?.into_iter().map(Entry::row).collect();
    Ok(EntrySet {
        entries,
        total: state.total,
        unfiltered_total: filter.count_unfiltered()?,
    })
}
