use std::collections::HashSet;

use tracing::{debug, info};

use crate::config::GridConfig;
use crate::domain::entities::action::{Action, ActionRegistry};
use crate::domain::entities::batch::BatchPlan;
use crate::domain::entities::column::{Column, ColumnRegistry};
use crate::domain::entities::entry::EntrySet;
use crate::domain::entities::grid_state::GridState;
use crate::domain::entities::selection::{RowId, Selection};
use crate::error::{ConfigError, GridError, GridResult};
use crate::usecase::ports::preferences::PreferenceStore;
use crate::usecase::ports::request::{
    scoped, RequestParams, PARAM_BATCH_FROM, PARAM_BATCH_LIMIT,
};
use crate::usecase::services::batch_coordinator::BatchCoordinator;
use crate::usecase::services::entry_service::EntrySource;
use crate::usecase::services::selection_resolver::resolve_selection;
use crate::usecase::services::state_resolver::GridStateResolver;

#[derive(Debug, Clone, Default)]
pub struct GridRegistry {
    ids: HashSet<String>,
}

impl GridRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, grid_id: &str, allow_override: bool) -> Result<(), ConfigError> {
        if !self.ids.insert(grid_id.to_string()) && !allow_override {
            return Err(ConfigError::DuplicateGridId(grid_id.to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridOutcome {
    Rendered,
    Executed { action: String, rows: usize },
    BatchPlanned(BatchPlan),
}

#[derive(Debug, Clone)]
pub struct GridView {
    pub state: GridState,
    pub columns: Vec<Column>,
    pub entries: EntrySet,
    pub actions: Vec<Action>,
    pub outcome: GridOutcome,
    pub show_duplicate_header: bool,
}

pub struct GridController {
    config: GridConfig,
    columns: ColumnRegistry,
    actions: ActionRegistry,
    source: EntrySource,
    view: Option<GridView>,
    executed: bool,
}

impl GridController {
    pub fn new(
        registry: &mut GridRegistry,
        config: GridConfig,
        columns: ColumnRegistry,
        actions: ActionRegistry,
        source: EntrySource,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        registry.register(&config.grid_id, config.allow_id_override)?;
        Ok(Self {
            config,
            columns,
            actions,
            source,
            view: None,
            executed: false,
        })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn view(&self) -> Option<&GridView> {
        self.view.as_ref()
    }

    /// Handles the current request once; later calls return the same view
    /// without touching the data source or re-running the action.
    pub fn handle(
        &mut self,
        params: &dyn RequestParams,
        store: &mut dyn PreferenceStore,
    ) -> GridResult<&GridView> {
        let view = match self.view.take() {
            Some(view) => view,
            None => self.process(params, store)?,
        };
        let view: &GridView = self.view.insert(view);
        Ok(view)
    }

    fn process(
        &mut self,
        params: &dyn RequestParams,
        store: &mut dyn PreferenceStore,
    ) -> GridResult<GridView> {
        let total = self.source.count_items()?;
        let state = GridStateResolver::new(&self.config).resolve(
            &mut self.columns,
            params,
            store,
            total,
        )?;
        self.columns.distribute_widths(false);
        let entries = self.source.load(&state, &self.columns, &self.config)?;

        let submitted = self
            .actions
            .resolve_submitted(params, &self.config.grid_id)
            .cloned();
        let outcome = match submitted {
            Some(action) => self.dispatch(&action, params, total)?,
            None => GridOutcome::Rendered,
        };

        Ok(GridView {
            show_duplicate_header: entries
                .show_duplicate_header(self.config.duplicate_header_threshold),
            state,
            columns: self.columns.columns().to_vec(),
            entries,
            actions: self.actions.valid_actions().into_iter().cloned().collect(),
            outcome,
        })
    }

    fn dispatch(
        &mut self,
        action: &Action,
        params: &dyn RequestParams,
        total: usize,
    ) -> GridResult<GridOutcome> {
        if !action.runs_on_server() {
            debug!(action = action.name.as_str(), "client-side action, nothing to execute");
            return Ok(GridOutcome::Rendered);
        }

        let selection = resolve_selection(params, &self.config, action, self.source.has_filter())?;
        let ids = match selection {
            Selection::Explicit(ids) => ids,
            Selection::AllFiltered => {
                let EntrySource::Filter(filter) = &mut self.source else {
                    return Err(ConfigError::MissingFilterCriteria {
                        grid: self.config.grid_id.clone(),
                    }
                    .into());
                };
                let coordinator = BatchCoordinator::new(&self.config);
                match batch_window(params, &self.config.grid_id) {
                    Some((from, limit)) => {
                        coordinator.fetch_window(filter.as_mut(), &from, limit)?
                    }
                    None if total <= self.config.batch_threshold => {
                        coordinator.fetch_all(filter.as_mut())?
                    }
                    None => {
                        let plan = coordinator.plan(filter.as_mut(), &action.name, total)?;
                        return Ok(GridOutcome::BatchPlanned(plan));
                    }
                }
            }
        };

        self.execute(action, &ids)
    }

    fn execute(&mut self, action: &Action, ids: &[RowId]) -> GridResult<GridOutcome> {
        if self.executed {
            debug!(action = action.name.as_str(), "action already executed for this request");
            return Ok(GridOutcome::Rendered);
        }
        self.executed = true;

        action.execute(ids).map_err(|source| GridError::Action {
            action: action.name.clone(),
            source,
        })?;
        info!(
            grid = self.config.grid_id.as_str(),
            action = action.name.as_str(),
            rows = ids.len(),
            "executed grid action"
        );
        Ok(GridOutcome::Executed {
            action: action.name.clone(),
            rows: ids.len(),
        })
    }
}

fn batch_window(params: &dyn RequestParams, grid_id: &str) -> Option<(RowId, usize)> {
    let from = params
        .get(&scoped(grid_id, PARAM_BATCH_FROM))
        .map(str::trim)
        .filter(|from| !from.is_empty())?;
    let limit = params
        .parse_usize(&scoped(grid_id, PARAM_BATCH_LIMIT))
        .filter(|limit| *limit > 0)?;
    Some((RowId::from(from), limit))
}
