pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod usecase;

pub use config::{load_config, GridConfig};
pub use domain::entities::action::{Action, ActionKind, ActionRegistry};
pub use domain::entities::batch::{
    batch_size_for, BatchPlan, BatchReport, BatchRun, Chunk, ChunkOutcome, FailurePolicy,
};
pub use domain::entities::column::{Column, ColumnRegistry, ColumnWidth};
pub use domain::entities::entry::{Entry, EntrySet, Row};
pub use domain::entities::grid_state::{GridState, SortDirection, SortSpec};
pub use domain::entities::selection::{RowId, Selection};
pub use error::{ConfigError, GridError, GridResult};
pub use usecase::ports::filter::{FilterCriteria, GridStateHints};
pub use usecase::ports::preferences::{InMemoryPreferenceStore, PreferenceStore};
pub use usecase::ports::request::{QueryParams, RequestParams};
pub use usecase::services::entry_service::EntrySource;
pub use usecase::services::grid_controller::{GridController, GridOutcome, GridRegistry, GridView};
