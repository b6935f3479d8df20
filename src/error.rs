use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid id must not be empty")]
    EmptyGridId,

    #[error("grid id `{0}` is already registered")]
    DuplicateGridId(String),

    #[error("action `{0}` is registered twice")]
    DuplicateAction(String),

    #[error("grid `{grid}` selects all filtered rows but has no primary key name")]
    MissingPrimaryKey { grid: String },

    #[error("grid `{grid}` selects all filtered rows but has no filter criteria attached")]
    MissingFilterCriteria { grid: String },

    #[error("invalid range for {field}: min {min} is greater than max {max}")]
    InvalidRange {
        field: &'static str,
        min: usize,
        max: usize,
    },

    #[error("{field} must be at least 1")]
    ZeroBound { field: &'static str },

    #[error("default page size {size} is not one of the allowed choices {choices:?}")]
    PageSizeNotAllowed { size: usize, choices: Vec<usize> },

    #[error("failed to load config: {0}")]
    Load(String),
}

#[derive(Error, Debug)]
pub enum GridError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("data source error: {0}")]
    Source(String),

    #[error("preference store error: {0}")]
    Store(String),

    #[error("batch chunk starting at row `{anchor}` no longer matches the filter")]
    StaleChunk { anchor: String },

    #[error("action `{action}` failed: {source}")]
    Action {
        action: String,
        #[source]
        source: anyhow::Error,
    },
}

impl GridError {
    pub fn is_config(&self) -> bool {
        matches!(self, GridError::Config(_))
    }
}

pub type GridResult<T> = Result<T, GridError>;
