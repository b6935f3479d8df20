use std::path::Path;

use chrono::Duration;
use serde::Deserialize;

use crate::domain::entities::grid_state::SortDirection;
use crate::error::ConfigError;

pub const DEFAULT_BATCH_MAX_SIZE: usize = 60;
pub const DEFAULT_PAGE_SIZE: usize = 30;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub grid_id: String,
    pub allow_id_override: bool,
    /// Page sizes a request may pick. Empty accepts any size; 0 disables pagination.
    pub page_size_choices: Vec<usize>,
    pub default_page_size: usize,
    pub default_sort: Option<String>,
    pub default_sort_direction: SortDirection,
    pub column_controls: bool,
    pub primary_key_name: Option<String>,
    pub batch_min_size: usize,
    pub batch_max_size: usize,
    pub batch_threshold: usize,
    pub preference_ttl_days: u32,
    pub duplicate_header_threshold: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_id: String::new(),
            allow_id_override: false,
            page_size_choices: vec![10, 30, 50, 100],
            default_page_size: DEFAULT_PAGE_SIZE,
            default_sort: None,
            default_sort_direction: SortDirection::Asc,
            column_controls: false,
            primary_key_name: None,
            batch_min_size: 1,
            batch_max_size: DEFAULT_BATCH_MAX_SIZE,
            batch_threshold: DEFAULT_BATCH_MAX_SIZE,
            preference_ttl_days: 30,
            duplicate_header_threshold: 20,
        }
    }
}

impl GridConfig {
    pub fn new(grid_id: impl Into<String>) -> Self {
        Self {
            grid_id: grid_id.into(),
            ..Self::default()
        }
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str::<GridConfig>(contents)
            .map_err(|e| ConfigError::Load(format!("failed to parse grid config: {e}")))
    }

    pub fn preference_ttl(&self) -> Duration {
        Duration::days(i64::from(self.preference_ttl_days))
    }

    pub fn allows_page_size(&self, size: usize) -> bool {
        self.page_size_choices.is_empty() || self.page_size_choices.contains(&size)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_id.trim().is_empty() {
            return Err(ConfigError::EmptyGridId);
        }
        if self.batch_max_size == 0 {
            return Err(ConfigError::ZeroBound {
                field: "batch_max_size",
            });
        }
        if self.batch_min_size > self.batch_max_size {
            return Err(ConfigError::InvalidRange {
                field: "batch size",
                min: self.batch_min_size,
                max: self.batch_max_size,
            });
        }
        if !self.allows_page_size(self.default_page_size) {
            return Err(ConfigError::PageSizeNotAllowed {
                size: self.default_page_size,
                choices: self.page_size_choices.clone(),
            });
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<GridConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("failed to read '{}': {e}", path.display())))?;
    let config = GridConfig::from_yaml_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let config = GridConfig::from_yaml_str(
            "grid_id: users\nprimary_key_name: id\ndefault_sort_direction: desc\nbatch_max_size: 40\n",
        )
        .expect("config should parse");

        assert_eq!(config.grid_id, "users");
        assert_eq!(config.primary_key_name.as_deref(), Some("id"));
        assert_eq!(config.default_sort_direction, SortDirection::Desc);
        assert_eq!(config.batch_max_size, 40);
        assert_eq!(config.default_page_size, DEFAULT_PAGE_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_batch_range() {
        let config = GridConfig {
            batch_min_size: 10,
            batch_max_size: 5,
            ..GridConfig::new("users")
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidRange {
                field: "batch size",
                min: 10,
                max: 5
            })
        );
    }

    #[test]
    fn validate_rejects_default_page_size_outside_choices() {
        let config = GridConfig {
            default_page_size: 25,
            ..GridConfig::new("users")
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::PageSizeNotAllowed { size: 25, .. })
        ));
        assert_eq!(GridConfig::default().validate(), Err(ConfigError::EmptyGridId));
    }
}
