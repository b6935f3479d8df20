use crate::config::GridConfig;
use crate::domain::entities::action::Action;
use crate::domain::entities::selection::Selection;
use crate::error::ConfigError;
use crate::usecase::ports::request::{scoped, RequestParams, PARAM_IDS, PARAM_SELECT_ALL};

pub fn resolve_selection(
    params: &dyn RequestParams,
    config: &GridConfig,
    action: &Action,
    has_filter: bool,
) -> Result<Selection, ConfigError> {
    let grid = config.grid_id.as_str();

    if action.supports_select_all && params.flag(&scoped(grid, PARAM_SELECT_ALL)) {
        if config.primary_key_name.is_none() {
            return Err(ConfigError::MissingPrimaryKey {
                grid: grid.to_string(),
            });
        }
        if !has_filter {
            return Err(ConfigError::MissingFilterCriteria {
                grid: grid.to_string(),
            });
        }
        return Ok(Selection::AllFiltered);
    }

    let submitted = params.get_all(&scoped(grid, PARAM_IDS));
    Ok(Selection::explicit(
        submitted
            .iter()
            .flat_map(|value| value.split(','))
            .map(str::trim),
    ))
}
