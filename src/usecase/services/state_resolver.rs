use tracing::debug;

use crate::config::GridConfig;
use crate::domain::entities::column::ColumnRegistry;
use crate::domain::entities::grid_state::{
    clamp_page, page_count, GridState, SortDirection, SortSpec,
};
use crate::error::GridResult;
use crate::usecase::ports::preferences::{preference_key, PreferenceStore};
use crate::usecase::ports::request::{
    scoped, RequestParams, PARAM_COLUMNS, PARAM_DIRECTION, PARAM_PAGE, PARAM_PAGE_SIZE,
    PARAM_SORT,
};
use crate::usecase::services::layered::{Layer, LayeredResolver};

pub const SETTING_PAGE: &str = "page";
pub const SETTING_PAGE_SIZE: &str = "page_size";
pub const SETTING_SORT: &str = "sort";
pub const SETTING_DIRECTION: &str = "dir";
pub const SETTING_COLUMNS: &str = "columns";

#[derive(Debug, Default)]
struct Persisted {
    page: Option<String>,
    page_size: Option<String>,
    sort: Option<String>,
    direction: Option<String>,
    columns: Option<String>,
}

pub struct GridStateResolver<'a> {
    config: &'a GridConfig,
}

impl<'a> GridStateResolver<'a> {
    pub fn new(config: &'a GridConfig) -> Self {
        Self { config }
    }

    pub fn resolve(
        &self,
        columns: &mut ColumnRegistry,
        params: &dyn RequestParams,
        store: &mut dyn PreferenceStore,
        total: usize,
    ) -> GridResult<GridState> {
        let grid = self.config.grid_id.as_str();
        let param = |name: &str| scoped(grid, name);
        let persisted = self.load_persisted(store)?;

        let page_size = LayeredResolver::new()
            .layer(Layer::Request, || {
                params
                    .parse_usize(&param(PARAM_PAGE_SIZE))
                    .filter(|size| self.config.allows_page_size(*size))
            })
            .layer(Layer::Persisted, || {
                persisted
                    .page_size
                    .as_deref()
                    .and_then(|v| v.parse().ok())
                    .filter(|size| self.config.allows_page_size(*size))
            })
            .layer(Layer::Configured, || Some(self.config.default_page_size))
            .resolve();
        let (page_size, page_size_layer) = match page_size {
            Some(resolved) => (resolved.value, resolved.layer),
            None => (self.config.default_page_size, Layer::Configured),
        };

        if self.config.column_controls {
            let visible = LayeredResolver::new()
                .layer(Layer::Request, || {
                    let requested = params.get_all(&param(PARAM_COLUMNS));
                    known_columns(columns, requested.iter().flat_map(|v| v.split(',')))
                })
                .layer(Layer::Persisted, || {
                    persisted
                        .columns
                        .as_deref()
                        .and_then(|v| known_columns(columns, v.split(',')))
                })
                .value();
            if let Some(visible) = visible {
                columns.apply_visibility(&visible);
            }
        }

        let sort = LayeredResolver::new()
            .layer(Layer::Request, || {
                params
                    .get(&param(PARAM_SORT))
                    .and_then(|key| columns.sortable(key.trim()))
            })
            .layer(Layer::Persisted, || {
                persisted
                    .sort
                    .as_deref()
                    .and_then(|key| columns.sortable(key))
            })
            .layer(Layer::Configured, || {
                self.config
                    .default_sort
                    .as_deref()
                    .and_then(|key| columns.sortable(key))
            })
            .layer(Layer::Fallback, || columns.first_sortable())
            .resolve();

        let direction_param = params
            .get(&param(PARAM_DIRECTION))
            .and_then(SortDirection::parse);
        let direction = direction_param
            .or_else(|| persisted.direction.as_deref().and_then(SortDirection::parse))
            .unwrap_or(self.config.default_sort_direction);

        let sort_key = sort.as_ref().map(|resolved| resolved.value.order_key.clone());
        let sort_changed = sort
            .as_ref()
            .is_some_and(|s| s.layer == Layer::Request && sort_key != persisted.sort);
        let size_changed = page_size_layer == Layer::Request
            && persisted.page_size.as_deref() != Some(page_size.to_string().as_str());
        let direction_changed = direction_param.is_some_and(|dir| {
            persisted.direction.as_deref().and_then(SortDirection::parse) != Some(dir)
        });
        let reset_page = sort_changed || size_changed || direction_changed;

        let requested_page = LayeredResolver::new()
            .layer(Layer::Request, || params.parse_usize(&param(PARAM_PAGE)))
            .layer(Layer::Persisted, || {
                if reset_page {
                    return None;
                }
                persisted.page.as_deref().and_then(|v| v.parse().ok())
            })
            .layer(Layer::Configured, || Some(1))
            .value()
            .unwrap_or(1);
        let page = clamp_page(requested_page, total, page_size);

        let sort = sort.map(|resolved| SortSpec {
            order_key: resolved.value.order_key.clone(),
            data_key: resolved.value.data_key.clone(),
            direction,
        });

        let state = GridState {
            grid_id: grid.to_string(),
            page,
            page_size,
            sort,
            column_controls_enabled: self.config.column_controls,
            visible_columns: columns.visible_order_keys(),
            total,
            page_count: page_count(total, page_size),
        };

        debug!(
            grid,
            page = state.page,
            page_size = state.page_size,
            sort = state.sort.as_ref().map(|s| s.order_key.as_str()),
            direction = direction.as_str(),
            reset_page,
            "resolved grid state"
        );

        self.persist(&state, direction, store)?;
        Ok(state)
    }

    fn load_persisted(&self, store: &dyn PreferenceStore) -> GridResult<Persisted> {
        let grid = self.config.grid_id.as_str();
        let get = |setting: &str| store.get(&preference_key(grid, setting));
        Ok(Persisted {
            page: get(SETTING_PAGE)?,
            page_size: get(SETTING_PAGE_SIZE)?,
            sort: get(SETTING_SORT)?,
            direction: get(SETTING_DIRECTION)?,
            columns: if self.config.column_controls {
                get(SETTING_COLUMNS)?
            } else {
                None
            },
        })
    }

    fn persist(
        &self,
        state: &GridState,
        direction: SortDirection,
        store: &mut dyn PreferenceStore,
    ) -> GridResult<()> {
        let grid = self.config.grid_id.as_str();
        let ttl = self.config.preference_ttl();
        let sort = state
            .sort
            .as_ref()
            .map(|s| s.order_key.as_str())
            .unwrap_or("");

        store.set(&preference_key(grid, SETTING_PAGE), &state.page.to_string(), ttl)?;
        store.set(
            &preference_key(grid, SETTING_PAGE_SIZE),
            &state.page_size.to_string(),
            ttl,
        )?;
        store.set(&preference_key(grid, SETTING_SORT), sort, ttl)?;
        store.set(
            &preference_key(grid, SETTING_DIRECTION),
            direction.as_str(),
            ttl,
        )?;
        if state.column_controls_enabled {
            store.set(
                &preference_key(grid, SETTING_COLUMNS),
                &state.visible_columns.join(","),
                ttl,
            )?;
        }
        Ok(())
    }
}

fn known_columns<'k>(
    columns: &ColumnRegistry,
    keys: impl Iterator<Item = &'k str>,
) -> Option<Vec<String>> {
    let known: Vec<String> = keys
        .map(str::trim)
        .filter(|key| {
            columns
                .find_by_order_key(key)
                .is_some_and(|column| !column.is_action)
        })
        .map(str::to_string)
        .collect();
    (!known.is_empty()).then_some(known)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::column::Column;
    use crate::usecase::ports::preferences::InMemoryPreferenceStore;
    use crate::usecase::ports::request::QueryParams;

    fn columns() -> ColumnRegistry {
        ColumnRegistry::new()
            .with(Column::new("id", "ID"))
            .with(Column::new("name", "Name").sortable())
            .with(Column::new("email", "E-mail").sortable())
            .with(Column::action("ops", "Operations"))
    }

    fn config() -> GridConfig {
        GridConfig {
            page_size_choices: vec![10, 25, 50],
            default_page_size: 10,
            ..GridConfig::new("users")
        }
    }

    fn resolve(
        config: &GridConfig,
        columns: &mut ColumnRegistry,
        params: &QueryParams,
        store: &mut InMemoryPreferenceStore,
        total: usize,
    ) -> GridState {
        GridStateResolver::new(config)
            .resolve(columns, params, store, total)
            .expect("state should resolve")
    }

    #[test]
    fn request_overrides_are_persisted_for_the_next_request() {
        let config = config();
        let mut store = InMemoryPreferenceStore::new();
        let params = QueryParams::new()
            .with("users_page", "3")
            .with("users_page_size", "25")
            .with("users_sort", "email")
            .with("users_dir", "desc");

        let first = resolve(&config, &mut columns(), &params, &mut store, 200);
        assert_eq!(first.page, 3);
        assert_eq!(first.page_size, 25);
        assert_eq!(first.sort.as_ref().map(|s| s.order_key.as_str()), Some("email"));

        let second = resolve(&config, &mut columns(), &QueryParams::new(), &mut store, 200);
        assert_eq!(second, first);
    }

    #[test]
    fn sort_falls_back_to_configured_then_first_sortable() {
        let mut store = InMemoryPreferenceStore::new();
        let configured = GridConfig {
            default_sort: Some("email".to_string()),
            ..config()
        };
        let state = resolve(&configured, &mut columns(), &QueryParams::new(), &mut store, 5);
        assert_eq!(state.sort.map(|s| s.order_key), Some("email".to_string()));

        let mut store = InMemoryPreferenceStore::new();
        let unsortable_default = GridConfig {
            default_sort: Some("id".to_string()),
            ..config()
        };
        let state = resolve(&unsortable_default, &mut columns(), &QueryParams::new(), &mut store, 5);
        assert_eq!(state.sort.map(|s| s.order_key), Some("name".to_string()));

        let mut store = InMemoryPreferenceStore::new();
        let mut plain = ColumnRegistry::new().with(Column::new("id", "ID"));
        let state = resolve(&config(), &mut plain, &QueryParams::new(), &mut store, 5);
        assert_eq!(state.sort, None);
    }

    #[test]
    fn unknown_sort_key_and_page_size_fall_through() {
        let mut store = InMemoryPreferenceStore::new();
        let params = QueryParams::new()
            .with("users_sort", "ops")
            .with("users_page_size", "7");
        let state = resolve(&config(), &mut columns(), &params, &mut store, 5);
        assert_eq!(state.sort.map(|s| s.order_key), Some("name".to_string()));
        assert_eq!(state.page_size, 10);
    }

    #[test]
    fn out_of_range_page_is_clamped() {
        let mut store = InMemoryPreferenceStore::new();
        let params = QueryParams::new().with("users_page", "99");
        let state = resolve(&config(), &mut columns(), &params, &mut store, 42);
        assert_eq!(state.page, 5);
        assert_eq!(state.page_count, 5);

        let params = QueryParams::new().with("users_page", "0");
        let state = resolve(&config(), &mut columns(), &params, &mut store, 0);
        assert_eq!(state.page, 1);
        assert_eq!(state.page_count, 0);
    }

    #[test]
    fn changing_sort_resets_persisted_page() {
        let config = config();
        let mut store = InMemoryPreferenceStore::new();
        let params = QueryParams::new().with("users_page", "4");
        resolve(&config, &mut columns(), &params, &mut store, 100);

        let params = QueryParams::new().with("users_sort", "email");
        let state = resolve(&config, &mut columns(), &params, &mut store, 100);
        assert_eq!(state.page, 1);

        let params = QueryParams::new().with("users_page", "2");
        resolve(&config, &mut columns(), &params, &mut store, 100);
        let params = QueryParams::new().with("users_sort", "email");
        let state = resolve(&config, &mut columns(), &params, &mut store, 100);
        assert_eq!(state.page, 2, "re-submitting the current sort keeps the page");
    }

    #[test]
    fn zero_page_size_disables_pagination() {
        let config = GridConfig {
            page_size_choices: vec![0, 10],
            ..config()
        };
        let mut store = InMemoryPreferenceStore::new();
        let params = QueryParams::new()
            .with("users_page_size", "0")
            .with("users_page", "3");
        let state = resolve(&config, &mut columns(), &params, &mut store, 500);
        assert_eq!(state.page_size, 0);
        assert_eq!(state.page_count, 0);
        assert_eq!(state.page, 1);
        assert_eq!(state.limit(), None);
    }

    #[test]
    fn column_controls_apply_and_persist_visibility() {
        let config = GridConfig {
            column_controls: true,
            ..config()
        };
        let mut store = InMemoryPreferenceStore::new();
        let params = QueryParams::new().with("users_columns", "name,bogus");
        let mut registry = columns();
        let state = resolve(&config, &mut registry, &params, &mut store, 5);
        assert_eq!(state.visible_columns, vec!["name".to_string()]);

        let mut fresh = columns();
        let state = resolve(&config, &mut fresh, &QueryParams::new(), &mut store, 5);
        assert_eq!(state.visible_columns, vec!["name".to_string()]);
        assert!(fresh.find_by_order_key("email").is_some_and(|c| c.hidden));
    }

    #[test]
    fn action_column_keys_do_not_hide_data_columns() {
        let config = GridConfig {
            column_controls: true,
            ..config()
        };
        let mut store = InMemoryPreferenceStore::new();
        let params = QueryParams::new().with("users_columns", "ops");
        let mut registry = columns();
        let state = resolve(&config, &mut registry, &params, &mut store, 5);
        assert_eq!(
            state.visible_columns,
            vec!["id".to_string(), "name".to_string(), "email".to_string()]
        );
        assert!(registry.columns().iter().all(|c| !c.hidden));
    }
}
