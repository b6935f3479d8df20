use tracing::{info, warn};

use crate::config::GridConfig;
use crate::domain::entities::batch::{batch_size_for, BatchPlan};
use crate::domain::entities::selection::RowId;
use crate::error::{ConfigError, GridError, GridResult};
use crate::usecase::ports::filter::FilterCriteria;

pub struct BatchCoordinator<'a> {
    config: &'a GridConfig,
}

impl<'a> BatchCoordinator<'a> {
    pub fn new(config: &'a GridConfig) -> Self {
        Self { config }
    }

    fn primary_key(&self) -> Result<&'a str, ConfigError> {
        self.config
            .primary_key_name
            .as_deref()
            .ok_or_else(|| ConfigError::MissingPrimaryKey {
                grid: self.config.grid_id.clone(),
            })
    }

    pub fn fetch_all(&self, filter: &mut dyn FilterCriteria) -> GridResult<Vec<RowId>> {
        let key = self.primary_key()?;
        filter.set_limit(None, 0);
        let rows = filter.get_items()?;

        let mut ids = Vec::with_capacity(rows.len());
        let mut skipped = 0_usize;
        for row in rows {
            match row.get(key).filter(|value| !value.is_empty()) {
                Some(value) => ids.push(RowId(value.clone())),
                None => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(
                grid = self.config.grid_id.as_str(),
                key, skipped, "rows without a primary key were left out of the selection"
            );
        }
        Ok(ids)
    }

    pub fn fetch_window(
        &self,
        filter: &mut dyn FilterCriteria,
        from: &RowId,
        limit: usize,
    ) -> GridResult<Vec<RowId>> {
        let ids = self.fetch_all(filter)?;
        let Some(start) = ids.iter().position(|id| id == from) else {
            warn!(
                grid = self.config.grid_id.as_str(),
                anchor = from.as_str(),
                "chunk anchor left the filter"
            );
            return Err(GridError::StaleChunk {
                anchor: from.to_string(),
            });
        };
        Ok(ids.into_iter().skip(start).take(limit).collect())
    }

    pub fn plan(
        &self,
        filter: &mut dyn FilterCriteria,
        action_name: &str,
        expected_total: usize,
    ) -> GridResult<BatchPlan> {
        let ids = self.fetch_all(filter)?;
        if ids.len() != expected_total {
            warn!(
                grid = self.config.grid_id.as_str(),
                expected_total,
                fetched = ids.len(),
                "filtered row count changed while planning batches"
            );
        }

        let batch_size = batch_size_for(
            ids.len(),
            self.config.batch_min_size,
            self.config.batch_max_size,
        );
        let plan = BatchPlan::new(action_name, ids, batch_size);
        info!(
            grid = self.config.grid_id.as_str(),
            action = action_name,
            rows = plan.total(),
            batch_size,
            steps = plan.step_count(),
            "planned batch execution"
        );
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::entry::Row;
    use crate::infra::memory::MemoryFilterCriteria;

    fn filter(n: usize) -> MemoryFilterCriteria {
        let rows = (1..=n)
            .map(|i| Row::from([("id".to_string(), i.to_string())]))
            .collect();
        MemoryFilterCriteria::new(rows)
    }

    fn config() -> GridConfig {
        GridConfig {
            primary_key_name: Some("id".to_string()),
            ..GridConfig::new("orders")
        }
    }

    #[test]
    fn plan_ignores_page_limit() {
        let config = config();
        let mut filter = filter(237);
        filter.set_limit(Some(10), 30);

        let plan = BatchCoordinator::new(&config)
            .plan(&mut filter, "archive", 237)
            .expect("plan should build");

        assert_eq!(plan.total(), 237);
        assert_eq!(plan.batch_size, 24);
        assert_eq!(plan.step_count(), 10);
        assert_eq!(plan.all_ids.first(), Some(&RowId::from("1")));
    }

    #[test]
    fn plan_respects_configured_ceiling() {
        let config = GridConfig {
            batch_max_size: 15,
            ..config()
        };
        let plan = BatchCoordinator::new(&config)
            .plan(&mut filter(1000), "archive", 1000)
            .expect("plan should build");
        assert_eq!(plan.batch_size, 15);
        assert_eq!(plan.step_count(), 67);
    }

    #[test]
    fn rows_without_key_are_skipped() {
        let config = config();
        let rows = vec![
            Row::from([("id".to_string(), "1".to_string())]),
            Row::from([("name".to_string(), "no key".to_string())]),
            Row::from([("id".to_string(), String::new())]),
        ];
        let ids = BatchCoordinator::new(&config)
            .fetch_all(&mut MemoryFilterCriteria::new(rows))
            .expect("ids should fetch");
        assert_eq!(ids, vec![RowId::from("1")]);
    }

    #[test]
    fn plan_follows_rows_fetched_when_filter_shrank() {
        let config = config();
        let plan = BatchCoordinator::new(&config)
            .plan(&mut filter(30), "archive", 40)
            .expect("plan should build");
        assert_eq!(plan.total(), 30);
        assert_eq!(plan.batch_size, 3);
    }

    #[test]
    fn window_fetch_starts_at_anchor() {
        let config = config();
        let coordinator = BatchCoordinator::new(&config);
        let ids = coordinator
            .fetch_window(&mut filter(50), &RowId::from("25"), 24)
            .expect("ids should fetch");
        assert_eq!(ids.len(), 24);
        assert_eq!(ids[0], RowId::from("25"));

        let tail = coordinator
            .fetch_window(&mut filter(50), &RowId::from("45"), 24)
            .expect("ids should fetch");
        assert_eq!(tail.len(), 6);
    }

    #[test]
    fn window_fetch_follows_anchor_when_earlier_rows_left() {
        let config = config();
        let rows = (11..=30)
            .map(|i| Row::from([("id".to_string(), i.to_string())]))
            .collect();
        let ids = BatchCoordinator::new(&config)
            .fetch_window(&mut MemoryFilterCriteria::new(rows), &RowId::from("11"), 10)
            .expect("ids should fetch");
        let expected: Vec<RowId> = (11..=20).map(|i: i64| RowId::from(i)).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn window_fetch_fails_when_anchor_is_gone() {
        let config = config();
        let err = BatchCoordinator::new(&config)
            .fetch_window(&mut filter(5), &RowId::from("9"), 3)
            .expect_err("missing anchor should fail");
        assert!(matches!(err, GridError::StaleChunk { ref anchor } if anchor == "9"));
    }

    #[test]
    fn missing_primary_key_is_a_config_error() {
        let config = GridConfig::new("orders");
        let err = BatchCoordinator::new(&config)
            .fetch_all(&mut filter(3))
            .expect_err("should fail without key");
        assert!(matches!(
            err,
            GridError::Config(ConfigError::MissingPrimaryKey { .. })
        ));
    }
}
