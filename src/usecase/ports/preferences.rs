use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::error::GridResult;

pub trait PreferenceStore {
    fn get(&self, key: &str) -> GridResult<Option<String>>;
    fn set(&mut self, key: &str, value: &str, ttl: Duration) -> GridResult<()>;
}

pub fn preference_key(grid_id: &str, setting: &str) -> String {
    format!("{grid_id}:{setting}")
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryPreferenceStore {
    values: HashMap<String, (String, DateTime<Utc>)>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, key: &str) -> GridResult<Option<String>> {
        Ok(self
            .values
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Utc::now())
            .map(|(value, _)| value.clone()))
    }

    fn set(&mut self, key: &str, value: &str, ttl: Duration) -> GridResult<()> {
        self.values
            .insert(key.to_string(), (value.to_string(), Utc::now() + ttl));
        Ok(())
    }
}
