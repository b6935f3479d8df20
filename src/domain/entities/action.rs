use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::domain::entities::selection::RowId;
use crate::error::ConfigError;
use crate::usecase::ports::request::{scoped, RequestParams, PARAM_ACTION};

pub type ActionCallback = Arc<dyn Fn(&[RowId]) -> anyhow::Result<()> + Send + Sync>;
pub type EnabledPredicate = Arc<dyn Fn() -> bool + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    Default,
    Confirm { message: String },
    /// Handled entirely in the browser; never executes on the server.
    ClientScript { script: String },
    Separator,
}

#[derive(Clone)]
pub struct Action {
    pub name: String,
    pub label: String,
    pub kind: ActionKind,
    pub supports_select_all: bool,
    enabled: Option<EnabledPredicate>,
    callback: Option<ActionCallback>,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("kind", &self.kind)
            .field("supports_select_all", &self.supports_select_all)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl Action {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: ActionKind::Default,
            supports_select_all: false,
            enabled: None,
            callback: None,
        }
    }

    pub fn separator() -> Self {
        Self {
            kind: ActionKind::Separator,
            ..Self::new("", "")
        }
    }

    pub fn confirm(mut self, message: impl Into<String>) -> Self {
        self.kind = ActionKind::Confirm {
            message: message.into(),
        };
        self
    }

    pub fn client_script(mut self, script: impl Into<String>) -> Self {
        self.kind = ActionKind::ClientScript {
            script: script.into(),
        };
        self
    }

    pub fn select_all(mut self) -> Self {
        self.supports_select_all = true;
        self
    }

    pub fn enabled_when<F>(mut self, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.enabled = Some(Arc::new(predicate));
        self
    }

    pub fn on_execute<F>(mut self, callback: F) -> Self
    where
        F: Fn(&[RowId]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.as_ref().map_or(true, |predicate| predicate())
    }

    pub fn is_separator(&self) -> bool {
        matches!(self.kind, ActionKind::Separator)
    }

    pub fn runs_on_server(&self) -> bool {
        matches!(self.kind, ActionKind::Default | ActionKind::Confirm { .. })
    }

    pub fn execute(&self, ids: &[RowId]) -> anyhow::Result<()> {
        match &self.callback {
            Some(callback) if self.runs_on_server() => callback(ids),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActionRegistry {
    actions: Vec<Action>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, action: Action) -> Result<&mut Self, ConfigError> {
        if !action.is_separator() && self.actions.iter().any(|a| a.name == action.name) {
            return Err(ConfigError::DuplicateAction(action.name));
        }
        self.actions.push(action);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions
            .iter()
            .find(|a| !a.is_separator() && a.name == name)
    }

    pub fn valid_actions(&self) -> Vec<&Action> {
        let mut valid: Vec<&Action> = Vec::new();
        for action in &self.actions {
            if action.is_separator() {
                if valid.last().is_some_and(|prev| !prev.is_separator()) {
                    valid.push(action);
                }
            } else if action.is_enabled() {
                valid.push(action);
            }
        }
        if valid.last().is_some_and(|a| a.is_separator()) {
            valid.pop();
        }
        valid
    }

    pub fn resolve_submitted(&self, params: &dyn RequestParams, grid_id: &str) -> Option<&Action> {
        let submitted = params.get(&scoped(grid_id, PARAM_ACTION))?.trim();
        if submitted.is_empty() {
            return None;
        }
        let resolved = self.get(submitted).filter(|action| action.is_enabled());
        if resolved.is_none() {
            debug!(grid = grid_id, action = submitted, "ignoring unknown or disabled action");
        }
        resolved
    }
}
