use crate::domain::entities::selection::RowId;
use crate::usecase::ports::request::{
    scoped, PARAM_ACTION, PARAM_BATCH_FROM, PARAM_BATCH_LIMIT, PARAM_IDS, PARAM_SELECT_ALL,
};

pub fn batch_size_for(total: usize, min: usize, max: usize) -> usize {
    let min = min.max(1);
    let max = max.max(min);
    total.div_ceil(10).clamp(min, max)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub offset: usize,
    pub ids: Vec<RowId>,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn request_params(&self, grid_id: &str, action: &str) -> Vec<(String, String)> {
        let mut params = vec![(scoped(grid_id, PARAM_ACTION), action.to_string())];
        params.extend(
            self.ids
                .iter()
                .map(|id| (scoped(grid_id, PARAM_IDS), id.to_string())),
        );
        params
    }

    /// The server re-derives the slice from the active filter, starting at this
    /// chunk's first row rather than at a position that earlier chunks may shift.
    pub fn window_params(&self, grid_id: &str, action: &str) -> Vec<(String, String)> {
        let mut params = vec![
            (scoped(grid_id, PARAM_ACTION), action.to_string()),
            (scoped(grid_id, PARAM_SELECT_ALL), "1".to_string()),
            (scoped(grid_id, PARAM_BATCH_LIMIT), self.len().to_string()),
        ];
        if let Some(first) = self.ids.first() {
            params.push((scoped(grid_id, PARAM_BATCH_FROM), first.to_string()));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub action_name: String,
    pub all_ids: Vec<RowId>,
    pub batch_size: usize,
    cursor: usize,
}

impl BatchPlan {
    pub fn new(action_name: impl Into<String>, all_ids: Vec<RowId>, batch_size: usize) -> Self {
        Self {
            action_name: action_name.into(),
            all_ids,
            batch_size: batch_size.max(1),
            cursor: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.all_ids.len()
    }

    pub fn step_count(&self) -> usize {
        self.all_ids.len().div_ceil(self.batch_size)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn progress(&self) -> (usize, usize) {
        (self.cursor, self.all_ids.len())
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.all_ids.len()
    }

    pub fn resume_at(mut self, cursor: usize) -> Self {
        self.cursor = cursor.min(self.all_ids.len());
        self
    }
}

impl Iterator for BatchPlan {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.is_exhausted() {
            return None;
        }
        let offset = self.cursor;
        let end = (offset + self.batch_size).min(self.all_ids.len());
        self.cursor = end;
        Some(Chunk {
            index: offset / self.batch_size,
            offset,
            ids: self.all_ids[offset..end].to_vec(),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.all_ids.len() - self.cursor).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    StopOnFailure,
    Continue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkOutcome {
    pub index: usize,
    pub rows: usize,
    pub error: Option<String>,
}

impl ChunkOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub outcomes: Vec<ChunkOutcome>,
    pub total_rows: usize,
    pub cancelled: bool,
}

impl BatchReport {
    pub fn succeeded_rows(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.succeeded())
            .map(|o| o.rows)
            .sum()
    }

    pub fn failed_chunks(&self) -> Vec<usize> {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded())
            .map(|o| o.index)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.succeeded_rows() == self.total_rows
    }
}

pub struct BatchRun {
    plan: BatchPlan,
    policy: FailurePolicy,
}

impl BatchRun {
    pub fn new(plan: BatchPlan) -> Self {
        Self {
            plan,
            policy: FailurePolicy::default(),
        }
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn drive<D, C>(self, mut dispatch: D, mut cancelled: C) -> BatchReport
    where
        D: FnMut(&Chunk) -> anyhow::Result<()>,
        C: FnMut(&BatchReport) -> bool,
    {
        let mut report = BatchReport {
            total_rows: self.plan.total(),
            ..BatchReport::default()
        };

        for chunk in self.plan {
            if cancelled(&report) {
                report.cancelled = true;
                break;
            }
            let error = dispatch(&chunk).err().map(|err| format!("{err:#}"));
            let failed = error.is_some();
            report.outcomes.push(ChunkOutcome {
                index: chunk.index,
                rows: chunk.len(),
                error,
            });
            if failed && self.policy == FailurePolicy::StopOnFailure {
                break;
            }
        }

        report
    }
}
