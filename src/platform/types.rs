use chrono::{DateTime, Utc};

use crate::conclusion::Conclusion;

/// Repository and git ref that runs are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    pub git_ref: String,
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}@{}", self.owner, self.repo, self.git_ref)
    }
}

/// Lifecycle of a run. Only a completed run carries a conclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Queued, waiting or requested.
    Pending,
    InProgress,
    Completed(Conclusion),
}

/// One observed execution of a check run or workflow run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub id: u64,
    pub name: String,
    pub state: RunState,
    /// Set for check runs.
    pub started_at: Option<DateTime<Utc>>,
    /// Set for workflow runs.
    pub attempt: Option<u64>,
}

impl RunRecord {
    pub fn conclusion(&self) -> Option<&Conclusion> {
        match &self.state {
            RunState::Completed(conclusion) => Some(conclusion),
            _ => None,
        }
    }

    pub fn status(&self) -> &'static str {
        match self.state {
            RunState::Pending => "pending",
            RunState::InProgress => "in_progress",
            RunState::Completed(_) => "completed",
        }
    }
}
