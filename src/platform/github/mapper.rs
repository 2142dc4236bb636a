use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::conclusion::Conclusion;
use crate::platform::types::{RunRecord, RunState};

/// Response of `GET /repos/{owner}/{repo}/commits/{ref}/check-runs`.
#[derive(Debug, Deserialize)]
pub struct CheckRunList {
    #[serde(default)]
    pub total_count: u64,
    pub check_runs: Vec<ApiCheckRun>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCheckRun {
    pub id: u64,
    pub name: String,
    pub status: String,
    pub conclusion: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

/// Response of `GET /repos/{owner}/{repo}/actions/runs`.
#[derive(Debug, Deserialize)]
pub struct WorkflowRunList {
    #[serde(default)]
    pub total_count: u64,
    pub workflow_runs: Vec<ApiWorkflowRun>,
}

#[derive(Debug, Deserialize)]
pub struct ApiWorkflowRun {
    pub id: u64,
    pub name: Option<String>,
    pub status: Option<String>,
    pub conclusion: Option<String>,
    pub run_attempt: Option<u64>,
}

/// Map a GitHub check run to a run record.
pub fn map_check_run(run: ApiCheckRun) -> RunRecord {
    RunRecord {
        id: run.id,
        state: map_state(run.id, Some(run.status.as_str()), run.conclusion.as_deref()),
        name: run.name,
        started_at: run.started_at,
        attempt: None,
    }
}

/// Map a GitHub workflow run to a run record.
pub fn map_workflow_run(run: ApiWorkflowRun) -> RunRecord {
    RunRecord {
        id: run.id,
        state: map_state(run.id, run.status.as_deref(), run.conclusion.as_deref()),
        name: run.name.unwrap_or_default(),
        started_at: None,
        attempt: run.run_attempt,
    }
}

fn map_state(id: u64, status: Option<&str>, conclusion: Option<&str>) -> RunState {
    match (status, conclusion) {
        (Some("completed"), Some(conclusion)) => RunState::Completed(Conclusion::from_api(conclusion)),
        (Some("completed"), None) => {
            tracing::warn!(run_id = id, "Run is completed but has no conclusion yet");
            RunState::InProgress
        }
        (Some("in_progress"), _) => RunState::InProgress,
        _ => RunState::Pending,
    }
}
