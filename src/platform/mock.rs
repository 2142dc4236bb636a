//! Scripted in-memory platform for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::conclusion::Conclusion;
use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;

pub type Response = std::result::Result<Vec<RunRecord>, String>;

/// Responses served in order; the last one repeats once the queue drains.
#[derive(Default)]
struct Script {
    queue: VecDeque<Response>,
    last: Option<Response>,
}

impl Script {
    fn next(&mut self) -> Response {
        match self.queue.pop_front() {
            Some(response) => {
                self.last = Some(response.clone());
                response
            }
            None => self.last.clone().unwrap_or_else(|| Ok(Vec::new())),
        }
    }
}

#[derive(Default)]
pub struct MockPlatform {
    checks: Mutex<HashMap<String, Script>>,
    workflows: Mutex<Script>,
    cancel_failures: Mutex<u32>,
    check_calls: Mutex<Vec<String>>,
    workflow_calls: Mutex<usize>,
    cancel_calls: Mutex<Vec<(String, u64)>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check_runs(self, check_name: &str, responses: Vec<Response>) -> Self {
        self.checks.lock().unwrap().insert(
            check_name.to_string(),
            Script {
                queue: responses.into(),
                last: None,
            },
        );
        self
    }

    pub fn with_workflow_runs(self, responses: Vec<Response>) -> Self {
        *self.workflows.lock().unwrap() = Script {
            queue: responses.into(),
            last: None,
        };
        self
    }

    /// Fail the first `count` cancellation requests.
    pub fn with_cancel_failures(self, count: u32) -> Self {
        *self.cancel_failures.lock().unwrap() = count;
        self
    }

    pub fn check_calls(&self) -> Vec<String> {
        self.check_calls.lock().unwrap().clone()
    }

    pub fn workflow_calls(&self) -> usize {
        *self.workflow_calls.lock().unwrap()
    }

    pub fn cancel_calls(&self) -> Vec<u64> {
        self.cancel_targets().into_iter().map(|(_, run_id)| run_id).collect()
    }

    /// Cancellation requests as `("owner/repo", run_id)`.
    pub fn cancel_targets(&self) -> Vec<(String, u64)> {
        self.cancel_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn list_check_runs(&self, _target: &RepoRef, check_name: &str) -> Result<Vec<RunRecord>> {
        self.check_calls.lock().unwrap().push(check_name.to_string());
        self.checks
            .lock()
            .unwrap()
            .entry(check_name.to_string())
            .or_default()
            .next()
            .map_err(AppError::GitHubApi)
    }

    async fn list_workflow_runs(&self, _target: &RepoRef) -> Result<Vec<RunRecord>> {
        *self.workflow_calls.lock().unwrap() += 1;
        self.workflows.lock().unwrap().next().map_err(AppError::GitHubApi)
    }

    async fn cancel_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<()> {
        self.cancel_calls
            .lock()
            .unwrap()
            .push((format!("{owner}/{repo}"), run_id));
        let mut failures = self.cancel_failures.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err(AppError::GitHubApi("503 Service Unavailable".to_string()));
        }
        Ok(())
    }
}

pub fn target() -> RepoRef {
    RepoRef {
        owner: "testOrg".to_string(),
        repo: "testRepo".to_string(),
        git_ref: "abcd".to_string(),
    }
}

pub fn check_run(id: u64, name: &str, state: RunState, started_at: Option<&str>) -> RunRecord {
    RunRecord {
        id,
        name: name.to_string(),
        state,
        started_at: started_at.map(|s| {
            DateTime::parse_from_rfc3339(s)
                .unwrap()
                .with_timezone(&Utc)
        }),
        attempt: None,
    }
}

pub fn workflow_run(name: &str, attempt: u64, state: RunState) -> RunRecord {
    RunRecord {
        id: 10,
        name: name.to_string(),
        state,
        started_at: None,
        attempt: Some(attempt),
    }
}

pub fn completed(conclusion: Conclusion) -> RunState {
    RunState::Completed(conclusion)
}
