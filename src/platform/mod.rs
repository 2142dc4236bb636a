pub mod github;
#[cfg(test)]
pub mod mock;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use types::*;

/// Remote status API the poller queries.
///
/// An empty list is a valid "nothing yet" answer; errors are transport or
/// authentication failures and end the invocation.
#[async_trait]
pub trait Platform: Send + Sync {
    /// List check runs with the given name on a ref.
    async fn list_check_runs(&self, target: &RepoRef, check_name: &str) -> Result<Vec<RunRecord>>;

    /// List all workflow runs for a ref, regardless of workflow name.
    async fn list_workflow_runs(&self, target: &RepoRef) -> Result<Vec<RunRecord>>;

    /// Request cancellation of a workflow run.
    async fn cancel_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<()>;
}
