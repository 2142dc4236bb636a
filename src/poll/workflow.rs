use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;

use crate::conclusion::{summarize_conclusions, Conclusion, SuccessSet};
use crate::error::{AppError, Result};
use crate::platform::types::RepoRef;
use crate::platform::Platform;

use super::{poll, select, Attempt, PollConfig, Resolver};

/// Resolves the highest attempt of one named workflow at a ref.
pub struct WorkflowResolver<'a> {
    platform: &'a dyn Platform,
    target: &'a RepoRef,
    workflow_name: &'a str,
    config: PollConfig,
}

impl<'a> WorkflowResolver<'a> {
    pub fn new(
        platform: &'a dyn Platform,
        target: &'a RepoRef,
        workflow_name: &'a str,
        config: PollConfig,
    ) -> Self {
        Self {
            platform,
            target,
            workflow_name,
            config,
        }
    }
}

#[async_trait]
impl<'a> Resolver for WorkflowResolver<'a> {
    async fn attempt(&mut self) -> Result<Attempt> {
        tracing::info!(
            workflow = self.workflow_name,
            repo = %self.target,
            "Retrieving workflow runs"
        );
        let all_runs = self.platform.list_workflow_runs(self.target).await?;
        tracing::info!(count = all_runs.len(), "Retrieved workflow runs");

        if all_runs.is_empty() {
            tracing::info!(git_ref = %self.target.git_ref, "No workflow runs found");
            return Ok(Attempt::Absent);
        }

        let (runs, others): (Vec<_>, Vec<_>) = all_runs
            .into_iter()
            .partition(|run| run.name == self.workflow_name);

        if runs.is_empty() {
            let present: BTreeSet<&str> = others.iter().map(|run| run.name.as_str()).collect();
            tracing::info!(
                workflow = self.workflow_name,
                present = ?present,
                "No workflow run with this name; other workflow names exist"
            );
            return Ok(Attempt::Absent);
        }

        tracing::info!(
            workflow = self.workflow_name,
            count = runs.len(),
            "Found workflow runs with this name"
        );

        let latest = select::highest_attempt(&runs);
        if let Some(run) = latest {
            tracing::info!(
                run_id = run.id,
                attempt = ?run.attempt,
                status = run.status(),
                conclusion = ?run.conclusion().map(Conclusion::as_str),
                "Selected highest run attempt"
            );
        }

        Ok(select::classify(latest))
    }

    fn on_timed_out(&self, warmup_expired: bool) -> Conclusion {
        if warmup_expired {
            tracing::info!(
                workflow = self.workflow_name,
                warmup_secs = self.config.warmup.as_secs(),
                "No workflow runs found during warm-up, exiting with conclusion 'not_found'"
            );
            Conclusion::NotFound
        } else {
            tracing::info!(
                workflow = self.workflow_name,
                timeout_secs = self.config.timeout.as_secs(),
                "No completed workflow runs before the timeout, exiting with conclusion 'timed_out'"
            );
            Conclusion::TimedOut
        }
    }
}

/// Poll a single workflow until its highest attempt finishes.
pub async fn poll_workflow(
    platform: &dyn Platform,
    target: &RepoRef,
    workflow_name: &str,
    config: &PollConfig,
) -> Result<Conclusion> {
    let mut resolver = WorkflowResolver::new(platform, target, workflow_name, *config);
    poll(config, &mut resolver).await
}

/// Poll workflows one after another, in the given order.
///
/// Stops at the first workflow whose conclusion is not a success and returns
/// it. Only the first workflow gets the warm-up period; the others must
/// already exist once their predecessors finished. When all succeed, the
/// per-workflow conclusions are summarized.
pub async fn poll_workflows(
    platform: &dyn Platform,
    target: &RepoRef,
    workflow_names: &[String],
    success: &SuccessSet,
    config: &PollConfig,
) -> Result<Conclusion> {
    if workflow_names.is_empty() {
        return Err(AppError::Config("No workflow names to poll".to_string()));
    }

    let total = workflow_names.len();
    let mut conclusions = Vec::with_capacity(total);

    for (index, workflow_name) in workflow_names.iter().enumerate() {
        tracing::info!("[Workflow {}/{}] {}", index + 1, total, workflow_name);

        let per_workflow = if index == 0 {
            *config
        } else {
            config.with_warmup(Duration::ZERO)
        };

        let conclusion = poll_workflow(platform, target, workflow_name, &per_workflow).await?;
        if !success.contains(&conclusion) {
            tracing::info!(
                workflow = %workflow_name,
                conclusion = %conclusion,
                "Workflow did not succeed, skipping remaining workflows"
            );
            return Ok(conclusion);
        }
        conclusions.push(conclusion);
    }

    Ok(summarize_conclusions(&conclusions))
}
