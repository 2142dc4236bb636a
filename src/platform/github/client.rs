use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Serialize;

use crate::config::GitHubConfig;
use crate::error::{AppError, Result};
use crate::platform::types::*;
use crate::platform::Platform;

use super::mapper;

/// Largest page GitHub allows for both run listings.
const PER_PAGE: u8 = 100;

#[derive(Serialize)]
struct CheckRunQuery<'a> {
    check_name: &'a str,
    per_page: u8,
    page: u32,
}

#[derive(Serialize)]
struct WorkflowRunQuery<'a> {
    head_sha: &'a str,
    per_page: u8,
    page: u32,
}

/// Whether a listing is exhausted after a page of `received` items, with
/// `collected` items gathered so far out of `total_count` (0 when unknown).
fn is_last_page(received: usize, collected: usize, total_count: u64) -> bool {
    received < usize::from(PER_PAGE) || (total_count > 0 && collected as u64 >= total_count)
}

pub struct GitHubPlatform {
    client: Octocrab,
}

impl GitHubPlatform {
    pub fn new(config: &GitHubConfig) -> Result<Self> {
        if config.token.trim().is_empty() {
            return Err(AppError::Config(
                "A GitHub token is required (github.token or GITHUB_TOKEN)".to_string(),
            ));
        }

        let mut builder = Octocrab::builder().personal_token(config.token.clone());
        if let Some(api_url) = &config.api_url {
            builder = builder
                .base_uri(api_url.as_str())
                .map_err(|e| AppError::Config(format!("Invalid GitHub API URL '{api_url}': {e}")))?;
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Platform for GitHubPlatform {
    async fn list_check_runs(&self, target: &RepoRef, check_name: &str) -> Result<Vec<RunRecord>> {
        let url = format!(
            "/repos/{}/{}/commits/{}/check-runs",
            target.owner,
            target.repo,
            urlencoding::encode(&target.git_ref)
        );
        let mut runs = Vec::new();

        for page in 1.. {
            let query = CheckRunQuery {
                check_name,
                per_page: PER_PAGE,
                page,
            };

            let response: mapper::CheckRunList = self
                .client
                .get(&url, Some(&query))
                .await
                .map_err(|e| {
                    AppError::GitHubApi(format!("Failed to list check runs for {target}: {e}"))
                })?;

            tracing::debug!(
                check_name,
                page,
                total_count = response.total_count,
                "Check runs response received"
            );

            let received = response.check_runs.len();
            runs.extend(response.check_runs.into_iter().map(mapper::map_check_run));
            if is_last_page(received, runs.len(), response.total_count) {
                break;
            }
        }

        Ok(runs)
    }

    async fn list_workflow_runs(&self, target: &RepoRef) -> Result<Vec<RunRecord>> {
        let url = format!("/repos/{}/{}/actions/runs", target.owner, target.repo);
        let mut runs = Vec::new();

        for page in 1.. {
            let query = WorkflowRunQuery {
                head_sha: &target.git_ref,
                per_page: PER_PAGE,
                page,
            };

            let response: mapper::WorkflowRunList = self
                .client
                .get(&url, Some(&query))
                .await
                .map_err(|e| {
                    AppError::GitHubApi(format!("Failed to list workflow runs for {target}: {e}"))
                })?;

            tracing::debug!(
                page,
                total_count = response.total_count,
                "Workflow runs response received"
            );

            let received = response.workflow_runs.len();
            runs.extend(response.workflow_runs.into_iter().map(mapper::map_workflow_run));
            if is_last_page(received, runs.len(), response.total_count) {
                break;
            }
        }

        Ok(runs)
    }

    async fn cancel_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<()> {
        let url = format!("/repos/{owner}/{repo}/actions/runs/{run_id}/cancel");
        let _: serde_json::Value = self
            .client
            .post(&url, None::<&()>)
            .await
            .map_err(|e| AppError::GitHubApi(format!("Failed to cancel workflow run {run_id}: {e}")))?;

        Ok(())
    }
}
