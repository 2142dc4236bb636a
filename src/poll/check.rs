use async_trait::async_trait;

use crate::conclusion::{Conclusion, SuccessSet};
use crate::error::{AppError, Result};
use crate::platform::types::RepoRef;
use crate::platform::Platform;

use super::{poll, select, Attempt, PollConfig, Resolver};

/// Resolves the last started check run for one or more check names.
///
/// With several names, `anyOf(...)` is required: the first name to finish
/// with a success conclusion decides the outcome, and names that finish with
/// anything else are dropped from later attempts.
pub struct CheckResolver<'a> {
    platform: &'a dyn Platform,
    target: &'a RepoRef,
    success: &'a SuccessSet,
    config: PollConfig,
    /// Names still being polled.
    remaining: Vec<String>,
    multiple: bool,
}

impl<'a> CheckResolver<'a> {
    pub fn new(
        platform: &'a dyn Platform,
        target: &'a RepoRef,
        check_names: Vec<String>,
        success: &'a SuccessSet,
        config: PollConfig,
    ) -> Result<Self> {
        if check_names.is_empty() {
            return Err(AppError::Config("No check names to poll".to_string()));
        }
        let multiple = check_names.len() > 1;
        if multiple && !success.any_of() {
            return Err(AppError::Unsupported(
                "Multiple checkNames require successConclusions wrapped in anyOf(...)".to_string(),
            ));
        }

        Ok(Self {
            platform,
            target,
            success,
            config,
            remaining: check_names,
            multiple,
        })
    }
}

#[async_trait]
impl<'a> Resolver for CheckResolver<'a> {
    async fn attempt(&mut self) -> Result<Attempt> {
        let mut found = false;

        for check_name in self.remaining.clone() {
            tracing::info!(
                check_name = %check_name,
                repo = %self.target,
                "Retrieving check runs"
            );
            let runs = self.platform.list_check_runs(self.target, &check_name).await?;
            tracing::info!(check_name = %check_name, count = runs.len(), "Retrieved check runs");

            let selected = select::last_started(&runs);
            if let Some(run) = selected {
                tracing::info!(
                    check_name = %check_name,
                    run_id = run.id,
                    status = run.status(),
                    "Selected last started check run"
                );
            }

            match select::classify(selected) {
                Attempt::Terminal(conclusion) => {
                    tracing::info!(
                        check_name = %check_name,
                        conclusion = %conclusion,
                        "Found a completed check"
                    );
                    if !self.multiple {
                        return Ok(Attempt::Terminal(conclusion));
                    }
                    if self.success.contains(&conclusion) {
                        return Ok(Attempt::Terminal(Conclusion::Success));
                    }
                    self.remaining.retain(|name| name != &check_name);
                    if self.remaining.is_empty() {
                        return Ok(Attempt::Terminal(conclusion));
                    }
                    found = true;
                }
                Attempt::Pending => found = true,
                Attempt::Absent => {}
            }
        }

        tracing::info!(
            check_names = %self.remaining.join("', '"),
            "No completed checks yet"
        );

        Ok(if found { Attempt::Pending } else { Attempt::Absent })
    }

    fn on_timed_out(&self, warmup_expired: bool) -> Conclusion {
        if warmup_expired {
            tracing::info!(
                warmup_secs = self.config.warmup.as_secs(),
                "No checks found during warm-up, exiting with conclusion 'not_found'"
            );
            Conclusion::NotFound
        } else {
            tracing::info!(
                timeout_secs = self.config.timeout.as_secs(),
                "No completed checks before the timeout, exiting with conclusion 'timed_out'"
            );
            Conclusion::TimedOut
        }
    }
}

/// Poll check runs named `check_names` on `target` until they resolve.
pub async fn poll_checks(
    platform: &dyn Platform,
    target: &RepoRef,
    check_names: Vec<String>,
    success: &SuccessSet,
    config: &PollConfig,
) -> Result<Conclusion> {
    tracing::info!(check_names = %check_names.join("', '"), "Polling check runs");
    let mut resolver = CheckResolver::new(platform, target, check_names, success, *config)?;
    poll(config, &mut resolver).await
}
