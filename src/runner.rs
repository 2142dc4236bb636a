use crate::cancel::cancel_current_run;
use crate::conclusion::Conclusion;
use crate::config::{Settings, TargetKind};
use crate::error::Result;
use crate::platform::Platform;
use crate::poll::{check::poll_checks, workflow::poll_workflows};
use crate::report::Outcome;

/// Poll the configured checks or workflows until they resolve.
pub async fn resolve(platform: &dyn Platform, settings: &Settings) -> Result<Conclusion> {
    tracing::info!(
        repo = %settings.target,
        success_conclusions = %settings.success,
        timeout_secs = settings.poll.timeout.as_secs(),
        warmup_secs = settings.poll.warmup.as_secs(),
        interval_secs = settings.poll.interval.as_secs(),
        "Resolving run conclusion"
    );

    match &settings.kind {
        TargetKind::Checks(names) => {
            poll_checks(
                platform,
                &settings.target,
                names.clone(),
                &settings.success,
                &settings.poll,
            )
            .await
        }
        TargetKind::Workflows(names) => {
            poll_workflows(
                platform,
                &settings.target,
                names,
                &settings.success,
                &settings.poll,
            )
            .await
        }
    }
}

/// Resolve the conclusion, judge it, and cancel the enclosing run on failure
/// when asked to.
pub async fn execute(platform: &dyn Platform, settings: &Settings) -> Result<Outcome> {
    let conclusion = resolve(platform, settings).await?;
    let outcome = Outcome::evaluate(conclusion, &settings.success);

    if outcome.passed {
        tracing::info!(conclusion = %outcome.conclusion, "Conclusion is a success");
        return Ok(outcome);
    }

    tracing::error!(
        "Conclusion '{}' was not defined as a success",
        outcome.conclusion
    );

    if settings.cancel_on_failure {
        match &settings.current_run {
            Some(run) => cancel_current_run(platform, &run.owner, &run.repo, run.run_id).await,
            None => tracing::warn!(
                "cancel_on_failure is set but the current run id or repository is unknown, not cancelling"
            ),
        }
    }

    Ok(outcome)
}
