use std::time::Duration;

use crate::platform::Platform;
use crate::poll::wait;

/// Cancellation requests sent before giving up.
const CANCEL_ATTEMPTS: u32 = 3;
const CANCEL_BACKOFF: Duration = Duration::from_secs(1);

/// Time given to the runner to act on the cancellation.
const SETTLE_TICKS: u32 = 60;
const SETTLE_TICK: Duration = Duration::from_secs(1);

/// Ask GitHub to cancel the workflow run this invocation belongs to.
///
/// Best effort: failures are logged and swallowed. Returns whether a request
/// was accepted.
pub async fn request_cancellation(platform: &dyn Platform, owner: &str, repo: &str, run_id: u64) -> bool {
    for attempt in 1..=CANCEL_ATTEMPTS {
        match platform.cancel_workflow_run(owner, repo, run_id).await {
            Ok(()) => {
                tracing::info!(run_id, "Cancellation requested");
                return true;
            }
            Err(e) => {
                tracing::warn!(
                    run_id,
                    attempt,
                    error = %e,
                    "Failed to request cancellation"
                );
                if attempt < CANCEL_ATTEMPTS {
                    wait(CANCEL_BACKOFF).await;
                }
            }
        }
    }
    false
}

/// Cancel the current workflow run and give the runner time to stop it
/// before the failure is reported.
pub async fn cancel_current_run(platform: &dyn Platform, owner: &str, repo: &str, run_id: u64) {
    tracing::info!(owner, repo, run_id, "Cancelling current workflow...");
    request_cancellation(platform, owner, repo, run_id).await;

    for _ in 0..SETTLE_TICKS {
        tracing::debug!("Waiting for current workflow to be cancelled...");
        wait(SETTLE_TICK).await;
    }
}
