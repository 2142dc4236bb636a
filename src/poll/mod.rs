pub mod check;
pub mod select;
pub mod workflow;

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::conclusion::Conclusion;
use crate::error::Result;

/// Timing for one poll: total budget, warm-up grace period, and the pause
/// between attempts. Both deadlines are measured from the same start instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub timeout: Duration,
    pub warmup: Duration,
    pub interval: Duration,
}

impl PollConfig {
    pub fn from_secs(timeout: u64, warmup: u64, interval: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout),
            warmup: Duration::from_secs(warmup),
            interval: Duration::from_secs(interval),
        }
    }

    /// Same timing with the warm-up replaced.
    pub fn with_warmup(self, warmup: Duration) -> Self {
        Self { warmup, ..self }
    }
}

/// What a single attempt observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    /// The authoritative run finished.
    Terminal(Conclusion),
    /// Something exists but has not finished.
    Pending,
    /// Nothing matching was found.
    Absent,
}

/// Per-target resolution plugged into [`poll`].
#[async_trait]
pub trait Resolver: Send {
    /// Query once and classify what was found.
    async fn attempt(&mut self) -> Result<Attempt>;

    /// Conclusion to report when a deadline expires. `warmup_expired` is true
    /// when nothing was ever found within the warm-up period.
    fn on_timed_out(&self, warmup_expired: bool) -> Conclusion;
}

/// Suspend between two attempts.
pub async fn wait(interval: Duration) {
    tokio::time::sleep(interval).await;
}

/// Drive `resolver` until it reports a terminal conclusion or a deadline expires.
///
/// Absence only ends the poll early after the warm-up period and only if
/// nothing has been seen yet; once any run was observed the full timeout
/// applies. Errors from the resolver are returned as-is, without retrying.
/// A deadline too far out to be represented on the clock never expires.
pub async fn poll<R>(config: &PollConfig, resolver: &mut R) -> Result<Conclusion>
where
    R: Resolver + ?Sized,
{
    let start = Instant::now();
    let deadline = start.checked_add(config.timeout);
    let warmup_deadline = start.checked_add(config.warmup);
    let mut seen_pending = false;
    let mut now = start;

    while deadline.map_or(true, |deadline| now <= deadline) {
        match resolver.attempt().await? {
            Attempt::Terminal(conclusion) => return Ok(conclusion),
            Attempt::Pending => seen_pending = true,
            Attempt::Absent => {
                let warmup_over = warmup_deadline.is_some_and(|warmup| Instant::now() >= warmup);
                if !seen_pending && warmup_over {
                    return Ok(resolver.on_timed_out(true));
                }
            }
        }

        tracing::info!(
            interval_secs = config.interval.as_secs_f64(),
            "Waiting before next attempt"
        );
        wait(config.interval).await;
        now = Instant::now();
    }

    Ok(resolver.on_timed_out(false))
}
