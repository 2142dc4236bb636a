use crate::platform::types::{RunRecord, RunState};

use super::Attempt;

/// Pick the run with the greatest key. On equal keys the earliest run in the
/// input wins, so the choice is stable for a given response.
pub fn latest_by<K, F>(runs: &[RunRecord], key: F) -> Option<&RunRecord>
where
    K: Ord,
    F: Fn(&RunRecord) -> K,
{
    let mut iter = runs.iter();
    let first = iter.next()?;
    let mut best = (key(first), first);
    for run in iter {
        let candidate = key(run);
        if candidate > best.0 {
            best = (candidate, run);
        }
    }
    Some(best.1)
}

/// Most recently started run. Runs without a start time rank lowest.
pub fn last_started(runs: &[RunRecord]) -> Option<&RunRecord> {
    latest_by(runs, |run| run.started_at)
}

/// Run with the highest attempt number. Runs without one rank lowest.
pub fn highest_attempt(runs: &[RunRecord]) -> Option<&RunRecord> {
    latest_by(runs, |run| run.attempt)
}

/// Classify the selected run. Status decides, not which runs finished: a newer
/// pending run hides an older completed one.
pub fn classify(selected: Option<&RunRecord>) -> Attempt {
    match selected.map(|run| &run.state) {
        None => Attempt::Absent,
        Some(RunState::Completed(conclusion)) => Attempt::Terminal(conclusion.clone()),
        Some(_) => Attempt::Pending,
    }
}
