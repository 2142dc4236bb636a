use std::fmt;
use std::str::FromStr;

/// Terminal outcome of a check run or workflow run.
///
/// `NotFound` and `TimedOut` can also be produced locally by the poller when a
/// deadline expires. `Other` carries API values outside the known vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Conclusion {
    Success,
    Failure,
    Neutral,
    Cancelled,
    Skipped,
    TimedOut,
    ActionRequired,
    NotFound,
    Other(String),
}

impl Conclusion {
    /// Every value accepted in a success set, in documentation order.
    pub const KNOWN: [Conclusion; 8] = [
        Conclusion::Success,
        Conclusion::Failure,
        Conclusion::Neutral,
        Conclusion::Cancelled,
        Conclusion::Skipped,
        Conclusion::TimedOut,
        Conclusion::ActionRequired,
        Conclusion::NotFound,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Conclusion::Success => "success",
            Conclusion::Failure => "failure",
            Conclusion::Neutral => "neutral",
            Conclusion::Cancelled => "cancelled",
            Conclusion::Skipped => "skipped",
            Conclusion::TimedOut => "timed_out",
            Conclusion::ActionRequired => "action_required",
            Conclusion::NotFound => "not_found",
            Conclusion::Other(raw) => raw,
        }
    }

    /// Convert a conclusion string reported by the API.
    ///
    /// Unknown values are not rejected: they are logged and passed through as
    /// [`Conclusion::Other`] so the caller still sees what GitHub reported.
    pub fn from_api(raw: &str) -> Self {
        raw.parse().unwrap_or_else(|_| {
            tracing::warn!(conclusion = raw, "Unexpected conclusion reported by the API");
            Conclusion::Other(raw.to_string())
        })
    }

    /// Position in the pessimistic priority table, highest first.
    fn severity(&self) -> Option<u8> {
        match self {
            Conclusion::TimedOut => Some(7),
            Conclusion::Cancelled => Some(6),
            Conclusion::Failure => Some(5),
            Conclusion::ActionRequired => Some(4),
            Conclusion::Skipped => Some(3),
            Conclusion::Neutral => Some(2),
            Conclusion::NotFound => Some(1),
            Conclusion::Success => Some(0),
            Conclusion::Other(_) => None,
        }
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownConclusion(pub String);

impl FromStr for Conclusion {
    type Err = UnknownConclusion;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Conclusion::KNOWN
            .iter()
            .find(|c| c.as_str() == s)
            .cloned()
            .ok_or_else(|| UnknownConclusion(s.to_string()))
    }
}

/// Combine several conclusions into one, letting the worst outcome win.
///
/// Priority: `timed_out > cancelled > failure > action_required > skipped >
/// neutral > not_found > success`. Values outside that table are ignored;
/// when nothing ranks, the result is `success`.
pub fn summarize_conclusions<'a, I>(conclusions: I) -> Conclusion
where
    I: IntoIterator<Item = &'a Conclusion>,
{
    conclusions
        .into_iter()
        .filter_map(|c| c.severity().map(|rank| (rank, c)))
        .max_by_key(|(rank, _)| *rank)
        .map(|(_, c)| c.clone())
        .unwrap_or(Conclusion::Success)
}

/// Conclusions the caller considers a pass, plus the `anyOf(...)` marker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuccessSet {
    conclusions: Vec<Conclusion>,
    any_of: bool,
}

impl SuccessSet {
    pub fn new(mut conclusions: Vec<Conclusion>, any_of: bool) -> Self {
        conclusions.sort();
        conclusions.dedup();
        Self {
            conclusions,
            any_of,
        }
    }

    pub fn contains(&self, conclusion: &Conclusion) -> bool {
        self.conclusions.contains(conclusion)
    }

    /// Whether several targets are satisfied by any single one succeeding.
    pub fn any_of(&self) -> bool {
        self.any_of
    }

    pub fn conclusions(&self) -> &[Conclusion] {
        &self.conclusions
    }
}

impl fmt::Display for SuccessSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .conclusions
            .iter()
            .map(Conclusion::as_str)
            .collect::<Vec<_>>()
            .join("|");
        if self.any_of {
            write!(f, "anyOf({joined})")
        } else {
            f.write_str(&joined)
        }
    }
}
