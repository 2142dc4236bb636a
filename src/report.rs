use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::conclusion::{Conclusion, SuccessSet};
use crate::error::Result;

/// Final result of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub conclusion: Conclusion,
    pub passed: bool,
}

impl Outcome {
    pub fn evaluate(conclusion: Conclusion, success: &SuccessSet) -> Self {
        let passed = success.contains(&conclusion);
        Self { conclusion, passed }
    }
}

/// Append the conclusion as a step output to a `GITHUB_OUTPUT` file.
pub fn write_step_output(path: &Path, conclusion: &Conclusion) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "conclusion={conclusion}")?;
    tracing::debug!(path = %path.display(), "Wrote step output");
    Ok(())
}
