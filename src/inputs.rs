use crate::conclusion::{Conclusion, SuccessSet};
use crate::error::{AppError, Result};

const ANY_OF_PREFIX: &str = "anyOf(";

/// Parse a `|`-separated list of conclusions, optionally wrapped in `anyOf(...)`.
///
/// `"success|skipped"` accepts either outcome; `"anyOf(success)"` additionally
/// lets several check names be satisfied by any one of them succeeding.
pub fn parse_success_conclusions(input: &str) -> Result<SuccessSet> {
    let trimmed = input.trim();

    let (body, any_of) = match trimmed.strip_prefix(ANY_OF_PREFIX) {
        Some(rest) => {
            let inner = rest.strip_suffix(')').ok_or_else(|| {
                AppError::Config(format!(
                    "Invalid successConclusions '{input}': missing closing ')' for anyOf("
                ))
            })?;
            (inner, true)
        }
        None => (trimmed, false),
    };

    if body.trim().is_empty() {
        return Err(AppError::Config(format!(
            "Invalid successConclusions '{input}': at least one conclusion is required. Valid values are: {}",
            vocabulary()
        )));
    }

    let conclusions = body
        .split('|')
        .map(|token| {
            let token = token.trim();
            token.parse::<Conclusion>().map_err(|_| {
                AppError::Config(format!(
                    "Invalid conclusion '{token}' in successConclusions '{input}'. Valid values are: {}",
                    vocabulary()
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(success_conclusions = %body, any_of, "Parsed success conclusions");

    Ok(SuccessSet::new(conclusions, any_of))
}

fn vocabulary() -> String {
    Conclusion::KNOWN
        .iter()
        .map(Conclusion::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a list of names given either one per line or as `[a, b, c]`.
///
/// Entries are trimmed and empty entries dropped. Inside brackets, entries may
/// be quoted. `field` only names the option in error messages.
pub fn parse_name_list(input: &str, field: &str) -> Result<Vec<String>> {
    let trimmed = input.trim();

    let names: Vec<String> = if let Some(rest) = trimmed.strip_prefix('[') {
        let inner = rest.strip_suffix(']').ok_or_else(|| {
            AppError::Config(format!("Invalid {field} '{input}': missing closing ']'"))
        })?;
        inner
            .split(',')
            .map(|entry| unquote(entry.trim()).trim().to_string())
            .filter(|entry| !entry.is_empty())
            .collect()
    } else {
        trimmed
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect()
    };

    if names.is_empty() {
        return Err(AppError::Config(format!("{field} must name at least one entry")));
    }

    Ok(names)
}

fn unquote(entry: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = entry
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    entry
}
