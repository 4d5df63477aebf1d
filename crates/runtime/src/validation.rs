//! Field rules called from generated `Command::validate` bodies.
//!
//! Every rule is pure: the same input always yields the same result.

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

use regex::Regex;

/// Compiled patterns, keyed by their source. Generated code only passes
/// string literals, so the map stays as small as the schema.
static PATTERNS: LazyLock<Mutex<HashMap<&'static str, Regex>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Why a command failed validation. Surfaced to the command's caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("field {field} cannot be empty")]
    Empty { field: &'static str },

    #[error("field {field} exceeded maximum length {max}")]
    TooLong { field: &'static str, max: usize },

    #[error("field {field} does not match pattern {pattern}")]
    PatternMismatch {
        field: &'static str,
        pattern: &'static str,
    },

    #[error("field {field} has unusable pattern {pattern}: {reason}")]
    InvalidPattern {
        field: &'static str,
        pattern: &'static str,
        reason: String,
    },
}

/// Reject an empty string.
pub fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}

/// Reject a string longer than `max` characters.
pub fn max_length(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

fn compiled(field: &'static str, pattern: &'static str) -> Result<Regex, ValidationError> {
    let mut patterns = PATTERNS
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(re) = patterns.get(pattern) {
        return Ok(re.clone());
    }

    let re = Regex::new(pattern).map_err(|err| ValidationError::InvalidPattern {
        field,
        pattern,
        reason: err.to_string(),
    })?;
    patterns.insert(pattern, re.clone());
    Ok(re)
}

/// Reject a string that does not match `pattern`. Each pattern is compiled
/// once per process.
pub fn matches_pattern(
    field: &'static str,
    value: &str,
    pattern: &'static str,
) -> Result<(), ValidationError> {
    let re = compiled(field, pattern)?;

    if !re.is_match(value) {
        return Err(ValidationError::PatternMismatch { field, pattern });
    }
    Ok(())
}
