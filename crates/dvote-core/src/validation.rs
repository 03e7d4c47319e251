use crate::error::CoreError;
use std::collections::HashSet;

pub const MIN_OPTIONS: usize = 2;
pub const MAX_VOTER_ID_LEN: usize = 128;

fn char_len(value: &str) -> usize {
    value.chars().count()
}

pub fn normalize_question(question: &str) -> Result<String, CoreError> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("question must not be empty".into()));
    }
    Ok(trimmed.to_string())
}

/// Trim every option and require at least two distinct (case-sensitive) entries.
/// Order is preserved; there is no upper bound on count or length.
pub fn normalize_options<S: AsRef<str>>(options: &[S]) -> Result<Vec<String>, CoreError> {
    let mut seen = HashSet::with_capacity(options.len());
    let mut normalized = Vec::with_capacity(options.len());
    for (index, raw) in options.iter().enumerate() {
        let text = raw.as_ref().trim();
        if text.is_empty() {
            return Err(CoreError::Validation(format!(
                "option {index} must not be empty"
            )));
        }
        if !seen.insert(text) {
            return Err(CoreError::Validation(format!(
                "option {index} duplicates \"{text}\""
            )));
        }
        normalized.push(text.to_string());
    }

    if normalized.len() < MIN_OPTIONS {
        return Err(CoreError::Validation(format!(
            "a poll needs at least {MIN_OPTIONS} options"
        )));
    }
    Ok(normalized)
}

pub fn normalize_voter_id(voter_id: &str) -> Result<String, CoreError> {
    let trimmed = voter_id.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("voterId must not be empty".into()));
    }
    if char_len(trimmed) > MAX_VOTER_ID_LEN {
        return Err(CoreError::Validation(format!(
            "voterId must be at most {MAX_VOTER_ID_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}
