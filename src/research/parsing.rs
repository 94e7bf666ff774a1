//! Structured output recovered from free-form model text.
//!
//! Models wrap their JSON in prose and code fences. [`extract_json_object`]
//! finds the first balanced object; [`parse_reply`] deserializes it and reports
//! a tagged failure instead of an error so callers can apply their fallback.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Whether a Decision Service result came from the model or from a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Ok,
    FallbackUsed { reason: String },
}

/// A value plus how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub status: OutcomeStatus,
}

impl<T> Outcome<T> {
    pub fn ok(value: T) -> Self {
        Self {
            value,
            status: OutcomeStatus::Ok,
        }
    }

    pub fn fallback(value: T, reason: impl Into<String>) -> Self {
        Self {
            value,
            status: OutcomeStatus::FallbackUsed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.status, OutcomeStatus::FallbackUsed { .. })
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        match &self.status {
            OutcomeStatus::FallbackUsed { reason } => Some(reason),
            OutcomeStatus::Ok => None,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            value: f(self.value),
            status: self.status,
        }
    }
}

/// Why a reply could not be turned into a value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReplyError {
    #[error("reply contains no JSON object")]
    NoObject,

    #[error("reply JSON is invalid: {0}")]
    Invalid(String),
}

/// First balanced `{...}` span in `text`. Braces inside JSON strings,
/// including escaped quotes, do not count. An opening brace that never
/// closes is skipped and the scan resumes at the next one.
pub fn extract_json_object(text: &str) -> Option<&str> {
    text.match_indices('{')
        .find_map(|(start, _)| balanced_end(&text[start..]).map(|end| &text[start..start + end]))
}

/// Byte length of the balanced object that opens at the start of `text`.
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extract and deserialize the first JSON object in a reply.
pub fn parse_reply<T: DeserializeOwned>(text: &str) -> Result<T, ReplyError> {
    let object = extract_json_object(text).ok_or(ReplyError::NoObject)?;
    serde_json::from_str(object).map_err(|e| ReplyError::Invalid(e.to_string()))
}
