//! Scan requests
//!
//! A request wraps one untrusted payload for the duration of a single scan.

use chrono::{DateTime, Utc};

/// Number of characters of the payload kept in the audit trail
pub const SNIPPET_CHARS: usize = 50;

/// One payload submitted for classification
#[derive(Debug, Clone)]
pub struct ScanRequest {
    input: String,
    submitted_at: DateTime<Utc>,
}

impl ScanRequest {
    /// Create a request stamped with the current time
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            submitted_at: Utc::now(),
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// First [`SNIPPET_CHARS`] characters of the payload
    pub fn snippet(&self) -> String {
        truncate_chars(&self.input, SNIPPET_CHARS)
    }
}

/// Truncate to at most `max` characters without splitting a code point
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
