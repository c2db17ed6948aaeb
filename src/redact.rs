//! Credential scrubbing for audit snippets
//!
//! Payloads sent to the firewall sometimes carry pasted credentials. When
//! `audit.redact_secrets` is on, these are masked before a snippet is stored.

use once_cell::sync::Lazy;
use regex::Regex;

/// Placeholder written over a matched credential
pub const REDACTION_MARK: &str = "[REDACTED]";

static CREDENTIAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(api|secret)[_-]?key\s*[=:]\s*['\x22]?[a-zA-Z0-9_\-]{16,}",
        r"(?i)(access|bearer)[_-]?token\s*[=:]?\s*['\x22]?[a-zA-Z0-9_\-\.]{16,}",
        r"AKIA[0-9A-Z]{16}",
        r"gh[pousr]_[A-Za-z0-9_]{36,}",
        r"github_pat_[A-Za-z0-9_]{22,}",
        r"sk-[A-Za-z0-9_\-]{20,}",
        r"AIza[0-9A-Za-z_\-]{35}",
        r"(?i)(password|passwd|pwd)\s*[=:]\s*\S+",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Replace every credential-looking span with [`REDACTION_MARK`]
pub fn redact(text: &str) -> String {
    let mut out = text.to_string();
    for re in CREDENTIAL_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, REDACTION_MARK).into_owned();
        }
    }
    out
}
