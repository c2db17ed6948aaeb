//! Verdict schema and the caller-facing scan outcome
//!
//! The backend's answer is validated here. Nothing outside the schema is
//! coerced: an unknown verdict or an out-of-range score is an error, never
//! a default.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Three-way classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// Critical risk, reject the input
    Block,

    /// Suspicious, hold for review
    Flag,

    /// Safe
    Pass,
}

impl Verdict {
    /// Parse the exact wire spelling
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "BLOCK" => Some(Verdict::Block),
            "FLAG" => Some(Verdict::Flag),
            "PASS" => Some(Verdict::Pass),
            _ => None,
        }
    }

    /// Wire spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Block => "BLOCK",
            Verdict::Flag => "FLAG",
            Verdict::Pass => "PASS",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ways a backend response can violate the verdict schema
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("response is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` must be a {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("unknown verdict {0:?}, expected BLOCK, FLAG or PASS")]
    UnknownVerdict(String),

    #[error("risk_score {0} is outside [0.0, 1.0]")]
    ScoreOutOfRange(f64),
}

/// A validated classification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub verdict: Verdict,
    pub risk_score: f64,
    pub reasoning: String,
}

/// Parse and validate a backend response body
pub fn parse_classification(text: &str) -> Result<Classification, SchemaError> {
    let value: Value =
        serde_json::from_str(text.trim()).map_err(|e| SchemaError::InvalidJson(e.to_string()))?;

    let obj = value.as_object().ok_or(SchemaError::NotAnObject)?;

    let verdict_raw = string_field(obj, "verdict")?;
    let verdict = Verdict::from_wire(verdict_raw)
        .ok_or_else(|| SchemaError::UnknownVerdict(verdict_raw.to_string()))?;

    let risk_score = obj
        .get("risk_score")
        .ok_or(SchemaError::MissingField("risk_score"))?
        .as_f64()
        .ok_or(SchemaError::WrongType {
            field: "risk_score",
            expected: "number",
        })?;
    if !risk_score.is_finite() || !(0.0..=1.0).contains(&risk_score) {
        return Err(SchemaError::ScoreOutOfRange(risk_score));
    }

    let reasoning = string_field(obj, "reasoning")?.to_string();

    Ok(Classification {
        verdict,
        risk_score,
        reasoning,
    })
}

fn string_field<'a>(obj: &'a Map<String, Value>, field: &'static str) -> Result<&'a str, SchemaError> {
    obj.get(field)
        .ok_or(SchemaError::MissingField(field))?
        .as_str()
        .ok_or(SchemaError::WrongType {
            field,
            expected: "string",
        })
}

/// Result of a completed scan, as reported to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOutcome {
    pub verdict: Verdict,
    pub risk_score: f64,
    pub reasoning: String,

    /// Set when the classification succeeded but the audit append did not
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audit_warning: Option<String>,
}

impl ScanOutcome {
    pub fn from_classification(classification: Classification, audit_warning: Option<String>) -> Self {
        Self {
            verdict: classification.verdict,
            risk_score: classification.risk_score,
            reasoning: classification.reasoning,
            audit_warning,
        }
    }

    pub fn is_block(&self) -> bool {
        self.verdict == Verdict::Block
    }

    pub fn is_pass(&self) -> bool {
        self.verdict == Verdict::Pass
    }

    /// True when the decision was not durably recorded
    pub fn audit_failed(&self) -> bool {
        self.audit_warning.is_some()
    }

    /// Serialize to a single JSON line
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
