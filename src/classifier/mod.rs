//! Classifier adapter
//!
//! Turns a payload and a policy into a validated [`Classification`] by way
//! of a [`ClassificationBackend`]. The policy always travels as the system
//! instruction and the payload as the only user content; the two are never
//! concatenated.

pub mod gemini;

use crate::policy::Policy;
use crate::verdict::{parse_classification, Classification, SchemaError};

pub use gemini::GeminiBackend;

/// Output format requested from the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// Structured JSON output
    Json,
}

/// A single generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest<'a> {
    /// Operating instructions (the policy)
    pub system_instruction: &'a str,

    /// Untrusted content to classify
    pub payload: &'a str,

    pub response_format: ResponseFormat,

    pub temperature: f32,
}

/// Backend call failures
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("classification backend timed out after {0}s")]
    Timeout(u64),

    #[error("classification backend unreachable: {0}")]
    Transport(String),

    #[error("classification backend returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("classification backend returned no content")]
    EmptyResponse,

    #[error("no API key found in ${0}")]
    MissingApiKey(String),
}

impl BackendError {
    /// 401/403 from the backend
    pub fn is_auth(&self) -> bool {
        matches!(self, BackendError::Http { status: 401 | 403, .. })
    }

    /// 429 from the backend
    pub fn is_quota(&self) -> bool {
        matches!(self, BackendError::Http { status: 429, .. })
    }
}

/// Anything that can answer a generation request
pub trait ClassificationBackend: Send + Sync {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, BackendError>;
}

/// Why a classification did not produce a verdict
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("malformed classifier response: {0}")]
    Schema(#[from] SchemaError),
}

/// Stateless adapter over a backend
pub struct ClassifierAdapter {
    backend: Box<dyn ClassificationBackend>,
}

impl ClassifierAdapter {
    pub fn new(backend: Box<dyn ClassificationBackend>) -> Self {
        Self { backend }
    }

    /// Classify one payload under the given policy
    pub fn classify(&self, input: &str, policy: &Policy) -> Result<Classification, ClassifyError> {
        let request = GenerateRequest {
            system_instruction: policy.text(),
            payload: input,
            response_format: ResponseFormat::Json,
            temperature: 0.0,
        };

        let body = self.backend.generate(&request)?;
        let classification = parse_classification(&body).map_err(|e| {
            tracing::warn!(error = %e, "classifier response failed schema validation");
            e
        })?;
        Ok(classification)
    }
}
