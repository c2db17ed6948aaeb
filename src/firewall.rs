//! Firewall orchestrator
//!
//! Drives one payload through classification and auditing:
//!
//! ```text
//! Pending -> Classified -> Logged
//!         |            \-> LogFailed            (outcome returned with a warning)
//!         \-> ClassificationFailed              (error returned, nothing logged)
//! ```

use std::fmt;

use crate::audit::AuditLogger;
use crate::classifier::{BackendError, ClassifierAdapter, ClassifyError, GeminiBackend};
use crate::config::Config;
use crate::input::ScanRequest;
use crate::policy::{Policy, PolicyError};
use crate::verdict::{ScanOutcome, SchemaError};

/// Why a scan produced no verdict
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("classification failed: {0}")]
    Classification(#[source] BackendError),

    #[error("classifier response violated the verdict schema: {0}")]
    Schema(#[source] SchemaError),
}

impl ScanError {
    /// Stable machine-readable category
    pub fn kind(&self) -> &'static str {
        match self {
            ScanError::Classification(_) => "classification_error",
            ScanError::Schema(_) => "schema_error",
        }
    }
}

impl From<ClassifyError> for ScanError {
    fn from(e: ClassifyError) -> Self {
        match e {
            ClassifyError::Backend(e) => ScanError::Classification(e),
            ClassifyError::Schema(e) => ScanError::Schema(e),
        }
    }
}

/// Failures building a firewall from configuration
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Lifecycle of a single scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    Pending,
    Classified,
    Logged,
    ClassificationFailed,
    LogFailed,
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanState::Pending => "PENDING",
            ScanState::Classified => "CLASSIFIED",
            ScanState::Logged => "LOGGED",
            ScanState::ClassificationFailed => "CLASSIFICATION_FAILED",
            ScanState::LogFailed => "LOG_FAILED",
        };
        f.write_str(s)
    }
}

/// Classify-then-audit pipeline
pub struct Firewall {
    classifier: ClassifierAdapter,
    policy: Policy,
    audit: AuditLogger,
}

impl Firewall {
    pub fn new(classifier: ClassifierAdapter, policy: Policy, audit: AuditLogger) -> Self {
        Self {
            classifier,
            policy,
            audit,
        }
    }

    /// Build the Gemini-backed firewall described by `config`
    pub fn from_config(config: &Config) -> Result<Self, InitError> {
        let policy = match config.policy_path() {
            Some(path) => Policy::from_file(&path)?,
            None => Policy::default(),
        };

        let backend = GeminiBackend::from_config(&config.backend)?;

        let audit = match config.audit_path() {
            Some(path) => AuditLogger::open(&path, config.audit.format),
            None => AuditLogger::disabled(),
        }
        .with_redaction(config.audit.redact_secrets);

        Ok(Self::new(ClassifierAdapter::new(Box::new(backend)), policy, audit))
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Scan one payload
    ///
    /// Returns the verdict, or the reason none was produced. A classified
    /// payload is always returned even if the audit append fails; the failure
    /// is carried in [`ScanOutcome::audit_warning`].
    pub fn scan(&self, input: &str) -> Result<ScanOutcome, ScanError> {
        let request = ScanRequest::new(input);
        trace_state(ScanState::Pending);

        let classification = match self.classifier.classify(request.input(), &self.policy) {
            Ok(c) => c,
            Err(e) => {
                trace_state(ScanState::ClassificationFailed);
                return Err(e.into());
            }
        };
        trace_state(ScanState::Classified);

        let record = self.audit.record_for(&request, &classification);
        let audit_warning = match self.audit.append(&record) {
            Ok(()) => {
                trace_state(ScanState::Logged);
                None
            }
            Err(e) => {
                trace_state(ScanState::LogFailed);
                tracing::warn!(error = %e, verdict = %classification.verdict, "decision not recorded in audit log");
                Some(e.to_string())
            }
        };

        Ok(ScanOutcome::from_classification(classification, audit_warning))
    }
}

fn trace_state(state: ScanState) {
    tracing::debug!(%state, "scan state");
}
