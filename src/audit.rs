//! Audit trail for classification decisions
//!
//! Every successful classification is recorded exactly once. Two on-disk
//! formats sit behind the same [`AuditStore`] contract:
//!
//! - [`JsonArrayStore`]: the whole log is one JSON array, rewritten on every
//!   append. Simple to inspect, but each append is O(n) in the log size, so it
//!   suits small deployments only.
//! - [`JsonLinesStore`]: one record per line, appended in place. Appends are
//!   O(1) and a torn write only costs the last line.
//!
//! Read failures (missing file, unreadable file, corrupt content) degrade to
//! an empty log. Write failures are returned to the caller.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::input::{truncate_chars, ScanRequest, SNIPPET_CHARS};
use crate::redact;
use crate::verdict::{Classification, Verdict};

/// One recorded decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// When the payload was submitted (UTC)
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    pub verdict: Verdict,

    #[serde(rename = "risk")]
    pub risk_score: f64,

    #[serde(rename = "reason")]
    pub reasoning: String,

    /// Leading characters of the scanned payload
    pub input_snippet: String,
}

impl AuditRecord {
    /// Build a record from a request and its classification
    pub fn new(request: &ScanRequest, classification: &Classification) -> Self {
        Self::with_snippet(request, request.snippet(), classification)
    }

    /// Same as [`AuditRecord::new`], with credentials masked before truncation
    pub fn redacted(request: &ScanRequest, classification: &Classification) -> Self {
        let scrubbed = redact::redact(request.input());
        Self::with_snippet(request, truncate_chars(&scrubbed, SNIPPET_CHARS), classification)
    }

    fn with_snippet(
        request: &ScanRequest,
        input_snippet: String,
        classification: &Classification,
    ) -> Self {
        Self {
            timestamp: request.submitted_at(),
            verdict: classification.verdict,
            risk_score: classification.risk_score,
            reasoning: classification.reasoning.clone(),
            input_snippet,
        }
    }
}

/// RFC 3339, or a naive local `YYYY-MM-DDTHH:MM:SS[.ffffff]` as written by older tools
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))?;
    Ok(Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive)))
}

/// Failure to persist an audit record
#[derive(Debug, thiserror::Error)]
pub enum AuditWriteError {
    #[error("failed to write audit log {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize audit record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl AuditWriteError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        AuditWriteError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// On-disk layout of the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditFormat {
    /// Single JSON array, rewritten per append
    #[default]
    JsonArray,

    /// One JSON object per line
    JsonLines,
}

impl AuditFormat {
    /// Format implied by a log file's extension
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("ndjson") => AuditFormat::JsonLines,
            _ => AuditFormat::JsonArray,
        }
    }
}

/// Persistent storage for audit records
pub trait AuditStore: Send {
    /// Append one record after all existing ones
    fn append(&mut self, record: &AuditRecord) -> Result<(), AuditWriteError>;

    /// All readable records, oldest first. Never fails.
    fn read_all(&self) -> Vec<AuditRecord>;
}

fn ensure_parent(path: &Path) -> Result<(), AuditWriteError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| AuditWriteError::io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Whole-file JSON array store
#[derive(Debug, Clone)]
pub struct JsonArrayStore {
    path: PathBuf,
}

impl JsonArrayStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Existing records, or empty if the file is absent, unreadable, or not a
    /// JSON array made up entirely of records.
    fn load_records(&self) -> Vec<AuditRecord> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "audit log unreadable, starting fresh");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Vec<AuditRecord>>(&content) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "audit log corrupt, starting fresh");
                Vec::new()
            }
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl AuditStore for JsonArrayStore {
    fn append(&mut self, record: &AuditRecord) -> Result<(), AuditWriteError> {
        let mut records = self.load_records();
        records.push(record.clone());
        let json = serde_json::to_string_pretty(&records)?;

        ensure_parent(&self.path)?;

        // Write beside the target and rename so readers never see a partial array
        let tmp = self.tmp_path();
        fs::write(&tmp, json).map_err(|e| AuditWriteError::io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(AuditWriteError::io(&self.path, e));
        }
        Ok(())
    }

    fn read_all(&self) -> Vec<AuditRecord> {
        self.load_records()
    }
}

/// Append-only JSON Lines store
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// True if the file is non-empty and its last byte is not a newline
fn has_torn_tail(file: &mut fs::File) -> std::io::Result<bool> {
    let len = file.seek(SeekFrom::End(0))?;
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

impl AuditStore for JsonLinesStore {
    fn append(&mut self, record: &AuditRecord) -> Result<(), AuditWriteError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        ensure_parent(&self.path)?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AuditWriteError::io(&self.path, e))?;

        // Terminate a torn last line so this record starts on its own line
        if has_torn_tail(&mut file).unwrap_or(false) {
            line.insert(0, '\n');
        }

        file.write_all(line.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| AuditWriteError::io(&self.path, e))
    }

    fn read_all(&self) -> Vec<AuditRecord> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %self.path.display(), error = %e, "audit log unreadable");
                }
                return Vec::new();
            }
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }
}

/// Serializing front for an audit store
///
/// The store's read-modify-write cycle runs under a mutex, so a shared logger
/// can be used from several threads without interleaving appends.
pub struct AuditLogger {
    store: Option<Mutex<Box<dyn AuditStore>>>,
    redact_secrets: bool,
}

impl AuditLogger {
    /// Log to the given store
    pub fn new(store: Box<dyn AuditStore>) -> Self {
        Self {
            store: Some(Mutex::new(store)),
            redact_secrets: false,
        }
    }

    /// Open a file-backed store in the given format
    pub fn open(path: &Path, format: AuditFormat) -> Self {
        let store: Box<dyn AuditStore> = match format {
            AuditFormat::JsonArray => Box::new(JsonArrayStore::new(path)),
            AuditFormat::JsonLines => Box::new(JsonLinesStore::new(path)),
        };
        Self::new(store)
    }

    /// A logger that records nothing
    pub fn disabled() -> Self {
        Self {
            store: None,
            redact_secrets: false,
        }
    }

    /// Mask credentials in snippets built by [`AuditLogger::record_for`]
    pub fn with_redaction(mut self, redact_secrets: bool) -> Self {
        self.redact_secrets = redact_secrets;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Build the record for a decision, honoring the redaction setting
    pub fn record_for(&self, request: &ScanRequest, classification: &Classification) -> AuditRecord {
        if self.redact_secrets {
            AuditRecord::redacted(request, classification)
        } else {
            AuditRecord::new(request, classification)
        }
    }

    /// Append a record
    pub fn append(&self, record: &AuditRecord) -> Result<(), AuditWriteError> {
        match &self.store {
            Some(store) => {
                let mut store = store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                store.append(record)
            }
            None => Ok(()),
        }
    }

    /// Everything currently readable from the store
    pub fn records(&self) -> Vec<AuditRecord> {
        match &self.store {
            Some(store) => store
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .read_all(),
            None => Vec::new(),
        }
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::disabled()
    }
}
