//! Configuration loading for prompt-firewall
//!
//! Supports TOML configuration with built-in defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::audit::AuditFormat;

/// Errors loading an explicitly named config file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Classification backend settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the API, without the model path
    pub endpoint: String,

    /// Model identifier
    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Upper bound on a single classification call
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-3-flash-preview".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Policy document location
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct PolicyConfig {
    /// Replacement policy file; the built-in policy is used when unset
    pub path: Option<String>,
}

/// Audit trail settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
    pub path: String,
    pub format: AuditFormat,

    /// Mask credentials in stored snippets
    pub redact_secrets: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "security_audit.json".to_string(),
            format: AuditFormat::JsonArray,
            redact_secrets: false,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub policy: PolicyConfig,
    pub audit: AuditConfig,
}

impl Config {
    /// Load configuration from the standard locations or use defaults
    pub fn load() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("prompt-firewall/config.toml")),
            Some(PathBuf::from("/etc/prompt-firewall/config.toml")),
        ];

        for path in config_paths.into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            match Self::load_from(&path) {
                Ok(config) => return config,
                Err(e) => tracing::warn!(error = %e, "ignoring config file"),
            }
        }

        Config::default()
    }

    /// Load from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Expand ~ in path strings
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Audit log path (expanded), or None when auditing is off
    pub fn audit_path(&self) -> Option<PathBuf> {
        self.audit
            .enabled
            .then(|| Self::expand_path(&self.audit.path))
    }

    /// Policy file path (expanded)
    pub fn policy_path(&self) -> Option<PathBuf> {
        self.policy.path.as_ref().map(|p| Self::expand_path(p))
    }
}

/// Documented default configuration
pub const DEFAULT_CONFIG_TOML: &str = r#"
[backend]
endpoint = "https://generativelanguage.googleapis.com/v1beta"
model = "gemini-3-flash-preview"
api_key_env = "GEMINI_API_KEY"
timeout_secs = 30

[policy]
# path = "~/.config/prompt-firewall/policy.txt"

[audit]
enabled = true
path = "security_audit.json"
format = "json-array"
redact_secrets = false
"#;
