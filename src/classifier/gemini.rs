//! Gemini `generateContent` backend
//!
//! Sends the policy as `systemInstruction`, the payload as the single user
//! turn, and asks for `application/json` output at temperature zero.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{BackendError, ClassificationBackend, GenerateRequest, ResponseFormat};
use crate::config::BackendConfig;

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_request(request: &GenerateRequest<'a>) -> Self {
        let response_mime_type = match request.response_format {
            ResponseFormat::Json => "application/json",
        };

        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: request.system_instruction,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part {
                    text: request.payload,
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type,
                temperature: request.temperature,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// HTTP client for the Gemini API
pub struct GeminiBackend {
    client: Client,
    url: String,
    api_key: String,
    timeout_secs: u64,
}

impl GeminiBackend {
    /// Build a backend, reading the API key from the configured environment variable
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| BackendError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, api_key)
    }

    /// Build a backend with an explicit API key
    pub fn with_api_key(config: &BackendConfig, api_key: impl Into<String>) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to create HTTP client: {}", e)))?;

        let url = format!(
            "{}/models/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            url,
            api_key: api_key.into(),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn map_send_error(&self, e: reqwest::Error) -> BackendError {
        if e.is_timeout() {
            BackendError::Timeout(self.timeout_secs)
        } else {
            BackendError::Transport(e.to_string())
        }
    }
}

impl ClassificationBackend for GeminiBackend {
    fn generate(&self, request: &GenerateRequest<'_>) -> Result<String, BackendError> {
        let body = GenerateContentRequest::from_request(request);

        tracing::debug!(url = %self.url, payload_chars = request.payload.chars().count(), "calling classification backend");

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text().map_err(|e| self.map_send_error(e))?;
        let parsed: GenerateContentResponse = serde_json::from_str(&raw)
            .map_err(|e| BackendError::Transport(format!("unexpected response envelope: {}", e)))?;

        parsed.into_text().ok_or(BackendError::EmptyResponse)
    }
}
