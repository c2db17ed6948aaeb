//! Gemini backend against a mock HTTP server

use std::time::Duration;

use prompt_firewall::{
    classifier::{GenerateRequest, ResponseFormat},
    config::BackendConfig,
    AuditLogger, BackendError, ClassificationBackend, ClassifierAdapter, Firewall, GeminiBackend,
    Policy, ScanError, SchemaError,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

fn backend_config(server: &MockServer, timeout_secs: u64) -> BackendConfig {
    BackendConfig {
        endpoint: format!("{}/v1beta", server.uri()),
        model: "gemini-test".to_string(),
        api_key_env: "PROMPT_FIREWALL_BACKEND_TEST_KEY".to_string(),
        timeout_secs,
    }
}

/// Run one generate call off the async runtime; the blocking client must not
/// be driven from an async context.
async fn generate(config: BackendConfig) -> Result<String, BackendError> {
    tokio::task::spawn_blocking(move || {
        let backend = GeminiBackend::with_api_key(&config, "test-key")?;
        backend.generate(&GenerateRequest {
            system_instruction: "POLICY",
            payload: "Write a script for Fibonacci.",
            response_format: ResponseFormat::Json,
            temperature: 0.0,
        })
    })
    .await
    .unwrap()
}

async fn mount(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(header("x-goog-api-key", "test-key"))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

fn candidate(text: &str) -> serde_json::Value {
    json!({ "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }] })
}

// ============================================================================
// Successful calls
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_request_carries_policy_payload_and_deterministic_config() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "systemInstruction": { "parts": [{ "text": "POLICY" }] },
            "contents": [{ "role": "user", "parts": [{ "text": "Write a script for Fibonacci." }] }],
            "generationConfig": { "responseMimeType": "application/json", "temperature": 0.0 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(candidate(
            r#"{"verdict":"PASS","risk_score":0.0,"reasoning":"benign"}"#,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let text = generate(backend_config(&server, 5)).await.unwrap();
    assert!(text.contains("\"PASS\""));
}

// ============================================================================
// Error mapping
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rate_limited_response_is_quota_error() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(429).set_body_string("quota")).await;

    let err = generate(backend_config(&server, 5)).await.unwrap_err();
    match &err {
        BackendError::Http { status, body } => {
            assert_eq!(*status, 429);
            assert_eq!(body, "quota");
        }
        other => panic!("expected HTTP error, got {:?}", other),
    }
    assert!(err.is_quota());
    assert!(!err.is_auth());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unauthorized_response_is_auth_error() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(401).set_body_string("API key not valid")).await;

    let err = generate(backend_config(&server, 5)).await.unwrap_err();
    assert!(err.is_auth());
    assert!(err.to_string().contains("API key not valid"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(candidate("{}"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let err = generate(backend_config(&server, 1)).await.unwrap_err();
    assert!(matches!(err, BackendError::Timeout(1)), "got {:?}", err);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_candidates_is_empty_response() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] }))).await;

    let err = generate(backend_config(&server, 5)).await.unwrap_err();
    assert!(matches!(err, BackendError::EmptyResponse), "got {:?}", err);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_non_json_envelope_is_transport_error() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(200).set_body_string("<html>oops</html>")).await;

    let err = generate(backend_config(&server, 5)).await.unwrap_err();
    assert!(matches!(err, BackendError::Transport(_)), "got {:?}", err);
}

// ============================================================================
// Through the firewall
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unknown_verdict_from_backend_is_schema_error() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200).set_body_json(candidate(
            r#"{"verdict": "MAYBE", "risk_score": 0.3, "reasoning": "..."}"#,
        )),
    )
    .await;

    let config = backend_config(&server, 5);
    let err = tokio::task::spawn_blocking(move || {
        let backend = GeminiBackend::with_api_key(&config, "test-key").unwrap();
        let firewall = Firewall::new(
            ClassifierAdapter::new(Box::new(backend)),
            Policy::default(),
            AuditLogger::disabled(),
        );
        firewall.scan("anything").unwrap_err()
    })
    .await
    .unwrap();

    assert!(matches!(err, ScanError::Schema(SchemaError::UnknownVerdict(ref v)) if v == "MAYBE"));
}
