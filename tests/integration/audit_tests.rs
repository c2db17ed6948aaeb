//! Audit store properties, exercised through the public API

use std::fs;

use prompt_firewall::{
    AuditFormat, AuditLogger, AuditRecord, AuditStore, Classification, JsonArrayStore,
    JsonLinesStore, ScanRequest, Verdict,
};
use tempfile::TempDir;

fn record(input: &str, verdict: Verdict) -> AuditRecord {
    AuditRecord::new(
        &ScanRequest::new(input),
        &Classification {
            verdict,
            risk_score: 0.25,
            reasoning: format!("reason for {}", input),
        },
    )
}

fn stores(dir: &TempDir) -> Vec<Box<dyn AuditStore>> {
    vec![
        Box::new(JsonArrayStore::new(dir.path().join("audit.json"))),
        Box::new(JsonLinesStore::new(dir.path().join("audit.jsonl"))),
    ]
}

// ============================================================================
// Properties shared by both formats
// ============================================================================

#[test]
fn test_first_append_to_missing_store() {
    let dir = TempDir::new().unwrap();
    for mut store in stores(&dir) {
        assert!(store.read_all().is_empty());
        let r = record("only", Verdict::Pass);
        store.append(&r).unwrap();
        assert_eq!(store.read_all(), vec![r]);
    }
}

#[test]
fn test_append_order_preserved() {
    let dir = TempDir::new().unwrap();
    for mut store in stores(&dir) {
        let r1 = record("one", Verdict::Pass);
        let r2 = record("two", Verdict::Block);
        let r3 = record("three", Verdict::Flag);
        store.append(&r1).unwrap();
        store.append(&r2).unwrap();
        store.append(&r3).unwrap();
        assert_eq!(store.read_all(), vec![r1, r2, r3]);
    }
}

#[test]
fn test_duplicates_not_collapsed() {
    let dir = TempDir::new().unwrap();
    for mut store in stores(&dir) {
        let r = record("same", Verdict::Flag);
        store.append(&r).unwrap();
        store.append(&r).unwrap();
        assert_eq!(store.read_all().len(), 2);
    }
}

// ============================================================================
// JSON array store
// ============================================================================

#[test]
fn test_corrupt_array_store_replaced_by_new_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.json");
    fs::write(&path, "[{\"timestamp\": ").unwrap();

    let mut store = JsonArrayStore::new(&path);
    let r = record("fresh", Verdict::Pass);
    store.append(&r).unwrap();

    assert_eq!(store.read_all(), vec![r]);
    let on_disk: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk.as_array().unwrap().len(), 1);
}

#[test]
fn test_array_of_non_records_replaced_by_new_record() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.json");
    fs::write(&path, "[42]").unwrap();

    let mut store = JsonArrayStore::new(&path);
    let r = record("fresh", Verdict::Flag);
    store.append(&r).unwrap();

    let on_disk: Vec<AuditRecord> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, vec![r]);
}

#[test]
fn test_empty_file_treated_as_empty_log() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.json");
    fs::write(&path, "").unwrap();

    let mut store = JsonArrayStore::new(&path);
    store.append(&record("x", Verdict::Pass)).unwrap();
    assert_eq!(store.read_all().len(), 1);
}

#[test]
fn test_array_store_on_disk_shape() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.json");
    let mut store = JsonArrayStore::new(&path);
    store.append(&record("Write a script for Fibonacci.", Verdict::Pass)).unwrap();

    let on_disk: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let entry = &on_disk[0];
    for key in ["timestamp", "verdict", "risk", "reason", "input_snippet"] {
        assert!(entry.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(entry["verdict"], "PASS");
    assert!(chrono::DateTime::parse_from_rfc3339(entry["timestamp"].as_str().unwrap()).is_ok());
}

// ============================================================================
// Logger
// ============================================================================

#[test]
fn test_logger_open_selects_format() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.jsonl");
    let logger = AuditLogger::open(&path, AuditFormat::JsonLines);

    logger.append(&record("a", Verdict::Pass)).unwrap();
    logger.append(&record("b", Verdict::Pass)).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    assert_eq!(logger.records().len(), 2);
}

#[test]
fn test_snippet_truncated_to_fifty_chars() {
    let input = "x".repeat(80);
    let r = record(&input, Verdict::Pass);
    assert_eq!(r.input_snippet, "x".repeat(50));
}
