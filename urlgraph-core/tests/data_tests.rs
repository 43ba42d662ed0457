// Tests for JSON Lines loading and writing

use std::fs;
use urlgraph_core::data::{load_pages, load_records, read_jsonl, write_jsonl};
use urlgraph_core::{DataError, PageContent, UrlRecord};

// ============================================================================
// Record Loading Tests
// ============================================================================

#[test]
fn test_load_records_skips_invalid_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("urls.jsonl");
    fs::write(
        &path,
        concat!(
            "{\"schema_version\": 1, \"url\": \"https://a.com/\", \"url_normalized\": \"https://a.com/\", \"depth\": 0, \"parent_url\": null, \"fragments\": [], \"discovered_at\": 1700000000}\n",
            "{\"url\": \"https://a.com/x\", \"depth\": 1, \"parent_url\": \"https://a.com/\", \"status_code\": 404}\n",
            "{broken\n",
            "{\"depth\": 3}\n",
        ),
    )
    .unwrap();

    let batch = load_records(&path).unwrap();

    assert_eq!(batch.len(), 2);
    assert_eq!(batch.skipped.len(), 2);
    assert_eq!(batch.skipped[0].line, 3);
    assert_eq!(batch.skipped[1].line, 4);
    assert_eq!(batch.items[1].parent_url.as_deref(), Some("https://a.com/"));
    assert_eq!(batch.items[1].status_code, Some(404));
    assert!(batch.items[0].discovered_time().is_some());
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_records(&dir.path().join("missing.jsonl"));
    assert!(matches!(result, Err(DataError::Io { .. })));
}

// ============================================================================
// Page Loading Tests
// ============================================================================

#[test]
fn test_load_pages_with_partial_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pages.jsonl");
    fs::write(
        &path,
        concat!(
            "{\"url\": \"https://a.com/\", \"final_url\": \"https://a.com/home\", \"status_code\": 200, \"title\": \"Home\", \"internal_links\": [\"https://a.com/x\"], \"json_ld\": [{\"@type\": \"WebSite\"}]}\n",
            "{\"url\": \"https://a.com/x\"}\n",
        ),
    )
    .unwrap();

    let batch = load_pages(&path).unwrap();

    assert_eq!(batch.len(), 2);
    assert_eq!(batch.items[0].identity_url(), "https://a.com/home");
    assert_eq!(batch.items[0].internal_links, vec!["https://a.com/x".to_string()]);
    assert_eq!(batch.items[0].json_ld.len(), 1);
    assert_eq!(batch.items[1].identity_url(), "https://a.com/x");
    assert!(batch.items[1].title.is_none());
}

// ============================================================================
// Write Tests
// ============================================================================

#[test]
fn test_write_then_read_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.jsonl");
    let mut child = UrlRecord::new("https://a.com/x", 1, Some("https://a.com/".into())).unwrap();
    child.fragments = vec!["top".to_string()];
    let records = vec![UrlRecord::new("https://a.com/", 0, None).unwrap(), child];

    let written = write_jsonl(&records, &path).unwrap();
    let batch = read_jsonl::<UrlRecord>(&path).unwrap();

    assert_eq!(written, 2);
    assert!(batch.skipped.is_empty());
    assert_eq!(batch.items, records);
}

#[test]
fn test_written_lines_are_single_json_objects() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pages.jsonl");
    let pages = vec![PageContent::new("https://a.com/", "https://a.com/")];

    write_jsonl(&pages, &path).unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    let value: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
    assert_eq!(value["final_url"], "https://a.com/");
    assert_eq!(value["status_code"], 200);
}
