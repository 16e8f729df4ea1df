//! Tests for media existence validation.

mod common;

use std::collections::HashMap;

use common::{engine_for_mock, mock_media_lookup, setup_mock_server};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, ResponseTemplate};

fn audio_field(marker: &str) -> HashMap<String, String> {
    HashMap::from([
        ("Front".to_string(), "hello".to_string()),
        ("Audio".to_string(), marker.to_string()),
    ])
}

#[tokio::test]
async fn test_existence_checks_are_deduplicated_across_batch() {
    let server = setup_mock_server().await;

    // 3 notes reference a.mp3 and one references b.mp3: exactly 2 lookups,
    // enforced by the per-filename expect(1) on each mock.
    mock_media_lookup(&server, "a.mp3", true).await;
    mock_media_lookup(&server, "b.mp3", false).await;

    let field_maps = vec![
        audio_field("[sound:a.mp3]"),
        audio_field("[sound:a.mp3]"),
        audio_field("[sound:a.mp3]"),
        audio_field("[sound:b.mp3]"),
    ];

    let engine = engine_for_mock(&server);
    let report = engine.media().find_missing(&field_maps).await;

    assert!(!report.is_clean());
    assert_eq!(report.missing.len(), 1);
    assert_eq!(report.missing[&3], vec!["b.mp3"]);
    assert!(report.unverified.is_empty());
}

#[tokio::test]
async fn test_missing_file_attributed_to_every_referencing_note() {
    let server = setup_mock_server().await;

    mock_media_lookup(&server, "gone.mp3", false).await;

    let field_maps = vec![
        audio_field("[sound:gone.mp3]"),
        HashMap::from([("Front".to_string(), "no refs".to_string())]),
        audio_field("[sound:gone.mp3]"),
    ];

    let engine = engine_for_mock(&server);
    let report = engine.media().find_missing(&field_maps).await;

    assert_eq!(report.missing[&0], vec!["gone.mp3"]);
    assert!(!report.missing.contains_key(&1));
    assert_eq!(report.missing[&2], vec!["gone.mp3"]);
}

#[tokio::test]
async fn test_batch_without_references_issues_no_checks() {
    // No retrieveMediaFile mock is mounted; any lookup would fail loudly.
    let server = setup_mock_server().await;

    let field_maps = vec![HashMap::from([
        ("Front".to_string(), "hello".to_string()),
        ("Back".to_string(), "world".to_string()),
    ])];

    let engine = engine_for_mock(&server);
    let report = engine.media().find_missing(&field_maps).await;

    assert!(report.is_clean());
    assert!(report.unverified.is_empty());
}

#[tokio::test]
async fn test_failed_check_is_unverified_not_missing() {
    let server = setup_mock_server().await;

    // The lookup itself blows up; the file must not be reported missing.
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "action": "retrieveMediaFile",
            "params": {"filename": "flaky.mp3"}
        })))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let field_maps = vec![audio_field("[sound:flaky.mp3]")];

    let engine = engine_for_mock(&server);
    let report = engine.media().find_missing(&field_maps).await;

    assert!(report.is_clean());
    assert_eq!(report.unverified, vec!["flaky.mp3"]);
}

#[tokio::test]
async fn test_exists_maps_false_result_to_absent() {
    let server = setup_mock_server().await;

    mock_media_lookup(&server, "present.mp3", true).await;
    mock_media_lookup(&server, "absent.mp3", false).await;

    let engine = engine_for_mock(&server);
    assert!(engine.media().exists("present.mp3").await.unwrap());
    assert!(!engine.media().exists("absent.mp3").await.unwrap());
}
