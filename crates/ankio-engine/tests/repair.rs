//! Tests for deck media validation and repair.

mod common;

use common::{
    engine_for_mock, mock_action, mock_anki_response, mock_media_lookup, setup_mock_server,
};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, ResponseTemplate};

fn null_result() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "result": null,
        "error": null
    }))
}

#[tokio::test]
async fn test_audit_empty_deck_is_clean() {
    let server = setup_mock_server().await;

    mock_action(&server, "findNotes", mock_anki_response(Vec::<i64>::new())).await;

    let engine = engine_for_mock(&server);
    let report = engine.repair().audit("Empty Deck").await.unwrap();

    assert!(report.is_clean());
    assert_eq!(report.total_notes, 0);
    assert_eq!(report.notes_with_missing_media, 0);
    assert!(report.missing_files.is_empty());
}

#[tokio::test]
async fn test_audit_reports_broken_note_by_id() {
    let server = setup_mock_server().await;

    mock_action(&server, "findNotes", mock_anki_response(vec![7_i64])).await;
    mock_action(
        &server,
        "notesInfo",
        mock_anki_response(vec![serde_json::json!({
            "noteId": 7_i64,
            "modelName": "Basic",
            "tags": [],
            "fields": {
                "Front": {"value": "hello", "order": 0},
                "Audio": {"value": "[sound:missing.mp3] [sound:present.mp3]", "order": 1}
            }
        })]),
    )
    .await;
    mock_media_lookup(&server, "missing.mp3", false).await;
    mock_media_lookup(&server, "present.mp3", true).await;

    let engine = engine_for_mock(&server);
    let report = engine.repair().audit("My Deck").await.unwrap();

    assert_eq!(report.total_notes, 1);
    assert_eq!(report.notes_with_missing_media, 1);
    assert_eq!(report.missing_files, vec!["missing.mp3"]);
    assert_eq!(report.broken_notes[&7], vec!["missing.mp3"]);
}

#[tokio::test]
async fn test_repair_strips_only_the_missing_marker() {
    let server = setup_mock_server().await;

    mock_action(&server, "findNotes", mock_anki_response(vec![7_i64])).await;
    mock_action(
        &server,
        "notesInfo",
        mock_anki_response(vec![serde_json::json!({
            "noteId": 7_i64,
            "modelName": "Basic",
            "tags": ["vocab"],
            "fields": {
                "Front": {"value": "hello", "order": 0},
                "Audio": {"value": "[sound:missing.mp3] [sound:present.mp3]", "order": 1}
            }
        })]),
    )
    .await;
    mock_media_lookup(&server, "missing.mp3", false).await;
    mock_media_lookup(&server, "present.mp3", true).await;

    // Untouched fields ride along verbatim; the surviving marker is
    // preserved exactly with no doubled spacing.
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "action": "updateNoteFields",
            "params": {
                "note": {
                    "id": 7,
                    "fields": {
                        "Front": "hello",
                        "Audio": "[sound:present.mp3]"
                    },
                    "tags": ["vocab"]
                }
            }
        })))
        .respond_with(null_result())
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for_mock(&server);
    let (report, removed) = engine.repair().repair("My Deck").await.unwrap();

    assert_eq!(report.broken_notes[&7], vec!["missing.mp3"]);
    assert_eq!(removed, 1);
}

#[tokio::test]
async fn test_repair_clean_deck_issues_no_writes() {
    let server = setup_mock_server().await;

    mock_action(&server, "findNotes", mock_anki_response(vec![7_i64])).await;
    mock_action(
        &server,
        "notesInfo",
        mock_anki_response(vec![serde_json::json!({
            "noteId": 7_i64,
            "modelName": "Basic",
            "tags": [],
            "fields": {
                "Audio": {"value": "[sound:present.mp3]", "order": 0}
            }
        })]),
    )
    .await;
    mock_media_lookup(&server, "present.mp3", true).await;

    // No updateNoteFields mock is mounted: a write would fail the test.
    let engine = engine_for_mock(&server);
    let (report, removed) = engine.repair().repair("My Deck").await.unwrap();

    assert!(report.is_clean());
    assert_eq!(removed, 0);
}

#[tokio::test]
async fn test_repair_fixes_multiple_fields_in_one_write() {
    let server = setup_mock_server().await;

    mock_action(&server, "findNotes", mock_anki_response(vec![9_i64])).await;
    mock_action(
        &server,
        "notesInfo",
        mock_anki_response(vec![serde_json::json!({
            "noteId": 9_i64,
            "modelName": "Basic",
            "tags": [],
            "fields": {
                "Front": {"value": "word [sound:gone.mp3]", "order": 0},
                "Back": {"value": "[sound:gone.mp3] meaning", "order": 1}
            }
        })]),
    )
    .await;
    mock_media_lookup(&server, "gone.mp3", false).await;

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "action": "updateNoteFields",
            "params": {
                "note": {
                    "id": 9,
                    "fields": {"Front": "word", "Back": "meaning"}
                }
            }
        })))
        .respond_with(null_result())
        .expect(1)
        .mount(&server)
        .await;

    let engine = engine_for_mock(&server);
    let (_, removed) = engine.repair().repair("My Deck").await.unwrap();

    assert_eq!(removed, 2);
}
