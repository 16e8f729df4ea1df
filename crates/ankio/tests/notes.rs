//! Tests for note actions.

mod common;

use std::collections::HashMap;

use ankio::{AnkiClient, Error, NoteBuilder};
use common::{mock_action, mock_anki_error, mock_anki_response, setup_mock_server};

#[tokio::test]
async fn test_add_note() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(&server, "addNote", mock_anki_response(1234567890_i64)).await;

    let note = NoteBuilder::new("Default", "Basic")
        .field("Front", "Hello")
        .field("Back", "World")
        .tag("test")
        .build();

    let id = client.notes().add(note).await.unwrap();
    assert_eq!(id, 1234567890);
}

#[tokio::test]
async fn test_add_note_duplicate_error() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "addNote",
        mock_anki_error("cannot create note because it is a duplicate"),
    )
    .await;

    let note = NoteBuilder::new("Default", "Basic")
        .field("Front", "Hello")
        .build();

    let err = client.notes().add(note).await.unwrap_err();
    assert!(matches!(err, Error::AnkiConnect(msg) if msg.contains("duplicate")));
}

#[tokio::test]
async fn test_find_notes() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "findNotes",
        mock_anki_response(vec![1_i64, 2, 3]),
    )
    .await;

    let ids = client.notes().find("deck:\"My Deck\"").await.unwrap();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_notes_info() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "notesInfo",
        mock_anki_response(vec![serde_json::json!({
            "noteId": 42_i64,
            "modelName": "Basic",
            "tags": ["vocab"],
            "fields": {
                "Front": {"value": "hello", "order": 0},
                "Back": {"value": "world", "order": 1}
            }
        })]),
    )
    .await;

    let infos = client.notes().info(&[42]).await.unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].note_id, 42);
    assert_eq!(infos[0].fields["Front"].value, "hello");
    assert_eq!(infos[0].field_values()["Back"], "world");
}

#[tokio::test]
async fn test_add_many_preserves_failed_slots() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "addNotes",
        mock_anki_response(serde_json::json!([101, null, 103])),
    )
    .await;

    let notes = vec![
        NoteBuilder::new("Default", "Basic").field("Front", "a").build(),
        NoteBuilder::new("Default", "Basic").field("Front", "b").build(),
        NoteBuilder::new("Default", "Basic").field("Front", "c").build(),
    ];

    let ids = client.notes().add_many(&notes).await.unwrap();
    assert_eq!(ids, vec![Some(101), None, Some(103)]);
}

#[tokio::test]
async fn test_can_add_detailed() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "canAddNotesWithErrorDetail",
        mock_anki_response(serde_json::json!([
            {"canAdd": true},
            {"canAdd": false, "error": "cannot create note because it is a duplicate"}
        ])),
    )
    .await;

    let notes = vec![
        NoteBuilder::new("Default", "Basic").field("Front", "a").build(),
        NoteBuilder::new("Default", "Basic").field("Front", "a").build(),
    ];

    let verdicts = client.notes().can_add_detailed(&notes).await.unwrap();
    assert!(verdicts[0].can_add);
    assert!(!verdicts[1].can_add);
    assert!(verdicts[1].error.as_deref().unwrap().contains("duplicate"));
}

#[tokio::test]
async fn test_update_fields() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    // updateNoteFields returns null on success
    mock_action(
        &server,
        "updateNoteFields",
        wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": null,
            "error": null
        })),
    )
    .await;

    let mut fields = HashMap::new();
    fields.insert("Front".to_string(), "Updated".to_string());

    let tags = vec!["reviewed".to_string()];
    let result = client.notes().update_fields(42, &fields, &tags).await;
    assert!(result.is_ok());
}
