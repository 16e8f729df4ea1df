//! Tests for model and deck actions.

mod common;

use ankio::{AnkiClient, CreateModelParams};
use common::{mock_action, mock_anki_response, setup_mock_server};

#[tokio::test]
async fn test_deck_names() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "deckNames",
        mock_anki_response(vec!["Default", "Japanese"]),
    )
    .await;

    let names = client.decks().names().await.unwrap();
    assert_eq!(names, vec!["Default", "Japanese"]);
}

#[tokio::test]
async fn test_create_deck() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(&server, "createDeck", mock_anki_response(1699173278958_i64)).await;

    let id = client.decks().create("Japanese::Vocabulary").await.unwrap();
    assert_eq!(id, 1699173278958);
}

#[tokio::test]
async fn test_model_field_names() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "modelFieldNames",
        mock_anki_response(vec!["Front", "Back", "Audio"]),
    )
    .await;

    let fields = client.models().field_names("Basic").await.unwrap();
    assert_eq!(fields, vec!["Front", "Back", "Audio"]);
}

#[tokio::test]
async fn test_model_templates() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "modelTemplates",
        mock_anki_response(serde_json::json!({
            "Card 1": {"Front": "{{Front}}", "Back": "{{FrontSide}}<hr>{{Back}}"}
        })),
    )
    .await;

    let templates = client.models().templates("Basic").await.unwrap();
    assert_eq!(templates.len(), 1);
    assert_eq!(templates["Card 1"].front, "{{Front}}");
}

#[tokio::test]
async fn test_model_styling() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "modelStyling",
        mock_anki_response(serde_json::json!({"css": ".card { font-size: 20px; }"})),
    )
    .await;

    let styling = client.models().styling("Basic").await.unwrap();
    assert!(styling.css.contains("font-size"));
}

#[tokio::test]
async fn test_create_model() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "createModel",
        mock_anki_response(serde_json::json!({"id": 1699173278959_i64, "name": "Listening"})),
    )
    .await;

    let params = CreateModelParams::new("Listening")
        .field("Front")
        .field("Back")
        .template("Card 1", "{{Front}}", "{{FrontSide}}<hr id=\"answer\">{{Back}}");

    let created = client.models().create(params).await.unwrap();
    assert_eq!(created["name"], "Listening");
}
