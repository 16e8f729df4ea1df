//! Tests for media actions.

mod common;

use ankio::{AnkiClient, Error};
use common::{mock_action, mock_anki_response, setup_mock_server};

#[tokio::test]
async fn test_store_media() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    // The store may rename the file; the returned name wins.
    mock_action(
        &server,
        "storeMediaFile",
        mock_anki_response("audio (1).mp3"),
    )
    .await;

    let saved = client
        .media()
        .store("audio.mp3", "SGVsbG8gV29ybGQ=")
        .await
        .unwrap();
    assert_eq!(saved, "audio (1).mp3");
}

#[tokio::test]
async fn test_retrieve_existing_file() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "retrieveMediaFile",
        mock_anki_response("SGVsbG8gV29ybGQ="),
    )
    .await;

    let content = client.media().retrieve("audio.mp3").await.unwrap();
    assert_eq!(content.as_deref(), Some("SGVsbG8gV29ybGQ="));
}

#[tokio::test]
async fn test_retrieve_missing_file_is_none() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    // AnkiConnect answers `false` for an absent file, not an error.
    mock_action(&server, "retrieveMediaFile", mock_anki_response(false)).await;

    let content = client.media().retrieve("missing.mp3").await.unwrap();
    assert!(content.is_none());
}

#[tokio::test]
async fn test_list_media() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "getMediaFilesNames",
        mock_anki_response(vec!["a.mp3", "b.mp3"]),
    )
    .await;

    let files = client.media().list("*.mp3").await.unwrap();
    assert_eq!(files.len(), 2);
}

#[tokio::test]
async fn test_media_directory() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "getMediaDirPath",
        mock_anki_response("/home/test/.local/share/Anki2/User 1/collection.media"),
    )
    .await;

    let path = client.media().directory().await.unwrap();
    assert!(path.ends_with("collection.media"));
}

#[tokio::test]
async fn test_delete_media() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "deleteMediaFile",
        wiremock::ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": null,
            "error": null
        })),
    )
    .await;

    assert!(client.media().delete("old.mp3").await.is_ok());
}

#[tokio::test]
async fn test_non_2xx_status_is_transport_failure() {
    let server = setup_mock_server().await;
    let client = AnkiClient::builder().url(server.uri()).build();

    mock_action(
        &server,
        "getMediaFilesNames",
        wiremock::ResponseTemplate::new(500),
    )
    .await;

    let err = client.media().list("*").await.unwrap_err();
    assert!(matches!(err, Error::Status(500)));
}
