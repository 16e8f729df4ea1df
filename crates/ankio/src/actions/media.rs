//! Media-related AnkiConnect actions.
//!
//! # Example
//!
//! ```no_run
//! use ankio::AnkiClient;
//!
//! # async fn example() -> ankio::Result<()> {
//! let client = AnkiClient::new();
//!
//! // Store a base64-encoded file
//! let saved = client.media().store("audio.mp3", "SGVsbG8=").await?;
//!
//! // Check whether a referenced file actually exists
//! let exists = client.media().retrieve(&saved).await?.is_some();
//! # Ok(())
//! # }
//! ```

use serde::Serialize;

use crate::client::AnkiClient;
use crate::error::{Error, Result};

/// Provides access to media-related AnkiConnect operations.
///
/// Obtained via [`AnkiClient::media()`].
#[derive(Debug)]
pub struct MediaActions<'a> {
    pub(crate) client: &'a AnkiClient,
}

#[derive(Serialize)]
struct StoreParams<'a> {
    filename: &'a str,
    data: &'a str,
}

#[derive(Serialize)]
struct FilenameParams<'a> {
    filename: &'a str,
}

#[derive(Serialize)]
struct ListParams<'a> {
    pattern: &'a str,
}

impl<'a> MediaActions<'a> {
    /// Store a base64-encoded media file.
    ///
    /// Returns the filename that was actually used - the store may rename
    /// to avoid clobbering an existing file, so callers must use the
    /// returned name when building `[sound:...]` references.
    pub async fn store(&self, filename: &str, data_base64: &str) -> Result<String> {
        self.client
            .invoke(
                "storeMediaFile",
                StoreParams {
                    filename,
                    data: data_base64,
                },
            )
            .await
    }

    /// Retrieve a media file's contents as base64.
    ///
    /// Returns `None` if the file does not exist: AnkiConnect answers
    /// `false` rather than an error for absent files, and that distinction
    /// is what existence checks are built on.
    pub async fn retrieve(&self, filename: &str) -> Result<Option<String>> {
        let result: serde_json::Value = self
            .client
            .invoke("retrieveMediaFile", FilenameParams { filename })
            .await?;

        match result {
            serde_json::Value::Bool(false) => Ok(None),
            serde_json::Value::String(data) => Ok(Some(data)),
            other => Err(Error::AnkiConnect(format!(
                "unexpected retrieveMediaFile result: {other}"
            ))),
        }
    }

    /// List media files matching a glob pattern (e.g. `*.mp3`).
    pub async fn list(&self, pattern: &str) -> Result<Vec<String>> {
        self.client
            .invoke("getMediaFilesNames", ListParams { pattern })
            .await
    }

    /// Get the path to Anki's media directory.
    pub async fn directory(&self) -> Result<String> {
        self.client.invoke_without_params("getMediaDirPath").await
    }

    /// Delete a media file.
    pub async fn delete(&self, filename: &str) -> Result<()> {
        self.client
            .invoke_void("deleteMediaFile", FilenameParams { filename })
            .await
    }
}
