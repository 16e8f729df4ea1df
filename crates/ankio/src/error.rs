//! Error types for the ankio crate.
//!
//! Two failure families matter to callers and are kept distinct:
//!
//! - transport failures ([`Error::ConnectionRefused`], [`Error::Status`],
//!   [`Error::Http`]): the request never produced a usable AnkiConnect
//!   response envelope
//! - store-reported errors ([`Error::AnkiConnect`]): the envelope arrived
//!   with its `error` field populated (e.g. "cannot create note because it
//!   is a duplicate")
//!
//! # Example
//!
//! ```no_run
//! use ankio::{AnkiClient, Error};
//!
//! # async fn example() {
//! let client = AnkiClient::new();
//!
//! match client.decks().names().await {
//!     Ok(decks) => println!("Found {} decks", decks.len()),
//!     Err(Error::ConnectionRefused) => {
//!         eprintln!("Please start Anki with AnkiConnect installed");
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! # }
//! ```

use thiserror::Error;

/// The error type for AnkiConnect operations.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP/network error from reqwest.
    ///
    /// Typically indicates network issues unrelated to Anki.
    /// For connection issues, see [`Error::ConnectionRefused`].
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// AnkiConnect answered with a non-2xx HTTP status.
    ///
    /// Distinct from [`Error::AnkiConnect`]: the response body never made it
    /// to the `{result, error}` envelope.
    #[error("AnkiConnect returned HTTP status {0}")]
    Status(u16),

    /// AnkiConnect returned an error message.
    ///
    /// Common messages include:
    /// - "cannot create note because it is a duplicate"
    /// - "deck was not found"
    /// - "model was not found"
    #[error("AnkiConnect error: {0}")]
    AnkiConnect(String),

    /// Response was empty (neither result nor error).
    ///
    /// This is unexpected and may indicate an AnkiConnect bug.
    #[error("AnkiConnect returned empty response")]
    EmptyResponse,

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Connection refused - Anki is likely not running.
    #[error("Could not connect to Anki. Is Anki running with AnkiConnect installed?")]
    ConnectionRefused,
}

/// A specialized Result type for AnkiConnect operations.
pub type Result<T> = std::result::Result<T, Error>;
