//! An async Rust client for the AnkiConnect API.
//!
//! This crate provides typed access to the AnkiConnect actions used for
//! inspecting and mutating a running Anki collection: finding and adding
//! notes, batch admission checks, field updates, and media file management.
//!
//! # Quick Start
//!
//! ```no_run
//! use ankio::AnkiClient;
//!
//! # async fn example() -> ankio::Result<()> {
//! // Create a client with default settings (localhost:8765)
//! let client = AnkiClient::new();
//!
//! // List all decks
//! let decks = client.decks().names().await?;
//! println!("Found {} decks", decks.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Action Groups
//!
//! Operations are organized into groups accessible from the client:
//!
//! - [`AnkiClient::decks()`] - List and create decks
//! - [`AnkiClient::models()`] - Inspect and create note types
//! - [`AnkiClient::notes()`] - Find, add, and update notes
//! - [`AnkiClient::media()`] - Store, retrieve, and delete media files
//!
//! # Requirements
//!
//! - Anki must be running with the [AnkiConnect](https://ankiweb.net/shared/info/2055492159) add-on installed
//! - By default, the client connects to `http://127.0.0.1:8765`

pub mod actions;
pub mod client;
pub mod error;
mod request;
pub mod types;

pub use client::{AnkiClient, ClientBuilder};
pub use error::{Error, Result};
pub use types::{
    CanAddResult, CardTemplate, CreateCardTemplate, CreateModelParams, ModelStyling, Note,
    NoteBuilder, NoteField, NoteInfo,
};
