//! High-level workflow operations for Anki via AnkiConnect.
//!
//! This crate builds on the [`ankio`] client library. While `ankio` provides
//! 1:1 API bindings, `ankio-engine` combines multiple API calls into cohesive
//! workflows: batch note creation and updates with per-item failure
//! reporting, media reference validation and repair, and text-to-speech
//! synthesis for attaching pronunciation audio.
//!
//! # Quick Start
//!
//! ```no_run
//! use ankio_engine::Engine;
//! use ankio_engine::sync::{CreateOptions, NoteSpec};
//!
//! # async fn example() -> ankio_engine::Result<()> {
//! let engine = Engine::new();
//!
//! let specs = vec![NoteSpec {
//!     model_name: "Basic".to_string(),
//!     fields: [("Front".to_string(), "hello".to_string())].into(),
//!     tags: vec![],
//! }];
//!
//! let outcome = engine
//!     .sync()
//!     .bulk_create("Japanese", &specs, CreateOptions::default())
//!     .await?;
//! println!("created {} of {}", outcome.succeeded(), outcome.attempted);
//! # Ok(())
//! # }
//! ```

mod error;

pub mod media;
pub mod repair;
pub mod sync;
pub mod tts;

pub use error::{Error, Result};

// Re-export ankio types for convenience
pub use ankio::{
    AnkiClient, CanAddResult, CardTemplate, ClientBuilder, CreateModelParams, ModelStyling, Note,
    NoteBuilder, NoteField, NoteInfo,
};

use media::MediaEngine;
use repair::RepairEngine;
use sync::SyncEngine;
use tts::TtsEngine;

/// High-level workflow engine for Anki operations.
///
/// The engine wraps an [`AnkiClient`] and provides access to workflow
/// modules that combine multiple API calls into cohesive operations.
#[derive(Debug, Clone)]
pub struct Engine {
    client: AnkiClient,
    tts: TtsEngine,
}

impl Engine {
    /// Create a new engine with default client settings.
    ///
    /// Connects to AnkiConnect at `http://127.0.0.1:8765`.
    pub fn new() -> Self {
        Self::from_client(AnkiClient::new())
    }

    /// Create an engine from an existing client.
    pub fn from_client(client: AnkiClient) -> Self {
        Self {
            client,
            tts: TtsEngine::new(),
        }
    }

    /// Get a reference to the underlying client.
    ///
    /// Use this for direct API access when workflows don't cover your use
    /// case.
    pub fn client(&self) -> &AnkiClient {
        &self.client
    }

    /// Access media reference validation.
    ///
    /// Extracts `[sound:...]` references and checks them against the media
    /// store, deduplicating lookups across a batch.
    pub fn media(&self) -> MediaEngine<'_> {
        MediaEngine::new(&self.client)
    }

    /// Access batch synchronization workflows.
    ///
    /// Bulk create with admission checks, bulk merge-update, and the shared
    /// partial-failure outcome type.
    pub fn sync(&self) -> SyncEngine<'_> {
        SyncEngine::new(&self.client)
    }

    /// Access deck media validation and broken-reference repair.
    pub fn repair(&self) -> RepairEngine<'_> {
        RepairEngine::new(&self.client)
    }

    /// Access text-to-speech synthesis.
    pub fn tts(&self) -> &TtsEngine {
        &self.tts
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
