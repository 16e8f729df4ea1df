//! Error types for ankio-engine.
//!
//! Errors from engine workflows fall into two categories:
//!
//! 1. **Client errors**: wrapped from the underlying [`ankio::Error`] type
//! 2. **Workflow errors**: specific to engine operations (e.g. a note id
//!    that resolves to nothing, or a batch aborted on media validation)

use thiserror::Error;

use crate::media::MissingMediaReport;

/// Result type for ankio-engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An error from the underlying ankio client.
    #[error(transparent)]
    Client(#[from] ankio::Error),

    /// A note id did not resolve to an existing note.
    #[error("note not found: {0}")]
    NoteNotFound(i64),

    /// A request was structurally invalid.
    #[error("validation error: {0}")]
    Validation(String),

    /// A batch was aborted because notes reference missing media files.
    ///
    /// Carries the full report so callers can list the offending notes and
    /// filenames instead of a bare message.
    #[error("{} note(s) reference missing media files", .0.missing.len())]
    MediaValidation(MissingMediaReport),

    /// A text-to-speech provider call failed.
    #[error("TTS error: {0}")]
    Tts(String),
}
