//! Action modules for AnkiConnect operations.
//!
//! Each module provides a set of related operations grouped by domain.

mod decks;
mod media;
mod models;
mod notes;

pub use decks::DeckActions;
pub use media::MediaActions;
pub use models::ModelActions;
pub use notes::NoteActions;
