//! Shared types for AnkiConnect requests and responses.

mod model;
mod note;

pub use model::{CardTemplate, CreateCardTemplate, CreateModelParams, ModelStyling};
pub use note::{CanAddResult, Note, NoteBuilder, NoteField, NoteInfo};
