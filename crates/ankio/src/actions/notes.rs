//! Note-related AnkiConnect actions.
//!
//! # Example
//!
//! ```no_run
//! use ankio::{AnkiClient, NoteBuilder};
//!
//! # async fn example() -> ankio::Result<()> {
//! let client = AnkiClient::new();
//!
//! let note = NoteBuilder::new("Default", "Basic")
//!     .field("Front", "Hello")
//!     .field("Back", "World")
//!     .tag("greetings")
//!     .build();
//!
//! let note_id = client.notes().add(note).await?;
//! println!("Created note: {}", note_id);
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

use serde::Serialize;

use crate::client::AnkiClient;
use crate::error::Result;
use crate::types::{CanAddResult, Note, NoteInfo};

/// Provides access to note-related AnkiConnect operations.
///
/// Obtained via [`AnkiClient::notes()`].
#[derive(Debug)]
pub struct NoteActions<'a> {
    pub(crate) client: &'a AnkiClient,
}

// Parameter structs for actions
#[derive(Serialize)]
struct AddNoteParams {
    note: Note,
}

#[derive(Serialize)]
struct FindNotesParams<'a> {
    query: &'a str,
}

#[derive(Serialize)]
struct NotesInfoParams<'a> {
    notes: &'a [i64],
}

#[derive(Serialize)]
struct NotesParams<'a> {
    notes: &'a [Note],
}

#[derive(Serialize)]
struct UpdateNoteFieldsParams<'a> {
    note: UpdateNoteFieldsInner<'a>,
}

#[derive(Serialize)]
struct UpdateNoteFieldsInner<'a> {
    id: i64,
    fields: &'a HashMap<String, String>,
    tags: &'a [String],
}

impl<'a> NoteActions<'a> {
    /// Add a new note.
    ///
    /// Returns the ID of the created note. AnkiConnect rejects exact
    /// duplicates with a store error.
    pub async fn add(&self, note: Note) -> Result<i64> {
        self.client.invoke("addNote", AddNoteParams { note }).await
    }

    /// Find notes matching a query.
    ///
    /// Returns a list of note IDs. Use [`info()`](Self::info) to get full
    /// note details. Uses Anki's search syntax, e.g. `deck:"My Deck"` or
    /// `tag:verb`.
    pub async fn find(&self, query: &str) -> Result<Vec<i64>> {
        self.client
            .invoke("findNotes", FindNotesParams { query })
            .await
    }

    /// Get detailed information about notes.
    ///
    /// The result preserves the order of the requested IDs.
    pub async fn info(&self, note_ids: &[i64]) -> Result<Vec<NoteInfo>> {
        self.client
            .invoke("notesInfo", NotesInfoParams { notes: note_ids })
            .await
    }

    /// Add multiple notes in one call.
    ///
    /// Returns one entry per input note, in order. Entries are `None` for
    /// notes the store refused to create (e.g. duplicates), so callers can
    /// map results back to their input positions.
    pub async fn add_many(&self, notes: &[Note]) -> Result<Vec<Option<i64>>> {
        self.client.invoke("addNotes", NotesParams { notes }).await
    }

    /// Ask the store whether each note could be added, without adding any.
    ///
    /// Returns one verdict per input note, in order, with the store's
    /// reason for any rejection (duplicate, unknown model, and so on).
    pub async fn can_add_detailed(&self, notes: &[Note]) -> Result<Vec<CanAddResult>> {
        self.client
            .invoke("canAddNotesWithErrorDetail", NotesParams { notes })
            .await
    }

    /// Replace a note's field values and tags.
    ///
    /// The field map is written as given: fields to preserve must be
    /// included with their current values. Callers wanting merge semantics
    /// should fetch the note with [`info()`](Self::info) first.
    pub async fn update_fields(
        &self,
        note_id: i64,
        fields: &HashMap<String, String>,
        tags: &[String],
    ) -> Result<()> {
        self.client
            .invoke_void(
                "updateNoteFields",
                UpdateNoteFieldsParams {
                    note: UpdateNoteFieldsInner {
                        id: note_id,
                        fields,
                        tags,
                    },
                },
            )
            .await
    }
}
