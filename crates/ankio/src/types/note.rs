//! Note-related types.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A new note to be added to Anki.
///
/// Use [`NoteBuilder`] for a more ergonomic way to construct notes.
///
/// Field values are HTML. Field names are case-sensitive and must match the
/// model's field names exactly - the store rejects unknown fields at
/// admission time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// The deck to add the note to.
    pub deck_name: String,
    /// The note type (model) name.
    pub model_name: String,
    /// Field values, keyed by field name.
    pub fields: HashMap<String, String>,
    /// Tags for the note.
    pub tags: Vec<String>,
}

/// Information about an existing note, as returned by `notesInfo`.
///
/// The store answers an empty object for ids that resolve to nothing, so
/// every field is defaulted; a `note_id` of 0 marks such a placeholder.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteInfo {
    /// The note ID.
    #[serde(default)]
    pub note_id: i64,
    /// The note type (model) name.
    #[serde(default)]
    pub model_name: String,
    /// Tags on the note.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Field values and metadata.
    #[serde(default)]
    pub fields: HashMap<String, NoteField>,
}

impl NoteInfo {
    /// The note's field values as a plain name-to-text map.
    pub fn field_values(&self) -> HashMap<String, String> {
        self.fields
            .iter()
            .map(|(name, field)| (name.clone(), field.value.clone()))
            .collect()
    }
}

/// A field value with metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct NoteField {
    /// The field value (HTML).
    pub value: String,
    /// The field's position in the note type.
    pub order: i32,
}

/// Result of asking whether a note can be added.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanAddResult {
    /// Whether the note can be added.
    pub can_add: bool,
    /// The store's reason if the note cannot be added.
    #[serde(default)]
    pub error: Option<String>,
}

/// Builder for creating notes with a fluent API.
///
/// # Example
///
/// ```
/// use ankio::NoteBuilder;
///
/// let note = NoteBuilder::new("My Deck", "Basic")
///     .field("Front", "What is the capital of France?")
///     .field("Back", "Paris")
///     .tag("geography")
///     .build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct NoteBuilder {
    deck_name: String,
    model_name: String,
    fields: HashMap<String, String>,
    tags: Vec<String>,
}

impl NoteBuilder {
    /// Create a new note builder for the given deck and model.
    pub fn new(deck: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            deck_name: deck.into(),
            model_name: model.into(),
            ..Default::default()
        }
    }

    /// Set a field value.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set all field values at once.
    pub fn fields(mut self, fields: impl IntoIterator<Item = (String, String)>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Add a tag to the note.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Add multiple tags to the note.
    pub fn tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Build the note.
    pub fn build(self) -> Note {
        Note {
            deck_name: self.deck_name,
            model_name: self.model_name,
            fields: self.fields,
            tags: self.tags,
        }
    }
}
