//! Batch note synchronization with partial-failure reporting.
//!
//! Bulk create and bulk update reconcile several AnkiConnect calls into one
//! client-visible outcome: every input item lands in exactly one of the
//! success or failure lists, keyed by its original position, so a rejected
//! note never prevents its siblings from being processed.

use std::collections::{HashMap, HashSet};

use ankio::{AnkiClient, Note, NoteBuilder};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::media::MediaEngine;
use crate::{Error, Result};

/// A note candidate for bulk creation.
///
/// The model name and field map are mandatory; tags default to empty. The
/// tool layer deserializes the whole candidate list up front, so one
/// structurally invalid item fails the entire create call before anything
/// is attempted - unlike updates, which degrade per item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteSpec {
    /// The note type (model) name.
    pub model_name: String,
    /// Field values, keyed by field name.
    pub fields: HashMap<String, String>,
    /// Tags for the note.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NoteSpec {
    fn to_note(&self, deck: &str) -> Note {
        NoteBuilder::new(deck, &self.model_name)
            .fields(self.fields.clone())
            .tags(self.tags.iter().cloned())
            .build()
    }

    fn echo(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

/// A single bulk-update item, parsed leniently from raw JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSpec {
    /// ID of the note to update.
    pub note_id: i64,
    /// Field values to set; unnamed fields are preserved.
    pub fields: HashMap<String, String>,
    /// Replacement tag list. `None` preserves the note's existing tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Media validation options for bulk create.
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateOptions {
    /// Check `[sound:...]` references against the media store first.
    pub validate_media: bool,
    /// Drop notes with missing media (reported as per-item failures)
    /// instead of aborting the whole call.
    pub skip_invalid_media: bool,
}

/// Per-item success in a batch operation.
#[derive(Debug, Clone, Serialize)]
pub struct ItemSuccess<T> {
    /// Position of the item in the original input list.
    pub index: usize,
    #[serde(flatten)]
    pub value: T,
}

/// Per-item failure in a batch operation.
#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
    /// Position of the item in the original input list.
    pub index: usize,
    /// Why this item failed.
    pub reason: String,
    /// The original input payload, echoed back for caller retry.
    pub input: serde_json::Value,
}

/// Aggregate result of a batch operation.
///
/// Invariant: every input item appears in exactly one of `successes` and
/// `failures`, so `successes.len() + failures.len() == attempted`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome<T> {
    /// Number of items submitted.
    pub attempted: usize,
    /// Items that succeeded, in input order.
    pub successes: Vec<ItemSuccess<T>>,
    /// Items that failed, in input order, with reasons.
    pub failures: Vec<ItemFailure>,
}

impl<T> BatchOutcome<T> {
    fn new(attempted: usize) -> Self {
        Self {
            attempted,
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Number of items that succeeded.
    pub fn succeeded(&self) -> usize {
        self.successes.len()
    }

    /// Number of items that failed.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    fn success(&mut self, index: usize, value: T) {
        self.successes.push(ItemSuccess { index, value });
    }

    fn failure(&mut self, index: usize, reason: impl Into<String>, input: serde_json::Value) {
        self.failures.push(ItemFailure {
            index,
            reason: reason.into(),
            input,
        });
    }

    fn into_sorted(mut self) -> Self {
        self.successes.sort_by_key(|s| s.index);
        self.failures.sort_by_key(|f| f.index);
        self
    }
}

/// Outcome payload for a created note.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedNote {
    /// The store-assigned note ID.
    pub note_id: i64,
    /// The field values the note was created with.
    pub fields: HashMap<String, String>,
}

/// Outcome payload for an updated note.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatedNote {
    /// The updated note's ID.
    pub note_id: i64,
    /// Names of the fields the caller changed, sorted.
    pub updated_fields: Vec<String>,
}

/// Partition of candidate notes by the store's admissibility verdict.
#[derive(Debug)]
pub struct Admission {
    /// Admitted notes with their original indices, input order preserved.
    pub admitted: Vec<(usize, Note)>,
    /// Rejected notes: original index plus the store's stated reason.
    pub rejected: Vec<(usize, String)>,
}

/// Batch synchronization workflow engine.
#[derive(Debug)]
pub struct SyncEngine<'a> {
    client: &'a AnkiClient,
}

impl<'a> SyncEngine<'a> {
    pub(crate) fn new(client: &'a AnkiClient) -> Self {
        Self { client }
    }

    /// Ask the store for a per-note admissibility verdict and partition the
    /// candidates accordingly. Classification only - nothing is created.
    ///
    /// Duplicate and schema checking is delegated entirely to the store's
    /// own admission check (`canAddNotesWithErrorDetail`).
    pub async fn partition_admissible(&self, candidates: Vec<(usize, Note)>) -> Result<Admission> {
        let notes: Vec<Note> = candidates.iter().map(|(_, note)| note.clone()).collect();
        let verdicts = self.client.notes().can_add_detailed(&notes).await?;

        let mut admission = Admission {
            admitted: Vec::new(),
            rejected: Vec::new(),
        };
        for ((index, note), verdict) in candidates.into_iter().zip(verdicts) {
            if verdict.can_add {
                admission.admitted.push((index, note));
            } else {
                let reason = verdict
                    .error
                    .unwrap_or_else(|| "note cannot be added".to_string());
                admission.rejected.push((index, reason));
            }
        }
        Ok(admission)
    }

    /// Create a batch of notes in one deck.
    ///
    /// Inadmissible notes (duplicates, schema violations) and notes dropped
    /// for missing media are reported as per-item failures with
    /// distinguishable reasons; they never prevent sibling notes from being
    /// created. With `validate_media` set and `skip_invalid_media` unset, a
    /// note with missing media aborts the whole call via
    /// [`Error::MediaValidation`].
    pub async fn bulk_create(
        &self,
        deck: &str,
        specs: &[NoteSpec],
        options: CreateOptions,
    ) -> Result<BatchOutcome<CreatedNote>> {
        if specs.is_empty() {
            return Err(Error::Validation("no notes provided".to_string()));
        }

        let mut outcome = BatchOutcome::new(specs.len());

        if options.validate_media {
            let field_maps: Vec<_> = specs.iter().map(|s| s.fields.clone()).collect();
            let report = MediaEngine::new(self.client).find_missing(&field_maps).await;
            if !report.is_clean() {
                if !options.skip_invalid_media {
                    return Err(Error::MediaValidation(report));
                }
                debug!(
                    dropped = report.missing.len(),
                    "dropping notes with missing media from batch"
                );
                for (&index, files) in &report.missing {
                    outcome.failure(
                        index,
                        format!("missing media files: {}", files.join(", ")),
                        specs[index].echo(),
                    );
                }
            }
        }

        let dropped: HashSet<usize> = outcome.failures.iter().map(|f| f.index).collect();
        let candidates: Vec<(usize, Note)> = specs
            .iter()
            .enumerate()
            .filter(|(index, _)| !dropped.contains(index))
            .map(|(index, spec)| (index, spec.to_note(deck)))
            .collect();

        if candidates.is_empty() {
            return Ok(outcome.into_sorted());
        }

        let admission = self.partition_admissible(candidates).await?;
        for (index, reason) in admission.rejected {
            outcome.failure(index, reason, specs[index].echo());
        }

        if !admission.admitted.is_empty() {
            let notes: Vec<Note> = admission
                .admitted
                .iter()
                .map(|(_, note)| note.clone())
                .collect();
            let ids = self.client.notes().add_many(&notes).await?;

            for ((index, _), id) in admission.admitted.into_iter().zip(ids) {
                match id {
                    Some(note_id) => outcome.success(
                        index,
                        CreatedNote {
                            note_id,
                            fields: specs[index].fields.clone(),
                        },
                    ),
                    None => outcome.failure(index, "note was not created", specs[index].echo()),
                }
            }
        }

        Ok(outcome.into_sorted())
    }

    /// Apply a batch of independent merge-updates.
    ///
    /// Items arrive as raw JSON so a malformed item (missing `note_id` or
    /// `fields`) becomes a per-item failure that echoes the offending
    /// payload - it never aborts the rest of the batch. Each update is
    /// individually guarded: a not-found id or transport error is recorded
    /// and the loop continues.
    pub async fn bulk_update(
        &self,
        updates: &[serde_json::Value],
    ) -> Result<BatchOutcome<UpdatedNote>> {
        if updates.is_empty() {
            return Err(Error::Validation("no updates provided".to_string()));
        }

        let mut outcome = BatchOutcome::new(updates.len());

        for (index, raw) in updates.iter().enumerate() {
            let spec: UpdateSpec = match serde_json::from_value(raw.clone()) {
                Ok(spec) => spec,
                Err(e) => {
                    outcome.failure(
                        index,
                        format!("missing or malformed 'note_id' or 'fields': {e}"),
                        raw.clone(),
                    );
                    continue;
                }
            };

            match self
                .update_note(spec.note_id, &spec.fields, spec.tags.as_deref())
                .await
            {
                Ok(updated_fields) => outcome.success(
                    index,
                    UpdatedNote {
                        note_id: spec.note_id,
                        updated_fields,
                    },
                ),
                Err(e) => outcome.failure(index, e.to_string(), raw.clone()),
            }
        }

        Ok(outcome)
    }

    /// Merge-update a single note.
    ///
    /// Fetches the current note, overlays the given field values (fields
    /// not named in the update are preserved verbatim), replaces tags only
    /// when a tag list is supplied, and writes the merged note back.
    /// Returns the names of the fields the caller changed.
    pub async fn update_note(
        &self,
        note_id: i64,
        fields: &HashMap<String, String>,
        tags: Option<&[String]>,
    ) -> Result<Vec<String>> {
        let infos = self.client.notes().info(&[note_id]).await?;
        // The store answers an empty object for unknown ids.
        let current = infos
            .into_iter()
            .find(|info| info.note_id == note_id)
            .ok_or(Error::NoteNotFound(note_id))?;

        let mut merged = current.field_values();
        for (name, value) in fields {
            merged.insert(name.clone(), value.clone());
        }

        let tags: Vec<String> = match tags {
            Some(tags) => tags.to_vec(),
            None => current.tags,
        };

        self.client
            .notes()
            .update_fields(note_id, &merged, &tags)
            .await?;

        let mut updated: Vec<String> = fields.keys().cloned().collect();
        updated.sort();
        Ok(updated)
    }
}
