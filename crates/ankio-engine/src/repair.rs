//! Deck media validation and broken-reference repair.
//!
//! Reads a deck's full note set, finds `[sound:...]` references pointing at
//! files absent from the media store, and optionally rewrites the affected
//! fields to remove the broken markers.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use ankio::{AnkiClient, NoteInfo};
use serde::Serialize;
use tracing::{debug, warn};

use crate::Result;
use crate::media::{MediaEngine, strip_sound_refs};

/// Report of a deck media validation pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeckMediaReport {
    /// The deck that was validated.
    pub deck: String,
    /// Number of notes examined.
    pub total_notes: usize,
    /// Number of notes referencing at least one missing file.
    pub notes_with_missing_media: usize,
    /// Distinct missing filenames across the deck, sorted.
    pub missing_files: Vec<String>,
    /// Note id -> missing filenames referenced by that note.
    pub broken_notes: BTreeMap<i64, Vec<String>>,
    /// Filenames whose existence check failed (validation ran degraded).
    pub unverified: Vec<String>,
}

impl DeckMediaReport {
    /// True when no note references a confirmed-missing file.
    pub fn is_clean(&self) -> bool {
        self.broken_notes.is_empty()
    }
}

/// Broken-reference repair workflow engine.
#[derive(Debug)]
pub struct RepairEngine<'a> {
    client: &'a AnkiClient,
}

impl<'a> RepairEngine<'a> {
    pub(crate) fn new(client: &'a AnkiClient) -> Self {
        Self { client }
    }

    /// Validate every media reference in a deck.
    ///
    /// An empty or unknown deck yields a clean zero-count report.
    pub async fn audit(&self, deck: &str) -> Result<DeckMediaReport> {
        Ok(self.audit_notes(deck).await?.0)
    }

    /// Validate a deck and strip every broken reference found.
    ///
    /// For each affected note, markers referencing missing files are
    /// removed from every affected field (whitespace collapsed, trimmed),
    /// and the note is written back in a single update covering all its
    /// changed fields. Fields with no broken reference are never rewritten,
    /// so a second run against unchanged media issues zero writes. Repair
    /// writes bypass re-validation: stripping markers cannot introduce new
    /// references.
    ///
    /// Returns the validation report and the number of references removed.
    pub async fn repair(&self, deck: &str) -> Result<(DeckMediaReport, usize)> {
        let (report, infos) = self.audit_notes(deck).await?;
        if report.is_clean() {
            return Ok((report, 0));
        }

        let by_id: HashMap<i64, &NoteInfo> = infos.iter().map(|n| (n.note_id, n)).collect();
        let mut removed = 0;

        for (note_id, missing) in &report.broken_notes {
            let Some(info) = by_id.get(note_id) else {
                continue;
            };

            let mut fields = info.field_values();
            let mut changed = 0;
            for value in fields.values_mut() {
                let (stripped, count) = strip_sound_refs(value, missing);
                if count > 0 {
                    *value = stripped;
                    changed += count;
                }
            }

            if changed > 0 {
                match self
                    .client
                    .notes()
                    .update_fields(*note_id, &fields, &info.tags)
                    .await
                {
                    Ok(()) => {
                        debug!(note_id, refs_removed = changed, "repaired note");
                        removed += changed;
                    }
                    Err(e) => {
                        // One failed write must not abort the remaining
                        // repairs; the note stays in broken_notes.
                        warn!(note_id, error = %e, "failed to repair note");
                    }
                }
            }
        }

        Ok((report, removed))
    }

    async fn audit_notes(&self, deck: &str) -> Result<(DeckMediaReport, Vec<NoteInfo>)> {
        let mut report = DeckMediaReport {
            deck: deck.to_string(),
            ..Default::default()
        };

        let query = format!("deck:\"{deck}\"");
        let note_ids = self.client.notes().find(&query).await?;
        if note_ids.is_empty() {
            return Ok((report, Vec::new()));
        }

        let infos = self.client.notes().info(&note_ids).await?;
        report.total_notes = infos.len();

        let field_maps: Vec<_> = infos.iter().map(|info| info.field_values()).collect();
        let missing = MediaEngine::new(self.client).find_missing(&field_maps).await;
        report.unverified = missing.unverified;

        let mut all_missing = BTreeSet::new();
        for (index, files) in missing.missing {
            all_missing.extend(files.iter().cloned());
            report.broken_notes.insert(infos[index].note_id, files);
        }
        report.notes_with_missing_media = report.broken_notes.len();
        report.missing_files = all_missing.into_iter().collect();

        Ok((report, infos))
    }
}
