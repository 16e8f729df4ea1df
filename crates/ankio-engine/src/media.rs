//! Media reference extraction and existence validation.
//!
//! Field values embed audio references as literal `[sound:<filename>]`
//! markers. This module extracts those references, checks the referenced
//! files against the media store with one lookup per distinct filename, and
//! reports which notes point at files that do not exist.

use std::collections::{BTreeMap, HashMap};

use ankio::AnkiClient;
use serde::Serialize;
use tracing::warn;

use crate::Result;

/// Extract the filenames referenced by `[sound:...]` markers in field text.
///
/// Returns the filenames in order of appearance. Matches are
/// non-overlapping and never span marker boundaries; text without markers
/// yields an empty vec.
pub fn extract_sound_refs(text: &str) -> Vec<String> {
    let pattern = regex_lite::Regex::new(r"\[sound:([^\]]+)\]").unwrap();
    pattern
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Remove every `[sound:<name>]` marker referencing one of `filenames`.
///
/// The whole marker substring is deleted, not blanked. When anything was
/// removed, runs of whitespace are collapsed to single spaces and the
/// result is trimmed; otherwise the text is returned verbatim. Returns the
/// new text and the number of markers removed.
pub fn strip_sound_refs(text: &str, filenames: &[String]) -> (String, usize) {
    let mut out = text.to_string();
    let mut removed = 0;

    for name in filenames {
        let marker = format!("[sound:{name}]");
        let count = out.matches(&marker).count();
        if count > 0 {
            out = out.replace(&marker, "");
            removed += count;
        }
    }

    if removed > 0 {
        out = out.split_whitespace().collect::<Vec<_>>().join(" ");
    }

    (out, removed)
}

/// Filenames referenced across a batch, deduplicated, with an index back to
/// every batch item that references each one.
///
/// A filename referenced by five notes triggers exactly one existence
/// check; the index scatters the verdict back to all five.
#[derive(Debug, Default)]
pub(crate) struct RefIndex {
    /// Distinct filenames in first-seen order.
    unique: Vec<String>,
    /// Filename -> indices of the items referencing it.
    referencing: HashMap<String, Vec<usize>>,
}

impl RefIndex {
    /// Collect references from a batch of field maps, item index first.
    pub(crate) fn from_field_maps(field_maps: &[HashMap<String, String>]) -> Self {
        let mut index = Self::default();
        for (item, fields) in field_maps.iter().enumerate() {
            for value in fields.values() {
                for filename in extract_sound_refs(value) {
                    index.record(item, filename);
                }
            }
        }
        index
    }

    fn record(&mut self, item: usize, filename: String) {
        let occurrences = self.referencing.entry(filename.clone()).or_default();
        if occurrences.is_empty() {
            self.unique.push(filename);
        }
        if occurrences.last() != Some(&item) {
            occurrences.push(item);
        }
    }

    pub(crate) fn unique(&self) -> &[String] {
        &self.unique
    }

    pub(crate) fn referencing(&self, filename: &str) -> &[usize] {
        self.referencing
            .get(filename)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Referenced-but-absent media across a batch.
///
/// An absent key means "no problem for that note", not "not checked" - the
/// empty report is the canonical all-clear value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MissingMediaReport {
    /// Batch item index -> missing filenames referenced by that item.
    pub missing: BTreeMap<usize, Vec<String>>,
    /// Filenames whose existence check failed and could not be confirmed.
    ///
    /// These are never treated as missing. A non-empty list means the
    /// validation ran degraded and the all-clear is weaker than usual.
    pub unverified: Vec<String>,
}

impl MissingMediaReport {
    /// True when no note references a confirmed-missing file.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
    }

    /// Human-readable `note index -> files` listing for error messages.
    pub fn describe(&self) -> String {
        self.missing
            .iter()
            .map(|(index, files)| format!("note {}: {}", index, files.join(", ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Media validation workflow engine.
#[derive(Debug)]
pub struct MediaEngine<'a> {
    client: &'a AnkiClient,
}

impl<'a> MediaEngine<'a> {
    pub(crate) fn new(client: &'a AnkiClient) -> Self {
        Self { client }
    }

    /// Check whether a single media file exists in the store.
    ///
    /// Built on `retrieveMediaFile`, which answers `false` for absent files
    /// rather than an error.
    pub async fn exists(&self, filename: &str) -> Result<bool> {
        Ok(self.client.media().retrieve(filename).await?.is_some())
    }

    /// Find referenced-but-absent media across a batch of field maps.
    ///
    /// Issues exactly one existence check per distinct filename, no matter
    /// how many notes or fields reference it. This function never fails: an
    /// individual check error marks the filename unverified (logged, and
    /// listed in the report) instead of aborting the batch, so degraded
    /// validation never blocks note creation outright.
    pub async fn find_missing(
        &self,
        field_maps: &[HashMap<String, String>],
    ) -> MissingMediaReport {
        let index = RefIndex::from_field_maps(field_maps);
        let mut report = MissingMediaReport::default();

        for filename in index.unique() {
            match self.exists(filename).await {
                Ok(true) => {}
                Ok(false) => {
                    for &item in index.referencing(filename) {
                        report.missing.entry(item).or_default().push(filename.clone());
                    }
                }
                Err(e) => {
                    warn!(
                        filename = %filename,
                        error = %e,
                        "media existence check failed; treating file as unverified"
                    );
                    report.unverified.push(filename.clone());
                }
            }
        }

        report
    }
}
