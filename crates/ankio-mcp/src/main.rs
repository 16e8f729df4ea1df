//! MCP server for Anki note management via AnkiConnect.
//!
//! Exposes deck inspection, batch note synchronization with media
//! validation, broken-reference repair, media file management, and TTS
//! audio generation as tools for LLM assistants.

use std::collections::HashMap;
use std::sync::Arc;

use ankio_engine::sync::{CreateOptions, NoteSpec};
use ankio_engine::tts::TtsProvider;
use ankio_engine::{CreateModelParams, Engine, NoteBuilder, NoteField, NoteInfo};
use clap::Parser;
use rand::seq::IndexedRandom;
use rmcp::{
    ErrorData as McpError, ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, tool, tool_handler, tool_router,
};
use tracing::{debug, info, warn};

// ============================================================================
// CLI Arguments
// ============================================================================

/// MCP server for Anki note management via AnkiConnect.
#[derive(Parser, Debug)]
#[command(name = "ankio-mcp")]
#[command(version, about, long_about = None)]
struct Args {
    /// AnkiConnect host address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// AnkiConnect port
    #[arg(long, default_value_t = 8765)]
    port: u16,

    /// Read-only mode (disables write operations)
    #[arg(long, default_value_t = false)]
    read_only: bool,

    /// Enable verbose logging (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Transport mode: stdio (default) or http
    #[arg(long, default_value = "stdio")]
    transport: Transport,

    /// HTTP server port (only used with --transport http)
    #[arg(long, default_value_t = 3000)]
    http_port: u16,

    /// HTTP server bind address (only used with --transport http)
    #[arg(long, default_value = "127.0.0.1")]
    http_host: String,
}

/// Transport mode for the MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Transport {
    /// Standard I/O transport (default, for CLI integration)
    #[default]
    Stdio,
    /// HTTP transport (for remote connections)
    Http,
}

impl std::str::FromStr for Transport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stdio" => Ok(Transport::Stdio),
            "http" => Ok(Transport::Http),
            _ => Err(format!("Invalid transport: {}. Use 'stdio' or 'http'", s)),
        }
    }
}

// ============================================================================
// Parameter Types
// ============================================================================

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct DeckParams {
    /// Name of the Anki deck
    deck: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct GetDeckSampleParams {
    /// Name of the Anki deck to sample notes from
    deck: String,
    /// Number of notes to randomly sample (1-50)
    #[serde(default = "default_sample_size")]
    sample_size: usize,
}

fn default_sample_size() -> usize {
    5
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct CreateNoteParams {
    /// Name of the Anki deck to add the note to
    deck: String,
    /// Name of the note type/model to use
    model: String,
    /// Field values (field_name -> value)
    fields: HashMap<String, String>,
    /// Optional tags for the note
    #[serde(default)]
    tags: Vec<String>,
    /// Check [sound:...] references against the media store before creating
    #[serde(default)]
    validate_media: bool,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct UpdateNoteParams {
    /// ID of the note to update
    note_id: i64,
    /// Field values to update; fields not named here are preserved
    fields: HashMap<String, String>,
    /// Replacement tag list; existing tags are kept when omitted
    #[serde(default)]
    tags: Option<Vec<String>>,
    /// Check [sound:...] references against the media store before updating
    #[serde(default)]
    validate_media: bool,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct BulkNoteSpec {
    /// Name of the note type/model for this note
    model_name: String,
    /// Field values (field_name -> value)
    fields: HashMap<String, String>,
    /// Optional tags for this note
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct CreateNotesBulkParams {
    /// Name of the Anki deck to add the notes to
    deck: String,
    /// Notes to create
    notes: Vec<BulkNoteSpec>,
    /// Check [sound:...] references against the media store first
    #[serde(default)]
    validate_media: bool,
    /// Drop notes with missing media (reported as failures) instead of
    /// aborting the whole call
    #[serde(default)]
    skip_invalid_media: bool,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct UpdateNotesBulkParams {
    /// Updates to apply; each item needs 'note_id' and 'fields', plus an
    /// optional 'tags' list. Malformed items are reported per item.
    updates: Vec<serde_json::Value>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct ValidateDeckMediaParams {
    /// Name of the Anki deck to validate
    deck: String,
    /// Also strip broken [sound:...] references from the affected notes
    #[serde(default)]
    delete_missing_refs: bool,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct FindSimilarNotesParams {
    /// Name of the Anki deck to search in
    deck: String,
    /// Text to search for as a substring in any field
    search_text: String,
    /// Whether the search should be case sensitive
    #[serde(default)]
    case_sensitive: bool,
    /// Maximum number of matching notes to return (1-100)
    #[serde(default = "default_max_results")]
    max_results: usize,
}

fn default_max_results() -> usize {
    20
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct CreateDeckWithNoteTypeParams {
    /// Name for the new Anki deck
    deck: String,
    /// Name for the note type/model to create or reuse
    model: String,
    /// Field names for the note type (e.g. ["Front", "Back", "Audio"])
    fields: Vec<String>,
    /// Optional card template definitions; a basic front/back template is
    /// generated when omitted
    #[serde(default)]
    card_templates: Option<Vec<CardTemplateDef>>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct CardTemplateDef {
    /// Template name
    name: String,
    /// Front template HTML
    front: String,
    /// Back template HTML
    back: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct ListMediaFilesParams {
    /// Glob pattern to filter files (e.g. "*.mp3"); all files when omitted
    #[serde(default)]
    pattern: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct MediaFilenameParams {
    /// Name of the media file
    filename: String,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct RetrieveMediaFileParams {
    /// Name of the media file to retrieve
    filename: String,
    /// Include the base64-encoded file content in the result
    #[serde(default)]
    return_base64: bool,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct SaveMediaFileParams {
    /// Name to save the file as (e.g. "audio.mp3")
    filename: String,
    /// Base64 encoded file data
    base64_data: String,
    /// Type of media file (audio, image, etc.)
    #[serde(default = "default_media_type")]
    media_type: String,
}

fn default_media_type() -> String {
    "audio".to_string()
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct DeleteMediaFileParams {
    /// Name of the media file to delete
    filename: String,
    /// Must be true to actually delete the file
    #[serde(default)]
    confirm: bool,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct GenerateAudioParams {
    /// Text to convert to speech
    text: String,
    /// TTS provider: "elevenlabs" (default) or "google"
    #[serde(default)]
    provider: Option<String>,
    /// Language code for Google TTS (e.g. "cmn-cn", "en-US")
    #[serde(default)]
    language: Option<String>,
    /// Voice id (ElevenLabs) or voice name (Google)
    #[serde(default)]
    voice: Option<String>,
}

#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
struct GenerateAndSaveAudioParams {
    /// Text to convert to speech and save
    text: String,
    /// Name for the audio file (e.g. "pronunciation.mp3")
    filename: String,
    /// TTS provider: "elevenlabs" (default) or "google"
    #[serde(default)]
    provider: Option<String>,
    /// Language code for Google TTS (e.g. "cmn-cn", "en-US")
    #[serde(default)]
    language: Option<String>,
    /// Voice id (ElevenLabs) or voice name (Google)
    #[serde(default)]
    voice: Option<String>,
}

// ============================================================================
// Helpers
// ============================================================================

/// Truncate a field value for listing output, counting characters rather
/// than bytes so multi-byte text never splits mid-character.
fn truncate_chars(value: &str, max_chars: usize) -> String {
    if value.chars().count() > max_chars {
        let truncated: String = value.chars().take(max_chars).collect();
        format!("{truncated}...")
    } else {
        value.to_string()
    }
}

/// Format notes for human-readable listing output.
fn format_notes(header: String, notes: &[NoteInfo], truncate_at: usize) -> String {
    let mut output = vec![header, String::new()];

    for (i, note) in notes.iter().enumerate() {
        output.push(format!("Note {} (ID: {}):", i + 1, note.note_id));
        output.push(format!("  Model: {}", note.model_name));
        let tags = if note.tags.is_empty() {
            "None".to_string()
        } else {
            note.tags.join(", ")
        };
        output.push(format!("  Tags: {}", tags));
        output.push("  Fields:".to_string());

        let mut fields: Vec<(&String, &NoteField)> = note.fields.iter().collect();
        fields.sort_by_key(|(_, field)| field.order);
        for (name, field) in fields {
            output.push(format!(
                "    {}: {}",
                name,
                truncate_chars(&field.value, truncate_at)
            ));
        }
        output.push(String::new());
    }

    output.join("\n")
}

/// Map an engine error onto an MCP error, preserving the structured media
/// report when a batch was aborted on validation.
fn engine_error(e: ankio_engine::Error) -> McpError {
    match e {
        ankio_engine::Error::MediaValidation(report) => McpError::invalid_params(
            format!(
                "notes reference missing media files: {}",
                report.describe()
            ),
            serde_json::to_value(&report).ok(),
        ),
        ankio_engine::Error::Validation(msg) => McpError::invalid_params(msg, None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn parse_provider(provider: Option<&str>) -> Result<TtsProvider, McpError> {
    match provider {
        Some(name) => name
            .parse::<TtsProvider>()
            .map_err(|e| McpError::invalid_params(e, None)),
        None => Ok(TtsProvider::default()),
    }
}

fn json_result(value: serde_json::Value) -> CallToolResult {
    CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(&value).unwrap_or_default(),
    )])
}

// ============================================================================
// Server Implementation
// ============================================================================

#[derive(Clone)]
struct AnkiServer {
    engine: Arc<Engine>,
    tool_router: ToolRouter<AnkiServer>,
    read_only: bool,
}

impl AnkiServer {
    fn new(url: &str, read_only: bool) -> Self {
        let client = ankio_engine::ClientBuilder::new().url(url).build();
        let engine = Engine::from_client(client);
        Self {
            engine: Arc::new(engine),
            tool_router: Self::tool_router(),
            read_only,
        }
    }

    fn check_write(&self, operation: &str) -> Result<(), McpError> {
        if self.read_only {
            warn!("Blocked write operation in read-only mode: {}", operation);
            Err(McpError::invalid_request(
                format!(
                    "Write operation '{}' is not allowed in read-only mode",
                    operation
                ),
                None,
            ))
        } else {
            Ok(())
        }
    }

    /// Fetch full note infos for a deck; `Ok(None)` means the deck is empty
    /// or unknown.
    async fn deck_notes(&self, deck: &str) -> Result<Option<Vec<NoteInfo>>, McpError> {
        let query = format!("deck:\"{deck}\"");
        let note_ids = self
            .engine
            .client()
            .notes()
            .find(&query)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        if note_ids.is_empty() {
            return Ok(None);
        }

        let notes = self
            .engine
            .client()
            .notes()
            .info(&note_ids)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(Some(notes))
    }

    /// Run media validation over one set of field values, failing the call
    /// when a referenced file is confirmed missing.
    async fn validate_fields_media(
        &self,
        fields: &HashMap<String, String>,
    ) -> Result<(), McpError> {
        let report = self
            .engine
            .media()
            .find_missing(std::slice::from_ref(fields))
            .await;
        if report.is_clean() {
            Ok(())
        } else {
            Err(McpError::invalid_params(
                format!("missing media files: {}", report.describe()),
                serde_json::to_value(&report).ok(),
            ))
        }
    }
}

#[tool_router]
impl AnkiServer {
    // ========================================================================
    // Deck and Model Inspection
    // ========================================================================

    #[tool(description = "List all available Anki decks.")]
    async fn list_decks(&self) -> Result<CallToolResult, McpError> {
        debug!("Listing decks");

        let decks = self
            .engine
            .client()
            .decks()
            .names()
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        let listing = decks
            .iter()
            .map(|deck| format!("- {deck}"))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(CallToolResult::success(vec![Content::text(format!(
            "Available decks ({}):\n{}",
            decks.len(),
            listing
        ))]))
    }

    #[tool(description = "Get all notes/cards from a specific deck.")]
    async fn get_deck_notes(
        &self,
        Parameters(params): Parameters<DeckParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!(deck = %params.deck, "Getting deck notes");

        let Some(notes) = self.deck_notes(&params.deck).await? else {
            return Ok(CallToolResult::success(vec![Content::text(format!(
                "No notes found in deck '{}'",
                params.deck
            ))]));
        };

        let header = format!("Notes in deck '{}' ({} total):", params.deck, notes.len());
        Ok(CallToolResult::success(vec![Content::text(format_notes(
            header, &notes, 100,
        ))]))
    }

    #[tool(
        description = "Get a random sample of notes from a specific deck to understand typical note structure."
    )]
    async fn get_deck_sample(
        &self,
        Parameters(params): Parameters<GetDeckSampleParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!(deck = %params.deck, sample_size = params.sample_size, "Sampling deck");

        let query = format!("deck:\"{}\"", params.deck);
        let note_ids = self
            .engine
            .client()
            .notes()
            .find(&query)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        if note_ids.is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(format!(
                "No notes found in deck '{}'",
                params.deck
            ))]));
        }

        let sample_size = params.sample_size.clamp(1, 50).min(note_ids.len());
        let sampled: Vec<i64> = note_ids
            .choose_multiple(&mut rand::rng(), sample_size)
            .copied()
            .collect();

        let notes = self
            .engine
            .client()
            .notes()
            .info(&sampled)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        let header = format!(
            "Sample of {} notes from deck '{}' (total: {}):",
            notes.len(),
            params.deck,
            note_ids.len()
        );
        Ok(CallToolResult::success(vec![Content::text(format_notes(
            header, &notes, 200,
        ))]))
    }

    #[tool(
        description = "Get the note types (models) and their field definitions used in a specific deck."
    )]
    async fn get_deck_note_types(
        &self,
        Parameters(params): Parameters<DeckParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!(deck = %params.deck, "Getting deck note types");

        let query = format!("deck:\"{}\"", params.deck);
        let note_ids = self
            .engine
            .client()
            .notes()
            .find(&query)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        if note_ids.is_empty() {
            return Ok(CallToolResult::success(vec![Content::text(format!(
                "No notes found in deck '{}'",
                params.deck
            ))]));
        }

        // A sample is enough to discover the models in use.
        let sample_size = note_ids.len().min(50);
        let sampled: Vec<i64> = note_ids
            .choose_multiple(&mut rand::rng(), sample_size)
            .copied()
            .collect();

        let notes = self
            .engine
            .client()
            .notes()
            .info(&sampled)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        // BTreeSet dedupes and sorts the model names in one pass.
        let model_names: std::collections::BTreeSet<String> = notes
            .iter()
            .map(|note| note.model_name.clone())
            .collect();

        let mut output = vec![format!("Note types used in deck '{}':", params.deck), String::new()];
        for model_name in model_names {
            if let Ok(fields) = self.engine.client().models().field_names(&model_name).await {
                output.push(format!("Model: {model_name}"));
                output.push(format!("  Fields: {}", fields.join(", ")));
                output.push(String::new());
            }
        }

        Ok(CallToolResult::success(vec![Content::text(
            output.join("\n"),
        )]))
    }

    #[tool(
        description = "List all available note types (models) with their fields and card templates."
    )]
    async fn list_note_types(&self) -> Result<CallToolResult, McpError> {
        debug!("Listing note types");

        let mut model_names = self
            .engine
            .client()
            .models()
            .names()
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        model_names.sort();

        let mut output = vec![format!("Available note types ({}):", model_names.len()), String::new()];

        for model_name in &model_names {
            output.push(format!("Model: {model_name}"));

            if let Ok(fields) = self.engine.client().models().field_names(model_name).await {
                output.push(format!("  Fields: {}", fields.join(", ")));
            }

            if let Ok(templates) = self.engine.client().models().templates(model_name).await {
                output.push(format!("  Templates: {} card type(s)", templates.len()));
                let mut names: Vec<&String> = templates.keys().collect();
                names.sort();
                for name in names {
                    output.push(format!("    - {name}"));
                }
            }

            if let Ok(styling) = self.engine.client().models().styling(model_name).await {
                output.push(format!("  CSS: {} characters", styling.css.len()));
            }

            output.push(String::new());
        }

        Ok(CallToolResult::success(vec![Content::text(
            output.join("\n"),
        )]))
    }

    #[tool(
        description = "Create a new deck and optionally a new note type with specified fields and card templates."
    )]
    async fn create_deck_with_note_type(
        &self,
        Parameters(params): Parameters<CreateDeckWithNoteTypeParams>,
    ) -> Result<CallToolResult, McpError> {
        self.check_write("create_deck_with_note_type")?;
        debug!(deck = %params.deck, model = %params.model, "Creating deck with note type");

        if params.fields.is_empty() {
            return Err(McpError::invalid_params(
                "at least one field name is required",
                None,
            ));
        }

        let deck_id = self
            .engine
            .client()
            .decks()
            .create(&params.deck)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        let existing_models = self
            .engine
            .client()
            .models()
            .names()
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        if existing_models.contains(&params.model) {
            info!(deck_id, deck = %params.deck, model = %params.model, "Deck created with existing note type");
            return Ok(json_result(serde_json::json!({
                "success": true,
                "deck_id": deck_id,
                "deck_name": params.deck,
                "model_created": false,
                "model_name": params.model,
                "message": format!(
                    "Note type '{}' already exists, deck created with existing note type",
                    params.model
                ),
            })));
        }

        let mut model = CreateModelParams::new(&params.model).css(
            ".card {\n font-family: arial;\n font-size: 20px;\n text-align: center;\n color: black;\n background-color: white;\n}\n",
        );
        for field in &params.fields {
            model = model.field(field);
        }

        match params.card_templates {
            Some(templates) => {
                for template in templates {
                    model = model.template(template.name, template.front, template.back);
                }
            }
            None => {
                // Basic front/back template from the first two fields.
                let front = format!("{{{{{}}}}}", params.fields[0]);
                let back = if params.fields.len() > 1 {
                    format!("{{{{FrontSide}}}}<hr id=\"answer\">{{{{{}}}}}", params.fields[1])
                } else {
                    front.clone()
                };
                model = model.template("Card 1", front, back);
            }
        }

        self.engine
            .client()
            .models()
            .create(model)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        info!(deck_id, deck = %params.deck, model = %params.model, "Deck and note type created");
        Ok(json_result(serde_json::json!({
            "success": true,
            "deck_id": deck_id,
            "deck_name": params.deck,
            "model_created": true,
            "model_name": params.model,
            "fields": params.fields,
        })))
    }

    // ========================================================================
    // Note Creation and Updates
    // ========================================================================

    #[tool(
        description = "Create a new note in the specified deck. Set validate_media=true to reject the note if it references missing media files."
    )]
    async fn create_note(
        &self,
        Parameters(params): Parameters<CreateNoteParams>,
    ) -> Result<CallToolResult, McpError> {
        self.check_write("create_note")?;
        debug!(deck = %params.deck, model = %params.model, "Creating note");

        if params.validate_media {
            self.validate_fields_media(&params.fields).await?;
        }

        let note = NoteBuilder::new(&params.deck, &params.model)
            .fields(params.fields.clone())
            .tags(params.tags)
            .build();

        let note_id = self
            .engine
            .client()
            .notes()
            .add(note)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        info!(note_id, "Note created");
        Ok(json_result(serde_json::json!({
            "success": true,
            "note_id": note_id,
        })))
    }

    #[tool(
        description = "Update specific fields of an existing note. Fields not named in the update are preserved; tags are replaced only when a tag list is supplied. Perfect for adding audio to existing cards."
    )]
    async fn update_note(
        &self,
        Parameters(params): Parameters<UpdateNoteParams>,
    ) -> Result<CallToolResult, McpError> {
        self.check_write("update_note")?;
        debug!(note_id = params.note_id, "Updating note");

        if params.validate_media {
            self.validate_fields_media(&params.fields).await?;
        }

        let updated_fields = self
            .engine
            .sync()
            .update_note(params.note_id, &params.fields, params.tags.as_deref())
            .await
            .map_err(engine_error)?;

        info!(note_id = params.note_id, "Note updated");
        Ok(json_result(serde_json::json!({
            "success": true,
            "note_id": params.note_id,
            "updated_fields": updated_fields,
            "message": format!(
                "Successfully updated note {} with fields: {}",
                params.note_id,
                updated_fields.join(", ")
            ),
        })))
    }

    #[tool(
        description = "Create multiple notes in a single batch operation. Duplicates and media failures are reported per item while the rest of the batch is still created. Set validate_media=true to check [sound:...] references first; with skip_invalid_media=true, offending notes are dropped instead of failing the whole call."
    )]
    async fn create_notes_bulk(
        &self,
        Parameters(params): Parameters<CreateNotesBulkParams>,
    ) -> Result<CallToolResult, McpError> {
        self.check_write("create_notes_bulk")?;
        debug!(
            deck = %params.deck,
            count = params.notes.len(),
            validate_media = params.validate_media,
            "Bulk creating notes"
        );

        let specs: Vec<NoteSpec> = params
            .notes
            .into_iter()
            .map(|note| NoteSpec {
                model_name: note.model_name,
                fields: note.fields,
                tags: note.tags,
            })
            .collect();

        let options = CreateOptions {
            validate_media: params.validate_media,
            skip_invalid_media: params.skip_invalid_media,
        };

        let outcome = self
            .engine
            .sync()
            .bulk_create(&params.deck, &specs, options)
            .await
            .map_err(engine_error)?;

        info!(
            attempted = outcome.attempted,
            succeeded = outcome.succeeded(),
            failed = outcome.failed(),
            "Bulk create completed"
        );

        let message = format!(
            "Created {} new notes. {} notes failed (see failed_notes for details).",
            outcome.succeeded(),
            outcome.failed()
        );
        Ok(json_result(serde_json::json!({
            "success": true,
            "total_attempted": outcome.attempted,
            "successful_count": outcome.succeeded(),
            "failed_count": outcome.failed(),
            "successful_notes": outcome.successes,
            "failed_notes": outcome.failures,
            "message": message,
        })))
    }

    #[tool(
        description = "Update multiple notes in a single batch operation. Each update needs 'note_id' and 'fields'; a malformed or failing item is reported per item and does not abort the rest of the batch."
    )]
    async fn update_notes_bulk(
        &self,
        Parameters(params): Parameters<UpdateNotesBulkParams>,
    ) -> Result<CallToolResult, McpError> {
        self.check_write("update_notes_bulk")?;
        debug!(count = params.updates.len(), "Bulk updating notes");

        let outcome = self
            .engine
            .sync()
            .bulk_update(&params.updates)
            .await
            .map_err(engine_error)?;

        info!(
            attempted = outcome.attempted,
            succeeded = outcome.succeeded(),
            failed = outcome.failed(),
            "Bulk update completed"
        );

        let message = format!(
            "Successfully updated {} out of {} notes",
            outcome.succeeded(),
            outcome.attempted
        );
        Ok(json_result(serde_json::json!({
            "success": true,
            "total_attempted": outcome.attempted,
            "successful_count": outcome.succeeded(),
            "failed_count": outcome.failed(),
            "successful_updates": outcome.successes,
            "failed_updates": outcome.failures,
            "message": message,
        })))
    }

    // ========================================================================
    // Media Validation and Repair
    // ========================================================================

    #[tool(
        description = "Check every [sound:...] reference in a deck against the media store and report notes pointing at missing files. Set delete_missing_refs=true to also strip the broken references from the affected notes."
    )]
    async fn validate_deck_media(
        &self,
        Parameters(params): Parameters<ValidateDeckMediaParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!(
            deck = %params.deck,
            repair = params.delete_missing_refs,
            "Validating deck media"
        );

        if params.delete_missing_refs {
            self.check_write("validate_deck_media")?;

            let (report, deleted_refs_count) = self
                .engine
                .repair()
                .repair(&params.deck)
                .await
                .map_err(engine_error)?;

            info!(
                deck = %params.deck,
                broken_notes = report.notes_with_missing_media,
                deleted_refs_count,
                "Deck media repaired"
            );

            let mut result = serde_json::to_value(&report)
                .map_err(|e| McpError::internal_error(e.to_string(), None))?;
            result["success"] = serde_json::Value::Bool(true);
            result["deleted_refs_count"] = serde_json::Value::from(deleted_refs_count);
            return Ok(json_result(result));
        }

        let report = self
            .engine
            .repair()
            .audit(&params.deck)
            .await
            .map_err(engine_error)?;

        let mut result = serde_json::to_value(&report)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        result["success"] = serde_json::Value::Bool(true);
        Ok(json_result(result))
    }

    #[tool(
        description = "Find notes that contain the search text as a substring in any field. Simple and reliable text matching."
    )]
    async fn find_similar_notes(
        &self,
        Parameters(params): Parameters<FindSimilarNotesParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!(deck = %params.deck, search = %params.search_text, "Finding similar notes");

        let Some(notes) = self.deck_notes(&params.deck).await? else {
            return Err(McpError::invalid_params(
                format!("No notes found in deck '{}'", params.deck),
                None,
            ));
        };

        let needle = if params.case_sensitive {
            params.search_text.clone()
        } else {
            params.search_text.to_lowercase()
        };

        let max_results = params.max_results.clamp(1, 100);
        let mut matches = Vec::new();

        for note in &notes {
            let mut matching_fields = Vec::new();
            for (name, field) in &note.fields {
                let value = field.value.trim();
                if value.is_empty() {
                    continue;
                }

                let haystack = if params.case_sensitive {
                    value.to_string()
                } else {
                    value.to_lowercase()
                };
                if haystack.contains(&needle) {
                    matching_fields.push(serde_json::json!({
                        "field_name": name,
                        "field_value": value,
                    }));
                }
            }

            if !matching_fields.is_empty() {
                matches.push(serde_json::json!({
                    "note_id": note.note_id,
                    "model_name": note.model_name,
                    "tags": note.tags,
                    "matching_fields": matching_fields,
                    "fields": note.field_values(),
                }));
                if matches.len() >= max_results {
                    break;
                }
            }
        }

        Ok(json_result(serde_json::json!({
            "success": true,
            "search_text": params.search_text,
            "found_count": matches.len(),
            "case_sensitive": params.case_sensitive,
            "deck_name": params.deck,
            "notes": matches,
        })))
    }

    // ========================================================================
    // Media Files
    // ========================================================================

    #[tool(description = "List media files in Anki's collection, optionally filtered by glob pattern.")]
    async fn list_media_files(
        &self,
        Parameters(params): Parameters<ListMediaFilesParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!(pattern = ?params.pattern, "Listing media files");

        let pattern = params.pattern.as_deref().unwrap_or("*");
        let mut files = self
            .engine
            .client()
            .media()
            .list(pattern)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        files.sort();

        Ok(json_result(serde_json::json!({
            "success": true,
            "count": files.len(),
            "pattern": params.pattern,
            "files": files,
        })))
    }

    #[tool(description = "Check whether a media file exists in Anki's collection.")]
    async fn media_file_exists(
        &self,
        Parameters(params): Parameters<MediaFilenameParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!(filename = %params.filename, "Checking media file");

        let exists = self
            .engine
            .media()
            .exists(&params.filename)
            .await
            .map_err(engine_error)?;

        Ok(json_result(serde_json::json!({
            "success": true,
            "filename": params.filename,
            "exists": exists,
        })))
    }

    #[tool(
        description = "Retrieve a media file from Anki's collection. Set return_base64=true to include the file content."
    )]
    async fn retrieve_media_file(
        &self,
        Parameters(params): Parameters<RetrieveMediaFileParams>,
    ) -> Result<CallToolResult, McpError> {
        debug!(filename = %params.filename, "Retrieving media file");

        let content = self
            .engine
            .client()
            .media()
            .retrieve(&params.filename)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        let result = match content {
            None => serde_json::json!({
                "success": true,
                "filename": params.filename,
                "exists": false,
                "message": format!("Media file '{}' not found", params.filename),
            }),
            Some(data) if params.return_base64 => serde_json::json!({
                "success": true,
                "filename": params.filename,
                "exists": true,
                "base64_data": data,
            }),
            Some(_) => serde_json::json!({
                "success": true,
                "filename": params.filename,
                "exists": true,
                "message": format!(
                    "Media file '{}' exists (content not returned)",
                    params.filename
                ),
            }),
        };

        Ok(json_result(result))
    }

    #[tool(
        description = "Save base64 encoded media data as a file in Anki's media collection for use in cards."
    )]
    async fn save_media_file(
        &self,
        Parameters(params): Parameters<SaveMediaFileParams>,
    ) -> Result<CallToolResult, McpError> {
        self.check_write("save_media_file")?;
        debug!(filename = %params.filename, media_type = %params.media_type, "Saving media file");

        let saved_filename = self
            .engine
            .client()
            .media()
            .store(&params.filename, &params.base64_data)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        info!(filename = %saved_filename, "Media file saved");
        Ok(json_result(serde_json::json!({
            "success": true,
            "filename": saved_filename,
            "media_type": params.media_type,
            "message": format!(
                "Media file saved as '{}' in Anki's media collection",
                saved_filename
            ),
        })))
    }

    #[tool(
        description = "Delete a media file from Anki's collection. Requires confirm=true to actually delete."
    )]
    async fn delete_media_file(
        &self,
        Parameters(params): Parameters<DeleteMediaFileParams>,
    ) -> Result<CallToolResult, McpError> {
        if !params.confirm {
            return Ok(json_result(serde_json::json!({
                "success": false,
                "filename": params.filename,
                "error": "Deletion requires confirm=True to prevent accidents",
            })));
        }
        self.check_write("delete_media_file")?;
        debug!(filename = %params.filename, "Deleting media file");

        let exists = self
            .engine
            .media()
            .exists(&params.filename)
            .await
            .map_err(engine_error)?;
        if !exists {
            return Ok(json_result(serde_json::json!({
                "success": true,
                "deleted": false,
                "filename": params.filename,
                "message": format!("Media file '{}' does not exist", params.filename),
            })));
        }

        self.engine
            .client()
            .media()
            .delete(&params.filename)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        info!(filename = %params.filename, "Media file deleted");
        Ok(json_result(serde_json::json!({
            "success": true,
            "deleted": true,
            "filename": params.filename,
            "message": format!("Media file '{}' deleted successfully", params.filename),
        })))
    }

    #[tool(description = "Get the path to Anki's media collection directory.")]
    async fn get_media_directory(&self) -> Result<CallToolResult, McpError> {
        debug!("Getting media directory");

        let path = self
            .engine
            .client()
            .media()
            .directory()
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        Ok(json_result(serde_json::json!({
            "success": true,
            "path": path,
            "message": format!("Media directory: {path}"),
        })))
    }

    // ========================================================================
    // Text-to-Speech
    // ========================================================================

    #[tool(
        description = "Generate speech audio from text and return base64 encoded MP3 data. Provider can be 'elevenlabs' (default) or 'google'."
    )]
    async fn generate_audio(
        &self,
        Parameters(params): Parameters<GenerateAudioParams>,
    ) -> Result<CallToolResult, McpError> {
        let provider = parse_provider(params.provider.as_deref())?;
        debug!(provider = ?provider, "Generating audio");

        let audio = self
            .engine
            .tts()
            .synthesize(
                &params.text,
                provider,
                params.language.as_deref(),
                params.voice.as_deref(),
            )
            .await
            .map_err(engine_error)?;

        let mut result = serde_json::to_value(&audio)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        result["success"] = serde_json::Value::Bool(true);
        Ok(json_result(result))
    }

    #[tool(
        description = "Generate speech audio from text and save it to Anki's media collection, returning the [sound:...] tag to use in card fields."
    )]
    async fn generate_and_save_audio(
        &self,
        Parameters(params): Parameters<GenerateAndSaveAudioParams>,
    ) -> Result<CallToolResult, McpError> {
        self.check_write("generate_and_save_audio")?;
        let provider = parse_provider(params.provider.as_deref())?;
        debug!(provider = ?provider, filename = %params.filename, "Generating and saving audio");

        let audio = self
            .engine
            .tts()
            .synthesize(
                &params.text,
                provider,
                params.language.as_deref(),
                params.voice.as_deref(),
            )
            .await
            .map_err(engine_error)?;

        let saved_filename = self
            .engine
            .client()
            .media()
            .store(&params.filename, &audio.audio_base64)
            .await
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;

        info!(filename = %saved_filename, "Audio generated and saved");
        Ok(json_result(serde_json::json!({
            "success": true,
            "filename": saved_filename,
            "text": params.text,
            "provider": audio.provider,
            "voice": audio.voice,
            "sound_tag": format!("[sound:{saved_filename}]"),
            "message": format!(
                "Audio generated and saved as '{0}'. Use [sound:{0}] in your card fields.",
                saved_filename
            ),
        })))
    }
}

#[tool_handler]
impl ServerHandler for AnkiServer {
    fn get_info(&self) -> ServerInfo {
        let mode = if self.read_only { " (read-only)" } else { "" };
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(format!(
                "Anki note management via AnkiConnect{}. \
                 Requires Anki to be running with the AnkiConnect add-on installed. \
                 Tools: list_decks, get_deck_notes, create_notes_bulk, update_notes_bulk, \
                 validate_deck_media, generate_and_save_audio, and more.",
                mode
            )),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize tracing
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let url = format!("http://{}:{}", args.host, args.port);
    info!(
        anki_url = %url,
        read_only = args.read_only,
        transport = ?args.transport,
        "Starting ankio-mcp server"
    );

    let server = AnkiServer::new(&url, args.read_only);

    match args.transport {
        Transport::Stdio => {
            let transport = (tokio::io::stdin(), tokio::io::stdout());
            let mcp_server = server.serve(transport).await?;
            mcp_server.waiting().await?;
        }
        Transport::Http => {
            use rmcp::transport::streamable_http_server::{
                StreamableHttpServerConfig, StreamableHttpService,
                session::local::LocalSessionManager,
            };

            let bind_addr = format!("{}:{}", args.http_host, args.http_port);
            info!(bind_addr = %bind_addr, "Starting HTTP transport");

            let service: StreamableHttpService<AnkiServer, LocalSessionManager> =
                StreamableHttpService::new(
                    move || Ok(server.clone()),
                    Arc::new(LocalSessionManager::default()),
                    StreamableHttpServerConfig::default(),
                );

            let router = axum::Router::new().nest_service("/mcp", service);
            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            info!(bind_addr = %bind_addr, "MCP server listening on HTTP");

            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}
