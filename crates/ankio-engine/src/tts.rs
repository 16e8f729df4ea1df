//! Text-to-speech provider adapters.
//!
//! Each provider is a single stateless HTTP call that turns text into MP3
//! audio, returned base64-encoded so it can go straight into
//! `storeMediaFile`. API keys come from the environment; a missing key is a
//! typed error with setup instructions, not a panic.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const ELEVENLABS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";
const GOOGLE_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Default ElevenLabs voice (Arabella) when neither the argument nor
/// `ELEVENLABS_VOICE_ID` is set.
const DEFAULT_ELEVENLABS_VOICE: &str = "aEO01A4wXwd1O8GPgGlF";
const DEFAULT_ELEVENLABS_MODEL: &str = "eleven_monolingual_v2";

const DEFAULT_GOOGLE_LANGUAGE: &str = "cmn-cn";
const DEFAULT_GOOGLE_VOICE: &str = "cmn-CN-Chirp3-HD-Achernar";

/// A supported text-to-speech provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TtsProvider {
    /// ElevenLabs (default).
    #[default]
    ElevenLabs,
    /// Google Cloud TTS (Chirp voices).
    Google,
}

impl std::str::FromStr for TtsProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "elevenlabs" => Ok(TtsProvider::ElevenLabs),
            "google" => Ok(TtsProvider::Google),
            _ => Err(format!(
                "Unsupported TTS provider: {s}. Supported providers: elevenlabs, google"
            )),
        }
    }
}

/// Synthesized audio returned by a provider.
#[derive(Debug, Clone, Serialize)]
pub struct TtsAudio {
    /// Base64-encoded MP3 data, ready for `storeMediaFile`.
    pub audio_base64: String,
    /// Audio format (always "mp3").
    pub format: String,
    /// The provider that produced the audio.
    pub provider: String,
    /// The voice that was used.
    pub voice: String,
    /// The text that was synthesized.
    pub text: String,
}

/// Text-to-speech workflow engine.
#[derive(Debug, Clone)]
pub struct TtsEngine {
    http: reqwest::Client,
}

impl TtsEngine {
    pub(crate) fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Synthesize speech with the given provider.
    ///
    /// `language` only applies to Google; `voice` is a voice id for
    /// ElevenLabs and a voice name for Google. Omitted values fall back to
    /// provider defaults.
    pub async fn synthesize(
        &self,
        text: &str,
        provider: TtsProvider,
        language: Option<&str>,
        voice: Option<&str>,
    ) -> Result<TtsAudio> {
        match provider {
            TtsProvider::ElevenLabs => self.elevenlabs(text, voice).await,
            TtsProvider::Google => {
                let language = language.unwrap_or(DEFAULT_GOOGLE_LANGUAGE);
                let voice = voice.unwrap_or(DEFAULT_GOOGLE_VOICE);
                self.google(text, language, voice).await
            }
        }
    }

    async fn elevenlabs(&self, text: &str, voice: Option<&str>) -> Result<TtsAudio> {
        let api_key = std::env::var("ELEVENLABS_API_KEY").map_err(|_| {
            Error::Tts(
                "ElevenLabs API key not found. Set the ELEVENLABS_API_KEY environment variable."
                    .to_string(),
            )
        })?;

        let voice_id = voice
            .map(str::to_string)
            .or_else(|| std::env::var("ELEVENLABS_VOICE_ID").ok())
            .unwrap_or_else(|| DEFAULT_ELEVENLABS_VOICE.to_string());

        let body = serde_json::json!({
            "text": text,
            "model_id": DEFAULT_ELEVENLABS_MODEL,
            "voice_settings": {"stability": 0.5, "similarity_boost": 0.5},
        });

        let response = self
            .http
            .post(format!("{ELEVENLABS_URL}/{voice_id}"))
            .header("Accept", "audio/mpeg")
            .header("xi-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Tts(format!("ElevenLabs request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!(
                "ElevenLabs API error: {status} - {detail}"
            )));
        }

        // The response body is raw MP3 bytes, not JSON.
        let audio = response
            .bytes()
            .await
            .map_err(|e| Error::Tts(format!("failed to read ElevenLabs response: {e}")))?;
        if audio.is_empty() {
            return Err(Error::Tts(
                "No audio data received from ElevenLabs API".to_string(),
            ));
        }

        Ok(TtsAudio {
            audio_base64: BASE64.encode(&audio),
            format: "mp3".to_string(),
            provider: "elevenlabs".to_string(),
            voice: voice_id,
            text: text.to_string(),
        })
    }

    async fn google(&self, text: &str, language: &str, voice: &str) -> Result<TtsAudio> {
        let api_key = std::env::var("GOOGLE_CLOUD_API_KEY").map_err(|_| {
            Error::Tts(
                "Google Cloud API key not found. Set the GOOGLE_CLOUD_API_KEY environment variable."
                    .to_string(),
            )
        })?;

        let body = serde_json::json!({
            "input": {"text": text},
            "voice": {"languageCode": language, "name": voice},
            "audioConfig": {"audioEncoding": "MP3"},
        });

        let response = self
            .http
            .post(format!("{GOOGLE_TTS_URL}?key={api_key}"))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Tts(format!("Google Cloud TTS request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!(
                "Google Cloud TTS API error: {status} - {detail}"
            )));
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct SynthesizeResponse {
            audio_content: String,
        }

        let synthesized: SynthesizeResponse = response
            .json()
            .await
            .map_err(|e| Error::Tts(format!("failed to parse Google Cloud TTS response: {e}")))?;

        Ok(TtsAudio {
            audio_base64: synthesized.audio_content,
            format: "mp3".to_string(),
            provider: "google".to_string(),
            voice: voice.to_string(),
            text: text.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!(
            "ElevenLabs".parse::<TtsProvider>().unwrap(),
            TtsProvider::ElevenLabs
        );
        assert_eq!("google".parse::<TtsProvider>().unwrap(), TtsProvider::Google);
        assert!("polly".parse::<TtsProvider>().is_err());
    }
}
