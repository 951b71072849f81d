//! OpenAI speech backend (`POST /audio/speech`).
//!
//! The API key is an ambient credential: `OpenAiConfig::api_key` or, failing
//! that, `OPENAI_API_KEY` at call time. Speed, pitch and speaker are accepted
//! and ignored; the configured voice is always used.

use super::{EngineKind, SpeechEngine};
use crate::audio::wav::decode_wav_bytes;
use crate::audio::AudioBuffer;
use crate::language::Language;
use crate::request::SynthesisRequest;
use crate::{Result, TtsError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub base_url: String, // e.g., https://api.openai.com/v1
    pub model: String,    // e.g., tts-1
    pub voice: String,    // e.g., alloy
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("OPENAI_BASE_URL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: std::env::var("OPENAI_TTS_MODEL")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "tts-1".to_string()),
            voice: std::env::var("OPENAI_TTS_VOICE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "alloy".to_string()),
            api_key: None,
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(30_000),
        }
    }
}

impl OpenAiConfig {
    /// Explicit key first, then the process environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

pub struct OpenAiEngine {
    http: Client,
    cfg: OpenAiConfig,
    default_language: Language,
}

impl OpenAiEngine {
    pub fn new(cfg: OpenAiConfig, default_language: Language) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| {
                TtsError::synthesis(EngineKind::OpenAi, format!("Failed to build HTTP client: {e}"))
            })?;
        Ok(Self {
            http,
            cfg,
            default_language,
        })
    }
}

#[async_trait]
impl SpeechEngine for OpenAiEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::OpenAi
    }

    fn default_language(&self) -> Language {
        self.default_language
    }

    async fn render(&self, request: &SynthesisRequest, language: Language) -> Result<AudioBuffer> {
        let api_key = self.cfg.resolve_api_key().ok_or_else(|| {
            TtsError::MissingCredential(
                "OpenAI TTS failed: OPENAI_API_KEY environment variable not set".to_string(),
            )
        })?;
        if request.has_prosody_hints() {
            debug!(target: "openai", "speed/pitch/speaker are not supported and will be ignored");
        }

        let url = format!("{}/audio/speech", self.cfg.base_url.trim_end_matches('/'));
        debug!(target: "openai", language = %language, "POST {}", url);

        let body = json!({
            "model": self.cfg.model,
            "voice": self.cfg.voice,
            "input": request.text,
            "response_format": "wav",
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                TtsError::synthesis(
                    EngineKind::OpenAi,
                    format!("Check your API key and network connectivity ({e})"),
                )
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            error!(target: "openai", %status, body = %text, "Speech API error");
            return Err(TtsError::synthesis(
                EngineKind::OpenAi,
                format!("status={} body={}", status, text),
            ));
        }

        let bytes = resp.bytes().await.map_err(|e| {
            TtsError::synthesis(EngineKind::OpenAi, format!("Failed to read audio: {e}"))
        })?;
        decode_wav_bytes(&bytes).map_err(|e| {
            TtsError::synthesis(EngineKind::OpenAi, format!("WAV decode failed: {e}"))
        })
    }
}
