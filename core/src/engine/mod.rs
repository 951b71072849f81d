//! Synthesis engines
//!
//! One capability (`synthesize`) behind three interchangeable backends:
//! - `gtts`:   Google Translate speech endpoint (network, MP3 decoded via ffmpeg)
//! - `openai`: OpenAI `audio/speech` (needs `OPENAI_API_KEY`, WAV response)
//! - `coqui`:  local Coqui `tts` command line (Python < 3.13, fixed 22050 Hz)
//!
//! Every backend shares request validation and reports its own failures as
//! `TtsError::SynthesisFailed`, so callers can match on one set of conditions.
//!
//! Env overrides are read by the per-backend `*Config::default()`:
//! - GTTS_TLD, GTTS_ENDPOINT
//! - OPENAI_API_KEY, OPENAI_BASE_URL, OPENAI_TTS_MODEL, OPENAI_TTS_VOICE
//! - COQUI_TTS_BIN, COQUI_PYTHON, COQUI_MODEL_EN, COQUI_MODEL_TR
//! - REQUEST_TIMEOUT_MS, TTS_TEMP_DIR, FFMPEG_BIN

mod coqui;
mod gtts;
mod openai;

pub use coqui::{
    check_runtime, parse_python_version, CoquiConfig, CoquiEngine, PythonVersion,
    COQUI_SAMPLE_RATE,
};
pub use gtts::{extract_audio, package_rpc, split_text, GttsConfig, GttsEngine, GOOGLE_TTS_MAX_CHARS};
pub use openai::{OpenAiConfig, OpenAiEngine};

use crate::audio::AudioBuffer;
use crate::language::Language;
use crate::request::SynthesisRequest;
use crate::{Result, TtsError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Serializes as the engine id; deserializes from an id or a UI label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum EngineKind {
    Gtts,
    OpenAi,
    Coqui,
}

impl EngineKind {
    pub const ALL: [EngineKind; 3] = [EngineKind::Gtts, EngineKind::OpenAi, EngineKind::Coqui];

    pub fn code(&self) -> &'static str {
        match self {
            EngineKind::Gtts => "gtts",
            EngineKind::OpenAi => "openai",
            EngineKind::Coqui => "coqui",
        }
    }

    /// Label shown to the user when picking an engine.
    pub fn label(&self) -> &'static str {
        match self {
            EngineKind::Gtts => "gTTS (default)",
            EngineKind::OpenAi => "OpenAI (API)",
            EngineKind::Coqui => "Coqui (local)",
        }
    }

    /// Map a UI label (or a bare engine code) to an engine.
    /// Total: anything unrecognized selects the primary backend.
    pub fn from_label(label: &str) -> EngineKind {
        EngineKind::ALL
            .into_iter()
            .find(|k| k.label() == label.trim())
            .or_else(|| label.parse().ok())
            .unwrap_or(EngineKind::Gtts)
    }

    /// Whether this backend can be expected to work in the current environment.
    pub fn is_available(&self, cfg: &EngineConfig) -> bool {
        match self {
            EngineKind::Gtts => true,
            EngineKind::OpenAi => cfg.openai.resolve_api_key().is_some(),
            EngineKind::Coqui => cfg.coqui.tts_bin.is_some() && check_runtime(&cfg.coqui).is_ok(),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineKind::Gtts => "gTTS",
            EngineKind::OpenAi => "OpenAI",
            EngineKind::Coqui => "Coqui",
        })
    }
}

impl FromStr for EngineKind {
    type Err = TtsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gtts" => Ok(EngineKind::Gtts),
            "openai" => Ok(EngineKind::OpenAi),
            "coqui" => Ok(EngineKind::Coqui),
            other => Err(TtsError::InvalidArgument(format!(
                "Unknown engine: {}. Supported: [\"gtts\", \"openai\", \"coqui\"]",
                other
            ))),
        }
    }
}

impl TryFrom<String> for EngineKind {
    type Error = TtsError;

    fn try_from(s: String) -> Result<Self> {
        EngineKind::ALL
            .into_iter()
            .find(|k| k.label() == s.trim())
            .map_or_else(|| s.parse(), Ok)
    }
}

/// Construction settings for all backends.
#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    pub gtts: GttsConfig,
    pub openai: OpenAiConfig,
    pub coqui: CoquiConfig,
}

#[async_trait]
pub trait SpeechEngine: Send + Sync {
    fn kind(&self) -> EngineKind;

    fn default_language(&self) -> Language;

    /// Backend-specific synthesis. Called only with validated requests.
    async fn render(&self, request: &SynthesisRequest, language: Language)
        -> Result<AudioBuffer>;

    /// Validate, synthesize, and clamp the result into [-1, 1].
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioBuffer> {
        request.validate()?;
        let language = request.language.unwrap_or_else(|| self.default_language());
        let mut audio = self.render(request, language).await?;
        if audio.is_empty() || audio.sample_rate == 0 {
            return Err(TtsError::synthesis(
                self.kind(),
                "backend returned no audio",
            ));
        }
        audio.clamp();
        debug!(
            target: "tts",
            engine = %self.kind(),
            samples = audio.len(),
            sample_rate = audio.sample_rate,
            "Synthesis complete"
        );
        Ok(audio)
    }
}

/// Build one engine from explicit configuration.
pub fn build_engine(
    kind: EngineKind,
    default_language: Language,
    cfg: &EngineConfig,
) -> Result<Arc<dyn SpeechEngine>> {
    info!(target: "tts", engine = %kind, language = %default_language, "Constructing engine");
    Ok(match kind {
        EngineKind::Gtts => Arc::new(GttsEngine::new(cfg.gtts.clone(), default_language)?),
        EngineKind::OpenAi => Arc::new(OpenAiEngine::new(cfg.openai.clone(), default_language)?),
        EngineKind::Coqui => Arc::new(CoquiEngine::new(cfg.coqui.clone(), default_language)?),
    })
}

/// Factory keyed on an engine id (`gtts`, `openai`, `coqui`), configured from env.
pub fn get_engine(engine_id: &str, default_language: Language) -> Result<Arc<dyn SpeechEngine>> {
    let kind: EngineKind = engine_id.parse()?;
    build_engine(kind, default_language, &EngineConfig::default())
}

/// Caller-owned set of constructed engines. Each backend is built on first
/// use and reused afterwards.
pub struct EngineSet {
    config: EngineConfig,
    default_language: Language,
    engines: HashMap<EngineKind, Arc<dyn SpeechEngine>>,
}

impl EngineSet {
    pub fn new(config: EngineConfig, default_language: Language) -> Self {
        Self {
            config,
            default_language,
            engines: HashMap::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Return the cached engine for `kind`, constructing it if needed.
    /// Construction failures are not cached.
    pub fn get(&mut self, kind: EngineKind) -> Result<Arc<dyn SpeechEngine>> {
        if let Some(engine) = self.engines.get(&kind) {
            return Ok(Arc::clone(engine));
        }
        let engine = build_engine(kind, self.default_language, &self.config)?;
        self.engines.insert(kind, Arc::clone(&engine));
        Ok(engine)
    }

    /// Register a pre-built engine, replacing any cached one of the same kind.
    pub fn insert(&mut self, engine: Arc<dyn SpeechEngine>) {
        self.engines.insert(engine.kind(), engine);
    }

    pub fn is_cached(&self, kind: EngineKind) -> bool {
        self.engines.contains_key(&kind)
    }

    /// Engines usable in this environment, in display order.
    pub fn available(&self) -> Vec<EngineKind> {
        EngineKind::ALL
            .into_iter()
            .filter(|k| self.engines.contains_key(k) || k.is_available(&self.config))
            .collect()
    }
}
