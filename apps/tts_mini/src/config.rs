use std::fs;
use std::path::{Path, PathBuf};

use tts_mini_audio::LossyEncoder;
use tts_mini_core::engine::{CoquiConfig, GttsConfig, OpenAiConfig};
use tts_mini_core::{EngineConfig, EngineKind, Language};

/// Everything the command line needs: backend settings, exporters, defaults.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub engines: EngineConfig,
    pub lossy: LossyEncoder,
    pub out_dir: PathBuf,
    pub default_engine: EngineKind,
    pub default_language: Language,
}

impl Default for AppConfig {
    fn default() -> Self {
        // Component defaults already consider env vars
        Self {
            engines: EngineConfig::default(),
            lossy: LossyEncoder::default(),
            out_dir: std::env::var("TTS_MINI_OUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("tts_output")),
            default_engine: std::env::var("TTS_MINI_ENGINE")
                .map(|s| EngineKind::from_label(&s))
                .unwrap_or(EngineKind::Gtts),
            default_language: std::env::var("TTS_MINI_LANGUAGE")
                .map(|s| Language::from_label(&s))
                .unwrap_or_default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file (path via TTS_MINI_CONFIG or ./tts_mini.toml),
    /// overlaying values onto env-driven defaults.
    pub fn load() -> Self {
        let path = std::env::var("TTS_MINI_CONFIG").unwrap_or_else(|_| "tts_mini.toml".into());
        Self::load_from(Path::new(&path))
    }

    pub fn load_from(p: &Path) -> Self {
        let default = Self::default();
        if !p.exists() {
            tracing::info!(target: "tts_mini", path = %p.display(), "No TOML config found; using defaults/env");
            return default;
        }
        match fs::read_to_string(p) {
            Ok(s) => match toml::from_str::<AppToml>(&s) {
                Ok(t) => t.overlay(default),
                Err(e) => {
                    tracing::warn!(target: "tts_mini", error = %e, "Failed to parse TOML; using defaults");
                    default
                }
            },
            Err(e) => {
                tracing::warn!(target: "tts_mini", error = %e, "Failed to read TOML; using defaults");
                default
            }
        }
    }
}

// =========================
// TOML overlay definitions
// =========================

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct AppToml {
    pub out_dir: Option<PathBuf>,
    pub engine: Option<EngineKind>,
    pub language: Option<Language>,
    /// Shared by MP3 decode (gtts) and MP3 export.
    pub ffmpeg_bin: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub request_timeout_ms: Option<u64>,
    pub gtts: Option<GttsToml>,
    pub openai: Option<OpenAiToml>,
    pub coqui: Option<CoquiToml>,
}

impl AppToml {
    fn overlay(self, mut base: AppConfig) -> AppConfig {
        if let Some(x) = self.out_dir {
            base.out_dir = x;
        }
        if let Some(x) = self.engine {
            base.default_engine = x;
        }
        if let Some(x) = self.language {
            base.default_language = x;
        }
        if let Some(x) = self.ffmpeg_bin {
            base.engines.gtts.ffmpeg_bin = Some(x.clone());
            base.lossy.ffmpeg_bin = Some(x);
        }
        if let Some(x) = self.temp_dir {
            base.engines.coqui.temp_dir = x.clone();
            base.lossy.temp_dir = x;
        }
        if let Some(x) = self.request_timeout_ms {
            base.engines.gtts.request_timeout_ms = x;
            base.engines.openai.request_timeout_ms = x;
        }
        // Per-engine sections win over the shared keys above
        if let Some(g) = self.gtts {
            g.apply(&mut base.engines.gtts);
        }
        if let Some(o) = self.openai {
            o.apply(&mut base.engines.openai);
        }
        if let Some(c) = self.coqui {
            c.apply(&mut base.engines.coqui);
        }
        base
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct GttsToml {
    pub tld: Option<String>,
    pub endpoint: Option<String>,
    pub slow: Option<bool>,
    pub request_timeout_ms: Option<u64>,
}
impl GttsToml {
    fn apply(self, g: &mut GttsConfig) {
        if let Some(x) = self.tld {
            g.tld = x;
        }
        if let Some(x) = self.endpoint {
            g.endpoint = Some(x).filter(|s| !s.is_empty());
        }
        if let Some(x) = self.slow {
            g.slow = x;
        }
        if let Some(x) = self.request_timeout_ms {
            g.request_timeout_ms = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct OpenAiToml {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub voice: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_ms: Option<u64>,
}
impl OpenAiToml {
    fn apply(self, o: &mut OpenAiConfig) {
        if let Some(x) = self.base_url {
            o.base_url = x;
        }
        if let Some(x) = self.model {
            o.model = x;
        }
        if let Some(x) = self.voice {
            o.voice = x;
        }
        if let Some(x) = self.api_key {
            o.api_key = Some(x).filter(|s| !s.is_empty());
        }
        if let Some(x) = self.request_timeout_ms {
            o.request_timeout_ms = x;
        }
    }
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
struct CoquiToml {
    pub tts_bin: Option<PathBuf>,
    pub python_bin: Option<PathBuf>,
    pub model_en: Option<String>,
    pub model_tr: Option<String>,
}
impl CoquiToml {
    fn apply(self, c: &mut CoquiConfig) {
        if let Some(x) = self.tts_bin {
            c.tts_bin = Some(x);
        }
        if let Some(x) = self.python_bin {
            c.python_bin = Some(x);
        }
        if let Some(x) = self.model_en {
            c.model_en = x;
        }
        if let Some(x) = self.model_tr {
            c.model_tr = x;
        }
    }
}
