//! Coqui TTS backend, driven through the toolkit's `tts` command line.
//!
//! The toolkit does not run on Python 3.13+, so construction probes the
//! interpreter once and refuses early. Models are fetched by the toolkit on
//! first use per language. The output is reported at 22050 Hz, which is what
//! the default models produce; other models may differ and are not corrected.

use super::{EngineKind, SpeechEngine};
use crate::audio::utils::{get_from_env_or_path, get_from_path};
use crate::audio::wav::read_wav_file;
use crate::audio::AudioBuffer;
use crate::language::Language;
use crate::request::SynthesisRequest;
use crate::{Result, TtsError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use tracing::{debug, info};

/// Assumed output rate for every model.
pub const COQUI_SAMPLE_RATE: u32 = 22_050;

/// First interpreter release the toolkit does not support.
const UNSUPPORTED_PYTHON: (u32, u32) = (3, 13);

#[derive(Clone, Debug)]
pub struct CoquiConfig {
    pub tts_bin: Option<PathBuf>,
    pub python_bin: Option<PathBuf>,
    /// Where the per-call output WAV is written before it is read back.
    pub temp_dir: PathBuf,
    pub model_en: String,
    pub model_tr: String,
}

impl Default for CoquiConfig {
    fn default() -> Self {
        Self {
            tts_bin: get_from_env_or_path("COQUI_TTS_BIN", "tts"),
            python_bin: get_from_env_or_path("COQUI_PYTHON", "python3")
                .or_else(|| get_from_path("python")),
            temp_dir: std::env::var("TTS_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
            model_en: std::env::var("COQUI_MODEL_EN")
                .unwrap_or_else(|_| "tts_models/en/ljspeech/tacotron2-DDC".to_string()),
            model_tr: std::env::var("COQUI_MODEL_TR")
                .unwrap_or_else(|_| "tts_models/tr/common-voice/glow-tts".to_string()),
        }
    }
}

impl CoquiConfig {
    pub fn model_for(&self, language: Language) -> &str {
        match language {
            Language::En => &self.model_en,
            Language::Tr => &self.model_tr,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PythonVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PythonVersion {
    pub fn is_supported(&self) -> bool {
        (self.major, self.minor) < UNSUPPORTED_PYTHON
    }
}

impl fmt::Display for PythonVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Parse `python --version` output, e.g. `Python 3.12.4` or `Python 3.13.0rc1`.
pub fn parse_python_version(output: &str) -> Option<PythonVersion> {
    let version = output.trim().strip_prefix("Python")?.trim();
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts
        .next()
        .map(|p| {
            p.chars()
                .take_while(char::is_ascii_digit)
                .collect::<String>()
        })
        .and_then(|p| p.parse().ok())
        .unwrap_or(0);
    Some(PythonVersion {
        major,
        minor,
        patch,
    })
}

fn probe_python(python: &Path) -> Result<PythonVersion> {
    let out = Command::new(python).arg("--version").output().map_err(|e| {
        TtsError::EnvironmentUnsupported(format!(
            "Coqui TTS failed: could not run {}: {e}",
            python.display()
        ))
    })?;
    // Older interpreters print the version on stderr.
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    parse_python_version(&text).ok_or_else(|| {
        TtsError::EnvironmentUnsupported(format!(
            "Coqui TTS failed: unrecognized Python version output: {}",
            text.trim()
        ))
    })
}

/// The runtime precondition for this backend.
pub fn check_runtime(cfg: &CoquiConfig) -> Result<PythonVersion> {
    let python = cfg.python_bin.as_deref().ok_or_else(|| {
        TtsError::EnvironmentUnsupported(
            "Coqui TTS failed: no Python runtime found. Set COQUI_PYTHON".to_string(),
        )
    })?;
    let version = probe_python(python)?;
    if !version.is_supported() {
        return Err(TtsError::EnvironmentUnsupported(format!(
            "Coqui TTS failed: Not supported on Python {}.{}+ (found {}). Use gTTS or OpenAI engines instead",
            UNSUPPORTED_PYTHON.0, UNSUPPORTED_PYTHON.1, version
        )));
    }
    Ok(version)
}

pub struct CoquiEngine {
    cfg: CoquiConfig,
    tts_bin: PathBuf,
    default_language: Language,
    /// Languages whose model the toolkit has already fetched.
    prepared: Mutex<HashSet<Language>>,
}

impl CoquiEngine {
    pub fn new(cfg: CoquiConfig, default_language: Language) -> Result<Self> {
        let python = check_runtime(&cfg)?;
        let tts_bin = cfg.tts_bin.clone().ok_or_else(|| {
            TtsError::synthesis(
                EngineKind::Coqui,
                "Not available. Install with: pip install coqui-tts (or set COQUI_TTS_BIN)",
            )
        })?;
        info!(target: "coqui", bin = ?tts_bin, python = %python, "Detected Coqui toolkit");
        Ok(Self {
            cfg,
            tts_bin,
            default_language,
            prepared: Mutex::new(HashSet::new()),
        })
    }

    pub fn is_prepared(&self, language: Language) -> bool {
        self.prepared
            .lock()
            .map(|p| p.contains(&language))
            .unwrap_or(false)
    }

    fn mark_prepared(&self, language: Language) {
        if let Ok(mut p) = self.prepared.lock() {
            p.insert(language);
        }
    }
}

#[async_trait]
impl SpeechEngine for CoquiEngine {
    fn kind(&self) -> EngineKind {
        EngineKind::Coqui
    }

    fn default_language(&self) -> Language {
        self.default_language
    }

    async fn render(&self, request: &SynthesisRequest, language: Language) -> Result<AudioBuffer> {
        let model = self.cfg.model_for(language).to_string();
        if !self.is_prepared(language) {
            info!(target: "coqui", model = %model, "First use of model; the toolkit may download it");
        }
        if request.speed.is_some() || request.pitch.is_some() {
            debug!(target: "coqui", "speed/pitch are not supported by the CLI and will be ignored");
        }

        let out_file = tempfile::Builder::new()
            .prefix("coqui_")
            .suffix(".wav")
            .tempfile_in(&self.cfg.temp_dir)
            .map_err(|e| {
                TtsError::synthesis(EngineKind::Coqui, format!("Failed to create temp file: {e}"))
            })?;
        let out_path = out_file.path().to_path_buf();

        let mut cmd = Command::new(&self.tts_bin);
        cmd.arg("--text").arg(&request.text);
        cmd.arg("--model_name").arg(&model);
        cmd.arg("--out_path").arg(&out_path);
        if let Some(speaker) = request.speaker.as_deref().filter(|s| !s.is_empty()) {
            cmd.arg("--speaker_idx").arg(speaker);
        }
        debug!(target: "coqui", command = ?cmd, "Running tts");

        let mut audio = tokio::task::spawn_blocking(move || -> std::result::Result<AudioBuffer, String> {
            let output = cmd.output().map_err(|e| e.to_string())?;
            if !output.status.success() {
                return Err(format!(
                    "tts exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ));
            }
            read_wav_file(&out_path).map_err(|e| format!("WAV decode failed: {e}"))
        })
        .await
        .map_err(|e| TtsError::synthesis(EngineKind::Coqui, e.to_string()))?
        .map_err(|e| TtsError::synthesis(EngineKind::Coqui, e))?;
        drop(out_file);

        self.mark_prepared(language);

        audio.peak_normalize();
        audio.sample_rate = COQUI_SAMPLE_RATE;
        Ok(audio)
    }
}
