// TTS Mini Core Library
// Uniform synthesis adapter over three text-to-speech backends

pub mod audio;
pub mod engine;
pub mod language;
pub mod request;

// Export core types
pub use audio::AudioBuffer;
pub use engine::{get_engine, EngineConfig, EngineKind, EngineSet, SpeechEngine};
pub use language::Language;
pub use request::SynthesisRequest;

// Error types
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TtsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Environment unsupported: {0}")]
    EnvironmentUnsupported(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Feature unavailable: {0}")]
    FeatureUnavailable(String),

    #[error("{engine} TTS failed: {cause}")]
    SynthesisFailed { engine: EngineKind, cause: String },

    #[error("IO failure: {0}")]
    IoFailure(String),
}

impl TtsError {
    pub(crate) fn synthesis(engine: EngineKind, cause: impl Into<String>) -> Self {
        TtsError::SynthesisFailed {
            engine,
            cause: cause.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TtsError>;
