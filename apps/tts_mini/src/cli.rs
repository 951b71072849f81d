//! Command-line argument parsing.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tts_mini_core::{EngineKind, Language, Result};

#[derive(Parser, Debug)]
#[command(name = "tts_mini")]
#[command(about = "Text-to-speech mini assistant: gTTS, OpenAI and Coqui behind one command", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Synthesize text and write WAV, MP3 and waveform files
    Speak(SpeakArgs),
    /// List engines usable in this environment
    Engines,
    /// Check external tools and credentials
    Preflight,
}

#[derive(Args, Debug, Clone)]
pub struct SpeakArgs {
    /// Text to speak (defaults to the language's example sentence)
    #[arg(long, short)]
    pub text: Option<String>,

    /// Primary engine: label ("gTTS (default)") or id (gtts, openai, coqui)
    #[arg(long, short, value_name = "ENGINE")]
    pub engine: Option<String>,

    /// Language: label ("English (US)", "English (UK)", "Turkish") or code (en, tr)
    #[arg(long, short, value_name = "LANGUAGE")]
    pub language: Option<String>,

    /// Speech speed multiplier, clamped to 0.5..=1.5
    #[arg(long, default_value = "1.0", allow_negative_numbers = true)]
    pub speed: f32,

    /// Pitch adjustment, clamped to -5..=5
    #[arg(long, default_value = "0.0", allow_negative_numbers = true)]
    pub pitch: f32,

    /// Second engine to run on the same text for comparison
    #[arg(long, value_name = "ENGINE")]
    pub compare: Option<String>,

    /// Directory for the generated files
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,
}

/// Accepts the UI label or the engine id. Unlike `EngineKind::from_label`,
/// an unknown name is an error here rather than a silent fallback.
pub fn parse_engine(s: &str) -> Result<EngineKind> {
    EngineKind::ALL
        .into_iter()
        .find(|k| k.label() == s.trim())
        .map(Ok)
        .unwrap_or_else(|| s.parse())
}

pub fn parse_language(s: &str) -> Result<Language> {
    s.parse()
}
