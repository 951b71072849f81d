//! 16-bit PCM mono WAV export.

use crate::utils::{check_written, ensure_parent_dir};
use std::path::{Path, PathBuf};
use tracing::info;
use tts_mini_core::audio::validate_audio;
use tts_mini_core::audio::wav::write_pcm16;
use tts_mini_core::{Result, TtsError};

/// Write `samples` as a WAV file, creating parent directories as needed.
/// Samples outside [-1, 1] saturate.
pub fn write_lossless(
    samples: &[f32],
    sample_rate: u32,
    path: impl AsRef<Path>,
) -> Result<PathBuf> {
    validate_audio(samples, sample_rate)?;
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    write_pcm16(path, samples, sample_rate).map_err(|e| {
        TtsError::IoFailure(format!("Failed to write WAV file at {}: {e}", path.display()))
    })?;
    check_written(path, "WAV")?;

    info!(
        target: "artifacts",
        path = %path.display(),
        samples = samples.len(),
        sample_rate,
        "Wrote WAV"
    );
    Ok(path.to_path_buf())
}
