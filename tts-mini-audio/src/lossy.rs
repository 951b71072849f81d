//! MP3 export through ffmpeg.
//!
//! Needs both the `mp3` cargo feature and an ffmpeg binary (`FFMPEG_BIN` or
//! PATH). When either is missing the writer fails with `FeatureUnavailable`
//! before touching the output path; callers are expected to treat that as a
//! notice, not an error.

use crate::utils::{check_written, ensure_parent_dir};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};
use tts_mini_core::audio::utils::find_ffmpeg;
use tts_mini_core::audio::validate_audio;
use tts_mini_core::audio::wav::write_pcm16;
use tts_mini_core::{Result, TtsError};

#[derive(Clone, Debug)]
pub struct LossyEncoder {
    pub ffmpeg_bin: Option<PathBuf>,
    /// Where the intermediate WAV lives during conversion.
    pub temp_dir: PathBuf,
}

impl Default for LossyEncoder {
    fn default() -> Self {
        Self {
            ffmpeg_bin: find_ffmpeg(),
            temp_dir: std::env::var("TTS_TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| std::env::temp_dir()),
        }
    }
}

impl LossyEncoder {
    pub fn is_available(&self) -> bool {
        self.encoder().is_ok()
    }

    fn encoder(&self) -> Result<&Path> {
        if !cfg!(feature = "mp3") {
            return Err(TtsError::FeatureUnavailable(
                "MP3 export not available: built without the `mp3` feature. Use WAV instead"
                    .to_string(),
            ));
        }
        self.ffmpeg_bin.as_deref().ok_or_else(|| {
            TtsError::FeatureUnavailable(
                "MP3 export not available: ffmpeg not found. Install ffmpeg or set FFMPEG_BIN"
                    .to_string(),
            )
        })
    }

    pub fn encode(
        &self,
        samples: &[f32],
        sample_rate: u32,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        validate_audio(samples, sample_rate)?;
        let ffmpeg = self.encoder()?;
        let path = path.as_ref();
        ensure_parent_dir(path)?;

        // Removed when dropped, on every return path.
        let intermediate = tempfile::Builder::new()
            .prefix("tts_mini_")
            .suffix(".wav")
            .tempfile_in(&self.temp_dir)
            .map_err(|e| TtsError::IoFailure(format!("Failed to create temp file: {e}")))?;
        write_pcm16(intermediate.path(), samples, sample_rate).map_err(|e| {
            TtsError::IoFailure(format!("Failed to write intermediate WAV: {e}"))
        })?;

        let mut cmd = Command::new(ffmpeg);
        cmd.args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(intermediate.path())
            .args(["-codec:a", "libmp3lame"])
            .arg(path);
        debug!(target: "artifacts", command = ?cmd, "Encoding MP3");

        let output = cmd.output().map_err(|e| {
            TtsError::IoFailure(format!("Failed to run {}: {e}", ffmpeg.display()))
        })?;
        if !output.status.success() {
            let _ = std::fs::remove_file(path);
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(target: "artifacts", status = %output.status, stderr = %stderr.trim(), "MP3 encode failed");
            return Err(TtsError::IoFailure(format!(
                "Failed to write MP3 file at {}: ffmpeg exited with {}: {}",
                path.display(),
                output.status,
                stderr.trim()
            )));
        }
        check_written(path, "MP3")?;

        info!(target: "artifacts", path = %path.display(), "Wrote MP3");
        Ok(path.to_path_buf())
    }
}

/// Encode with the environment's ffmpeg.
pub fn write_lossy(samples: &[f32], sample_rate: u32, path: impl AsRef<Path>) -> Result<PathBuf> {
    LossyEncoder::default().encode(samples, sample_rate, path)
}
