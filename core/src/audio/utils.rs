//! Shared audio utilities: external tool discovery and ffmpeg decoding.

use super::buffer::AudioBuffer;
use super::wav::read_wav_file;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Resolve a binary from an env override, falling back to a PATH lookup.
pub fn get_from_env_or_path(env_key: &str, default_bin: &str) -> Option<PathBuf> {
    if let Ok(p) = std::env::var(env_key) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return Some(pb);
        }
    }
    get_from_path(default_bin)
}

pub fn get_from_path(bin: &str) -> Option<PathBuf> {
    if bin.contains(std::path::MAIN_SEPARATOR) {
        let p = PathBuf::from(bin);
        return if p.exists() { Some(p) } else { None };
    }
    if let Ok(paths) = std::env::var("PATH") {
        for dir in std::env::split_paths(&paths) {
            let candidate = dir.join(bin);
            if candidate.is_file() {
                return Some(candidate);
            }
            if cfg!(windows) {
                let exe = dir.join(format!("{bin}.exe"));
                if exe.is_file() {
                    return Some(exe);
                }
            }
        }
    }
    None
}

/// `FFMPEG_BIN` or `ffmpeg` on PATH.
pub fn find_ffmpeg() -> Option<PathBuf> {
    get_from_env_or_path("FFMPEG_BIN", "ffmpeg")
}

/// Decode a compressed payload (MP3 and friends) to mono PCM via ffmpeg.
///
/// `extension` is the container hint for the temporary input file, e.g. `"mp3"`.
/// The intermediate files live in a temp dir removed when this returns.
pub fn decode_with_ffmpeg(
    ffmpeg: &Path,
    bytes: &[u8],
    extension: &str,
) -> std::io::Result<AudioBuffer> {
    let dir = tempfile::tempdir()?;
    let input = dir.path().join(format!("input.{extension}"));
    let output = dir.path().join("decoded.wav");
    std::fs::write(&input, bytes)?;

    let mut cmd = Command::new(ffmpeg);
    cmd.args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
        .arg(&input)
        .args(["-ac", "1", "-c:a", "pcm_s16le"])
        .arg(&output);
    debug!(target: "ffmpeg", command = ?cmd, "Decoding compressed audio");

    let out = cmd.output()?;
    if !out.status.success() {
        return Err(Error::new(
            ErrorKind::Other,
            format!(
                "ffmpeg exited with {}: {}",
                out.status,
                String::from_utf8_lossy(&out.stderr).trim()
            ),
        ));
    }
    read_wav_file(&output).map_err(|e| Error::new(ErrorKind::InvalidData, e))
}
