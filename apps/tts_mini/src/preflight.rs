//! Environment checks for the external pieces each engine and exporter needs.

use std::fmt;

use crate::config::AppConfig;
use tts_mini_core::engine::check_runtime;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warn,
    Fail,
}

#[derive(Clone, Debug)]
pub struct Check {
    pub name: &'static str,
    pub status: Status,
    pub detail: String,
}

impl Check {
    fn new(name: &'static str, status: Status, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = match self.status {
            Status::Ok => "ok  ",
            Status::Warn => "warn",
            Status::Fail => "FAIL",
        };
        write!(f, "[{mark}] {:<8} {}", self.name, self.detail)
    }
}

/// Only an unusable output directory is fatal; every engine and exporter is
/// optional on its own.
pub fn run(cfg: &AppConfig) -> Vec<Check> {
    let mut checks = Vec::new();

    checks.push(match &cfg.engines.gtts.ffmpeg_bin {
        Some(p) => Check::new("ffmpeg", Status::Ok, format!("found at {}", p.display())),
        None => Check::new(
            "ffmpeg",
            Status::Warn,
            "not found; gTTS cannot decode audio and MP3 export will be skipped (set FFMPEG_BIN)",
        ),
    });

    checks.push(if cfg.lossy.is_available() {
        Check::new("mp3", Status::Ok, "MP3 export enabled")
    } else {
        Check::new("mp3", Status::Warn, "MP3 export disabled; WAV only")
    });

    checks.push(match check_runtime(&cfg.engines.coqui) {
        Ok(version) => match &cfg.engines.coqui.tts_bin {
            Some(bin) => Check::new(
                "coqui",
                Status::Ok,
                format!("Python {version}, tts at {}", bin.display()),
            ),
            None => Check::new(
                "coqui",
                Status::Warn,
                format!("Python {version}; coqui-tts is optional (not installed)"),
            ),
        },
        Err(e) => Check::new("coqui", Status::Warn, e.to_string()),
    });

    checks.push(if cfg.engines.openai.resolve_api_key().is_some() {
        Check::new("openai", Status::Ok, "API key configured")
    } else {
        Check::new("openai", Status::Warn, "optional; OPENAI_API_KEY not set")
    });

    checks.push(match std::fs::create_dir_all(&cfg.out_dir) {
        Ok(()) => Check::new(
            "output",
            Status::Ok,
            format!("writing to {}", cfg.out_dir.display()),
        ),
        Err(e) => Check::new(
            "output",
            Status::Fail,
            format!("cannot create {}: {e}", cfg.out_dir.display()),
        ),
    });

    checks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn bare_config(out_dir: std::path::PathBuf) -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.engines.gtts.ffmpeg_bin = None;
        cfg.lossy.ffmpeg_bin = None;
        cfg.engines.coqui.python_bin = None;
        cfg.engines.coqui.tts_bin = None;
        cfg.engines.openai.api_key = None;
        cfg.out_dir = out_dir;
        cfg
    }

    #[test]
    #[serial]
    fn bare_environment_only_warns() {
        std::env::remove_var("OPENAI_API_KEY");
        let dir = tempfile::tempdir().unwrap();
        let checks = run(&bare_config(dir.path().join("out")));
        assert_eq!(checks.len(), 5);
        assert!(checks[..4].iter().all(|c| c.status == Status::Warn));
        assert_eq!(checks[4].status, Status::Ok);
        assert!(dir.path().join("out").is_dir());
    }

    #[test]
    #[serial]
    fn unusable_output_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("occupied");
        std::fs::write(&file, b"x").unwrap();
        let checks = run(&bare_config(file.join("out")));
        let output = checks.iter().find(|c| c.name == "output").unwrap();
        assert_eq!(output.status, Status::Fail);
        assert!(output.to_string().starts_with("[FAIL] output"));
    }
}
