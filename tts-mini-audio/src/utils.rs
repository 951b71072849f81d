use std::path::Path;
use tts_mini_core::{Result, TtsError};

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            TtsError::IoFailure(format!(
                "Failed to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

/// A writer only counts as successful if it left a non-empty file behind.
pub fn check_written(path: &Path, what: &str) -> Result<()> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(TtsError::IoFailure(format!(
            "Failed to write {what} file at {}",
            path.display()
        ))),
    }
}
