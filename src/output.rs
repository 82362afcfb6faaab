//! JSON artifact persistence.
//!
//! Artifacts are pretty-printed with two-space indentation and overwrite
//! whatever was there before.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Serializes `value` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let json = serde_json::to_string_pretty(value).context("failed to serialize artifact")?;
    fs::write(path, &json).with_context(|| format!("failed to write {}", path.display()))?;

    debug!(path = %path.display(), bytes = json.len(), "Artifact written");
    Ok(())
}
