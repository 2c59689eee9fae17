//! Atomic file write helpers.
//!
//! All persisted manifests are written with a temp-and-rename strategy so a
//! crash mid-write never leaves a file in a partially-written state: readers
//! see either the old content or the new content, never a mix.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

/// Create a directory and all of its parents if they don't exist.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Atomically write a string to a file.
///
/// The content is written to a temporary file in the target's directory and
/// then renamed over the target, which is atomic on all supported platforms
/// as long as the temp file lives on the same filesystem.
pub fn safe_write(path: &Path, content: &str) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    ensure_dir(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in {}", parent.display()))?;
    std::io::Write::write_all(&mut tmp, content.as_bytes())
        .with_context(|| format!("Failed to write temp file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
