//! Configuration and data directory paths
//!
//! Platform-specific locations via the `dirs` crate:
//! - Linux: `~/.config/diff-review/`, `~/.cache/diff-review/`
//! - macOS: `~/Library/Application Support/diff-review/`, `~/Library/Caches/diff-review/`
//! - Windows: `%APPDATA%\diff-review\`, `%LOCALAPPDATA%\diff-review\`

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_NAME: &str = "diff-review";

/// Get the application config directory, creating it if needed
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir)
}

/// Get the application cache directory, creating it if needed
pub fn cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Could not determine cache directory")?;
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    Ok(dir)
}

/// Directory log files are written to.
///
/// Debug builds log next to the working directory so runs are easy to
/// inspect; release builds log into the cache directory.
pub fn log_dir() -> Result<PathBuf> {
    if cfg!(debug_assertions) {
        std::env::current_dir().context("Could not determine current directory")
    } else {
        cache_dir()
    }
}
