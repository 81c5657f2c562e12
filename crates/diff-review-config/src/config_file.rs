//! Discovery of the configuration file.
//!
//! Candidates, first readable wins:
//! 1. `.diff-review.toml` in the working directory
//! 2. `.diff-review.toml` in the home directory
//! 3. `config.toml` in the platform config directory (see [`crate::config_dir`])

use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = ".diff-review.toml";
const CONFIG_DIR_FILE: &str = "config.toml";

/// Config file locations in lookup order.
pub fn config_file_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE)];

    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(CONFIG_FILE));
    }

    match crate::config_dir() {
        Ok(dir) => candidates.push(dir.join(CONFIG_DIR_FILE)),
        Err(e) => log::debug!("No config directory available: {}", e),
    }

    candidates
}

/// Read the first candidate that exists, returning its path and content.
pub fn read_first_config<P: AsRef<Path>>(candidates: &[P]) -> Option<(PathBuf, String)> {
    candidates.iter().find_map(|candidate| {
        let path = candidate.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => {
                log::debug!("Loaded config from {}", path.display());
                Some((path.to_path_buf(), content))
            }
            Err(e) => {
                log::trace!("Skipping {}: {}", path.display(), e);
                None
            }
        }
    })
}
