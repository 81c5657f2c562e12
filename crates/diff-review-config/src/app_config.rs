//! Application configuration
//!
//! Configuration loaded from .diff-review.toml.

use crate::config_file::{config_file_candidates, read_first_config};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application configuration loaded from .diff-review.toml
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Lines revealed per "expand above/below" control on collapsed chunks
    #[serde(default = "default_expand_context_lines")]
    pub expand_context_lines: u32,

    /// View mode text attachments open in ("rendered" or "source")
    #[serde(default = "default_view_mode")]
    pub default_view_mode: String,

    /// Audio player settings
    #[serde(default)]
    pub audio: AudioConfig,
}

/// Audio player settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AudioConfig {
    /// Initial volume between 0.0 and 1.0
    #[serde(default = "default_volume")]
    pub volume: f64,

    /// Initial playback speed
    #[serde(default = "default_playback_speed")]
    pub playback_speed: f64,
}

fn default_expand_context_lines() -> u32 {
    20
}

fn default_view_mode() -> String {
    "rendered".to_string()
}

fn default_volume() -> f64 {
    0.5
}

fn default_playback_speed() -> f64 {
    1.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            expand_context_lines: default_expand_context_lines(),
            default_view_mode: default_view_mode(),
            audio: AudioConfig::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            volume: default_volume(),
            playback_speed: default_playback_speed(),
        }
    }
}

impl AppConfig {
    /// Load config from the default locations, or use defaults
    pub fn load() -> Self {
        Self::load_from(&config_file_candidates())
    }

    /// Load config from the first existing candidate file, or use defaults
    ///
    /// A file that fails to parse is reported and defaults are used; later
    /// candidates are not consulted.
    pub fn load_from<P: AsRef<Path>>(candidates: &[P]) -> Self {
        if let Some((path, content)) = read_first_config(candidates) {
            match Self::from_toml(&content) {
                Ok(config) => {
                    log::info!("Loaded app config from {}", path.display());
                    return config;
                }
                Err(e) => {
                    log::warn!("Failed to parse config file {}: {}", path.display(), e);
                }
            }
        }

        log::debug!("Using default app config");
        Self::default()
    }

    /// Parse a config from TOML text
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
