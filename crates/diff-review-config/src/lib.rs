//! Configuration for diff-review
//!
//! This crate provides:
//! - Configuration file discovery (TOML)
//! - Application configuration (AppConfig)
//! - Config and cache directory paths

pub mod app_config;
pub mod config_file;
pub mod paths;

pub use app_config::{AppConfig, AudioConfig};
pub use config_file::{config_file_candidates, read_first_config, CONFIG_FILE};
pub use paths::{cache_dir, config_dir, log_dir};
