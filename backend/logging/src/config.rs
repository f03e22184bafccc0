//! Logger configuration: the flag record, its defaults, and YAML loading.

use crate::error::LogError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the directory created next to the executable by the default logger.
pub const DEFAULT_LOG_DIR_NAME: &str = "logs";

/// Which sinks are enabled and how messages are decorated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    pub persist_to_file: bool,
    pub print_to_console: bool,
    pub colorize: bool,
    /// Color the severity tag.
    pub colorize_background: bool,
    /// Color the message text.
    pub colorize_foreground: bool,
    /// Timestamp console lines and add the caller's location to file lines.
    pub include_timestamp: bool,
    pub log_directory: PathBuf,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            persist_to_file: true,
            print_to_console: true,
            colorize: true,
            colorize_background: true,
            colorize_foreground: true,
            include_timestamp: true,
            log_directory: PathBuf::from(DEFAULT_LOG_DIR_NAME),
        }
    }
}

impl LoggerConfig {
    /// All sinks and decorations on, logging into `<executable dir>/logs/`.
    pub fn beside_executable() -> Result<Self, LogError> {
        let exe = std::env::current_exe().map_err(LogError::ExecutablePath)?;
        let exe_dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self {
            log_directory: exe_dir.join(DEFAULT_LOG_DIR_NAME),
            ..Self::default()
        })
    }

    /// Console only, no color, no timestamp.
    pub fn plain_console(log_directory: impl Into<PathBuf>) -> Self {
        Self {
            persist_to_file: false,
            print_to_console: true,
            colorize: false,
            colorize_background: false,
            colorize_foreground: false,
            include_timestamp: false,
            log_directory: log_directory.into(),
        }
    }
}

/// Load a logger config from a YAML file.
///
/// Returns the default config if the file doesn't exist. A relative
/// `logDirectory` is resolved against the file's directory.
pub fn load_config(path: &Path) -> Result<LoggerConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Logger config does not exist; using defaults");
        return Ok(LoggerConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read logger config: {}", path.display()))?;

    let mut config: LoggerConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse logger config YAML at: {}", path.display()))?;

    if config.log_directory.is_relative() {
        if let Some(base) = path.parent() {
            config.log_directory = base.join(&config.log_directory);
        }
    }

    info!(path = %path.display(), "Loaded logger config");
    Ok(config)
}
