/*
 * Configuration management for the logger
 *
 * Parses the [logging] section of app_config.toml (or a bare table with the
 * same keys). Enum values are matched case-insensitively so hand-written
 * configs like `type = "File"` and `threshold = "WARNING"` are accepted.
 */

use serde::{Deserialize, Serialize};
use std::fs;

/// Log severity levels, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

// Separate implementation of Deserialize to handle case-insensitive values
impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(serde::de::Error::unknown_variant(
                &s,
                &["debug", "info", "warn", "warning", "error"],
            )),
        }
    }
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogType {
    Stderr,
    Stdout,
    File,
}

impl<'de> Deserialize<'de> for LogType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "stderr" | "console" => Ok(LogType::Stderr),
            "stdout" => Ok(LogType::Stdout),
            "file" => Ok(LogType::File),
            _ => Err(serde::de::Error::unknown_variant(
                &s,
                &["stderr", "console", "stdout", "file"],
            )),
        }
    }
}

/// Line layout of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogFormat {
    Text,
    Json,
}

impl<'de> Deserialize<'de> for LogFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(serde::de::Error::unknown_variant(&s, &["text", "plain", "json"])),
        }
    }
}

/// Configuration for the logger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Type of output (stderr, stdout, file)
    #[serde(rename = "type", default = "default_log_type")]
    pub log_type: LogType,

    /// Minimum log level to record
    #[serde(default = "default_threshold")]
    pub threshold: LogLevel,

    /// Text or JSON lines
    #[serde(default = "default_format")]
    pub format: LogFormat,

    /// File path for file-based logging
    #[serde(default)]
    pub file_path: Option<String>,

    /// Folder for log files, joined with `file_path` when both are set
    #[serde(default)]
    pub log_folder: Option<String>,

    /// Whether to flush after every write (default: false)
    #[serde(default)]
    pub force_flush: bool,
}

fn default_log_type() -> LogType {
    LogType::Stderr
}

fn default_threshold() -> LogLevel {
    LogLevel::Info
}

fn default_format() -> LogFormat {
    LogFormat::Text
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            log_type: default_log_type(),
            threshold: default_threshold(),
            format: default_format(),
            file_path: None,
            log_folder: None,
            force_flush: false,
        }
    }
}

impl LogConfig {
    /// Create configuration from a TOML file
    pub fn from_file(file_path: &str) -> Result<Self, String> {
        let config_str = fs::read_to_string(file_path)
            .map_err(|e| format!("Could not read config file '{}': {}", file_path, e))?;
        Self::from_toml_str(&config_str)
    }

    /// Parse either a document with a `[logging]` table or a bare logging table.
    pub fn from_toml_str(config_str: &str) -> Result<Self, String> {
        let mut document: toml::Table = toml::from_str(config_str)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;
        let section = match document.remove("logging") {
            Some(section) => section,
            None => toml::Value::Table(document),
        };
        section
            .try_into::<LogConfig>()
            .map_err(|e| format!("Failed to parse config file: {}", e))
    }

    /// Resolved path of the log file, if file output is configured.
    pub fn resolved_file_path(&self) -> Option<String> {
        let file = self.file_path.as_deref()?;
        match self.log_folder.as_deref() {
            Some(folder) if !folder.is_empty() => Some(
                std::path::Path::new(folder)
                    .join(file)
                    .to_string_lossy()
                    .into_owned(),
            ),
            _ => Some(file.to_string()),
        }
    }
}
