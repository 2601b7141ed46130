/*
 * Log output implementations
 *
 * - StderrOutput: default destination, shared with the host's diagnostics
 * - StdoutOutput: for hosts that capture stdout
 * - FileOutput: appends to a file, optionally flushing every line
 *
 * Records are rendered either as the classic text line or as one JSON
 * object per line.
 */

use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use crate::config::{LogConfig, LogFormat, LogLevel, LogType};

/// A single log event before rendering.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord<'a> {
    pub timestamp: &'a str,
    pub level: LogLevel,
    pub message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<&'a str>,
    pub file: &'a str,
    pub line: u32,
    pub module: &'a str,
}

impl LogRecord<'_> {
    /// `<ts> [LEVEL] [file:line] [module] message | context`
    pub fn to_text(&self) -> String {
        let level_str = self.level.as_str();
        match self.context {
            Some(ctx) => format!(
                "{} [{}] [{}:{}] [{}] {} | {}",
                self.timestamp, level_str, self.file, self.line, self.module, self.message, ctx
            ),
            None => format!(
                "{} [{}] [{}:{}] [{}] {}",
                self.timestamp, level_str, self.file, self.line, self.module, self.message
            ),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_text())
    }

    pub fn render(&self, format: LogFormat) -> String {
        match format {
            LogFormat::Text => self.to_text(),
            LogFormat::Json => self.to_json(),
        }
    }
}

pub trait LogOutput: Send + Sync {
    fn write_log(&mut self, formatted_message: &str) -> Result<(), String>;

    fn flush(&mut self) -> Result<(), String> {
        Ok(())
    }
}

pub struct StderrOutput;

impl LogOutput for StderrOutput {
    fn write_log(&mut self, formatted_message: &str) -> Result<(), String> {
        writeln!(io::stderr(), "{}", formatted_message)
            .map_err(|e| format!("Failed to write to stderr: {}", e))
    }
}

pub struct StdoutOutput;

impl LogOutput for StdoutOutput {
    fn write_log(&mut self, formatted_message: &str) -> Result<(), String> {
        writeln!(io::stdout(), "{}", formatted_message)
            .map_err(|e| format!("Failed to write to stdout: {}", e))
    }

    fn flush(&mut self) -> Result<(), String> {
        io::stdout()
            .flush()
            .map_err(|e| format!("Failed to flush stdout: {}", e))
    }
}

pub struct FileOutput {
    file: File,
    force_flush: bool,
}

impl FileOutput {
    pub fn new(file_path: &str, force_flush: bool) -> Result<Self, String> {
        // Create directory if it doesn't exist
        if let Some(parent) = Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create log directory: {}", e))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)
            .map_err(|e| format!("Failed to open log file: {}", e))?;

        Ok(FileOutput { file, force_flush })
    }
}

impl LogOutput for FileOutput {
    fn write_log(&mut self, formatted_message: &str) -> Result<(), String> {
        self.file
            .write_all(formatted_message.as_bytes())
            .and_then(|_| self.file.write_all(b"\n"))
            .map_err(|e| format!("Failed to write to log file: {}", e))?;

        if self.force_flush {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), String> {
        self.file
            .flush()
            .map_err(|e| format!("Failed to flush log file: {}", e))
    }
}

pub fn create_log_output(config: &LogConfig) -> Result<Box<dyn LogOutput>, String> {
    match config.log_type {
        LogType::Stderr => Ok(Box::new(StderrOutput)),
        LogType::Stdout => Ok(Box::new(StdoutOutput)),
        LogType::File => {
            let file_path = config
                .resolved_file_path()
                .ok_or_else(|| "File output requires 'file_path'".to_string())?;
            Ok(Box::new(FileOutput::new(&file_path, config.force_flush)?))
        }
    }
}
