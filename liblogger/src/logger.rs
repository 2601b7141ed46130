/*
 * Logger implementation module
 *
 * A process-wide logger behind a OnceCell. It is usable before
 * initialization (Info and above go to stderr) so that code running inside
 * a host process never loses diagnostics, and it can be re-initialized when
 * the host reloads configuration.
 */

use chrono::Utc;
use once_cell::sync::OnceCell;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use crate::config::{LogConfig, LogLevel};
use crate::outputs::{create_log_output, LogOutput, LogRecord};

static LOGGER_INSTANCE: OnceCell<Mutex<LoggerInner>> = OnceCell::new();

struct LoggerInner {
    config: LogConfig,
    output: Option<Box<dyn LogOutput>>,
}

impl LoggerInner {
    fn new() -> Self {
        LoggerInner {
            config: LogConfig::default(),
            output: None,
        }
    }

    fn init_with_config(&mut self, config: LogConfig) -> Result<(), String> {
        let output = create_log_output(&config)?;
        if let Some(mut previous) = self.output.replace(output) {
            let _ = previous.flush();
        }
        self.config = config;
        Ok(())
    }

    fn log(&mut self, level: LogLevel, message: &str, context: Option<&str>, file: &str, line: u32, module: &str) {
        if level < self.config.threshold {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();
        let record = LogRecord {
            timestamp: &timestamp,
            level,
            message,
            context,
            file,
            line,
            module,
        };
        let formatted = record.render(self.config.format);

        match self.output {
            Some(ref mut output) => {
                if let Err(e) = output.write_log(&formatted) {
                    let _ = writeln!(io::stderr(), "Failed to write log: {}", e);
                    let _ = writeln!(io::stderr(), "{}", formatted);
                }
            }
            None => {
                let _ = writeln!(io::stderr(), "{}", formatted);
            }
        }
    }

    fn flush(&mut self) -> Result<(), String> {
        match self.output {
            Some(ref mut output) => output.flush(),
            None => Ok(()),
        }
    }
}

fn instance() -> &'static Mutex<LoggerInner> {
    LOGGER_INSTANCE.get_or_init(|| Mutex::new(LoggerInner::new()))
}

pub struct Logger;

impl Logger {
    /// Initialize the logger with default configuration file "app_config.toml"
    pub fn init() {
        if Self::init_with_config_file("app_config.toml").is_err() {
            let _ = Self::init_with_config(LogConfig::default());
        }
    }

    /// Initialize the logger with a specific configuration file
    pub fn init_with_config_file(config_path: &str) -> Result<(), String> {
        let config = LogConfig::from_file(config_path)?;
        Self::init_with_config(config)
    }

    /// Initialize (or re-initialize) the logger with a LogConfig struct
    pub fn init_with_config(config: LogConfig) -> Result<(), String> {
        let mut guard = match instance().lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.init_with_config(config)
    }

    /// Log a debug message
    pub fn debug(message: &str, context: Option<String>, file: &'static str, line: u32, module: &'static str) {
        Self::log_with_metadata(LogLevel::Debug, message, context, file, line, module)
    }

    /// Log an info message
    pub fn info(message: &str, context: Option<String>, file: &'static str, line: u32, module: &'static str) {
        Self::log_with_metadata(LogLevel::Info, message, context, file, line, module)
    }

    /// Log a warning message
    pub fn warn(message: &str, context: Option<String>, file: &'static str, line: u32, module: &'static str) {
        Self::log_with_metadata(LogLevel::Warn, message, context, file, line, module)
    }

    /// Log an error message
    pub fn error(message: &str, context: Option<String>, file: &'static str, line: u32, module: &'static str) {
        Self::log_with_metadata(LogLevel::Error, message, context, file, line, module)
    }

    /// Current minimum level.
    pub fn threshold() -> LogLevel {
        match instance().lock() {
            Ok(guard) => guard.config.threshold,
            Err(poisoned) => poisoned.into_inner().config.threshold,
        }
    }

    fn log_with_metadata(level: LogLevel, message: &str, context: Option<String>, file: &str, line: u32, module: &str) {
        // Extract just the filename from the path
        let file_name = Path::new(file)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(file);

        match instance().lock() {
            Ok(mut logger) => logger.log(level, message, context.as_deref(), file_name, line, module),
            Err(poisoned) => {
                let mut logger = poisoned.into_inner();
                logger.log(level, message, context.as_deref(), file_name, line, module);
            }
        }
    }

    /// Flush any buffered output. Safe to call more than once.
    pub fn shutdown() -> Result<(), String> {
        match LOGGER_INSTANCE.get() {
            Some(logger) => match logger.lock() {
                Ok(mut guard) => guard.flush(),
                Err(poisoned) => poisoned.into_inner().flush(),
            },
            None => Ok(()),
        }
    }
}
