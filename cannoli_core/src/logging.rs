//! Logging for dispatch libraries
//!
//! Re-exports the `liblogger` macros so libraries built on cannoli_core share
//! one logging setup with the bridge.

pub use liblogger::{log_debug, log_error, log_info, log_warn, LogConfig, Logger};

/// Environment variable naming the configuration file to read.
pub const CONFIG_ENV: &str = "CANNOLI_BRIDGE_CONFIG";

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "app_config.toml";

/// Path of the configuration file: `$CANNOLI_BRIDGE_CONFIG`, else
/// `app_config.toml`. The boolean is true when it came from the environment.
pub fn config_path() -> (String, bool) {
    match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.is_empty() => (path, true),
        _ => (DEFAULT_CONFIG_FILE.to_string(), false),
    }
}

/// Initialize the logger for a dispatch library.
///
/// Reads the `[logging]` section of the configuration file. A missing
/// default file keeps stderr logging; an unreadable or invalid explicit one
/// is reported and also falls back to stderr.
pub fn init_logger(library_name: &str) -> Result<(), String> {
    let (path, explicit) = config_path();
    if !explicit && !std::path::Path::new(&path).exists() {
        return Logger::init_with_config(LogConfig::default());
    }

    match Logger::init_with_config_file(&path) {
        Ok(()) => Ok(()),
        Err(e) => {
            Logger::init_with_config(LogConfig::default())?;
            log_warn!(&format!("[{}] error initializing logger from config: {}", library_name, e));
            Ok(())
        }
    }
}
