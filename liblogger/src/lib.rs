/*
 * Main library entry point that exposes the public API
 *
 * This file defines the public interface for the logging library:
 * - Re-exporting the Logger struct for initialization and shutdown
 * - Re-exporting LogConfig and its enums for custom configuration
 * - Defining logging macros (log_debug, log_info, log_warn, log_error)
 *
 * The macros capture file, line and module information automatically.
 * They are safe to call from inside `extern "C"` entry points: a logger
 * that was never initialized writes to stderr.
 */

mod config;
mod logger;
mod outputs;

pub use config::{LogConfig, LogFormat, LogLevel, LogType};
pub use logger::Logger;
pub use outputs::LogRecord;

#[cfg(feature = "proc_macros")]
pub use liblogger_macros::{catch_panic, measure_time};

#[macro_export]
macro_rules! log_debug {
    ($message:expr) => {
        $crate::Logger::debug($message, None, file!(), line!(), module_path!())
    };
    ($message:expr, $context:expr) => {
        $crate::Logger::debug($message, $context, file!(), line!(), module_path!())
    };
}

#[macro_export]
macro_rules! log_info {
    ($message:expr) => {
        $crate::Logger::info($message, None, file!(), line!(), module_path!())
    };
    ($message:expr, $context:expr) => {
        $crate::Logger::info($message, $context, file!(), line!(), module_path!())
    };
}

#[macro_export]
macro_rules! log_warn {
    ($message:expr) => {
        $crate::Logger::warn($message, None, file!(), line!(), module_path!())
    };
    ($message:expr, $context:expr) => {
        $crate::Logger::warn($message, $context, file!(), line!(), module_path!())
    };
}

#[macro_export]
macro_rules! log_error {
    ($message:expr) => {
        $crate::Logger::error($message, None, file!(), line!(), module_path!())
    };
    ($message:expr, $context:expr) => {
        $crate::Logger::error($message, $context, file!(), line!(), module_path!())
    };
}
