use std::fs;
use std::path::{Path, PathBuf};

use cannoli_core::logging::config_path;
use liblogger::LogConfig;
use serde::Deserialize;

use crate::error::BridgeError;

/// Contents of `app_config.toml` relevant to the bridge.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub bridge: InterpreterConfig,

    #[serde(default)]
    pub logging: Option<LogConfig>,
}

/// The `[bridge]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Directories searched by `use` and by script `import`s, in order.
    pub include_paths: Vec<PathBuf>,

    /// Handler registered at init when the host has not set one.
    pub handler: Option<String>,

    /// Context module loaded at init. An empty string selects the canonical
    /// module.
    pub cannoli_module: Option<String>,

    /// Abort a script after this many operations.
    pub max_operations: Option<u64>,

    /// Maximum function call nesting.
    pub max_call_levels: Option<usize>,

    /// Expression nesting allowed at the top level of a script.
    pub max_expr_depth: Option<usize>,

    /// Expression nesting allowed inside function bodies.
    pub max_function_expr_depth: Option<usize>,
}

impl BridgeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, BridgeError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, BridgeError> {
        let text = fs::read_to_string(path).map_err(|source| BridgeError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Read the file named by `CANNOLI_BRIDGE_CONFIG`, or `app_config.toml`
    /// if it exists. No file at the default location means defaults.
    pub fn load() -> Result<Self, BridgeError> {
        let (path, explicit) = config_path();
        let path = PathBuf::from(path);
        if !explicit && !path.exists() {
            return Ok(BridgeConfig::default());
        }
        Self::from_file(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liblogger::LogLevel;
    use std::io::Write;

    #[test]
    fn parses_both_sections() {
        let config = BridgeConfig::from_toml_str(
            r#"
            [logging]
            type = "stderr"
            threshold = "debug"

            [bridge]
            include_paths = ["/srv/app/lib", "scripts"]
            handler = "handle"
            cannoli_module = ""
            max_operations = 100000
            max_function_expr_depth = 48
            "#,
        )
        .unwrap();

        assert_eq!(
            config.bridge.include_paths,
            vec![PathBuf::from("/srv/app/lib"), PathBuf::from("scripts")]
        );
        assert_eq!(config.bridge.handler.as_deref(), Some("handle"));
        assert_eq!(config.bridge.cannoli_module.as_deref(), Some(""));
        assert_eq!(config.bridge.max_operations, Some(100_000));
        assert_eq!(config.bridge.max_call_levels, None);
        assert_eq!(config.bridge.max_expr_depth, None);
        assert_eq!(config.bridge.max_function_expr_depth, Some(48));
        assert_eq!(config.logging.map(|l| l.threshold), Some(LogLevel::Debug));
    }

    #[test]
    fn empty_document_is_all_defaults() {
        let config = BridgeConfig::from_toml_str("").unwrap();
        assert!(config.bridge.include_paths.is_empty());
        assert!(config.bridge.handler.is_none());
        assert!(config.logging.is_none());
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[bridge]\nhandler = \"from_file\"").unwrap();
        let config = BridgeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bridge.handler.as_deref(), Some("from_file"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = BridgeConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, BridgeError::ConfigRead { .. }));
    }

    #[test]
    fn bad_types_are_rejected() {
        let err = BridgeConfig::from_toml_str("[bridge]\nmax_operations = \"lots\"").unwrap_err();
        assert!(matches!(err, BridgeError::ConfigParse(_)));
    }
}
