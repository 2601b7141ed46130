use rhai::{EvalAltResult, ParseError, Position};

#[derive(thiserror::Error, Debug)]
pub enum BridgeError {
    #[error("interpreter not initialized")]
    NotInitialized,

    #[error("interpreter was shut down and cannot be started again in this process")]
    Retired,

    #[error("missing {0}")]
    MissingArgument(&'static str),

    #[error("invalid name '{0}'")]
    InvalidName(String),

    #[error("module '{name}' not found in {searched} include path(s)")]
    ModuleNotFound { name: String, searched: usize },

    #[error("constructor returned no context object")]
    EmptyContext,

    #[error("interpreter failed to start: {0}")]
    Bootstrap(String),

    /// Error text trapped from a running script.
    #[error("{0}")]
    Script(String),

    #[error("{0}")]
    Parse(String),

    #[error("failed to read config '{path}': {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl From<Box<EvalAltResult>> for BridgeError {
    fn from(err: Box<EvalAltResult>) -> Self {
        BridgeError::Script(script_error_text(&err))
    }
}

impl From<ParseError> for BridgeError {
    fn from(err: ParseError) -> Self {
        BridgeError::Parse(err.to_string())
    }
}

/// Readable text for a trapped script error.
///
/// A `throw`n value is reported as itself, followed by where it was thrown;
/// errors raised inside nested function calls are unwrapped to the innermost
/// cause.
pub fn script_error_text(err: &EvalAltResult) -> String {
    match err {
        EvalAltResult::ErrorInFunctionCall(_, _, inner, _) => script_error_text(inner),
        EvalAltResult::ErrorRuntime(value, pos) => with_position(value.to_string(), *pos),
        other => other.to_string(),
    }
}

fn with_position(text: String, pos: Position) -> String {
    if pos.is_none() {
        text
    } else {
        format!("{} ({})", text, pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhai::Engine;

    #[test]
    fn thrown_value_is_reported_verbatim() {
        let engine = Engine::new();
        let err = engine.run("throw \"oops at line 3\";").unwrap_err();
        let text = script_error_text(&err);
        assert!(text.starts_with("oops at line 3"), "{text}");
    }

    #[test]
    fn nested_call_errors_are_unwrapped() {
        let engine = Engine::new();
        let err = engine
            .run("fn inner() { throw \"deep\"; } fn outer() { inner() } outer();")
            .unwrap_err();
        let text = script_error_text(&err);
        assert!(text.starts_with("deep"), "{text}");
    }

    #[test]
    fn other_errors_use_engine_message() {
        let engine = Engine::new();
        let err = engine.run("no_such_function(1)").unwrap_err();
        assert!(script_error_text(&err).contains("no_such_function"));
    }
}
