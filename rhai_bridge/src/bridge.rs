//! The process-wide bridge instance.
//!
//! Every C entry point goes through [`bridge()`], which serializes access to
//! the single interpreter. The lock is not reentrant: nothing reachable from
//! a script may call back into the C ABI.

use std::sync::Once;

use cannoli_core::{Request, Response};
use liblogger::{log_info, log_warn, Logger};
use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::interpreter::Interpreter;
use crate::registry::Registry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Running,
    ShuttingDown,
}

pub struct Bridge {
    state: LifecycleState,
    // Set by the first shutdown; the interpreter is never rebuilt afterwards.
    retired: bool,
    interpreter: Option<Interpreter>,
    registry: Registry,
}

static BRIDGE: Lazy<Mutex<Bridge>> = Lazy::new(|| Mutex::new(Bridge::new()));
static EXIT_HOOK: Once = Once::new();

/// Lock the process-wide bridge.
pub fn bridge() -> MutexGuard<'static, Bridge> {
    BRIDGE.lock()
}

extern "C" fn destruct_at_exit() {
    // A thread still inside a call at exit keeps the lock; skip teardown then.
    if let Some(mut bridge) = BRIDGE.try_lock() {
        bridge.shutdown();
    }
    let _ = Logger::shutdown();
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge {
    pub fn new() -> Self {
        Bridge {
            state: LifecycleState::Uninitialized,
            retired: false,
            interpreter: None,
            registry: Registry::default(),
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == LifecycleState::Running
    }

    /// Start the interpreter using `app_config.toml` (or
    /// `$CANNOLI_BRIDGE_CONFIG`). Calling it again while running is a no-op.
    pub fn init(&mut self) -> Result<(), BridgeError> {
        if self.is_initialized() {
            return Ok(());
        }
        let config = BridgeConfig::load().unwrap_or_else(|err| {
            log_warn!(&format!("rhai_bridge: {}; using defaults", err));
            BridgeConfig::default()
        });
        self.init_with_config(&config)
    }

    pub fn init_with_config(&mut self, config: &BridgeConfig) -> Result<(), BridgeError> {
        if self.is_initialized() {
            return Ok(());
        }
        if self.retired {
            return Err(BridgeError::Retired);
        }

        if let Some(logging) = &config.logging {
            if let Err(e) = Logger::init_with_config(logging.clone()) {
                log_warn!(&format!("rhai_bridge: logger setup failed: {}", e));
            }
        }

        // On failure the half-built engine is dropped here.
        let mut interpreter = Interpreter::new(&config.bridge)?;

        if self.registry.handler().is_none() {
            self.registry.set_handler(config.bridge.handler.as_deref());
        }
        if let Some(module) = &config.bridge.cannoli_module {
            self.registry.set_module_path(Some(module));
            if let Err(err) = interpreter.load_cannoli(module) {
                log_warn!(&format!("rhai_bridge: configured context module not loaded: {}", err));
            }
        }

        self.interpreter = Some(interpreter);
        self.state = LifecycleState::Running;
        EXIT_HOOK.call_once(|| unsafe {
            libc::atexit(destruct_at_exit);
        });
        log_info!("rhai_bridge: interpreter running");
        Ok(())
    }

    /// Tear down the interpreter and forget the registration.
    pub fn shutdown(&mut self) {
        self.registry.clear();
        if self.state != LifecycleState::Running {
            return;
        }
        self.state = LifecycleState::ShuttingDown;
        self.interpreter = None;
        self.retired = true;
        self.state = LifecycleState::Uninitialized;
        log_info!("rhai_bridge: interpreter shut down");
    }

    fn running(&mut self, action: &str) -> Result<&mut Interpreter, BridgeError> {
        match (self.state, self.interpreter.as_mut()) {
            (LifecycleState::Running, Some(interpreter)) => Ok(interpreter),
            _ => {
                log_warn!(&format!("rhai_bridge: {} called while not initialized", action));
                Err(BridgeError::NotInitialized)
            }
        }
    }

    pub fn interpreter(&self) -> Option<&Interpreter> {
        self.interpreter.as_ref()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn add_include_path(&mut self, dir: &str) -> Result<(), BridgeError> {
        self.running("add_inc")?.add_include_path(dir)
    }

    pub fn use_module(&mut self, name: &str) -> Result<(), BridgeError> {
        self.running("use")?.use_module(name)
    }

    pub fn do_file(&mut self, path: &str) -> Result<(), BridgeError> {
        self.running("do")?.do_file(path)
    }

    /// Load the context module and remember its path.
    pub fn load_cannoli(&mut self, path: &str) -> Result<(), BridgeError> {
        self.running("load_cannoli")?;
        self.registry.set_module_path(Some(path));
        self.running("load_cannoli")?.load_cannoli(path)
    }

    /// Dispatch to the registered handler. No handler, or no interpreter,
    /// means abstain.
    pub fn dispatch(&mut self, request: &Request) -> Response {
        let Some(handler) = self.registry.handler() else {
            return Response::Abstain;
        };
        match (self.state, self.interpreter.as_mut()) {
            (LifecycleState::Running, Some(interpreter)) => interpreter.dispatch(handler, request),
            _ => Response::Abstain,
        }
    }

    /// Dispatch to a handler named by the caller instead of the registry.
    pub fn call_handler(&mut self, handler: &str, request: &Request) -> Response {
        if handler.is_empty() {
            return Response::Abstain;
        }
        match self.running("call_handler") {
            Ok(interpreter) => interpreter.dispatch(handler, request),
            Err(_) => Response::Abstain,
        }
    }

    pub fn call_positional(&mut self, name: &str, args: [String; 4]) -> Response {
        if name.is_empty() {
            return Response::Abstain;
        }
        match self.running("call4") {
            Ok(interpreter) => interpreter.call_positional(name, args),
            Err(_) => Response::Abstain,
        }
    }

    /// Evaluate `code`; failures come back as `ERROR:<message>`.
    pub fn eval(&mut self, code: &str) -> String {
        match self.running("eval").and_then(|interpreter| interpreter.eval(code)) {
            Ok(value) => value,
            Err(err) => format!("ERROR:{}", err),
        }
    }

    /// Pending error message, empty when the last operation succeeded.
    pub fn last_error(&self) -> String {
        match (&self.state, &self.interpreter) {
            (LifecycleState::Running, Some(interpreter)) => {
                interpreter.last_error().unwrap_or_default().to_string()
            }
            _ => BridgeError::NotInitialized.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InterpreterConfig;

    fn running_bridge() -> Bridge {
        let mut bridge = Bridge::new();
        bridge.init_with_config(&BridgeConfig::default()).unwrap();
        bridge
    }

    #[test]
    fn lifecycle_transitions() {
        let mut bridge = Bridge::new();
        assert_eq!(bridge.state(), LifecycleState::Uninitialized);
        assert!(matches!(bridge.do_file("x.rhai"), Err(BridgeError::NotInitialized)));
        assert_eq!(bridge.last_error(), "interpreter not initialized");
        assert_eq!(bridge.eval("1"), "ERROR:interpreter not initialized");

        bridge.init_with_config(&BridgeConfig::default()).unwrap();
        bridge.init_with_config(&BridgeConfig::default()).unwrap();
        assert!(bridge.is_initialized());

        bridge.shutdown();
        assert_eq!(bridge.state(), LifecycleState::Uninitialized);
        assert!(bridge.interpreter().is_none());
        assert!(matches!(
            bridge.init_with_config(&BridgeConfig::default()),
            Err(BridgeError::Retired)
        ));
    }

    #[test]
    fn shutdown_clears_registration() {
        let mut bridge = running_bridge();
        bridge.registry_mut().set_handler(Some("handle"));
        bridge.load_cannoli("").unwrap();
        assert_eq!(bridge.registry().module_path(), None);

        bridge.shutdown();
        assert_eq!(bridge.registry().handler(), None);
    }

    #[test]
    fn abstains_without_handler() {
        let mut bridge = running_bridge();
        bridge.load_cannoli("").unwrap();
        assert!(bridge.dispatch(&Request::default()).is_abstain());
        assert!(bridge.call_handler("", &Request::default()).is_abstain());
    }

    #[test]
    fn abstains_when_not_running() {
        let mut bridge = Bridge::new();
        bridge.registry_mut().set_handler(Some("handle"));
        assert!(bridge.dispatch(&Request::default()).is_abstain());
    }

    #[test]
    fn configured_handler_and_module_are_applied() {
        let config = BridgeConfig {
            bridge: InterpreterConfig {
                handler: Some("handle".to_string()),
                cannoli_module: Some(String::new()),
                ..InterpreterConfig::default()
            },
            logging: None,
        };
        let mut bridge = Bridge::new();
        bridge.init_with_config(&config).unwrap();
        bridge.eval("fn handle(c) { c.write(\"configured\"); }");

        assert_eq!(bridge.registry().handler(), Some("handle"));
        assert_eq!(bridge.dispatch(&Request::default()), Response::body("configured"));
    }

    #[test]
    fn host_handler_wins_over_configured_one() {
        let config = BridgeConfig {
            bridge: InterpreterConfig {
                handler: Some("configured".to_string()),
                ..InterpreterConfig::default()
            },
            logging: None,
        };
        let mut bridge = Bridge::new();
        bridge.registry_mut().set_handler(Some("from_host"));
        bridge.init_with_config(&config).unwrap();
        assert_eq!(bridge.registry().handler(), Some("from_host"));
    }

    #[test]
    fn eval_and_error_reporting() {
        let mut bridge = running_bridge();
        assert_eq!(bridge.eval("6 * 7"), "42");
        assert_eq!(bridge.last_error(), "");

        let failed = bridge.eval("throw \"bad\"");
        assert!(failed.starts_with("ERROR:bad"), "{failed}");
        assert!(bridge.last_error().starts_with("bad"));
    }
}
