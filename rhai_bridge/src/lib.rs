pub mod bridge;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod ffi;
pub mod interpreter;
pub mod registry;

pub use bridge::{bridge, Bridge, LifecycleState};
pub use config::{BridgeConfig, InterpreterConfig};
pub use context::SharedMap;
pub use error::BridgeError;
pub use interpreter::Interpreter;
pub use registry::Registry;
