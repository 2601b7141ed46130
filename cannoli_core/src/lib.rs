pub mod c_string;
pub mod dispatch_macros;
pub mod headers;
pub mod host_value;
pub mod logging;
pub mod request;
pub mod response;

pub use headers::HeaderMap;
pub use host_value::{install_accessor, HostValue, StradaValue, StringifyFn};
pub use logging::{log_debug, log_error, log_info, log_warn};
pub use request::{HostRequest, Request};
pub use response::Response;
