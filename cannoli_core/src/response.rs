use std::fmt;
use std::os::raw::c_char;

use crate::c_string::into_owned_c_string;

/// Prefix of the error sentinel understood by the host.
pub const STATUS_PREFIX: &str = "STATUS:";

/// Outcome of one dispatch.
///
/// Only the C boundary flattens this to a string; everything on the Rust
/// side passes the tagged form around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Not handled here; the host moves on to the next library.
    Abstain,
    /// Response body, handed to the host verbatim.
    Body(String),
    /// Status sentinel, `STATUS:<code>:<message>` on the wire.
    Status { code: u16, message: String },
}

impl Response {
    /// A body response. An empty body abstains.
    pub fn body(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            Response::Abstain
        } else {
            Response::Body(text)
        }
    }

    pub fn status(code: u16, message: impl Into<String>) -> Self {
        Response::Status {
            code,
            message: message.into(),
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::status(500, message)
    }

    pub fn is_abstain(&self) -> bool {
        matches!(self, Response::Abstain)
    }

    /// Flatten to the host's string protocol.
    pub fn to_wire(&self) -> String {
        self.to_string()
    }

    /// Recognize the host string protocol. The sentinel is only recognized
    /// when the code is numeric; anything else is a body.
    pub fn from_wire(wire: &str) -> Self {
        if let Some(rest) = wire.strip_prefix(STATUS_PREFIX) {
            if let Some((code, message)) = rest.split_once(':') {
                if let Ok(code) = code.parse::<u16>() {
                    return Response::status(code, message);
                }
            }
        }
        Response::body(wire)
    }

    /// Hand the wire form to the host as a `malloc`-owned C string.
    pub fn into_c_string(self) -> *mut c_char {
        into_owned_c_string(&self.to_wire())
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Abstain => Ok(()),
            Response::Body(text) => f.write_str(text),
            Response::Status { code, message } => write!(f, "{}{}:{}", STATUS_PREFIX, code, message),
        }
    }
}

impl From<String> for Response {
    fn from(text: String) -> Self {
        Response::body(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_abstains() {
        assert_eq!(Response::body(""), Response::Abstain);
        assert_eq!(Response::Abstain.to_wire(), "");
    }

    #[test]
    fn status_sentinel_layout() {
        assert_eq!(
            Response::internal_error("Failed to create Cannoli object").to_wire(),
            "STATUS:500:Failed to create Cannoli object"
        );
    }

    #[test]
    fn message_may_contain_colons() {
        assert_eq!(
            Response::from_wire("STATUS:500:oops: at line 3"),
            Response::status(500, "oops: at line 3")
        );
    }

    #[test]
    fn non_numeric_status_is_a_body() {
        assert_eq!(
            Response::from_wire("STATUS:teapot:short and stout"),
            Response::Body("STATUS:teapot:short and stout".to_string())
        );
        assert_eq!(Response::from_wire("{\"ok\":true}"), Response::body("{\"ok\":true}"));
        assert!(Response::from_wire("").is_abstain());
    }
}
