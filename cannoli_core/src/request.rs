use crate::headers::HeaderMap;
use crate::host_value::HostValue;

pub const DEFAULT_METHOD: &str = "GET";
pub const DEFAULT_PATH: &str = "/";

/// The eight host handles that make up one dispatch call, in ABI order.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostRequest {
    pub method: HostValue,
    pub path: HostValue,
    pub path_info: HostValue,
    pub query_string: HostValue,
    pub body: HostValue,
    pub headers: HostValue,
    pub remote_addr: HostValue,
    pub content_type: HostValue,
}

/// Owned projection of a host request.
///
/// Projection happens once, up front, so nothing borrowed from the host
/// outlives the dispatch call that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub path_info: String,
    pub query_string: String,
    pub body: String,
    pub headers: HeaderMap,
    pub remote_addr: String,
    pub content_type: String,
}

impl Default for Request {
    fn default() -> Self {
        Request {
            method: DEFAULT_METHOD.to_string(),
            path: DEFAULT_PATH.to_string(),
            path_info: String::new(),
            query_string: String::new(),
            body: String::new(),
            headers: HeaderMap::new(),
            remote_addr: String::new(),
            content_type: String::new(),
        }
    }
}

impl Request {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Request {
            method: method.into(),
            path: path.into(),
            ..Request::default()
        }
    }

    pub fn with_path_info(mut self, path_info: impl Into<String>) -> Self {
        self.path_info = path_info.into();
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Copy every handle out of the host. NULL method/path fall back to
    /// `GET` and `/`; every other NULL reads as empty.
    pub fn from_host(host: &HostRequest) -> Self {
        let text = |value: HostValue| value.project().unwrap_or_default();

        Request {
            method: host.method.project().unwrap_or_else(|| DEFAULT_METHOD.to_string()),
            path: host.path.project().unwrap_or_else(|| DEFAULT_PATH.to_string()),
            path_info: text(host.path_info),
            query_string: text(host.query_string),
            body: text(host.body),
            headers: host
                .headers
                .as_c_str()
                .map(|raw| HeaderMap::parse(&raw.to_string_lossy()))
                .unwrap_or_default(),
            remote_addr: text(host.remote_addr),
            content_type: text(host.content_type),
        }
    }
}
