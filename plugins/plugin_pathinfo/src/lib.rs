//! Echo library for checking how the host splits `path` and `path_info`.
//! Handles every request.

use cannoli_core::{declare_dispatch, log_info, Request, Response};
use serde::Serialize;

pub const LIBRARY_TAG: &str = "pathinfo_test";

#[derive(Serialize)]
struct Echo<'a> {
    method: &'a str,
    path: &'a str,
    path_info: &'a str,
    library: &'static str,
}

pub fn route(request: &Request) -> Response {
    let echo = Echo {
        method: &request.method,
        path: &request.path,
        path_info: &request.path_info,
        library: LIBRARY_TAG,
    };
    match serde_json::to_string(&echo) {
        Ok(body) => Response::body(body),
        Err(e) => Response::internal_error(e.to_string()),
    }
}

declare_dispatch!("plugin_pathinfo", route);

#[ctor::ctor]
fn on_load() {
    let _ = cannoli_core::logging::init_logger("plugin_pathinfo");
    log_info!("[plugin_pathinfo] loaded");
}
