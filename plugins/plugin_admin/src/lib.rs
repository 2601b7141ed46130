//! Admin API stub library. Answers `/admin` and `/admin/*`, abstains
//! everywhere else so the host can try the next library.

use cannoli_core::{declare_dispatch, log_debug, log_info, Request, Response};
use serde::Serialize;

const ROUTE_PREFIX: &str = "/admin";

#[derive(Serialize)]
struct ServiceInfo {
    service: &'static str,
    status: &'static str,
    routes: [&'static str; 3],
}

#[derive(Serialize)]
struct User {
    id: u32,
    name: &'static str,
}

#[derive(Serialize)]
struct UserList {
    users: [User; 2],
}

#[derive(Serialize)]
struct Stats {
    requests: u64,
    errors: u64,
    uptime: u64,
}

#[derive(Serialize)]
struct RouteNotFound<'a> {
    error: &'static str,
    path: &'a str,
    path_info: &'a str,
}

fn json<T: Serialize>(value: &T) -> Response {
    match serde_json::to_string(value) {
        Ok(body) => Response::body(body),
        Err(e) => Response::internal_error(e.to_string()),
    }
}

pub fn route(request: &Request) -> Response {
    let path = request.path.as_str();
    if !path.starts_with(ROUTE_PREFIX) {
        return Response::Abstain;
    }

    let is_get = request.method == "GET";
    match path {
        "/admin" if is_get => json(&ServiceInfo {
            service: "admin",
            status: "ok",
            routes: ["/admin", "/admin/users", "/admin/stats"],
        }),
        "/admin/users" if is_get => json(&UserList {
            users: [User { id: 1, name: "admin" }, User { id: 2, name: "guest" }],
        }),
        "/admin/stats" if is_get => json(&Stats {
            requests: 100,
            errors: 0,
            uptime: 3600,
        }),
        _ if path.starts_with("/admin/") => {
            log_debug!(&format!("[plugin_admin] no route for {} {}", request.method, path));
            json(&RouteNotFound {
                error: "admin route not found",
                path,
                path_info: &request.path_info,
            })
        }
        _ => Response::Abstain,
    }
}

declare_dispatch!("plugin_admin", route);

#[ctor::ctor]
fn on_load() {
    let _ = cannoli_core::logging::init_logger("plugin_admin");
    log_info!("[plugin_admin] loaded");
}
