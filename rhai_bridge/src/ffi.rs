//! C entry points.
//!
//! Every returned `char*` is allocated with `malloc` and belongs to the
//! caller (`free` or `rhai_bridge_free`). The one exception is
//! `rhai_bridge_get_handler`, which lends out the registry's copy.

use std::ffi::CStr;
use std::os::raw::{c_char, c_int};
use std::ptr;

use cannoli_core::c_string::{free_c_string, into_owned_c_string};
use cannoli_core::{install_accessor, HostRequest, HostValue, Request, Response, StringifyFn};
use liblogger_macros::{catch_panic, measure_time};

use crate::bridge::bridge;
use crate::error::BridgeError;

fn flag(result: Result<(), BridgeError>) -> c_int {
    result.is_ok() as c_int
}

fn text(value: HostValue) -> String {
    value.project().unwrap_or_default()
}

fn panic_response() -> *mut c_char {
    Response::internal_error("rhai_bridge panicked").into_c_string()
}

/// Dispatch one request to the registered handler.
///
/// # Safety
/// Every argument must be NULL or a live host value for the duration of the call.
#[catch_panic(fallback = panic_response())]
#[measure_time]
#[no_mangle]
pub unsafe extern "C" fn cannoli_dispatch(
    method: HostValue,
    path: HostValue,
    path_info: HostValue,
    query_string: HostValue,
    body: HostValue,
    headers: HostValue,
    remote_addr: HostValue,
    content_type: HostValue,
) -> *mut c_char {
    let request = Request::from_host(&HostRequest {
        method,
        path,
        path_info,
        query_string,
        body,
        headers,
        remote_addr,
        content_type,
    });
    bridge().dispatch(&request).into_c_string()
}

/// Like `cannoli_dispatch`, but calls `sub_name` instead of the registered handler.
///
/// # Safety
/// Same contract as [`cannoli_dispatch`].
#[catch_panic(fallback = panic_response())]
#[no_mangle]
pub unsafe extern "C" fn rhai_bridge_call_handler(
    sub_name: HostValue,
    method: HostValue,
    path: HostValue,
    path_info: HostValue,
    query_string: HostValue,
    body: HostValue,
    headers: HostValue,
    remote_addr: HostValue,
    content_type: HostValue,
) -> *mut c_char {
    let request = Request::from_host(&HostRequest {
        method,
        path,
        path_info,
        query_string,
        body,
        headers,
        remote_addr,
        content_type,
    });
    bridge().call_handler(&text(sub_name), &request).into_c_string()
}

/// Call `sub_name(a1, a2, a3, a4)` with string arguments.
///
/// # Safety
/// Every argument must be NULL or a live host value.
#[catch_panic(fallback = panic_response())]
#[no_mangle]
pub unsafe extern "C" fn rhai_bridge_call4(
    sub_name: HostValue,
    a1: HostValue,
    a2: HostValue,
    a3: HostValue,
    a4: HostValue,
) -> *mut c_char {
    let args = [text(a1), text(a2), text(a3), text(a4)];
    bridge().call_positional(&text(sub_name), args).into_c_string()
}

/// Install the value accessor explicitly. Without this, `strada_to_str` is
/// looked up in the running process on first use.
#[catch_panic]
#[no_mangle]
pub extern "C" fn rhai_bridge_set_accessor(accessor: Option<StringifyFn>) -> c_int {
    match accessor {
        Some(accessor) => install_accessor(accessor) as c_int,
        None => 0,
    }
}

#[catch_panic]
#[no_mangle]
pub extern "C" fn rhai_bridge_init(_unused: *const c_char) -> c_int {
    flag(bridge().init())
}

#[catch_panic]
#[no_mangle]
pub extern "C" fn rhai_bridge_is_init() -> c_int {
    bridge().is_initialized() as c_int
}

#[catch_panic]
#[no_mangle]
pub extern "C" fn rhai_bridge_shutdown() {
    bridge().shutdown()
}

/// # Safety
/// `path` must be NULL or a live host value.
#[catch_panic]
#[no_mangle]
pub unsafe extern "C" fn rhai_bridge_add_inc(path: HostValue) -> c_int {
    flag(bridge().add_include_path(&text(path)))
}

/// # Safety
/// `module` must be NULL or a live host value.
#[catch_panic]
#[no_mangle]
pub unsafe extern "C" fn rhai_bridge_use(module: HostValue) -> c_int {
    flag(bridge().use_module(&text(module)))
}

/// # Safety
/// `file` must be NULL or a live host value.
#[catch_panic]
#[no_mangle]
pub unsafe extern "C" fn rhai_bridge_do(file: HostValue) -> c_int {
    flag(bridge().do_file(&text(file)))
}

/// # Safety
/// `path` must be NULL or a live host value.
#[catch_panic]
#[no_mangle]
pub unsafe extern "C" fn rhai_bridge_load_cannoli(path: HostValue) -> c_int {
    flag(bridge().load_cannoli(&text(path)))
}

/// # Safety
/// `name` must be NULL or a live host value.
#[catch_panic]
#[no_mangle]
pub unsafe extern "C" fn rhai_bridge_set_handler(name: HostValue) {
    bridge().registry_mut().set_handler(name.project().as_deref())
}

/// # Safety
/// `path` must be NULL or a live host value.
#[catch_panic]
#[no_mangle]
pub unsafe extern "C" fn rhai_bridge_set_cannoli_path(path: HostValue) {
    bridge().registry_mut().set_module_path(path.project().as_deref())
}

/// Borrowed handler name, NULL when unset. Valid until the next
/// `rhai_bridge_set_handler` or `rhai_bridge_shutdown`.
#[catch_panic(fallback = ptr::null())]
#[no_mangle]
pub extern "C" fn rhai_bridge_get_handler() -> *const c_char {
    bridge().registry().handler_ptr()
}

/// Evaluate a snippet. Returns the rendered value or `ERROR:<message>`.
///
/// # Safety
/// `code` must be NULL or a NUL-terminated string.
#[catch_panic(fallback = panic_response())]
#[no_mangle]
pub unsafe extern "C" fn rhai_bridge_eval(code: *const c_char) -> *mut c_char {
    if code.is_null() {
        return into_owned_c_string("");
    }
    let code = CStr::from_ptr(code).to_string_lossy();
    into_owned_c_string(&bridge().eval(&code))
}

/// Message of the last failed operation, or an empty string.
#[catch_panic(fallback = panic_response())]
#[no_mangle]
pub extern "C" fn rhai_bridge_get_error() -> *mut c_char {
    into_owned_c_string(&bridge().last_error())
}

/// Release a string returned by this library.
///
/// # Safety
/// `ptr` must be NULL or a string returned by this library, not yet freed.
#[no_mangle]
pub unsafe extern "C" fn rhai_bridge_free(ptr: *mut c_char) {
    free_c_string(ptr)
}
