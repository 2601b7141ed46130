#![allow(dead_code)]

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::Path;

use cannoli_core::c_string::OwnedCString;
use cannoli_core::host_value::c_string_accessor;
use cannoli_core::{HostValue, StradaValue};
use parking_lot::{Mutex, MutexGuard};
use rhai_bridge::ffi;

static SERIAL: Mutex<()> = parking_lot::const_mutex(());

/// Hold for the length of a test that touches the process-wide bridge.
pub fn serial() -> MutexGuard<'static, ()> {
    let guard = SERIAL.lock();
    ffi::rhai_bridge_set_accessor(Some(c_string_accessor));
    guard
}

/// Host values here are plain C strings; keep the `CString`s alive while
/// their handles are in use.
pub struct Values(Vec<CString>);

impl Values {
    pub fn new() -> Self {
        Values(Vec::new())
    }

    pub fn value(&mut self, text: &str) -> HostValue {
        let owned = CString::new(text).unwrap();
        let raw = owned.as_ptr() as *mut StradaValue;
        self.0.push(owned);
        unsafe { HostValue::from_raw(raw) }
    }
}

pub fn take(ptr: *mut c_char) -> String {
    assert!(!ptr.is_null(), "bridge returned NULL");
    unsafe { OwnedCString::from_raw(ptr) }.to_string_lossy()
}

pub fn borrowed(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

pub fn write_script(dir: &Path, relative: &str, source: &str) -> String {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, source).unwrap();
    path.to_str().unwrap().to_string()
}
