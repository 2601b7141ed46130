//! Strings handed to the host.
//!
//! The host releases returned strings with `free()`, so they are allocated
//! with the C allocator rather than through `CString::into_raw`.

use std::os::raw::c_char;
use std::ptr;

use crate::log_error;

/// Copy `text` into a fresh `malloc` buffer, NUL-terminated.
///
/// Text after an interior NUL is dropped since the host could never see it.
/// If the copy cannot be allocated the failure is logged and an empty string
/// is returned instead; NULL comes back only when even that fails.
pub fn into_owned_c_string(text: &str) -> *mut c_char {
    let bytes = text.as_bytes();
    let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());

    let buffer = unsafe { libc::malloc(len + 1) } as *mut u8;
    if buffer.is_null() {
        log_error!(&format!("failed to allocate {} bytes for response", len + 1));
        return empty_c_string();
    }

    unsafe {
        ptr::copy_nonoverlapping(bytes.as_ptr(), buffer, len);
        *buffer.add(len) = 0;
    }
    buffer as *mut c_char
}

/// A `malloc`-owned empty string.
pub fn empty_c_string() -> *mut c_char {
    unsafe { libc::calloc(1, 1) as *mut c_char }
}

/// Release a string produced by this module. NULL is ignored.
///
/// # Safety
/// `ptr` must be NULL or a pointer returned by [`into_owned_c_string`] or
/// [`empty_c_string`] that has not been freed yet.
pub unsafe fn free_c_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        libc::free(ptr as *mut libc::c_void);
    }
}

/// Releases the wrapped string on drop. Mostly useful on the calling side.
pub struct OwnedCString(*mut c_char);

impl OwnedCString {
    /// # Safety
    /// Same contract as [`free_c_string`]; ownership moves into the wrapper.
    pub unsafe fn from_raw(ptr: *mut c_char) -> Self {
        OwnedCString(ptr)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    pub fn to_string_lossy(&self) -> String {
        if self.0.is_null() {
            return String::new();
        }
        unsafe { std::ffi::CStr::from_ptr(self.0) }
            .to_string_lossy()
            .into_owned()
    }
}

impl Drop for OwnedCString {
    fn drop(&mut self) {
        unsafe { free_c_string(self.0) }
    }
}
