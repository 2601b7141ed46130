use std::ffi::CStr;
use std::os::raw::c_char;

use once_cell::sync::OnceCell;

use crate::log_warn;

/// Opaque value type owned by the host runtime.
///
/// The bridge never allocates, frees, or looks inside one of these. The only
/// thing it can do with a handle is ask the host to render it as a string.
#[repr(C)]
pub struct StradaValue {
    _private: [u8; 0],
}

/// Host-provided projection of a value to a borrowed, NUL-terminated string.
///
/// The returned pointer stays valid until the host mutates or releases the
/// value; callers copy it before returning control to the host.
pub type StringifyFn = unsafe extern "C" fn(*mut StradaValue) -> *const c_char;

/// Name of the accessor symbol exported by the host runtime.
pub const ACCESSOR_SYMBOL: &[u8] = b"strada_to_str\0";

static ACCESSOR: OnceCell<Option<StringifyFn>> = OnceCell::new();

/// Install the accessor explicitly instead of resolving `strada_to_str`
/// from the running process.
///
/// Returns `false` if an accessor was already installed or resolved.
pub fn install_accessor(accessor: StringifyFn) -> bool {
    ACCESSOR.set(Some(accessor)).is_ok()
}

/// Accessor for hosts whose handles are plain C strings.
///
/// # Safety
/// `value` must be NULL or point to a NUL-terminated string.
pub unsafe extern "C" fn c_string_accessor(value: *mut StradaValue) -> *const c_char {
    value as *const c_char
}

fn accessor() -> Option<StringifyFn> {
    *ACCESSOR.get_or_init(|| {
        let resolved = resolve_from_process();
        if resolved.is_none() {
            log_warn!("strada_to_str not found in process image; host values will read as empty");
        }
        resolved
    })
}

#[cfg(unix)]
fn resolve_from_process() -> Option<StringifyFn> {
    let library = libloading::os::unix::Library::this();
    // The process image outlives every caller, so the symbol can be copied out.
    let symbol = unsafe { library.get::<StringifyFn>(ACCESSOR_SYMBOL) }.ok()?;
    Some(*symbol)
}

#[cfg(windows)]
fn resolve_from_process() -> Option<StringifyFn> {
    let library = libloading::os::windows::Library::this().ok()?;
    let symbol = unsafe { library.get::<StringifyFn>(ACCESSOR_SYMBOL) }.ok()?;
    Some(*symbol)
}

#[cfg(not(any(unix, windows)))]
fn resolve_from_process() -> Option<StringifyFn> {
    None
}

/// Handle to a host value, passed by value across the C ABI.
///
/// A NULL handle is legal and projects to `None`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostValue(*mut StradaValue);

impl HostValue {
    pub const NULL: HostValue = HostValue(std::ptr::null_mut());

    /// # Safety
    /// `raw` must be NULL or a handle the installed accessor understands,
    /// and must stay valid for as long as the `HostValue` is projected.
    pub unsafe fn from_raw(raw: *mut StradaValue) -> Self {
        HostValue(raw)
    }

    pub fn as_ptr(&self) -> *mut StradaValue {
        self.0
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /// Borrow the host's string rendering of this value.
    ///
    /// NULL handle, missing accessor, or a NULL rendering all yield `None`.
    /// The borrow is re-fetched on every call; nothing is cached.
    pub fn as_c_str(&self) -> Option<&CStr> {
        if self.0.is_null() {
            return None;
        }
        let stringify = accessor()?;
        let rendered = unsafe { stringify(self.0) };
        if rendered.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(rendered) })
    }

    /// Owned copy of the rendering, lossily decoded as UTF-8.
    pub fn project(&self) -> Option<String> {
        self.as_c_str().map(|s| s.to_string_lossy().into_owned())
    }

    /// Owned copy, with NULL and empty renderings both reading as `None`.
    pub fn project_non_empty(&self) -> Option<String> {
        self.project().filter(|s| !s.is_empty())
    }
}

impl Default for HostValue {
    fn default() -> Self {
        HostValue::NULL
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn use_c_string_accessor() {
        install_accessor(c_string_accessor);
    }

    pub fn host(text: &CStr) -> HostValue {
        use_c_string_accessor();
        unsafe { HostValue::from_raw(text.as_ptr() as *mut StradaValue) }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn null_handle_projects_to_none() {
        use_c_string_accessor();
        assert_eq!(HostValue::NULL.project(), None);
        assert!(HostValue::default().is_null());
    }

    #[test]
    fn projection_copies_host_string() {
        let text = c"/admin";
        let value = host(text);
        assert_eq!(value.project().as_deref(), Some("/admin"));
        assert_eq!(value.as_c_str(), Some(text));
    }

    #[test]
    fn empty_rendering_is_absent_for_non_empty_projection() {
        let value = host(c"");
        assert_eq!(value.project().as_deref(), Some(""));
        assert_eq!(value.project_non_empty(), None);
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let bytes = b"caf\xe9\0";
        let text = CStr::from_bytes_with_nul(bytes).unwrap();
        assert_eq!(host(text).project().as_deref(), Some("caf\u{fffd}"));
    }
}
