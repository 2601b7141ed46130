use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

/// Which handler to call and which context module was requested.
///
/// Values are copied into storage owned here; a pointer handed out by
/// [`Registry::handler_ptr`] stays valid until the next `set_handler` or
/// `clear`.
#[derive(Debug, Default)]
pub struct Registry {
    handler: Option<CString>,
    module_path: Option<CString>,
}

fn owned(value: Option<&str>) -> Option<CString> {
    let value = value.filter(|v| !v.is_empty())?;
    // Keep what the host could have seen: everything before an interior NUL.
    let visible = value.split('\0').next().unwrap_or_default();
    if visible.is_empty() {
        return None;
    }
    CString::new(visible).ok()
}

impl Registry {
    /// Replace the handler name. `None` or empty clears it.
    pub fn set_handler(&mut self, name: Option<&str>) {
        self.handler = owned(name);
    }

    /// Replace the recorded context module path. `None` or empty clears it.
    pub fn set_module_path(&mut self, path: Option<&str>) {
        self.module_path = owned(path);
    }

    pub fn handler(&self) -> Option<&str> {
        self.handler.as_deref().and_then(|s| s.to_str().ok())
    }

    pub fn module_path(&self) -> Option<&str> {
        self.module_path.as_deref().and_then(|s| s.to_str().ok())
    }

    /// Borrowed C view of the handler name, NULL when unset.
    pub fn handler_ptr(&self) -> *const c_char {
        self.handler
            .as_deref()
            .map(CStr::as_ptr)
            .unwrap_or(ptr::null())
    }

    pub fn clear(&mut self) {
        self.handler = None;
        self.module_path = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_previous_value() {
        let mut registry = Registry::default();
        registry.set_handler(Some("first"));
        registry.set_handler(Some("second"));
        assert_eq!(registry.handler(), Some("second"));

        let ptr = registry.handler_ptr();
        assert_eq!(unsafe { CStr::from_ptr(ptr) }.to_str().unwrap(), "second");
    }

    #[test]
    fn empty_and_none_clear() {
        let mut registry = Registry::default();
        registry.set_handler(Some("handle"));
        registry.set_handler(Some(""));
        assert_eq!(registry.handler(), None);
        assert!(registry.handler_ptr().is_null());

        registry.set_module_path(Some("/srv/cannoli.rhai"));
        registry.set_module_path(None);
        assert_eq!(registry.module_path(), None);
    }

    #[test]
    fn clear_drops_both() {
        let mut registry = Registry::default();
        registry.set_handler(Some("handle"));
        registry.set_module_path(Some("lib/cannoli.rhai"));
        registry.clear();
        assert_eq!(registry.handler(), None);
        assert_eq!(registry.module_path(), None);
    }

    #[test]
    fn interior_nul_truncates() {
        let mut registry = Registry::default();
        registry.set_handler(Some("handle\0junk"));
        assert_eq!(registry.handler(), Some("handle"));
    }
}
