/// Declare the C entry points of a dispatch library.
///
/// `$route` is any `fn(&Request) -> Response`. The macro generates:
///
/// * `cannoli_dispatch`, taking the eight host handles and returning a
///   `malloc`-owned string (empty to abstain);
/// * `cannoli_free`, releasing a string returned by `cannoli_dispatch`;
/// * `cannoli_library_name`, a static, NUL-terminated name.
///
/// A panic in `$route` is logged and reported as `STATUS:500:...`.
#[macro_export]
macro_rules! declare_dispatch {
    ($name:literal, $route:path) => {
        /// # Safety
        /// Every argument must be NULL or a live host value for the duration
        /// of the call.
        #[no_mangle]
        pub unsafe extern "C" fn cannoli_dispatch(
            method: $crate::HostValue,
            path: $crate::HostValue,
            path_info: $crate::HostValue,
            query_string: $crate::HostValue,
            body: $crate::HostValue,
            headers: $crate::HostValue,
            remote_addr: $crate::HostValue,
            content_type: $crate::HostValue,
        ) -> *mut ::std::os::raw::c_char {
            let host = $crate::HostRequest {
                method,
                path,
                path_info,
                query_string,
                body,
                headers,
                remote_addr,
                content_type,
            };

            let outcome = ::std::panic::catch_unwind(::std::panic::AssertUnwindSafe(|| {
                let request = $crate::Request::from_host(&host);
                $route(&request)
            }));

            match outcome {
                Ok(response) => response.into_c_string(),
                Err(_) => {
                    $crate::log_error!(&format!("[{}] route panicked", $name));
                    $crate::Response::internal_error(concat!($name, " panicked")).into_c_string()
                }
            }
        }

        /// # Safety
        /// `ptr` must be NULL or a string returned by `cannoli_dispatch`.
        #[no_mangle]
        pub unsafe extern "C" fn cannoli_free(ptr: *mut ::std::os::raw::c_char) {
            $crate::c_string::free_c_string(ptr)
        }

        #[no_mangle]
        pub extern "C" fn cannoli_library_name() -> *const ::std::os::raw::c_char {
            concat!($name, "\0").as_ptr() as *const ::std::os::raw::c_char
        }
    };
}
