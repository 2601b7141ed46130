/*
 * Procedural macros for logging around function boundaries
 *
 * `catch_panic` keeps unwinds from escaping `extern "C"` entry points and
 * `measure_time` records how long a call took. Both expand to calls into
 * `liblogger`, so the crate using them must depend on it directly.
 */

extern crate proc_macro;

mod macro_utils;

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, parse_quote, ItemFn};

use crate::macro_utils::{get_fn_name, panic_message, returns_result, PanicArgs};

/// Measure execution time of a function, logged at debug level.
#[proc_macro_attribute]
pub fn measure_time(_args: TokenStream, input: TokenStream) -> TokenStream {
    let mut input_fn = parse_macro_input!(input as ItemFn);
    let fn_name = get_fn_name(&input_fn);
    let orig_block = input_fn.block.clone();

    input_fn.block = Box::new(parse_quote!({
        let start_time = ::std::time::Instant::now();
        let result = #orig_block;
        liblogger::log_debug!(
            &format!("{} completed in {} us", #fn_name, start_time.elapsed().as_micros()),
            None
        );
        result
    }));

    TokenStream::from(quote!(#input_fn))
}

/// Catch and log panics instead of unwinding out of the function.
///
/// Functions returning `Result` turn the panic into `Err(..)`. Everything
/// else returns `Default::default()`, or the expression given as
/// `#[catch_panic(fallback = expr)]` for return types without a default
/// (raw pointers, for example).
#[proc_macro_attribute]
pub fn catch_panic(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args as PanicArgs);
    let mut input_fn = parse_macro_input!(input as ItemFn);
    let fn_name = get_fn_name(&input_fn);
    let orig_block = input_fn.block.clone();

    let payload = format_ident!("panic_err");
    let message = panic_message(&payload);

    let recovery = match args.fallback {
        Some(fallback) => quote!(#fallback),
        None if returns_result(&input_fn) => {
            quote!(Err(format!("Panic in {}: {}", #fn_name, panic_msg).into()))
        }
        None => quote!(Default::default()),
    };

    input_fn.block = Box::new(parse_quote!({
        use std::panic::{catch_unwind, AssertUnwindSafe};

        match catch_unwind(AssertUnwindSafe(|| #orig_block)) {
            Ok(result) => result,
            Err(#payload) => {
                let panic_msg: String = #message;
                liblogger::log_error!(&format!("{} caught panic: {}", #fn_name, panic_msg), None);
                #recovery
            }
        }
    }));

    TokenStream::from(quote!(#input_fn))
}
