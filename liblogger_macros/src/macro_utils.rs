use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    token::Comma,
    Expr, ItemFn, Meta,
};

/// Helper function to get function name as string
pub fn get_fn_name(func: &ItemFn) -> String {
    func.sig.ident.to_string()
}

/// Arguments of `#[catch_panic(fallback = <expr>)]`.
#[derive(Default)]
pub struct PanicArgs {
    pub fallback: Option<Expr>,
}

impl Parse for PanicArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = PanicArgs::default();
        if input.is_empty() {
            return Ok(args);
        }

        let nested = Punctuated::<Meta, Comma>::parse_terminated(input)?;
        for meta in nested {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("fallback") => {
                    args.fallback = Some(nv.value);
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "expected `fallback = <expression>`",
                    ))
                }
            }
        }
        Ok(args)
    }
}

/// Whether the function's declared return type is a `Result<..>`.
pub fn returns_result(func: &ItemFn) -> bool {
    if let syn::ReturnType::Type(_, ty) = &func.sig.output {
        if let syn::Type::Path(type_path) = ty.as_ref() {
            return type_path
                .path
                .segments
                .last()
                .map(|segment| segment.ident == "Result")
                .unwrap_or(false);
        }
    }
    false
}

/// Expression turning a caught panic payload into a readable message.
pub fn panic_message(payload: &syn::Ident) -> TokenStream2 {
    quote! {
        if let Some(s) = #payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = #payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        }
    }
}
