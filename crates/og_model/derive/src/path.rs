//! Paths used by generated code.

use proc_macro2::TokenStream;
use quote::quote;

/// The path of `og_model` as seen from the crate being expanded.
///
/// Crates depending on the facade reach it as `::og_core::model`.
pub(crate) fn og_model() -> syn::Path {
    og_macro_utils::Manifest::shared(|manifest| manifest.get_crate_path("og_model"))
}

#[inline(always)]
pub(crate) fn info_(og_model_path: &syn::Path) -> TokenStream {
    quote! { #og_model_path::info }
}

#[inline(always)]
pub(crate) fn registry_(og_model_path: &syn::Path) -> TokenStream {
    quote! { #og_model_path::registry }
}

#[inline(always)]
pub(crate) fn macro_exports_(og_model_path: &syn::Path) -> TokenStream {
    quote! { #og_model_path::__macro_exports }
}

#[cfg(feature = "auto_register")]
#[inline(always)]
pub(crate) fn auto_register_(og_model_path: &syn::Path) -> TokenStream {
    quote! { #og_model_path::__macro_exports::auto_register }
}
