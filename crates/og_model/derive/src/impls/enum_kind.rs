use proc_macro2::TokenStream;
use quote::quote;

use super::get_auto_register_impl;

use crate::derive_data::GraphEnum;

/// Implement `Typed`, `Graph` and `GetTypeMeta` for a field-less enum.
pub(crate) fn impl_enum(info: &GraphEnum) -> TokenStream {
    let meta = info.meta();
    let og_model_path = meta.og_model_path();
    let info_ = crate::path::info_(og_model_path);
    let registry_ = crate::path::registry_(og_model_path);
    let macro_exports_ = crate::path::macro_exports_(og_model_path);
    let value_ = quote!(#og_model_path::value);

    let ident = meta.ident();
    let type_name = meta.type_name_tokens();
    let repr = info.repr();
    let repr_kind = info.repr_kind();
    let variants = info.variants();
    let variant_names = variants.iter().map(|v| v.to_string());

    let auto_register_tokens = get_auto_register_impl(meta);

    quote! {
        impl #info_::Typed for #ident {
            fn type_info() -> &'static #info_::TypeInfo {
                const VARIANTS: &[#info_::EnumVariant] = &[
                    #(#info_::EnumVariant {
                        name: #variant_names,
                        discriminant: #ident::#variants as i128,
                    },)*
                ];

                fn from_discriminant(
                    discriminant: i128,
                ) -> ::core::option::Option<#macro_exports_::Box<dyn #og_model_path::Graph>> {
                    #(
                        if discriminant == #ident::#variants as i128 {
                            return ::core::option::Option::Some(#macro_exports_::Box::new(#ident::#variants));
                        }
                    )*
                    ::core::option::Option::None
                }

                static CELL: #info_::NonGenericTypeInfoCell = #info_::NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| {
                    #info_::TypeInfo::Enum(#info_::EnumInfo::new::<Self>(
                        #type_name,
                        #value_::ScalarKind::#repr_kind,
                        VARIANTS,
                        from_discriminant,
                    ))
                })
            }
        }

        impl #og_model_path::Graph for #ident {
            #[inline]
            fn graph_info(&self) -> &'static #info_::TypeInfo {
                <Self as #info_::Typed>::type_info()
            }

            fn graph_ref(&self) -> #og_model_path::GraphRef<'_> {
                let value = match self {
                    #(Self::#variants => Self::#variants as #repr,)*
                };
                #og_model_path::GraphRef::Scalar(#value_::Scalar::#repr_kind(value))
            }
        }

        impl #registry_::GetTypeMeta for #ident {
            fn get_type_meta() -> #registry_::TypeMeta {
                #registry_::TypeMeta::of::<Self>()
            }
        }

        #auto_register_tokens
    }
}
