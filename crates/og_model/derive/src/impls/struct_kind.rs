use proc_macro2::TokenStream;
use quote::quote;

use super::get_auto_register_impl;

use crate::derive_data::{FieldKind, GraphStruct, StructField};

/// Implement `Typed`, `Graph`, `Record` and `GetTypeMeta` for a struct.
pub(crate) fn impl_struct(info: &GraphStruct) -> TokenStream {
    let typed_tokens = impl_trait_typed(info);
    let graph_tokens = impl_trait_graph(info);
    let record_tokens = impl_trait_record(info);
    let get_type_meta_tokens = impl_trait_get_type_meta(info);
    let auto_register_tokens = get_auto_register_impl(info.meta());

    quote! {
        #typed_tokens

        #graph_tokens

        #record_tokens

        #get_type_meta_tokens

        #auto_register_tokens
    }
}

// -----------------------------------------------------------------------------
// Typed

fn impl_trait_typed(info: &GraphStruct) -> TokenStream {
    let meta = info.meta();
    let og_model_path = meta.og_model_path();
    let info_ = crate::path::info_(og_model_path);
    let macro_exports_ = crate::path::macro_exports_(og_model_path);

    let field_tokens = info.fields().iter().map(|f| field_info_tokens(f, &info_));
    let computed_tokens = computed_info_tokens(info);
    let flags_tokens = if meta.attrs().error_base {
        quote!(.with_flags(#info_::TypeFlags::ERROR_BASE))
    } else {
        TokenStream::new()
    };
    let type_name = meta.type_name_tokens();

    let struct_info_tokens = quote! {
        #info_::TypeInfo::Struct(
            #info_::StructInfo::new::<Self>(
                #type_name,
                #macro_exports_::Vec::from([#(#field_tokens),*]),
            )
            #computed_tokens
            #flags_tokens
        )
    };

    let cell_tokens = if meta.impl_with_generic() {
        quote! {
            static CELL: #info_::GenericTypeInfoCell = #info_::GenericTypeInfoCell::new();
            CELL.get_or_insert::<Self>(|| #struct_info_tokens)
        }
    } else {
        quote! {
            static CELL: #info_::NonGenericTypeInfoCell = #info_::NonGenericTypeInfoCell::new();
            CELL.get_or_init(|| #struct_info_tokens)
        }
    };

    let ident = meta.ident();
    let (impl_generics, ty_generics, where_clause) = meta.split_generics(true);

    quote! {
        impl #impl_generics #info_::Typed for #ident #ty_generics #where_clause {
            fn type_info() -> &'static #info_::TypeInfo {
                #cell_tokens
            }
        }
    }
}

fn field_info_tokens(field: &StructField, info_: &TokenStream) -> TokenStream {
    let index = field.index;
    let name = field.name();

    let mut tokens = match field.kind {
        FieldKind::Skipped => quote!(#info_::FieldInfo::skipped(#index, #name)),
        FieldKind::PointerLike => quote!(#info_::FieldInfo::pointer_like(#index, #name)),
        FieldKind::Active => {
            let ty = field.ty();
            quote!(#info_::FieldInfo::new::<#ty>(#index, #name))
        }
    };

    let attrs = &field.attrs;
    if attrs.optional {
        tokens = quote!(#tokens.with_flags(#info_::FieldFlags::OPTIONAL));
    }
    if attrs.ignore_specializations {
        tokens = quote!(#tokens.with_flags(#info_::FieldFlags::IGNORE_SPECIALIZATIONS));
    }
    if attrs.base {
        tokens = quote!(#tokens.with_flags(#info_::FieldFlags::BASE));
    }
    if let Some(rename) = &attrs.rename {
        tokens = quote!(#tokens.with_wire_name(#rename));
    }
    tokens
}

fn computed_info_tokens(info: &GraphStruct) -> TokenStream {
    let meta = info.meta();
    let deprecated = &meta.attrs().deprecated;
    if deprecated.is_empty() {
        return TokenStream::new();
    }

    let og_model_path = meta.og_model_path();
    let info_ = crate::path::info_(og_model_path);
    let macro_exports_ = crate::path::macro_exports_(og_model_path);

    let items = deprecated.iter().map(|d| {
        let name = &d.name;
        let ty = &d.ty;
        let get = &d.get;
        let set = &d.set;
        let replacement = d.replacement.as_ref().map(|r| {
            let wire_name = info.replacement_wire_name(r);
            quote!(.with_replacement(#wire_name))
        });

        quote::quote_spanned! { d.span =>
            #info_::ComputedInfo::new::<#ty>(
                #name,
                |record: &dyn #og_model_path::Record| {
                    let this = record.downcast_ref::<Self>()?;
                    let value: #ty = #get(this);
                    ::core::option::Option::Some(
                        #macro_exports_::Box::new(value) as #macro_exports_::Box<dyn #og_model_path::Graph>
                    )
                },
                |record: &mut dyn #og_model_path::Record, value: #macro_exports_::Box<dyn #og_model_path::Graph>| {
                    let value = value.take::<#ty>()?;
                    match record.downcast_mut::<Self>() {
                        ::core::option::Option::Some(this) => {
                            #set(this, value);
                            ::core::result::Result::Ok(())
                        }
                        ::core::option::Option::None => ::core::result::Result::Err(
                            #macro_exports_::Box::new(value) as #macro_exports_::Box<dyn #og_model_path::Graph>
                        ),
                    }
                },
            )
            #replacement
        }
    });

    quote!(.with_computed(#macro_exports_::Vec::from([#(#items),*])))
}

// -----------------------------------------------------------------------------
// Graph

fn impl_trait_graph(info: &GraphStruct) -> TokenStream {
    let meta = info.meta();
    let og_model_path = meta.og_model_path();
    let info_ = crate::path::info_(og_model_path);

    let ident = meta.ident();
    let (impl_generics, ty_generics, where_clause) = meta.split_generics(true);

    quote! {
        impl #impl_generics #og_model_path::Graph for #ident #ty_generics #where_clause {
            #[inline]
            fn graph_info(&self) -> &'static #info_::TypeInfo {
                <Self as #info_::Typed>::type_info()
            }

            #[inline]
            fn graph_ref(&self) -> #og_model_path::GraphRef<'_> {
                #og_model_path::GraphRef::Record(self)
            }

            #[inline]
            fn as_record(&self) -> ::core::option::Option<&dyn #og_model_path::Record> {
                ::core::option::Option::Some(self)
            }

            #[inline]
            fn as_record_mut(&mut self) -> ::core::option::Option<&mut dyn #og_model_path::Record> {
                ::core::option::Option::Some(self)
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Record

fn impl_trait_record(info: &GraphStruct) -> TokenStream {
    let meta = info.meta();
    let og_model_path = meta.og_model_path();
    let info_ = crate::path::info_(og_model_path);
    let macro_exports_ = crate::path::macro_exports_(og_model_path);

    let indices = info.active_fields().map(|f| f.index).collect::<Vec<_>>();
    let idents = info.active_fields().map(StructField::ident).collect::<Vec<_>>();

    let ident = meta.ident();
    let (impl_generics, ty_generics, where_clause) = meta.split_generics(true);

    quote! {
        impl #impl_generics #og_model_path::Record for #ident #ty_generics #where_clause {
            #[inline]
            fn struct_info(&self) -> &'static #info_::StructInfo {
                #macro_exports_::struct_info_of(<Self as #info_::Typed>::type_info())
            }

            fn field_at(&self, index: usize) -> ::core::option::Option<&dyn #og_model_path::Graph> {
                match index {
                    #(#indices => ::core::option::Option::Some(&self.#idents),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn field_at_mut(&mut self, index: usize) -> ::core::option::Option<&mut dyn #og_model_path::Graph> {
                match index {
                    #(#indices => ::core::option::Option::Some(&mut self.#idents),)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_field_at(
                &mut self,
                index: usize,
                value: #macro_exports_::Box<dyn #og_model_path::Graph>,
            ) -> ::core::result::Result<(), #macro_exports_::Box<dyn #og_model_path::Graph>> {
                match index {
                    #(#indices => #macro_exports_::assign(&mut self.#idents, value),)*
                    _ => ::core::result::Result::Err(value),
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// GetTypeMeta

fn impl_trait_get_type_meta(info: &GraphStruct) -> TokenStream {
    let meta = info.meta();
    let og_model_path = meta.og_model_path();
    let registry_ = crate::path::registry_(og_model_path);

    let mut dependencies = info.active_fields().map(StructField::ty).collect::<Vec<_>>();
    dependencies.extend(meta.attrs().deprecated.iter().map(|d| &d.ty));

    let register_tokens = if dependencies.is_empty() {
        TokenStream::new()
    } else {
        quote! {
            fn register_dependencies(registry: &mut #registry_::TypeRegistry) {
                #(registry.register::<#dependencies>();)*
            }
        }
    };

    let ident = meta.ident();
    let (impl_generics, ty_generics, where_clause) = meta.split_generics(true);

    quote! {
        impl #impl_generics #registry_::GetTypeMeta for #ident #ty_generics #where_clause {
            fn get_type_meta() -> #registry_::TypeMeta {
                let mut meta = #registry_::TypeMeta::with_capacity::<Self>(2);
                meta.insert_trait::<#registry_::TypeTraitDefault>(
                    #registry_::FromType::<Self>::from_type()
                );
                meta.insert_trait::<#registry_::TypeTraitShared>(
                    #registry_::FromType::<Self>::from_type()
                );
                meta
            }

            #register_tokens
        }
    }
}
