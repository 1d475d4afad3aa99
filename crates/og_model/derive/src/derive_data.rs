//! Validated view of a `#[derive(Graph)]` input.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, GenericParam, Ident, LitStr, Type, WhereClause};

use crate::attributes::{FieldAttributes, TypeAttributes};

// -----------------------------------------------------------------------------
// GraphInput

pub(crate) enum GraphInput<'a> {
    Struct(GraphStruct<'a>),
    Enum(GraphEnum<'a>),
}

impl<'a> GraphInput<'a> {
    pub fn from_derive_input(ast: &'a DeriveInput) -> syn::Result<Self> {
        let meta = GraphMeta::new(ast)?;
        match &ast.data {
            Data::Struct(data) => GraphStruct::new(meta, &data.fields).map(Self::Struct),
            Data::Enum(data) => GraphEnum::new(meta, data).map(Self::Enum),
            Data::Union(_) => Err(syn::Error::new(
                ast.ident.span(),
                "`Graph` cannot be derived for unions",
            )),
        }
    }
}

// -----------------------------------------------------------------------------
// GraphMeta

/// Items shared by every kind of input.
pub(crate) struct GraphMeta<'a> {
    ast: &'a DeriveInput,
    attrs: TypeAttributes,
    og_model_path: syn::Path,
}

impl<'a> GraphMeta<'a> {
    fn new(ast: &'a DeriveInput) -> syn::Result<Self> {
        for param in &ast.generics.params {
            match param {
                GenericParam::Type(_) => {}
                GenericParam::Lifetime(p) => {
                    return Err(syn::Error::new(
                        p.span(),
                        "`Graph` types must be `'static` and cannot have lifetime parameters",
                    ));
                }
                GenericParam::Const(p) => {
                    return Err(syn::Error::new(
                        p.span(),
                        "`Graph` cannot be derived for types with const parameters",
                    ));
                }
            }
        }

        Ok(Self {
            ast,
            attrs: TypeAttributes::parse(&ast.attrs)?,
            og_model_path: crate::path::og_model(),
        })
    }

    #[inline]
    pub fn ident(&self) -> &'a Ident {
        &self.ast.ident
    }

    #[inline]
    pub fn attrs(&self) -> &TypeAttributes {
        &self.attrs
    }

    #[inline]
    pub fn og_model_path(&self) -> &syn::Path {
        &self.og_model_path
    }

    /// Returns `true` if the type has type parameters.
    #[inline]
    pub fn impl_with_generic(&self) -> bool {
        !self.ast.generics.params.is_empty()
    }

    /// `(impl_generics, ty_generics, where_clause)`.
    ///
    /// Every type parameter is bounded by `Typed + Graph + GetTypeMeta`.
    /// With `require_default`, `Self: Default` is added as well.
    pub fn split_generics(&self, require_default: bool) -> (TokenStream, TokenStream, TokenStream) {
        let og_model_path = &self.og_model_path;
        let info_ = crate::path::info_(og_model_path);
        let registry_ = crate::path::registry_(og_model_path);

        let generics = &self.ast.generics;
        let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

        if !self.impl_with_generic() {
            return (
                quote!(#impl_generics),
                quote!(#ty_generics),
                quote!(#where_clause),
            );
        }

        let predicates = where_clause.map(|w: &WhereClause| &w.predicates);
        let params = generics.type_params().map(|p| &p.ident);
        let ident = self.ident();
        let default_bound = if require_default {
            quote!(#ident #ty_generics: ::core::default::Default,)
        } else {
            TokenStream::new()
        };

        (
            quote!(#impl_generics),
            quote!(#ty_generics),
            quote! {
                where
                    #(#params: #info_::Typed + #og_model_path::Graph + #registry_::GetTypeMeta,)*
                    #default_bound
                    #predicates
            },
        )
    }

    /// An expression evaluating to the wire name.
    ///
    /// Generic types append their arguments' names, as in `Pair<i32, String>`.
    pub fn type_name_tokens(&self) -> TokenStream {
        let base = match &self.attrs.name {
            Some(name) => name.value(),
            None => self.ident().to_string(),
        };

        if !self.impl_with_generic() {
            return quote!(#base);
        }

        let og_model_path = &self.og_model_path;
        let info_ = crate::path::info_(og_model_path);

        let mut parts = Vec::new();
        let open = format!("{base}<");
        parts.push(quote!(#open));
        for (i, param) in self.ast.generics.type_params().enumerate() {
            if i > 0 {
                parts.push(quote!(", "));
            }
            let ident = &param.ident;
            parts.push(quote!(<#ident as #info_::Typed>::type_info().type_name()));
        }
        parts.push(quote!(">"));

        quote!(#og_model_path::impls::concat(&[#(#parts),*]))
    }
}

// -----------------------------------------------------------------------------
// GraphStruct

/// How a declared field takes part in encoding.
#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldKind {
    /// Read and written.
    Active,
    /// `#[graph(skip)]`.
    Skipped,
    /// Raw pointer, `NonNull` or `fn` pointer.
    PointerLike,
}

pub(crate) struct StructField<'a> {
    pub data: &'a syn::Field,
    pub attrs: FieldAttributes,
    pub index: usize,
    pub kind: FieldKind,
}

impl StructField<'_> {
    #[inline]
    pub fn ident(&self) -> &Ident {
        // Only named fields are accepted.
        self.data.ident.as_ref().unwrap_or_else(|| unreachable!())
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.data.ty
    }

    pub fn name(&self) -> String {
        self.ident().to_string()
    }

    pub fn wire_name(&self) -> String {
        match &self.attrs.rename {
            Some(rename) => rename.value(),
            None => self.name(),
        }
    }
}

pub(crate) struct GraphStruct<'a> {
    meta: GraphMeta<'a>,
    fields: Vec<StructField<'a>>,
}

impl<'a> GraphStruct<'a> {
    fn new(meta: GraphMeta<'a>, fields: &'a Fields) -> syn::Result<Self> {
        let named = match fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(unnamed) => {
                return Err(syn::Error::new(
                    unnamed.span(),
                    "`Graph` requires named fields; tuple structs have no member names",
                ));
            }
        };

        let mut out = Vec::with_capacity(named.len());
        let mut base: Option<&Ident> = None;
        for (index, data) in named.into_iter().enumerate() {
            let attrs = FieldAttributes::parse(&data.attrs)?;
            let kind = if attrs.skip {
                FieldKind::Skipped
            } else if is_pointer_like(&data.ty) {
                FieldKind::PointerLike
            } else {
                FieldKind::Active
            };

            if attrs.base {
                if base.is_some() {
                    return Err(syn::Error::new(
                        data.span(),
                        "at most one field can be marked `#[graph(base)]`",
                    ));
                }
                base = data.ident.as_ref();
            }

            out.push(StructField {
                data,
                attrs,
                index,
                kind,
            });
        }

        let this = Self { meta, fields: out };
        this.validate_deprecated()?;
        Ok(this)
    }

    fn validate_deprecated(&self) -> syn::Result<()> {
        for deprecated in &self.meta.attrs.deprecated {
            if let Some(replacement) = &deprecated.replacement {
                let value = replacement.value();
                let found = self
                    .active_fields()
                    .any(|f| f.wire_name() == value || f.name() == value);
                if !found {
                    return Err(syn::Error::new(
                        replacement.span(),
                        format!("replacement `{value}` is not an encoded field of this type"),
                    ));
                }
            }
        }
        Ok(())
    }

    #[inline]
    pub fn meta(&self) -> &GraphMeta<'a> {
        &self.meta
    }

    /// Every declared field, in declaration order.
    #[inline]
    pub fn fields(&self) -> &[StructField<'a>] {
        &self.fields
    }

    /// Fields that are read and written.
    pub fn active_fields(&self) -> impl Iterator<Item = &StructField<'a>> {
        self.fields.iter().filter(|f| f.kind == FieldKind::Active)
    }

    /// Resolves a `replacement = "..."` value to the wire name of the field.
    pub fn replacement_wire_name(&self, replacement: &LitStr) -> String {
        let value = replacement.value();
        self.active_fields()
            .find(|f| f.wire_name() == value || f.name() == value)
            .map(StructField::wire_name)
            .unwrap_or(value)
    }
}

/// Recognises raw pointers, `fn` pointers and `NonNull<_>` by syntax.
fn is_pointer_like(ty: &Type) -> bool {
    match ty {
        Type::Ptr(_) | Type::BareFn(_) => true,
        Type::Group(group) => is_pointer_like(&group.elem),
        Type::Paren(paren) => is_pointer_like(&paren.elem),
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "NonNull"),
        _ => false,
    }
}

// -----------------------------------------------------------------------------
// GraphEnum

pub(crate) struct GraphEnum<'a> {
    meta: GraphMeta<'a>,
    variants: Vec<&'a Ident>,
    repr: Ident,
}

impl<'a> GraphEnum<'a> {
    fn new(meta: GraphMeta<'a>, data: &'a syn::DataEnum) -> syn::Result<Self> {
        if meta.impl_with_generic() {
            return Err(syn::Error::new(
                meta.ident().span(),
                "`Graph` enums cannot be generic",
            ));
        }

        let mut variants = Vec::with_capacity(data.variants.len());
        for variant in &data.variants {
            if !matches!(variant.fields, Fields::Unit) {
                return Err(syn::Error::new(
                    variant.span(),
                    "`Graph` enums must be field-less",
                ));
            }
            variants.push(&variant.ident);
        }

        let repr = parse_repr(&meta.ast.attrs)?
            .unwrap_or_else(|| Ident::new("i32", Span::call_site()));

        Ok(Self {
            meta,
            variants,
            repr,
        })
    }

    #[inline]
    pub fn meta(&self) -> &GraphMeta<'a> {
        &self.meta
    }

    #[inline]
    pub fn variants(&self) -> &[&'a Ident] {
        &self.variants
    }

    /// The integer primitive, such as `u8`.
    #[inline]
    pub fn repr(&self) -> &Ident {
        &self.repr
    }

    /// The `ScalarKind` variant matching [`Self::repr`], such as `U8`.
    pub fn repr_kind(&self) -> Ident {
        let name = self.repr.to_string();
        let kind = match name.as_str() {
            "isize" => "Isize".to_owned(),
            "usize" => "Usize".to_owned(),
            other => other.to_uppercase(),
        };
        Ident::new(&kind, self.repr.span())
    }
}

const INTEGER_REPRS: &[&str] = &[
    "i8", "u8", "i16", "u16", "i32", "u32", "i64", "u64", "isize", "usize",
];

fn parse_repr(attrs: &[syn::Attribute]) -> syn::Result<Option<Ident>> {
    let mut repr = None;
    for attr in attrs {
        if !attr.path().is_ident("repr") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if let Some(ident) = meta.path.get_ident()
                && INTEGER_REPRS.contains(&ident.to_string().as_str())
            {
                repr = Some(ident.clone());
            }
            Ok(())
        })?;
    }
    Ok(repr)
}
