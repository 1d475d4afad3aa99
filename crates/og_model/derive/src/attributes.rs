//! Parsing of `#[graph(...)]` attributes.

use proc_macro2::Span;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Ident, LitStr, Path, Type};

use crate::GRAPH_ATTRIBUTE_NAME;

// -----------------------------------------------------------------------------
// TypeAttributes

/// `#[graph(deprecated(...))]`
pub(crate) struct DeprecatedAttribute {
    pub name: LitStr,
    pub ty: Type,
    pub get: Path,
    pub set: Path,
    pub replacement: Option<LitStr>,
    pub span: Span,
}

#[derive(Default)]
pub(crate) struct TypeAttributes {
    pub name: Option<LitStr>,
    pub deprecated: Vec<DeprecatedAttribute>,
    pub error_base: bool,
    pub auto_register: Option<Span>,
}

impl TypeAttributes {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in attrs {
            if !attr.path().is_ident(GRAPH_ATTRIBUTE_NAME) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    set_once(&meta, &mut this.name, meta.value()?.parse()?)
                } else if meta.path.is_ident("deprecated") {
                    this.deprecated.push(parse_deprecated(&meta)?);
                    Ok(())
                } else if meta.path.is_ident("error_base") {
                    this.error_base = true;
                    Ok(())
                } else if meta.path.is_ident("auto_register") {
                    this.auto_register = Some(span_of(&meta.path));
                    Ok(())
                } else {
                    Err(meta.error("unknown type attribute, expected one of `name`, `deprecated`, `error_base`, `auto_register`"))
                }
            })?;
        }
        Ok(this)
    }
}

fn parse_deprecated(meta: &ParseNestedMeta) -> syn::Result<DeprecatedAttribute> {
    let span = span_of(&meta.path);
    let mut name: Option<LitStr> = None;
    let mut ty: Option<Type> = None;
    let mut get: Option<Path> = None;
    let mut set: Option<Path> = None;
    let mut replacement: Option<LitStr> = None;

    meta.parse_nested_meta(|inner| {
        if inner.path.is_ident("name") {
            set_once(&inner, &mut name, inner.value()?.parse()?)
        } else if inner.path.is_ident("ty") {
            set_once(&inner, &mut ty, inner.value()?.parse()?)
        } else if inner.path.is_ident("get") {
            set_once(&inner, &mut get, inner.value()?.parse()?)
        } else if inner.path.is_ident("set") {
            set_once(&inner, &mut set, inner.value()?.parse()?)
        } else if inner.path.is_ident("replacement") {
            set_once(&inner, &mut replacement, inner.value()?.parse()?)
        } else {
            Err(inner.error("expected one of `name`, `ty`, `get`, `set`, `replacement`"))
        }
    })?;

    let missing = |what: &str| syn::Error::new(span, format!("`deprecated` requires `{what}`"));
    Ok(DeprecatedAttribute {
        name: name.ok_or_else(|| missing("name"))?,
        ty: ty.ok_or_else(|| missing("ty"))?,
        get: get.ok_or_else(|| missing("get"))?,
        set: set.ok_or_else(|| missing("set"))?,
        replacement,
        span,
    })
}

// -----------------------------------------------------------------------------
// FieldAttributes

#[derive(Default)]
pub(crate) struct FieldAttributes {
    pub skip: bool,
    pub optional: bool,
    pub ignore_specializations: bool,
    pub base: bool,
    pub rename: Option<LitStr>,
}

impl FieldAttributes {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut this = Self::default();
        for attr in attrs {
            if !attr.path().is_ident(GRAPH_ATTRIBUTE_NAME) {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    this.skip = true;
                } else if meta.path.is_ident("optional") {
                    this.optional = true;
                } else if meta.path.is_ident("ignore_specializations") {
                    this.ignore_specializations = true;
                } else if meta.path.is_ident("base") {
                    this.base = true;
                } else if meta.path.is_ident("rename") {
                    return set_once(&meta, &mut this.rename, meta.value()?.parse()?);
                } else {
                    return Err(meta.error(
                        "unknown field attribute, expected one of `skip`, `optional`, `rename`, `ignore_specializations`, `base`",
                    ));
                }
                Ok(())
            })?;
        }
        if this.base && (this.skip || this.rename.is_some()) {
            return Err(syn::Error::new(
                Span::call_site(),
                "`base` cannot be combined with `skip` or `rename`",
            ));
        }
        Ok(this)
    }
}

// -----------------------------------------------------------------------------
// Helpers

fn set_once<T>(meta: &ParseNestedMeta, slot: &mut Option<T>, value: T) -> syn::Result<()> {
    if slot.is_some() {
        return Err(meta.error("duplicate attribute"));
    }
    *slot = Some(value);
    Ok(())
}

fn span_of(path: &Path) -> Span {
    path.get_ident().map(Ident::span).unwrap_or_else(Span::call_site)
}
