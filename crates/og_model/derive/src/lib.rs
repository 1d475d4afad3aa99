//! `#[derive(Graph)]`, which makes a type walkable by the object-graph codec.
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::std_instead_of_core, reason = "proc-macro lib")]
#![allow(clippy::std_instead_of_alloc, reason = "proc-macro lib")]

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

static GRAPH_ATTRIBUTE_NAME: &str = "graph";

// -----------------------------------------------------------------------------
// Modules

mod attributes;
mod derive_data;
mod impls;
mod path;

// -----------------------------------------------------------------------------
// Macros

/// Derives `Typed`, `Graph`, `Record` and `GetTypeMeta`.
///
/// Structs with named fields, unit structs and field-less enums are
/// supported. Structs must implement [`Default`]: the decoder builds every
/// record from its default value and then assigns the members it reads.
///
/// # Field attributes
///
/// - `#[graph(skip)]`: never written, never read. The field type needs no
///   `Graph` implementation.
/// - `#[graph(optional)]`: may be absent from the data being read.
/// - `#[graph(rename = "Name")]`: the name used on the wire.
/// - `#[graph(ignore_specializations)]`: treat the field's type as closed
///   when generating a specialized accessor.
/// - `#[graph(base)]`: an embedded base record. Its members are inherited
///   and come first.
///
/// Raw pointers, `NonNull<_>` and `fn` pointers are recognised as
/// pointer-like fields. Member analysis rejects them unless the type is
/// marked `#[graph(error_base)]`, in which case they are excluded.
///
/// # Type attributes
///
/// - `#[graph(name = "Name")]`: the wire type name. Defaults to the type
///   identifier, with generic arguments appended.
/// - `#[graph(deprecated(name = "Old", ty = T, get = path, set = path, replacement = "field"))]`:
///   a computed member written under the former name `Old`. `get` is called
///   as `get(&self) -> T` and `set` as `set(&mut self, T)`. When data under
///   `Old` is read, `set` is invoked and the `replacement` field counts as
///   present.
/// - `#[graph(error_base)]`: the type is a structured error base.
/// - `#[graph(auto_register)]`: submit the type for
///   `TypeRegistry::auto_register`. Ignored for generic types.
///
/// # Enums
///
/// Field-less enums are encoded as the integer of their `#[repr]`, `i32`
/// when no `repr` is given.
///
/// ```rust, ignore
/// #[derive(Graph, Default)]
/// #[graph(deprecated(name = "Name", ty = String, get = Self::name, set = Self::set_name, replacement = "full_name"))]
/// struct Person {
///     full_name: String,
///     #[graph(optional)]
///     nickname: Option<String>,
/// }
/// ```
#[proc_macro_derive(Graph, attributes(graph))]
pub fn derive_graph(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    match derive_data::GraphInput::from_derive_input(&ast) {
        Ok(derive_data::GraphInput::Struct(data)) => impls::impl_struct(&data).into(),
        Ok(derive_data::GraphInput::Enum(data)) => impls::impl_enum(&data).into(),
        Err(err) => err.into_compile_error().into(),
    }
}
