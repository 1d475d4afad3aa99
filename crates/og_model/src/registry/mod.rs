//! Runtime type registry, used to resolve wire type names.
//!
//! ## Menu
//!
//! - [`TypeTrait`]: A capability supported by a type.
//! - [`FromType`]: Creates a `TypeTrait` for a concrete type.
//! - [`TypeMeta`]: A [`TypeInfo`] plus a [`TypeTrait`] table.
//! - [`GetTypeMeta`]: Creates the `TypeMeta` of a type.
//! - [`TypeRegistry`]: Stores `TypeMeta`s, indexed by `TypeId`, wire name and path.
//! - TypeTraits:
//!     - [`TypeTraitDefault`]: Creates a boxed default value.
//!     - [`TypeTraitShared`]: Creates a default record in a fresh shared slot.
//!
//! The decoder only consults the registry where the declared type does not
//! fix the concrete type: polymorphic members, and skipped objects that a
//! later back-reference may still need.
//!
//! ## auto_register
//!
//! See [`TypeRegistry::auto_register`].
//!
//! The [`inventory`] crate implements static registration. Not all platforms
//! support it; where it is unsupported the function returns `false` and
//! registers nothing.
//!
//! [`TypeInfo`]: crate::info::TypeInfo
//! [`inventory`]: https://docs.rs/inventory

// -----------------------------------------------------------------------------
// Modules

mod from_type;
mod traits;
mod type_meta;
mod type_registry;
mod type_trait;

// -----------------------------------------------------------------------------
// Exports

pub use from_type::FromType;
pub use traits::{TypeTraitDefault, TypeTraitShared};
pub use type_meta::{GetTypeMeta, TypeMeta};
pub use type_registry::{TypeRegistry, TypeRegistryArc};
pub use type_trait::TypeTrait;
