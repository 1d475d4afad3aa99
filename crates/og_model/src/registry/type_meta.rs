use alloc::boxed::Box;
use core::any::TypeId;
use core::fmt;

use og_utils::TypeIdMap;

use crate::info::{TypeInfo, Typed};
use crate::registry::{TypeRegistry, TypeTrait};

// -----------------------------------------------------------------------------
// TypeMeta

/// What the registry keeps per type: the [`TypeInfo`] plus a table of
/// [`TypeTrait`]s keyed by the trait's own type.
///
/// Built by [`GetTypeMeta`], which `#[derive(Graph)]` implements.
///
/// # Example
///
/// ```
/// # use og_model::registry::{TypeMeta, TypeTraitDefault, FromType};
/// let mut meta = TypeMeta::of::<String>();
/// meta.insert_trait::<TypeTraitDefault>(FromType::<String>::from_type());
///
/// let f = meta.get_trait::<TypeTraitDefault>().unwrap();
/// assert_eq!(f.default().take::<String>().unwrap(), "");
/// ```
pub struct TypeMeta {
    type_info: &'static TypeInfo,
    trait_table: TypeIdMap<Box<dyn TypeTrait>>,
}

impl TypeMeta {
    /// A meta for `T` without type traits.
    #[inline]
    pub fn of<T: Typed>() -> Self {
        Self {
            type_info: T::type_info(),
            trait_table: TypeIdMap::new(),
        }
    }

    #[inline]
    pub fn with_capacity<T: Typed>(capacity: usize) -> Self {
        Self {
            type_info: T::type_info(),
            trait_table: TypeIdMap::with_capacity(capacity),
        }
    }

    #[inline]
    pub const fn type_info(&self) -> &'static TypeInfo {
        self.type_info
    }

    #[inline]
    pub const fn type_id(&self) -> TypeId {
        self.type_info.type_id()
    }

    /// The wire name of the described type.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_info.type_name()
    }

    /// Stores `data`, replacing a previous trait of the same type.
    pub fn insert_trait<T: TypeTrait>(&mut self, data: T) {
        self.trait_table.insert(TypeId::of::<T>(), Box::new(data));
    }

    pub fn get_trait<T: TypeTrait>(&self) -> Option<&T> {
        let type_trait: &dyn TypeTrait = &**self.trait_table.get(&TypeId::of::<T>())?;
        type_trait.downcast_ref::<T>()
    }

    #[inline]
    pub fn has_trait<T: TypeTrait>(&self) -> bool {
        self.trait_table.contains(&TypeId::of::<T>())
    }

    #[inline]
    pub fn trait_len(&self) -> usize {
        self.trait_table.len()
    }
}

impl Clone for TypeMeta {
    fn clone(&self) -> Self {
        let mut trait_table = TypeIdMap::with_capacity(self.trait_len());
        for (id, type_trait) in self.trait_table.iter() {
            trait_table.insert(*id, (**type_trait).clone_type_trait());
        }
        Self {
            type_info: self.type_info,
            trait_table,
        }
    }
}

impl fmt::Debug for TypeMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMeta")
            .field("type_info", &self.type_info)
            .field("trait_len", &self.trait_len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// GetTypeMeta

/// Produces the [`TypeMeta`] of a type for registration into the
/// [`TypeRegistry`].
///
/// Implemented by `#[derive(Graph)]` and by every built-in encodable type.
///
/// ```
/// use og_model::derive::Graph;
/// use og_model::registry::{GetTypeMeta, TypeTraitShared};
///
/// #[derive(Graph, Default)]
/// struct Account {
///     id: u64,
/// }
///
/// let meta = Account::get_type_meta();
/// assert!(meta.has_trait::<TypeTraitShared>());
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `GetTypeMeta` so cannot provide type registration information",
    note = "consider annotating `{Self}` with `#[derive(Graph)]`"
)]
pub trait GetTypeMeta: Typed {
    /// Returns the default [`TypeMeta`] of this type.
    fn get_type_meta() -> TypeMeta;

    /// Registers the types this type depends on.
    fn register_dependencies(_registry: &mut TypeRegistry) {}
}
