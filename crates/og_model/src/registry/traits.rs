use alloc::boxed::Box;

use crate::info::Typed;
use crate::registry::FromType;
use crate::{Graph, Record, SharedSlot};

/// Creates a boxed default value of a registered type.
///
/// # Examples
///
/// ```
/// use og_model::registry::{TypeRegistry, TypeTraitDefault};
///
/// let registry = TypeRegistry::new();
///
/// let generator = registry
///     .get_with_type_name("String").unwrap()
///     .get_trait::<TypeTraitDefault>().unwrap();
///
/// assert_eq!(generator.default().take::<String>().unwrap(), "");
/// ```
#[derive(Clone)]
pub struct TypeTraitDefault {
    func: fn() -> Box<dyn Graph>,
}

impl TypeTraitDefault {
    /// Calls the type's [`Default`].
    #[inline(always)]
    pub fn default(&self) -> Box<dyn Graph> {
        (self.func)()
    }
}

impl<T: Default + Typed + Graph> FromType<T> for TypeTraitDefault {
    fn from_type() -> Self {
        Self {
            func: || Box::<T>::default(),
        }
    }
}

/// Creates a default record of a registered type inside a new shared slot.
///
/// This is how the decoder instantiates the concrete type behind a
/// polymorphic member.
#[derive(Clone)]
pub struct TypeTraitShared {
    func: fn() -> SharedSlot,
}

impl TypeTraitShared {
    /// Allocates a fresh default instance.
    #[inline]
    pub fn new_slot(&self) -> SharedSlot {
        (self.func)()
    }
}

impl<T: Default + Typed + Record> FromType<T> for TypeTraitShared {
    fn from_type() -> Self {
        Self {
            func: || SharedSlot::new(T::default()),
        }
    }
}
