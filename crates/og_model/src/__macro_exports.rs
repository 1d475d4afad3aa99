//! Items referenced by `#[derive(Graph)]` output. Not public API.

#![doc(hidden)]

pub use alloc::boxed::Box;
pub use alloc::vec::Vec;

use crate::Graph;
use crate::info::{StructInfo, TypeInfo};

/// The [`StructInfo`] inside a derived record's [`TypeInfo`].
#[inline]
pub fn struct_info_of(info: &'static TypeInfo) -> &'static StructInfo {
    match info {
        TypeInfo::Struct(info) => info,
        _ => unreachable!("derived records always carry struct info"),
    }
}

/// Moves a decoded value into a field of type `T`, handing it back on mismatch.
#[inline]
pub fn assign<T: Graph>(slot: &mut T, value: Box<dyn Graph>) -> Result<(), Box<dyn Graph>> {
    *slot = value.take::<T>()?;
    Ok(())
}

#[cfg(feature = "auto_register")]
pub mod auto_register {
    pub use inventory;

    use crate::registry::{GetTypeMeta, TypeRegistry};

    /// An entry submitted by `#[graph(auto_register)]`.
    pub struct __AutoRegisterFunc(pub fn(&mut TypeRegistry));

    inventory::collect!(__AutoRegisterFunc);

    /// Blanket registration hook used by generated submissions.
    pub trait __RegisterType {
        fn __register(registry: &mut TypeRegistry);
    }

    impl<T: GetTypeMeta> __RegisterType for T {
        #[inline]
        fn __register(registry: &mut TypeRegistry) {
            registry.register::<T>();
        }
    }

    /// Registered by this crate itself, so its presence after
    /// [`__register_types`] proves that `inventory` works on this platform.
    #[derive(crate::derive::Graph, Default)]
    pub struct __AvailFlag;

    inventory::submit! {
        __AutoRegisterFunc(<__AvailFlag as __RegisterType>::__register)
    }

    pub fn __register_types(registry: &mut TypeRegistry) {
        for func in inventory::iter::<__AutoRegisterFunc> {
            (func.0)(registry);
        }
    }
}
