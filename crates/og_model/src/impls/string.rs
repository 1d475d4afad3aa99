use alloc::string::String;

use crate::info::{NonGenericTypeInfoCell, StrInfo, TypeInfo, Typed};
use crate::registry::{FromType, GetTypeMeta, TypeMeta, TypeTraitDefault};
use crate::{Graph, GraphRef};

impl Typed for String {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Str(StrInfo::new::<Self>()))
    }
}

impl Graph for String {
    #[inline]
    fn graph_info(&self) -> &'static TypeInfo {
        <Self as Typed>::type_info()
    }

    #[inline]
    fn graph_ref(&self) -> GraphRef<'_> {
        GraphRef::Str(self)
    }
}

impl GetTypeMeta for String {
    fn get_type_meta() -> TypeMeta {
        let mut meta = TypeMeta::with_capacity::<Self>(1);
        meta.insert_trait::<TypeTraitDefault>(FromType::<Self>::from_type());
        meta
    }
}
