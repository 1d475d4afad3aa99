use core::time::Duration;
use std::time::SystemTime;

use crate::info::{NonGenericTypeInfoCell, ScalarInfo, TypeInfo, Typed};
use crate::registry::{FromType, GetTypeMeta, TypeMeta, TypeTraitDefault};
use crate::value::{Decimal, Scalar, ScalarKind};
use crate::{Graph, GraphRef};

macro_rules! impl_scalar {
    ($($ty:ty => $kind:ident,)*) => {$(
        impl Typed for $ty {
            fn type_info() -> &'static TypeInfo {
                static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| TypeInfo::Scalar(ScalarInfo::new::<Self>(ScalarKind::$kind)))
            }
        }

        impl Graph for $ty {
            #[inline]
            fn graph_info(&self) -> &'static TypeInfo {
                <Self as Typed>::type_info()
            }

            #[inline]
            fn graph_ref(&self) -> GraphRef<'_> {
                GraphRef::Scalar(Scalar::$kind(*self))
            }
        }
    )*};
}

macro_rules! impl_default_meta {
    ($($ty:ty),*) => {$(
        impl GetTypeMeta for $ty {
            fn get_type_meta() -> TypeMeta {
                let mut meta = TypeMeta::with_capacity::<Self>(1);
                meta.insert_trait::<TypeTraitDefault>(FromType::<Self>::from_type());
                meta
            }
        }
    )*};
}

impl_scalar! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    i128 => I128,
    u128 => U128,
    isize => Isize,
    usize => Usize,
    f32 => F32,
    f64 => F64,
    char => Char,
    Decimal => Decimal,
    Duration => Duration,
    SystemTime => Timestamp,
}

impl_default_meta!(
    bool, i8, u8, i16, u16, i32, u32, i64, u64, i128, u128, isize, usize, f32, f64, char,
    Decimal, Duration
);

// No `Default`, so no default constructor is registered.
impl GetTypeMeta for SystemTime {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>()
    }
}
