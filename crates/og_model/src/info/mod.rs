//! Static type descriptions.
//!
//! Every encodable type owns one `&'static` [`TypeInfo`], created lazily on
//! first access and never freed. The codec dispatches on it instead of on
//! the value, which is what lets it decode into a declared type before any
//! instance exists.

// -----------------------------------------------------------------------------
// Modules

mod cell;
mod kinds;
mod struct_info;

// -----------------------------------------------------------------------------
// Exports

pub use cell::{GenericTypeInfoCell, NonGenericTypeInfoCell};
pub use kinds::{ArrayInfo, EnumInfo, EnumVariant, OptionInfo, ScalarInfo, SharedInfo, StrInfo};
pub use struct_info::{ComputedInfo, FieldFlags, FieldInfo, StructInfo, TypeFlags};

use alloc::borrow::Cow;
use core::any::{Any, TypeId};
use core::fmt;

// -----------------------------------------------------------------------------
// Typed

/// Static access to a type's [`TypeInfo`].
///
/// Implemented by `#[derive(Graph)]` and by every built-in encodable type.
pub trait Typed: 'static {
    /// Returns the compile-time info for the underlying type.
    fn type_info() -> &'static TypeInfo;
}

// -----------------------------------------------------------------------------
// Type

/// The identity of a described type: its [`TypeId`], its wire name and its
/// Rust path for diagnostics.
#[derive(Clone)]
pub struct Type {
    id: TypeId,
    name: Cow<'static, str>,
    path: &'static str,
}

impl Type {
    /// Describes `T` under the given wire name.
    pub fn of<T: Any + ?Sized>(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: name.into(),
            path: core::any::type_name::<T>(),
        }
    }

    /// The [`TypeId`].
    #[inline]
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// The name written to the wire.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The full Rust type path.
    #[inline]
    pub const fn path(&self) -> &'static str {
        self.path
    }

    /// Returns `true` if this describes `T`.
    #[inline]
    pub fn is<T: Any + ?Sized>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)
    }
}

// -----------------------------------------------------------------------------
// TypeInfo

/// The kind of a [`TypeInfo`], without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar,
    Str,
    Enum,
    Struct,
    Array,
    Option,
    Shared,
}

/// Compile-time description of an encodable type.
#[derive(Debug)]
pub enum TypeInfo {
    Scalar(ScalarInfo),
    Str(StrInfo),
    Enum(EnumInfo),
    Struct(StructInfo),
    Array(ArrayInfo),
    Option(OptionInfo),
    Shared(SharedInfo),
}

macro_rules! impl_as_kind {
    ($($fn_name:ident => $variant:ident($info:ty),)*) => {
        $(
            #[doc = concat!("Returns the [`", stringify!($info), "`] if this is a `", stringify!($variant), "`.")]
            #[inline]
            pub const fn $fn_name(&self) -> Option<&$info> {
                match self {
                    Self::$variant(info) => Some(info),
                    _ => None,
                }
            }
        )*
    };
}

impl TypeInfo {
    /// The identity of the described type.
    pub const fn ty(&self) -> &Type {
        match self {
            Self::Scalar(info) => info.ty(),
            Self::Str(info) => info.ty(),
            Self::Enum(info) => info.ty(),
            Self::Struct(info) => info.ty(),
            Self::Array(info) => info.ty(),
            Self::Option(info) => info.ty(),
            Self::Shared(info) => info.ty(),
        }
    }

    /// The kind of this info.
    pub const fn kind(&self) -> TypeKind {
        match self {
            Self::Scalar(_) => TypeKind::Scalar,
            Self::Str(_) => TypeKind::Str,
            Self::Enum(_) => TypeKind::Enum,
            Self::Struct(_) => TypeKind::Struct,
            Self::Array(_) => TypeKind::Array,
            Self::Option(_) => TypeKind::Option,
            Self::Shared(_) => TypeKind::Shared,
        }
    }

    /// The [`TypeId`] of the described type.
    #[inline]
    pub const fn type_id(&self) -> TypeId {
        self.ty().id()
    }

    /// The name written to the wire.
    #[inline]
    pub fn type_name(&self) -> &str {
        self.ty().name()
    }

    /// The full Rust type path.
    #[inline]
    pub const fn type_path(&self) -> &'static str {
        self.ty().path()
    }

    /// Returns `true` if this describes `T`.
    #[inline]
    pub fn is<T: Any + ?Sized>(&self) -> bool {
        self.ty().is::<T>()
    }

    /// Returns `true` if the concrete runtime type of a value declared with
    /// this type cannot be known from the declaration alone.
    pub fn is_polymorphic(&self) -> bool {
        matches!(self, Self::Shared(info) if info.is_polymorphic())
    }

    /// Follows `Option` layers to the type that actually carries data.
    pub fn unwrap_optional(&'static self) -> &'static TypeInfo {
        let mut info = self;
        while let Self::Option(option) = info {
            info = option.inner();
        }
        info
    }

    impl_as_kind! {
        as_scalar => Scalar(ScalarInfo),
        as_str => Str(StrInfo),
        as_enum => Enum(EnumInfo),
        as_struct => Struct(StructInfo),
        as_array => Array(ArrayInfo),
        as_option => Option(OptionInfo),
        as_shared => Shared(SharedInfo),
    }
}
