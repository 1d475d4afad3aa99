use alloc::boxed::Box;
use alloc::borrow::Cow;
use core::any::Any;
use core::fmt;

use crate::info::{Type, TypeInfo};
use crate::value::ScalarKind;
use crate::{ArrayBuilder, Graph, SharedSlot};

// -----------------------------------------------------------------------------
// ScalarInfo

/// Info for fixed-width scalar types.
#[derive(Debug)]
pub struct ScalarInfo {
    ty: Type,
    kind: ScalarKind,
}

impl ScalarInfo {
    /// Describes `T`, named after its scalar kind.
    pub fn new<T: Any>(kind: ScalarKind) -> Self {
        Self {
            ty: Type::of::<T>(kind.name()),
            kind,
        }
    }

    /// The identity of the described type.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// The wire scalar kind.
    #[inline]
    pub const fn kind(&self) -> ScalarKind {
        self.kind
    }
}

// -----------------------------------------------------------------------------
// StrInfo

/// Info for string types.
#[derive(Debug)]
pub struct StrInfo {
    ty: Type,
}

impl StrInfo {
    /// Describes `T` as a string.
    pub fn new<T: Any>() -> Self {
        Self {
            ty: Type::of::<T>("String"),
        }
    }

    /// The identity of the described type.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }
}

// -----------------------------------------------------------------------------
// EnumInfo

/// One variant of a field-less enum.
#[derive(Debug, Clone, Copy)]
pub struct EnumVariant {
    pub name: &'static str,
    pub discriminant: i128,
}

/// Info for field-less enums, encoded as their integer representation.
pub struct EnumInfo {
    ty: Type,
    repr: ScalarKind,
    variants: &'static [EnumVariant],
    from_discriminant: fn(i128) -> Option<Box<dyn Graph>>,
}

impl EnumInfo {
    /// Describes the enum `T` with the given `repr` and variants.
    pub fn new<T: Any>(
        name: impl Into<Cow<'static, str>>,
        repr: ScalarKind,
        variants: &'static [EnumVariant],
        from_discriminant: fn(i128) -> Option<Box<dyn Graph>>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(name),
            repr,
            variants,
            from_discriminant,
        }
    }

    /// The identity of the described type.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// The integer kind used on the wire.
    #[inline]
    pub const fn repr(&self) -> ScalarKind {
        self.repr
    }

    /// The declared variants.
    #[inline]
    pub const fn variants(&self) -> &'static [EnumVariant] {
        self.variants
    }

    /// Builds the variant with the given discriminant.
    #[inline]
    pub fn from_discriminant(&self, discriminant: i128) -> Option<Box<dyn Graph>> {
        (self.from_discriminant)(discriminant)
    }
}

impl fmt::Debug for EnumInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumInfo")
            .field("ty", &self.ty)
            .field("repr", &self.repr)
            .field("variants", &self.variants)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ArrayInfo

/// Info for one-dimensional arrays.
pub struct ArrayInfo {
    ty: Type,
    item: fn() -> &'static TypeInfo,
    builder: fn(usize) -> Box<dyn ArrayBuilder>,
}

impl ArrayInfo {
    /// Describes the array type `T`.
    pub fn new<T: Any>(
        name: impl Into<Cow<'static, str>>,
        item: fn() -> &'static TypeInfo,
        builder: fn(usize) -> Box<dyn ArrayBuilder>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(name),
            item,
            builder,
        }
    }

    /// The identity of the described type.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// The declared element type.
    #[inline]
    pub fn item(&self) -> &'static TypeInfo {
        (self.item)()
    }

    /// A builder for an array of `capacity` elements.
    #[inline]
    pub fn builder(&self, capacity: usize) -> Box<dyn ArrayBuilder> {
        (self.builder)(capacity)
    }
}

impl fmt::Debug for ArrayInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayInfo").field("ty", &self.ty).finish()
    }
}

// -----------------------------------------------------------------------------
// OptionInfo

/// Info for `Option<T>`.
pub struct OptionInfo {
    ty: Type,
    inner: fn() -> &'static TypeInfo,
    none: fn() -> Box<dyn Graph>,
    some: fn(Box<dyn Graph>) -> Result<Box<dyn Graph>, Box<dyn Graph>>,
}

impl OptionInfo {
    /// Describes the optional type `T`.
    pub fn new<T: Any>(
        name: impl Into<Cow<'static, str>>,
        inner: fn() -> &'static TypeInfo,
        none: fn() -> Box<dyn Graph>,
        some: fn(Box<dyn Graph>) -> Result<Box<dyn Graph>, Box<dyn Graph>>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(name),
            inner,
            none,
            some,
        }
    }

    /// The identity of the described type.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// The wrapped type.
    #[inline]
    pub fn inner(&self) -> &'static TypeInfo {
        (self.inner)()
    }

    /// A boxed `None`.
    #[inline]
    pub fn none(&self) -> Box<dyn Graph> {
        (self.none)()
    }

    /// Wraps a value of the inner type in `Some`, handing it back on mismatch.
    #[inline]
    pub fn some(&self, value: Box<dyn Graph>) -> Result<Box<dyn Graph>, Box<dyn Graph>> {
        (self.some)(value)
    }
}

impl fmt::Debug for OptionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionInfo").field("ty", &self.ty).finish()
    }
}

// -----------------------------------------------------------------------------
// SharedInfo

/// Info for reference-semantics handles.
///
/// A handle to a concrete record type knows how to create its target.
/// A polymorphic handle (`Rc<RefCell<dyn Record>>`) does not: its target
/// is resolved by wire name through the registry.
pub struct SharedInfo {
    ty: Type,
    target: Option<fn() -> &'static TypeInfo>,
    new_slot: Option<fn() -> SharedSlot>,
    from_slot: fn(&SharedSlot) -> Option<Box<dyn Graph>>,
}

impl SharedInfo {
    /// Describes a handle to the concrete record `target`.
    pub fn new<T: Any>(
        name: impl Into<Cow<'static, str>>,
        target: fn() -> &'static TypeInfo,
        new_slot: fn() -> SharedSlot,
        from_slot: fn(&SharedSlot) -> Option<Box<dyn Graph>>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(name),
            target: Some(target),
            new_slot: Some(new_slot),
            from_slot,
        }
    }

    /// Describes a polymorphic handle.
    pub fn polymorphic<T: Any>(
        name: impl Into<Cow<'static, str>>,
        from_slot: fn(&SharedSlot) -> Option<Box<dyn Graph>>,
    ) -> Self {
        Self {
            ty: Type::of::<T>(name),
            target: None,
            new_slot: None,
            from_slot,
        }
    }

    /// The identity of the described type.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// Returns `true` if the target type is only known at runtime.
    #[inline]
    pub const fn is_polymorphic(&self) -> bool {
        self.target.is_none()
    }

    /// The declared target record, `None` when polymorphic.
    #[inline]
    pub fn target(&self) -> Option<&'static TypeInfo> {
        self.target.map(|f| f())
    }

    /// Creates a default instance of the target in a fresh allocation.
    #[inline]
    pub fn new_slot(&self) -> Option<SharedSlot> {
        self.new_slot.map(|f| f())
    }

    /// Builds a handle of this type from a slot, `None` on type mismatch.
    #[inline]
    pub fn from_slot(&self, slot: &SharedSlot) -> Option<Box<dyn Graph>> {
        (self.from_slot)(slot)
    }
}

impl fmt::Debug for SharedInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedInfo")
            .field("ty", &self.ty)
            .field("polymorphic", &self.is_polymorphic())
            .finish()
    }
}
