use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use bitflags::bitflags;

use crate::info::{Type, TypeInfo, Typed};
use crate::{Graph, Record};

bitflags! {
    /// Markers declared on a single field.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FieldFlags: u8 {
        /// `#[graph(skip)]`: never written, never read.
        const SKIP = 1 << 0;
        /// `#[graph(optional)]`: exempt from the completeness check.
        const OPTIONAL = 1 << 1;
        /// `#[graph(ignore_specializations)]`: treat the field type as closed.
        const IGNORE_SPECIALIZATIONS = 1 << 2;
        /// `#[graph(base)]`: an embedded base record whose members are inherited.
        const BASE = 1 << 3;
        /// Raw pointer, `NonNull` or function pointer.
        const POINTER_LIKE = 1 << 4;
    }
}

bitflags! {
    /// Markers declared on a record type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u8 {
        /// `#[graph(error_base)]`: pointer-like fields declared here are excluded.
        const ERROR_BASE = 1 << 0;
    }
}

// -----------------------------------------------------------------------------
// FieldInfo

/// A declared field of a record.
#[derive(Clone)]
pub struct FieldInfo {
    name: &'static str,
    wire_name: &'static str,
    index: usize,
    flags: FieldFlags,
    type_info: Option<fn() -> &'static TypeInfo>,
}

impl FieldInfo {
    /// A field of type `T` at `index`.
    pub fn new<T: Typed>(index: usize, name: &'static str) -> Self {
        Self {
            name,
            wire_name: name,
            index,
            flags: FieldFlags::empty(),
            type_info: Some(T::type_info),
        }
    }

    /// A `#[graph(skip)]` field, whose type need not be encodable.
    pub const fn skipped(index: usize, name: &'static str) -> Self {
        Self {
            name,
            wire_name: name,
            index,
            flags: FieldFlags::SKIP,
            type_info: None,
        }
    }

    /// A pointer-like field.
    pub const fn pointer_like(index: usize, name: &'static str) -> Self {
        Self {
            name,
            wire_name: name,
            index,
            flags: FieldFlags::POINTER_LIKE,
            type_info: None,
        }
    }

    /// Adds markers.
    pub const fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }

    /// Overrides the wire name.
    pub const fn with_wire_name(mut self, wire_name: &'static str) -> Self {
        self.wire_name = wire_name;
        self
    }

    /// The Rust field name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The name written to the wire.
    #[inline]
    pub const fn wire_name(&self) -> &'static str {
        self.wire_name
    }

    /// Position among all declared fields.
    #[inline]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The declared markers.
    #[inline]
    pub const fn flags(&self) -> FieldFlags {
        self.flags
    }

    /// Shorthand for `flags().contains(flag)`.
    #[inline]
    pub const fn has(&self, flag: FieldFlags) -> bool {
        self.flags.contains(flag)
    }

    /// The declared type, `None` for skipped and pointer-like fields.
    #[inline]
    pub fn type_info(&self) -> Option<&'static TypeInfo> {
        self.type_info.map(|f| f())
    }
}

impl fmt::Debug for FieldInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInfo")
            .field("name", &self.name)
            .field("wire_name", &self.wire_name)
            .field("index", &self.index)
            .field("flags", &self.flags)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// ComputedInfo

/// A deprecated-with-compatibility computed member.
///
/// It is written under its former name `name` using `get`, so that readers
/// built against an older shape still find it. On read, data under that
/// name is passed to `set` when a `replacement` field is declared, and the
/// replacement then counts as set.
#[derive(Clone)]
pub struct ComputedInfo {
    name: &'static str,
    type_info: fn() -> &'static TypeInfo,
    get: fn(&dyn Record) -> Option<Box<dyn Graph>>,
    set: fn(&mut dyn Record, Box<dyn Graph>) -> Result<(), Box<dyn Graph>>,
    replacement: Option<&'static str>,
}

impl ComputedInfo {
    /// A computed member of type `T`.
    pub fn new<T: Typed>(
        name: &'static str,
        get: fn(&dyn Record) -> Option<Box<dyn Graph>>,
        set: fn(&mut dyn Record, Box<dyn Graph>) -> Result<(), Box<dyn Graph>>,
    ) -> Self {
        Self {
            name,
            type_info: T::type_info,
            get,
            set,
            replacement: None,
        }
    }

    /// Names the field that this member stands in for.
    pub const fn with_replacement(mut self, replacement: &'static str) -> Self {
        self.replacement = Some(replacement);
        self
    }

    /// The former member name.
    #[inline]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The declared type.
    #[inline]
    pub fn type_info(&self) -> &'static TypeInfo {
        (self.type_info)()
    }

    /// The replacement field name, if declared.
    #[inline]
    pub const fn replacement(&self) -> Option<&'static str> {
        self.replacement
    }

    /// Computes the value from `record`.
    #[inline]
    pub fn get(&self, record: &dyn Record) -> Option<Box<dyn Graph>> {
        (self.get)(record)
    }

    /// Passes a decoded value to the setter.
    #[inline]
    pub fn set(&self, record: &mut dyn Record, value: Box<dyn Graph>) -> Result<(), Box<dyn Graph>> {
        (self.set)(record, value)
    }
}

impl fmt::Debug for ComputedInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedInfo")
            .field("name", &self.name)
            .field("replacement", &self.replacement)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// StructInfo

/// Info for records.
pub struct StructInfo {
    ty: Type,
    fields: Box<[FieldInfo]>,
    computed: Box<[ComputedInfo]>,
    flags: TypeFlags,
    base: Option<usize>,
    construct: fn() -> Box<dyn Graph>,
}

impl StructInfo {
    /// Describes the record `T`, built from `T::default()` on decode.
    pub fn new<T: Any + Default + Graph>(
        name: impl Into<Cow<'static, str>>,
        fields: Vec<FieldInfo>,
    ) -> Self {
        let base = fields.iter().position(|f| f.has(FieldFlags::BASE));
        Self {
            ty: Type::of::<T>(name),
            fields: fields.into_boxed_slice(),
            computed: Box::new([]),
            flags: TypeFlags::empty(),
            base,
            construct: || Box::new(T::default()),
        }
    }

    /// Adds computed members.
    pub fn with_computed(mut self, computed: Vec<ComputedInfo>) -> Self {
        self.computed = computed.into_boxed_slice();
        self
    }

    /// Adds type markers.
    pub const fn with_flags(mut self, flags: TypeFlags) -> Self {
        self.flags = self.flags.union(flags);
        self
    }

    /// The identity of the described type.
    #[inline]
    pub const fn ty(&self) -> &Type {
        &self.ty
    }

    /// The name written to the wire.
    #[inline]
    pub fn type_name(&self) -> &str {
        self.ty.name()
    }

    /// Every declared field, in declaration order.
    #[inline]
    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    /// Number of declared fields.
    #[inline]
    pub fn field_len(&self) -> usize {
        self.fields.len()
    }

    /// The field with the given Rust name.
    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Deprecated computed members.
    #[inline]
    pub fn computed(&self) -> &[ComputedInfo] {
        &self.computed
    }

    /// The declared markers.
    #[inline]
    pub const fn flags(&self) -> TypeFlags {
        self.flags
    }

    /// Returns `true` for `#[graph(error_base)]` types.
    #[inline]
    pub const fn is_error_base(&self) -> bool {
        self.flags.contains(TypeFlags::ERROR_BASE)
    }

    /// Index of the `#[graph(base)]` field.
    #[inline]
    pub const fn base_index(&self) -> Option<usize> {
        self.base
    }

    /// The info of the embedded base record.
    pub fn base(&self) -> Option<&'static StructInfo> {
        let field = &self.fields[self.base?];
        field.type_info()?.as_struct()
    }

    /// Returns `true` if a member named `wire_name` is declared directly on
    /// this type, not counting inherited members.
    pub fn declares(&self, wire_name: &str) -> bool {
        self.fields
            .iter()
            .any(|f| !f.has(FieldFlags::BASE) && f.wire_name == wire_name)
            || self.computed.iter().any(|c| c.name == wire_name)
    }

    /// A default instance.
    #[inline]
    pub fn construct(&self) -> Box<dyn Graph> {
        (self.construct)()
    }
}

impl fmt::Debug for StructInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructInfo")
            .field("ty", &self.ty)
            .field("fields", &self.fields)
            .field("computed", &self.computed)
            .field("flags", &self.flags)
            .finish()
    }
}
