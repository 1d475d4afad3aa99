//! Member layout analysis.
//!
//! A [`MemberLayout`] is the ordered list of members that take part in the
//! encoding of a record type, with inherited members first. It is computed
//! once per type from the static [`StructInfo`] and shared through a
//! [`LayoutCache`].
//!
//! Each declared member is classified as:
//!
//! - ordinary: written, read, and mandatory on read;
//! - optional-on-read: written and read, but exempt from the completeness check;
//! - excluded: never written, never read;
//! - deprecated: a computed member written under its former name.

use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::format;
use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::{PoisonError, RwLock};

use fixedbitset::FixedBitSet;
use og_utils::TypeIdMap;
use og_utils::hash::{FixedHashState, HashMap};

use crate::info::{ComputedInfo, FieldFlags, FieldInfo, StructInfo, TypeInfo};
use crate::{Graph, ModelError, Record, UnsupportedReason};

// -----------------------------------------------------------------------------
// MemberClass

/// How a declared member takes part in encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberClass {
    Ordinary,
    OptionalOnRead,
    Excluded,
    Deprecated {
        former: &'static str,
        replacement: Option<&'static str>,
    },
}

/// Classifies a field declared on `owner`.
///
/// Pointer-like fields are excluded on `#[graph(error_base)]` types and
/// rejected everywhere else.
pub fn classify_field(owner: &StructInfo, field: &FieldInfo) -> Result<MemberClass, ModelError> {
    if field.has(FieldFlags::POINTER_LIKE) {
        if owner.is_error_base() {
            return Ok(MemberClass::Excluded);
        }
        return Err(ModelError::UnsupportedMember {
            type_name: Cow::Owned(owner.type_name().into()),
            member: field.name(),
            reason: UnsupportedReason::PointerLike,
        });
    }
    if field.has(FieldFlags::SKIP) {
        Ok(MemberClass::Excluded)
    } else if field.has(FieldFlags::OPTIONAL) {
        Ok(MemberClass::OptionalOnRead)
    } else {
        Ok(MemberClass::Ordinary)
    }
}

// -----------------------------------------------------------------------------
// MemberDescriptor

/// What a member reads from and writes to.
#[derive(Debug, Clone, Copy)]
pub enum MemberKind {
    /// A stored field.
    Field(&'static FieldInfo),
    /// A deprecated computed member. `replacement` is the layout index of
    /// the field it stands in for.
    Deprecated {
        computed: &'static ComputedInfo,
        replacement: Option<usize>,
    },
}

/// A member value fetched for encoding.
pub enum MemberValue<'a> {
    Borrowed(&'a dyn Graph),
    Computed(Box<dyn Graph>),
}

impl MemberValue<'_> {
    /// The value, whichever way it was produced.
    #[inline]
    pub fn as_graph(&self) -> &dyn Graph {
        match self {
            Self::Borrowed(value) => *value,
            Self::Computed(value) => &**value,
        }
    }
}

/// One member of a [`MemberLayout`].
#[derive(Debug, Clone)]
pub struct MemberDescriptor {
    owner: &'static StructInfo,
    depth: usize,
    wire_name: &'static str,
    kind: MemberKind,
    optional: bool,
}

impl MemberDescriptor {
    /// The record type that declares the member.
    #[inline]
    pub const fn owner(&self) -> &'static StructInfo {
        self.owner
    }

    /// Number of base links from the analysed type to the owner.
    #[inline]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// The unique name used on the wire.
    #[inline]
    pub const fn wire_name(&self) -> &'static str {
        self.wire_name
    }

    #[inline]
    pub const fn kind(&self) -> MemberKind {
        self.kind
    }

    /// The member's classification.
    pub fn class(&self) -> MemberClass {
        match self.kind {
            MemberKind::Field(_) if self.optional => MemberClass::OptionalOnRead,
            MemberKind::Field(_) => MemberClass::Ordinary,
            MemberKind::Deprecated { computed, .. } => MemberClass::Deprecated {
                former: computed.name(),
                replacement: computed.replacement(),
            },
        }
    }

    /// Returns `true` if the member must be present on read.
    #[inline]
    pub fn is_mandatory(&self) -> bool {
        matches!(self.kind, MemberKind::Field(_)) && !self.optional
    }

    /// The declared type of the member.
    pub fn type_info(&self) -> Option<&'static TypeInfo> {
        match self.kind {
            MemberKind::Field(field) => field.type_info(),
            MemberKind::Deprecated { computed, .. } => Some(computed.type_info()),
        }
    }

    /// Returns `true` if the field carries `#[graph(ignore_specializations)]`.
    pub fn ignores_specializations(&self) -> bool {
        matches!(self.kind, MemberKind::Field(f) if f.has(FieldFlags::IGNORE_SPECIALIZATIONS))
    }

    /// Fetches the member from the analysed record.
    pub fn get<'r>(&self, record: &'r dyn Record) -> Option<MemberValue<'r>> {
        let owner = record.ancestor(self.depth)?;
        match self.kind {
            MemberKind::Field(field) => owner.field_at(field.index()).map(MemberValue::Borrowed),
            MemberKind::Deprecated { computed, .. } => {
                computed.get(owner).map(MemberValue::Computed)
            }
        }
    }

    /// Stores a decoded value into the analysed record.
    ///
    /// The value is handed back if its type does not fit.
    pub fn set(&self, record: &mut dyn Record, value: Box<dyn Graph>) -> Result<(), Box<dyn Graph>> {
        let Some(owner) = record.ancestor_mut(self.depth) else {
            return Err(value);
        };
        match self.kind {
            MemberKind::Field(field) => owner.set_field_at(field.index(), value),
            MemberKind::Deprecated { computed, .. } => computed.set(owner, value),
        }
    }
}

// -----------------------------------------------------------------------------
// MemberLayout

/// The ordered members of a record type.
#[derive(Debug)]
pub struct MemberLayout {
    info: &'static StructInfo,
    members: Box<[MemberDescriptor]>,
    lookup: HashMap<&'static str, usize>,
    mandatory: FixedBitSet,
    excluded: Box<[&'static str]>,
}

impl MemberLayout {
    /// Analyses `info` and its base chain.
    pub fn analyze(info: &'static StructInfo) -> Result<Self, ModelError> {
        let mut chain = Vec::new();
        let mut current = Some(info);
        while let Some(ty) = current {
            chain.push(ty);
            current = ty.base();
        }

        let mut members: Vec<MemberDescriptor> = Vec::new();
        let mut excluded = Vec::new();

        for depth in (0..chain.len()).rev() {
            let owner = chain[depth];
            let shadowed = |name: &str| chain[..depth].iter().any(|t| t.declares(name));
            let start = members.len();

            for field in owner.fields() {
                if field.has(FieldFlags::BASE) {
                    continue;
                }
                let optional = match classify_field(owner, field)? {
                    MemberClass::Excluded => {
                        excluded.push(field.name());
                        continue;
                    }
                    MemberClass::OptionalOnRead => true,
                    _ => false,
                };
                members.push(MemberDescriptor {
                    owner,
                    depth,
                    wire_name: qualify(owner, field.wire_name(), shadowed(field.wire_name())),
                    kind: MemberKind::Field(field),
                    optional,
                });
            }

            for computed in owner.computed() {
                let replacement = match computed.replacement() {
                    None => None,
                    Some(name) => Some(
                        members[start..]
                            .iter()
                            .position(|m| {
                                matches!(m.kind, MemberKind::Field(f) if f.name() == name || f.wire_name() == name)
                            })
                            .map(|i| start + i)
                            .ok_or_else(|| ModelError::UnresolvedReplacement {
                                type_name: Cow::Owned(owner.type_name().into()),
                                member: computed.name(),
                                replacement: name,
                            })?,
                    ),
                };
                members.push(MemberDescriptor {
                    owner,
                    depth,
                    wire_name: qualify(owner, computed.name(), shadowed(computed.name())),
                    kind: MemberKind::Deprecated {
                        computed,
                        replacement,
                    },
                    optional: true,
                });
            }
        }

        let mut lookup = HashMap::with_capacity_and_hasher(members.len(), FixedHashState);
        let mut mandatory = FixedBitSet::with_capacity(members.len());
        for (index, member) in members.iter().enumerate() {
            if lookup.insert(member.wire_name, index).is_some() {
                return Err(ModelError::DuplicateMember {
                    type_name: Cow::Owned(info.type_name().into()),
                    member: Cow::Borrowed(member.wire_name),
                });
            }
            mandatory.set(index, member.is_mandatory());
        }

        log::debug!(
            "analysed member layout of `{}`: {} members, {} excluded",
            info.type_name(),
            members.len(),
            excluded.len(),
        );

        Ok(Self {
            info,
            members: members.into_boxed_slice(),
            lookup,
            mandatory,
            excluded: excluded.into_boxed_slice(),
        })
    }

    /// The analysed type.
    #[inline]
    pub const fn info(&self) -> &'static StructInfo {
        self.info
    }

    /// The members in encoding order.
    #[inline]
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// The number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if nothing is encoded for this type.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The member at `index`.
    #[inline]
    pub fn member(&self, index: usize) -> &MemberDescriptor {
        &self.members[index]
    }

    /// Resolves a wire name to a member index.
    #[inline]
    pub fn find(&self, wire_name: &str) -> Option<usize> {
        self.lookup.get(wire_name).copied()
    }

    /// Indices of the members that must be present on read.
    #[inline]
    pub fn mandatory(&self) -> &FixedBitSet {
        &self.mandatory
    }

    /// Names of the excluded fields.
    #[inline]
    pub fn excluded(&self) -> &[&'static str] {
        &self.excluded
    }
}

// Qualified names live as long as the layouts that use them, which is the
// process lifetime for every cached layout.
fn qualify(owner: &StructInfo, name: &'static str, shadowed: bool) -> &'static str {
    if shadowed {
        Box::leak(format!("{}.{}", owner.type_name(), name).into_boxed_str())
    } else {
        name
    }
}

// -----------------------------------------------------------------------------
// LayoutCache

/// A shared cache of analysed layouts, keyed by type.
///
/// Both successful layouts and analysis errors are cached. When two
/// threads analyse the same type, the first insertion wins.
#[derive(Clone, Default)]
pub struct LayoutCache {
    inner: Arc<RwLock<TypeIdMap<Result<Arc<MemberLayout>, ModelError>>>>,
}

impl LayoutCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the layout of `info`, analysing it on first use.
    pub fn get(&self, info: &'static StructInfo) -> Result<Arc<MemberLayout>, ModelError> {
        let type_id = info.ty().id();
        let cached = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&type_id)
            .cloned();
        if let Some(result) = cached {
            return result;
        }

        let analysed = MemberLayout::analyze(info).map(Arc::new);
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_or_insert(type_id, || analysed)
            .clone()
    }

    /// Returns the layout of the record type described by `info`.
    pub fn get_for(&self, info: &'static TypeInfo) -> Result<Arc<MemberLayout>, ModelError> {
        match info.as_struct() {
            Some(info) => self.get(info),
            None => Err(ModelError::NotARecord {
                type_name: Cow::Owned(info.type_name().into()),
            }),
        }
    }

    /// The number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns `true` if nothing has been analysed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl core::fmt::Debug for LayoutCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LayoutCache").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests;
