use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::TypeId;
use std::sync::{PoisonError, RwLock};

use og_model::info::{StructInfo, TypeInfo};
use og_model::layout::LayoutCache;
use og_model::{Graph, GraphRef, ModelError, UnsupportedReason};
use og_utils::hash::HashSet;

use super::{Maps, Routine};
use crate::error::CodecError;
use crate::names::DeclaredName;
use crate::tracker::{EncodeTracker, ReuseStrategy};
use crate::transform::Transforms;
use crate::walker::{EncodeContext, Encoder, borrow_shared, element};
use crate::wire::Tag;

/// The member a type is compiled for, used in "not possible" reasons.
#[derive(Clone, Copy)]
struct Site {
    owner: &'static str,
    member: &'static str,
}

struct Frame {
    type_id: TypeId,
    relaxed: bool,
    low: usize,
}

/// Compiles routines for one root type.
///
/// Record types that reach themselves are compiled as groups: a member
/// that refers back to a record still being compiled gets a deferred
/// routine, looked up in the cache when it first runs. Records are only
/// published once the outermost record of their group succeeded, so a
/// deferred routine always finds its target.
pub(super) struct Compiler<'a> {
    maps: &'a Arc<RwLock<Maps>>,
    layouts: &'a LayoutCache,
    frames: Vec<Frame>,
    staged: Vec<(TypeId, bool, Routine)>,
}

impl<'a> Compiler<'a> {
    pub fn new(maps: &'a Arc<RwLock<Maps>>, layouts: &'a LayoutCache) -> Self {
        Self {
            maps,
            layouts,
            frames: Vec::new(),
            staged: Vec::new(),
        }
    }

    pub fn compile_root(&mut self, info: &'static TypeInfo) -> Result<Routine, ModelError> {
        let site = Site {
            owner: info.type_name(),
            member: "(root)",
        };
        self.compile(info, false, site)
    }

    /// `relaxed` hands polymorphic values to the generic walker instead of
    /// failing.
    fn compile(
        &mut self,
        info: &'static TypeInfo,
        relaxed: bool,
        site: Site,
    ) -> Result<Routine, ModelError> {
        match info {
            TypeInfo::Scalar(_) | TypeInfo::Enum(_) => Ok(Arc::new(move |value, sink| {
                match value.graph_ref() {
                    GraphRef::Scalar(scalar) => {
                        sink.out.scalar(scalar);
                        Ok(())
                    }
                    _ => Err(mismatch(info.type_name(), value)),
                }
            })),
            TypeInfo::Str(_) => Ok(Arc::new(move |value, sink| match value.graph_ref() {
                GraphRef::Str(s) => sink.out.string(Some(s)),
                _ => Err(mismatch(info.type_name(), value)),
            })),
            TypeInfo::Option(option) => {
                let inner = self.compile(option.inner(), relaxed, site)?;
                Ok(Arc::new(move |value, sink| match value.graph_ref() {
                    GraphRef::Option(None) => sink.none_of(info),
                    GraphRef::Option(Some(value)) => inner(value, sink),
                    _ => Err(mismatch(info.type_name(), value)),
                }))
            }
            TypeInfo::Array(array) => {
                let item = self.compile(array.item(), relaxed, site)?;
                Ok(Arc::new(move |value, sink| {
                    let GraphRef::Array(array) = value.graph_ref() else {
                        return Err(mismatch(info.type_name(), value));
                    };
                    sink.descend()?;
                    sink.array_start(array)?;
                    for index in 0..array.len() {
                        item(element(array, index)?, sink)?;
                    }
                    sink.out.tag(Tag::ArrayEnd);
                    sink.ascend();
                    Ok(())
                }))
            }
            TypeInfo::Struct(record) => self.compile_record(record, relaxed),
            TypeInfo::Shared(shared) => match shared.target() {
                Some(target) if !shared.is_polymorphic() => {
                    let target = self.compile(target, relaxed, site)?;
                    Ok(Arc::new(move |value, sink| {
                        let GraphRef::Shared(shared) = value.graph_ref() else {
                            return Err(mismatch(info.type_name(), value));
                        };
                        borrow_shared(shared, |record| target(record as &dyn Graph, sink))
                    }))
                }
                _ if relaxed => {
                    let layouts = self.layouts.clone();
                    Ok(Arc::new(move |value, sink| {
                        if !matches!(value.graph_ref(), GraphRef::Shared(_)) {
                            return Err(mismatch(info.type_name(), value));
                        }
                        let transforms = Transforms::default();
                        let cx = EncodeContext {
                            layouts: &layouts,
                            transforms: &transforms,
                        };
                        let tracker = EncodeTracker::new(ReuseStrategy::NoTrackingFast, 0);
                        Encoder::new(sink, tracker, cx).encode_value(value)
                    }))
                }
                _ => Err(ModelError::UnsupportedMember {
                    type_name: Cow::Borrowed(site.owner),
                    member: site.member,
                    reason: UnsupportedReason::Polymorphic,
                }),
            },
        }
    }

    fn compile_record(
        &mut self,
        info: &'static StructInfo,
        relaxed: bool,
    ) -> Result<Routine, ModelError> {
        let type_id = info.ty().id();
        if let Some(found) = self.lookup(type_id, relaxed) {
            return found;
        }
        if let Some(index) = self
            .frames
            .iter()
            .position(|frame| frame.type_id == type_id && frame.relaxed == relaxed)
        {
            self.lower(index);
            return Ok(self.deferred(type_id, relaxed, info.type_name()));
        }

        let index = self.frames.len();
        let staged = self.staged.len();
        self.frames.push(Frame {
            type_id,
            relaxed,
            low: index,
        });
        let result = self.record_routine(info, relaxed);
        let low = self.frames.pop().map_or(index, |frame| frame.low);

        if low < index {
            self.lower(low);
            if let Ok(routine) = &result {
                self.staged.push((type_id, relaxed, routine.clone()));
            }
            return result;
        }

        let group = self.staged.split_off(staged);
        let mut maps = self.maps.write().unwrap_or_else(PoisonError::into_inner);
        if result.is_ok() {
            for (type_id, relaxed, routine) in group {
                maps.routines_mut(relaxed).get_or_insert(type_id, || Ok(routine));
            }
        }
        maps.routines_mut(relaxed).get_or_insert(type_id, || result).clone()
    }

    fn record_routine(
        &mut self,
        info: &'static StructInfo,
        relaxed: bool,
    ) -> Result<Routine, ModelError> {
        let layout = self.layouts.get(info)?;
        let type_name = info.type_name();

        let mut routines = Vec::with_capacity(layout.len());
        for member in layout.members() {
            let Some(member_info) = member.type_info() else {
                return Err(ModelError::UnsupportedMember {
                    type_name: Cow::Borrowed(type_name),
                    member: member.wire_name(),
                    reason: UnsupportedReason::PointerLike,
                });
            };
            let site = Site {
                owner: type_name,
                member: member.wire_name(),
            };
            let relaxed = relaxed || member.ignores_specializations();
            routines.push(self.compile(member_info, relaxed, site)?);
        }
        let routines: Box<[Routine]> = routines.into_boxed_slice();

        Ok(Arc::new(move |value, sink| {
            let Some(record) = value.as_record() else {
                return Err(mismatch(type_name, value));
            };
            sink.descend()?;
            sink.object_start(type_name)?;
            for (member, routine) in layout.members().iter().zip(routines.iter()) {
                let Some(member_value) = member.get(record) else {
                    continue;
                };
                sink.field_name(member.wire_name())?;
                routine(member_value.as_graph(), sink)?;
            }
            sink.out.tag(Tag::ObjectEnd);
            sink.ascend();
            Ok(())
        }))
    }

    fn lookup(&self, type_id: TypeId, relaxed: bool) -> Option<Result<Routine, ModelError>> {
        let staged = self
            .staged
            .iter()
            .find(|(id, mode, _)| *id == type_id && *mode == relaxed);
        if let Some((_, _, routine)) = staged {
            return Some(Ok(routine.clone()));
        }
        let maps = self.maps.read().unwrap_or_else(PoisonError::into_inner);
        maps.routines(relaxed).get(&type_id).cloned()
    }

    /// Marks the current record as part of the group rooted at `low`.
    fn lower(&mut self, low: usize) {
        if let Some(frame) = self.frames.last_mut() {
            frame.low = frame.low.min(low);
        }
    }

    fn deferred(&self, type_id: TypeId, relaxed: bool, type_name: &'static str) -> Routine {
        let maps = Arc::downgrade(self.maps);
        Arc::new(move |value, sink| {
            let routine = match maps.upgrade() {
                Some(maps) => {
                    let maps = maps.read().unwrap_or_else(PoisonError::into_inner);
                    maps.routines(relaxed).get(&type_id).cloned()
                }
                None => None,
            };
            match routine {
                Some(Ok(routine)) => routine(value, sink),
                _ => Err(CodecError::UnresolvableType {
                    name: Cow::Borrowed(type_name),
                }),
            }
        })
    }
}

fn mismatch(expected: &'static str, value: &dyn Graph) -> CodecError {
    CodecError::mismatch(expected, value.graph_info().type_name())
}

// -----------------------------------------------------------------------------
// Declared names

/// Collects every type and member name a value declared as `info` may
/// write. Polymorphic subtrees contribute nothing.
pub(super) fn declared_names(info: &'static TypeInfo, layouts: &LayoutCache) -> Vec<DeclaredName> {
    let mut collector = NameCollector {
        layouts,
        visited: HashSet::default(),
        names: Vec::new(),
    };
    collector.visit(info);
    collector.names
}

struct NameCollector<'a> {
    layouts: &'a LayoutCache,
    visited: HashSet<TypeId>,
    names: Vec<DeclaredName>,
}

impl NameCollector<'_> {
    fn visit(&mut self, info: &'static TypeInfo) {
        match info {
            TypeInfo::Scalar(_) | TypeInfo::Str(_) | TypeInfo::Enum(_) => {}
            TypeInfo::Option(option) => self.visit(option.inner()),
            TypeInfo::Array(array) => {
                self.names.push(DeclaredName::of_type(array.item().type_name()));
                self.visit(array.item());
            }
            TypeInfo::Shared(shared) => {
                if !shared.is_polymorphic()
                    && let Some(target) = shared.target()
                {
                    self.visit(target);
                }
            }
            TypeInfo::Struct(record) => {
                if !self.visited.insert(info.type_id()) {
                    return;
                }
                self.names.push(DeclaredName::of_type(record.type_name()));
                let Ok(layout) = self.layouts.get(record) else {
                    return;
                };
                for member in layout.members() {
                    self.names.push(DeclaredName::of_member(member.wire_name()));
                    if let Some(member_info) = member.type_info() {
                        self.visit(member_info);
                    }
                }
            }
        }
    }
}
