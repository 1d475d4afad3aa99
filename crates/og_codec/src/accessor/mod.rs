//! Specialized accessors.
//!
//! An accessor is a routine compiled once per declared type that writes a
//! value of that type straight to a [`Sink`], with every member routine
//! resolved up front. Only reuse-free encoding can use them: a routine
//! never tracks references. Polymorphic members marked
//! `ignore_specializations` are handed to the generic walker, untracked.
//!
//! Routines are cached process-wide in an [`AccessorCache`]. Types that
//! cannot be specialized get a cached "not possible" entry carrying the
//! reason, so the analysis runs once per type.

use alloc::sync::Arc;
use core::any::TypeId;
use core::fmt;
use std::sync::{PoisonError, RwLock};

use og_model::info::TypeInfo;
use og_model::layout::LayoutCache;
use og_model::{Graph, ModelError};
use og_utils::TypeIdMap;

use crate::error::Result;
use crate::names::DeclaredName;
use crate::walker::Sink;

mod compiler;

use compiler::Compiler;

/// A compiled write routine.
pub(crate) type Routine = Arc<dyn Fn(&dyn Graph, &mut Sink<'_>) -> Result<()> + Send + Sync>;

// -----------------------------------------------------------------------------
// AccessorEntry

/// The cached accessor of one root type.
pub struct AccessorEntry {
    type_name: &'static str,
    routine: Result<Routine, ModelError>,
    names: Arc<[DeclaredName]>,
}

impl AccessorEntry {
    /// The name of the type this entry was compiled for.
    #[inline]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if a specialized routine exists.
    #[inline]
    pub fn is_possible(&self) -> bool {
        self.routine.is_ok()
    }

    /// Why no routine could be compiled.
    #[inline]
    pub fn reason(&self) -> Option<&ModelError> {
        self.routine.as_ref().err()
    }

    /// Every type and member name a value of this type may write, in
    /// first-use order.
    #[inline]
    pub fn names(&self) -> &[DeclaredName] {
        &self.names
    }

    #[inline]
    pub(crate) fn routine(&self) -> Result<&Routine, &ModelError> {
        self.routine.as_ref()
    }
}

impl fmt::Debug for AccessorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorEntry")
            .field("type_name", &self.type_name)
            .field("possible", &self.is_possible())
            .field("names", &self.names.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// AccessorCache

#[derive(Default)]
pub(crate) struct Maps {
    entries: TypeIdMap<Arc<AccessorEntry>>,
    strict: TypeIdMap<Result<Routine, ModelError>>,
    relaxed: TypeIdMap<Result<Routine, ModelError>>,
}

impl Maps {
    #[inline]
    fn routines(&self, relaxed: bool) -> &TypeIdMap<Result<Routine, ModelError>> {
        if relaxed { &self.relaxed } else { &self.strict }
    }

    #[inline]
    fn routines_mut(&mut self, relaxed: bool) -> &mut TypeIdMap<Result<Routine, ModelError>> {
        if relaxed {
            &mut self.relaxed
        } else {
            &mut self.strict
        }
    }
}

/// A shared, process-wide cache of specialized accessors.
///
/// Entries are immutable once inserted. When two threads compile the same
/// type, the first insertion wins and the other result is dropped.
#[derive(Clone, Default)]
pub struct AccessorCache {
    maps: Arc<RwLock<Maps>>,
}

impl AccessorCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the accessor of `info`, compiling it on first use.
    pub fn get_or_compile(&self, info: &'static TypeInfo, layouts: &LayoutCache) -> Arc<AccessorEntry> {
        let type_id = info.type_id();
        if let Some(entry) = self.read_entry(type_id) {
            return entry;
        }

        let mut compiler = Compiler::new(&self.maps, layouts);
        let routine = compiler.compile_root(info);
        let names = compiler::declared_names(info, layouts);
        match &routine {
            Ok(_) => log::debug!("compiled specialized accessor for `{}`", info.type_name()),
            Err(reason) => {
                log::debug!("no specialized accessor for `{}`: {reason}", info.type_name());
            }
        }

        let entry = AccessorEntry {
            type_name: info.type_name(),
            routine,
            names: names.into(),
        };
        self.maps
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get_or_insert(type_id, || Arc::new(entry))
            .clone()
    }

    /// The number of cached root entries.
    pub fn len(&self) -> usize {
        self.maps.read().unwrap_or_else(PoisonError::into_inner).entries.len()
    }

    /// Returns `true` if nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read_entry(&self, type_id: TypeId) -> Option<Arc<AccessorEntry>> {
        self.maps
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .get(&type_id)
            .cloned()
    }
}

impl fmt::Debug for AccessorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorCache").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests;
