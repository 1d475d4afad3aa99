use alloc::string::String;
use core::any::TypeId;
use core::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use og_utils::TypeIdMap;
use og_utils::hash::{FixedHashState, HashMap, HashSet};

use crate::info::Typed;
use crate::registry::{FromType, GetTypeMeta, TypeMeta, TypeTrait};

// -----------------------------------------------------------------------------
// TypeRegistry

/// Registered types, looked up by [`TypeId`] or by wire type name.
///
/// The codec consults it only where the declared type does not fix the
/// concrete type: polymorphic `SharedDyn` members, and skipped objects
/// whose reference a later back-reference may need.
///
/// A wire name claimed by two registered types is ambiguous and resolves
/// to nothing.
///
/// # Example
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
/// let s = generator.default().take::<String>().unwrap();
/// assert_eq!(s, "");
/// ```
pub struct TypeRegistry {
    metas: TypeIdMap<TypeMeta>,
    by_name: HashMap<&'static str, TypeId>,
    ambiguous: HashSet<&'static str>,
}

impl Default for TypeRegistry {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// A registry with nothing in it.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            metas: TypeIdMap::new(),
            by_name: HashMap::with_hasher(FixedHashState),
            ambiguous: HashSet::with_hasher(FixedHashState),
        }
    }

    /// A registry holding every scalar type and `String`.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register::<bool>();
        registry.register::<char>();
        registry.register::<u8>();
        registry.register::<u16>();
        registry.register::<u32>();
        registry.register::<u64>();
        registry.register::<u128>();
        registry.register::<usize>();
        registry.register::<i8>();
        registry.register::<i16>();
        registry.register::<i32>();
        registry.register::<i64>();
        registry.register::<i128>();
        registry.register::<isize>();
        registry.register::<f32>();
        registry.register::<f64>();
        registry.register::<crate::value::Decimal>();
        registry.register::<core::time::Duration>();
        registry.register::<std::time::SystemTime>();
        registry.register::<String>();
        registry
    }

    fn index_name(&mut self, name: &'static str, type_id: TypeId) {
        if self.ambiguous.contains(name) {
            return;
        }
        if self.by_name.remove(name).is_some() {
            log::debug!("wire name `{name}` is claimed twice and no longer resolves");
            self.ambiguous.insert(name);
        } else {
            self.by_name.insert(name, type_id);
        }
    }

    /// Inserts `type_meta` unless its type is already registered.
    ///
    /// Returns `true` if it was inserted. Dependencies are not registered.
    pub fn try_insert_type_meta(&mut self, type_meta: TypeMeta) -> bool {
        let (type_id, name) = (type_meta.type_id(), type_meta.type_name());
        let inserted = self.metas.try_insert(type_id, || type_meta);
        if inserted {
            self.index_name(name, type_id);
        }
        inserted
    }

    /// Registers `T` and, recursively, the types it depends on.
    ///
    /// Nothing happens if `T` is already registered.
    ///
    /// # Example
    ///
    /// ```
    /// # use core::any::TypeId;
    /// # use og_model::{derive::Graph, registry::{TypeRegistry, TypeTraitDefault}};
    /// #[derive(Graph, Default)]
    /// struct Foo {
    ///   name: Option<String>,
    ///   value: i32
    /// }
    ///
    /// let mut type_registry = TypeRegistry::empty();
    /// type_registry.register::<Foo>();
    ///
    /// assert!(type_registry.contains(TypeId::of::<Foo>()));
    /// assert!(type_registry.contains(TypeId::of::<Option<String>>()));
    /// assert!(type_registry.contains(TypeId::of::<i32>()));
    /// assert!(type_registry.get_type_trait::<TypeTraitDefault>(TypeId::of::<Foo>()).is_some());
    /// ```
    pub fn register<T: GetTypeMeta>(&mut self) {
        if self.contains(TypeId::of::<T>()) {
            return;
        }
        self.try_insert_type_meta(T::get_type_meta());
        T::register_dependencies(self);
    }

    /// Registers every type annotated with `#[graph(auto_register)]`.
    ///
    /// Repeated calls are cheap and insert no duplicates.
    ///
    /// Returns `true` if automatic registration works on the current
    /// platform. Without the `auto_register` feature this does nothing and
    /// returns `false`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use std::any::TypeId;
    /// # use og_model::{derive::Graph, registry::TypeRegistry};
    /// #[derive(Graph, Default)]
    /// #[graph(auto_register)]
    /// struct Foo {
    ///     value: i32,
    /// }
    ///
    /// let mut type_registry = TypeRegistry::empty();
    /// assert!(type_registry.auto_register());
    /// assert!(type_registry.contains(TypeId::of::<Foo>()));
    /// ```
    #[cfg_attr(not(feature = "auto_register"), inline(always))]
    pub fn auto_register(&mut self) -> bool {
        #[cfg(feature = "auto_register")]
        {
            use crate::__macro_exports::auto_register;
            if self.contains(TypeId::of::<auto_register::__AvailFlag>()) {
                return true;
            }
            auto_register::__register_types(self);
            self.contains(TypeId::of::<auto_register::__AvailFlag>())
        }
        #[cfg(not(feature = "auto_register"))]
        {
            false
        }
    }

    /// Adds the type trait `D` to the already registered type `T`.
    ///
    /// Returns `false` if `T` is not registered.
    pub fn register_type_trait<T: Typed, D: TypeTrait + FromType<T>>(&mut self) -> bool {
        let Some(type_meta) = self.metas.get_mut(&TypeId::of::<T>()) else {
            return false;
        };
        type_meta.insert_trait(D::from_type());
        true
    }

    #[inline]
    pub fn contains(&self, type_id: TypeId) -> bool {
        self.metas.contains(&type_id)
    }

    #[inline]
    pub fn get(&self, type_id: TypeId) -> Option<&TypeMeta> {
        self.metas.get(&type_id)
    }

    /// The type registered under the wire name `type_name`.
    ///
    /// Returns `None` if the name is unknown or ambiguous.
    pub fn get_with_type_name(&self, type_name: &str) -> Option<&TypeMeta> {
        self.by_name.get(type_name).and_then(|id| self.get(*id))
    }

    /// Returns `true` if more than one registered type uses this wire name.
    pub fn is_ambiguous(&self, type_name: &str) -> bool {
        self.ambiguous.contains(type_name)
    }

    pub fn get_type_trait<T: TypeTrait>(&self, type_id: TypeId) -> Option<&T> {
        self.get(type_id).and_then(TypeMeta::get_trait::<T>)
    }

    /// The number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.metas.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.metas.is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("len", &self.len())
            .field("names", &self.by_name.len())
            .field("ambiguous", &self.ambiguous)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// TypeRegistryArc

/// A [`TypeRegistry`] shared between codecs.
///
/// Cloning shares the registry. Registering through [`write`](Self::write)
/// is visible to every codec holding a clone.
#[derive(Clone, Default)]
pub struct TypeRegistryArc {
    inner: Arc<RwLock<TypeRegistry>>,
}

impl TypeRegistryArc {
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Locks for lookups. Poisoning is ignored.
    pub fn read(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks for registration. Poisoning is ignored.
    pub fn write(&self) -> RwLockWriteGuard<'_, TypeRegistry> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for TypeRegistryArc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.read().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use core::any::TypeId;

    use super::TypeRegistry;
    use crate::registry::{TypeTraitDefault, TypeTraitShared};

    mod left {
        #[derive(crate::derive::Graph, Default)]
        pub struct Twin;
    }

    mod right {
        #[derive(crate::derive::Graph, Default)]
        pub struct Twin;
    }

    #[derive(crate::derive::Graph, Default)]
    struct Holder {
        items: Vec<u16>,
        label: Option<String>,
    }

    #[test]
    fn register_pulls_in_dependencies() {
        let mut registry = TypeRegistry::empty();
        registry.register::<Holder>();
        assert!(registry.contains(TypeId::of::<Vec<u16>>()));
        assert!(registry.contains(TypeId::of::<u16>()));
        assert!(registry.contains(TypeId::of::<Option<String>>()));

        let meta = registry.get_with_type_name("Holder").unwrap();
        assert!(meta.has_trait::<TypeTraitDefault>());
        assert!(meta.has_trait::<TypeTraitShared>());
    }

    #[test]
    fn duplicate_names_become_ambiguous() {
        let mut registry = TypeRegistry::new();
        registry.register::<left::Twin>();
        assert!(registry.get_with_type_name("Twin").is_some());
        registry.register::<right::Twin>();
        assert!(registry.is_ambiguous("Twin"));
        assert!(registry.get_with_type_name("Twin").is_none());
        assert!(registry.contains(TypeId::of::<right::Twin>()));
    }

    #[test]
    fn shared_trait_creates_fresh_slots() {
        let mut registry = TypeRegistry::empty();
        registry.register::<Holder>();
        let shared = registry
            .get_type_trait::<TypeTraitShared>(TypeId::of::<Holder>())
            .unwrap();
        let a = shared.new_slot();
        let b = shared.new_slot();
        assert_ne!(a.identity(), b.identity());
        assert!(a.typed::<Holder>().is_some());
    }

    #[test]
    fn register_type_trait_requires_registration() {
        let mut registry = TypeRegistry::empty();
        assert!(!registry.register_type_trait::<u8, TypeTraitDefault>());
        registry.try_insert_type_meta(crate::registry::TypeMeta::of::<u8>());
        assert!(!registry.try_insert_type_meta(crate::registry::TypeMeta::of::<u8>()));
        assert!(registry.register_type_trait::<u8, TypeTraitDefault>());
        assert_eq!(registry.len(), 1);
    }
}
