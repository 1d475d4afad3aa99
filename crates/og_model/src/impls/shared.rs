use alloc::boxed::Box;
use alloc::rc::Rc;
use core::any::Any;
use core::cell::RefCell;
use core::fmt;

use crate::impls::concat;
use crate::info::{GenericTypeInfoCell, NonGenericTypeInfoCell, SharedInfo, TypeInfo, Typed};
use crate::registry::{GetTypeMeta, TypeMeta, TypeRegistry};
use crate::{Graph, GraphRef, Record, SharedGraph};

/// A reference-semantics record.
///
/// Values behind the same allocation are encoded once and decoded back
/// into a single allocation.
pub type Shared<T> = Rc<RefCell<T>>;

/// A reference-semantics record whose concrete type is only known at runtime.
pub type SharedDyn = Rc<RefCell<dyn Record>>;

// -----------------------------------------------------------------------------
// SharedSlot

/// A freshly allocated shared record, usable both typed and erased.
///
/// The decoder keeps one slot per reference number.
#[derive(Clone)]
pub struct SharedSlot {
    any: Rc<dyn Any>,
    record: Rc<RefCell<dyn Record>>,
}

impl SharedSlot {
    /// Moves `value` into a new shared allocation.
    pub fn new<T: Record>(value: T) -> Self {
        let rc = Rc::new(RefCell::new(value));
        Self {
            any: rc.clone(),
            record: rc,
        }
    }

    /// The typed handle, `None` if the slot holds another type.
    pub fn typed<T: Record>(&self) -> Option<Shared<T>> {
        self.any.clone().downcast::<RefCell<T>>().ok()
    }

    /// The erased handle.
    #[inline]
    pub fn record(&self) -> SharedDyn {
        self.record.clone()
    }

    /// The address shared by every handle to this slot.
    #[inline]
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.record) as *const () as usize
    }
}

impl fmt::Debug for SharedSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.record.try_borrow() {
            Ok(record) => write!(f, "SharedSlot({})", record.struct_info().type_name()),
            Err(_) => f.write_str("SharedSlot(<borrowed>)"),
        }
    }
}

// -----------------------------------------------------------------------------
// Shared<T>

impl<T: Record + Typed + Default> Typed for Shared<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            let name = concat(&["Shared<", T::type_info().type_name(), ">"]);
            TypeInfo::Shared(SharedInfo::new::<Self>(
                name,
                T::type_info,
                new_slot::<T>,
                typed_from_slot::<T>,
            ))
        })
    }
}

impl<T: Record + Typed + Default> Graph for Shared<T> {
    #[inline]
    fn graph_info(&self) -> &'static TypeInfo {
        <Self as Typed>::type_info()
    }

    #[inline]
    fn graph_ref(&self) -> GraphRef<'_> {
        GraphRef::Shared(self)
    }
}

impl<T: Record + Typed + Default> SharedGraph for Shared<T> {
    #[inline]
    fn identity(&self) -> usize {
        Rc::as_ptr(self) as *const () as usize
    }

    #[inline]
    fn erased(&self) -> SharedDyn {
        self.clone()
    }
}

impl<T: Record + GetTypeMeta + Default> GetTypeMeta for Shared<T> {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>()
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

fn new_slot<T: Record + Default>() -> SharedSlot {
    SharedSlot::new(T::default())
}

fn typed_from_slot<T: Record + Typed + Default>(slot: &SharedSlot) -> Option<Box<dyn Graph>> {
    slot.typed::<T>().map(|rc| Box::new(rc) as Box<dyn Graph>)
}

// -----------------------------------------------------------------------------
// SharedDyn

impl Typed for SharedDyn {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Shared(SharedInfo::polymorphic::<Self>("SharedDyn", erased_from_slot))
        })
    }
}

impl Graph for SharedDyn {
    #[inline]
    fn graph_info(&self) -> &'static TypeInfo {
        <Self as Typed>::type_info()
    }

    #[inline]
    fn graph_ref(&self) -> GraphRef<'_> {
        GraphRef::Shared(self)
    }
}

impl SharedGraph for SharedDyn {
    #[inline]
    fn identity(&self) -> usize {
        Rc::as_ptr(self) as *const () as usize
    }

    #[inline]
    fn erased(&self) -> SharedDyn {
        self.clone()
    }
}

impl GetTypeMeta for SharedDyn {
    fn get_type_meta() -> TypeMeta {
        TypeMeta::of::<Self>()
    }
}

fn erased_from_slot(slot: &SharedSlot) -> Option<Box<dyn Graph>> {
    Some(Box::new(slot.record()))
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::RefCell;

    use crate::info::Typed;
    use crate::{Graph, GraphRef, Shared, SharedDyn, SharedGraph, SharedSlot};

    #[derive(crate::derive::Graph, Default, Debug, PartialEq)]
    struct Cell {
        value: i32,
    }

    #[derive(crate::derive::Graph, Default)]
    struct Other;

    #[test]
    fn identity_is_shared_between_typed_and_erased() {
        let typed: Shared<Cell> = Rc::new(RefCell::new(Cell { value: 1 }));
        let erased: SharedDyn = typed.clone();
        assert_eq!(typed.identity(), erased.identity());
        assert_eq!(typed.identity(), SharedGraph::identity(&typed.erased()));
        assert!(matches!((&typed as &dyn Graph).graph_ref(), GraphRef::Shared(_)));
    }

    #[test]
    fn slot_hands_out_one_allocation() {
        let slot = SharedSlot::new(Cell { value: 5 });
        let a = slot.typed::<Cell>().unwrap();
        let b = slot.typed::<Cell>().unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(slot.identity(), a.identity());
        assert!(slot.typed::<Other>().is_none());

        a.borrow_mut().value = 6;
        let record = slot.record();
        let guard = record.borrow();
        assert_eq!(guard.downcast_ref::<Cell>(), Some(&Cell { value: 6 }));
    }

    #[test]
    fn polymorphic_info() {
        let info = SharedDyn::type_info();
        assert!(info.is_polymorphic());
        assert!(!<Shared<Cell>>::type_info().is_polymorphic());
        assert_eq!(<Shared<Cell>>::type_info().type_name(), "Shared<Cell>");

        let shared = info.as_shared().unwrap();
        assert!(shared.new_slot().is_none());
        let slot = SharedSlot::new(Other);
        assert!(shared.from_slot(&slot).is_some());
    }
}
