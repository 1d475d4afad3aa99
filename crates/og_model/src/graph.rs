use alloc::boxed::Box;
use alloc::rc::Rc;
use core::any::Any;
use core::cell::RefCell;
use core::fmt;

use crate::info::{StructInfo, TypeInfo};
use crate::value::Scalar;

// -----------------------------------------------------------------------------
// Graph

/// A value that can be walked by the codec.
///
/// Every node of an encodable object graph implements this trait: scalars,
/// strings, `Vec<T>`, `Option<T>`, shared handles and `#[derive(Graph)]`
/// records. The trait is object safe, the codec only ever sees
/// `&dyn Graph`.
///
/// # Examples
///
/// ```
/// use og_model::{Graph, GraphRef};
///
/// let v: &dyn Graph = &7_u16;
/// assert!(matches!(v.graph_ref(), GraphRef::Scalar(_)));
/// assert_eq!(v.graph_info().type_name(), "u16");
/// ```
pub trait Graph: Any {
    /// The static description of the concrete type.
    fn graph_info(&self) -> &'static TypeInfo;

    /// A borrowed view of the value's shape.
    fn graph_ref(&self) -> GraphRef<'_>;

    /// Returns `self` as a record if it is one.
    #[inline]
    fn as_record(&self) -> Option<&dyn Record> {
        None
    }

    /// Returns `self` as a mutable record if it is one.
    #[inline]
    fn as_record_mut(&mut self) -> Option<&mut dyn Record> {
        None
    }
}

/// The shape of a [`Graph`] value.
#[derive(Clone, Copy)]
pub enum GraphRef<'a> {
    /// A fixed-width scalar, also used by field-less enums.
    Scalar(Scalar),
    /// A non-null string.
    Str(&'a str),
    /// An optional value, `None` is written as null.
    Option(Option<&'a dyn Graph>),
    /// A one-dimensional array.
    Array(&'a dyn Array),
    /// A value-semantics record.
    Record(&'a dyn Record),
    /// A reference-semantics handle.
    Shared(&'a dyn SharedGraph),
}

impl fmt::Debug for GraphRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => f.debug_tuple("Scalar").field(s).finish(),
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Option(v) => f.debug_tuple("Option").field(&v.is_some()).finish(),
            Self::Array(a) => f.debug_tuple("Array").field(&a.len()).finish(),
            Self::Record(r) => f.debug_tuple("Record").field(&r.graph_info().type_name()).finish(),
            Self::Shared(s) => f.debug_tuple("Shared").field(&s.identity()).finish(),
        }
    }
}

impl dyn Graph {
    /// Returns `true` if the underlying value is of type `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        <dyn Any>::is::<T>(self)
    }

    /// Downcasts the value to type `T` by reference.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        <dyn Any>::downcast_ref(self)
    }

    /// Downcasts the value to type `T` by mutable reference.
    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        <dyn Any>::downcast_mut(self)
    }

    /// Downcasts the value to type `T`, unboxing it.
    ///
    /// If the underlying value is not of type `T`, returns `Err(self)`.
    ///
    /// ```
    /// use og_model::Graph;
    ///
    /// let v: Box<dyn Graph> = Box::new(String::from("x"));
    /// let v = v.take::<u8>().unwrap_err();
    /// assert_eq!(v.take::<String>().unwrap(), "x");
    /// ```
    pub fn take<T: Any>(self: Box<dyn Graph>) -> Result<T, Box<dyn Graph>> {
        if self.is::<T>() {
            let any: Box<dyn Any> = self;
            #[expect(unsafe_code, reason = "type is already checked")]
            Ok(unsafe { *any.downcast::<T>().unwrap_unchecked() })
        } else {
            Err(self)
        }
    }
}

impl fmt::Debug for dyn Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Graph({})", self.graph_info().type_name())
    }
}

// -----------------------------------------------------------------------------
// Record

/// A value with named members, implemented by `#[derive(Graph)]` structs.
///
/// Member access is positional. Indices follow [`StructInfo::fields`], which
/// lists every declared field, including excluded ones.
pub trait Record: Graph {
    /// The static description of this record.
    fn struct_info(&self) -> &'static StructInfo;

    /// Borrows the field at `index`, or `None` for excluded fields.
    fn field_at(&self, index: usize) -> Option<&dyn Graph>;

    /// Mutably borrows the field at `index`, or `None` for excluded fields.
    fn field_at_mut(&mut self, index: usize) -> Option<&mut dyn Graph>;

    /// Replaces the field at `index`.
    ///
    /// The value is handed back when its type does not match the field.
    fn set_field_at(&mut self, index: usize, value: Box<dyn Graph>) -> Result<(), Box<dyn Graph>>;
}

impl dyn Record {
    /// Downcasts the record to type `T` by reference.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        <dyn Any>::downcast_ref(self)
    }

    /// Downcasts the record to type `T` by mutable reference.
    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        <dyn Any>::downcast_mut(self)
    }

    /// The embedded `#[graph(base)]` record, if any.
    pub fn base(&self) -> Option<&dyn Record> {
        let index = self.struct_info().base_index()?;
        self.field_at(index)?.as_record()
    }

    /// The embedded `#[graph(base)]` record, mutably.
    pub fn base_mut(&mut self) -> Option<&mut dyn Record> {
        let index = self.struct_info().base_index()?;
        self.field_at_mut(index)?.as_record_mut()
    }

    /// Follows `depth` base links.
    pub fn ancestor(&self, depth: usize) -> Option<&dyn Record> {
        let mut current = self;
        for _ in 0..depth {
            current = current.base()?;
        }
        Some(current)
    }

    /// Follows `depth` base links, mutably.
    pub fn ancestor_mut(&mut self, depth: usize) -> Option<&mut dyn Record> {
        let mut current = self;
        for _ in 0..depth {
            current = current.base_mut()?;
        }
        Some(current)
    }
}

// -----------------------------------------------------------------------------
// Array

/// A one-dimensional sequence of values.
pub trait Array: Graph {
    /// Number of elements.
    fn len(&self) -> usize;

    /// Returns `true` if there are no elements.
    #[inline]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrows the element at `index`.
    fn get(&self, index: usize) -> Option<&dyn Graph>;
}

/// Collects decoded elements into a concrete array type.
///
/// Created through [`ArrayInfo::builder`](crate::info::ArrayInfo::builder).
pub trait ArrayBuilder {
    /// Appends an element, handing it back if its type does not match.
    fn push(&mut self, item: Box<dyn Graph>) -> Result<(), Box<dyn Graph>>;

    /// Produces the finished array.
    fn finish(self: Box<Self>) -> Box<dyn Graph>;
}

// -----------------------------------------------------------------------------
// SharedGraph

/// A reference-semantics handle whose identity matters.
///
/// Implemented for `Rc<RefCell<T>>` and `Rc<RefCell<dyn Record>>`.
pub trait SharedGraph: Graph {
    /// The address of the shared allocation.
    ///
    /// Two handles to the same allocation report the same identity,
    /// whether typed or erased.
    fn identity(&self) -> usize;

    /// A type-erased handle to the same allocation.
    fn erased(&self) -> Rc<RefCell<dyn Record>>;
}
