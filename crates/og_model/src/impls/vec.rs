use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::impls::concat;
use crate::info::{ArrayInfo, GenericTypeInfoCell, TypeInfo, Typed};
use crate::registry::{FromType, GetTypeMeta, TypeMeta, TypeRegistry, TypeTraitDefault};
use crate::{Array, ArrayBuilder, Graph, GraphRef};

impl<T: Graph + Typed> Typed for Vec<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            let name = concat(&["Vec<", T::type_info().type_name(), ">"]);
            TypeInfo::Array(ArrayInfo::new::<Self>(name, T::type_info, new_builder::<T>))
        })
    }
}

impl<T: Graph + Typed> Graph for Vec<T> {
    #[inline]
    fn graph_info(&self) -> &'static TypeInfo {
        <Self as Typed>::type_info()
    }

    #[inline]
    fn graph_ref(&self) -> GraphRef<'_> {
        GraphRef::Array(self)
    }
}

impl<T: Graph + Typed> Array for Vec<T> {
    #[inline]
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    #[inline]
    fn get(&self, index: usize) -> Option<&dyn Graph> {
        self.as_slice().get(index).map(|v| v as &dyn Graph)
    }
}

impl<T: Graph + GetTypeMeta> GetTypeMeta for Vec<T> {
    fn get_type_meta() -> TypeMeta {
        let mut meta = TypeMeta::with_capacity::<Self>(1);
        meta.insert_trait::<TypeTraitDefault>(FromType::<Self>::from_type());
        meta
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

fn new_builder<T: Graph + Typed>(capacity: usize) -> Box<dyn ArrayBuilder> {
    Box::new(VecBuilder::<T>::with_capacity(capacity))
}

/// Collects decoded elements into a `Vec<T>`.
pub struct VecBuilder<T> {
    items: Vec<T>,
}

impl<T> VecBuilder<T> {
    /// Creates a builder with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }
}

impl<T: Graph + Typed> ArrayBuilder for VecBuilder<T> {
    fn push(&mut self, item: Box<dyn Graph>) -> Result<(), Box<dyn Graph>> {
        self.items.push(item.take::<T>()?);
        Ok(())
    }

    fn finish(self: Box<Self>) -> Box<dyn Graph> {
        Box::new(self.items)
    }
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;

    use crate::info::Typed;
    use crate::{Graph, GraphRef};

    #[test]
    fn names_include_item_type() {
        assert_eq!(<Vec<i32>>::type_info().type_name(), "Vec<i32>");
        assert_eq!(<Vec<Vec<String>>>::type_info().type_name(), "Vec<Vec<String>>");
        let item = <Vec<u8>>::type_info().as_array().map(|a| a.item().type_name());
        assert_eq!(item, Some("u8"));
    }

    #[test]
    fn builder_rejects_foreign_items() {
        let info = <Vec<u16>>::type_info().as_array().unwrap();
        let mut builder = info.builder(2);
        assert!(builder.push(Box::new(1_u16)).is_ok());
        assert!(builder.push(Box::new(1_i64)).is_err());
        let built = builder.finish().take::<Vec<u16>>().unwrap();
        assert_eq!(built, vec![1]);
    }

    #[test]
    fn array_view() {
        let v = vec![3_i8, 4];
        let GraphRef::Array(array) = (&v as &dyn Graph).graph_ref() else {
            panic!("expected array");
        };
        assert_eq!(array.len(), 2);
        assert!(array.get(1).and_then(|e| e.downcast_ref::<i8>()) == Some(&4));
        assert!(array.get(2).is_none());
    }
}
