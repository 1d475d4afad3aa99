use alloc::boxed::Box;

use crate::impls::concat;
use crate::info::{GenericTypeInfoCell, OptionInfo, TypeInfo, Typed};
use crate::registry::{FromType, GetTypeMeta, TypeMeta, TypeRegistry, TypeTraitDefault};
use crate::{Graph, GraphRef};

impl<T: Graph + Typed> Typed for Option<T> {
    fn type_info() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Self>(|| {
            let name = concat(&["Option<", T::type_info().type_name(), ">"]);
            TypeInfo::Option(OptionInfo::new::<Self>(
                name,
                T::type_info,
                none::<T>,
                some::<T>,
            ))
        })
    }
}

impl<T: Graph + Typed> Graph for Option<T> {
    #[inline]
    fn graph_info(&self) -> &'static TypeInfo {
        <Self as Typed>::type_info()
    }

    #[inline]
    fn graph_ref(&self) -> GraphRef<'_> {
        GraphRef::Option(self.as_ref().map(|v| v as &dyn Graph))
    }
}

impl<T: Graph + GetTypeMeta> GetTypeMeta for Option<T> {
    fn get_type_meta() -> TypeMeta {
        let mut meta = TypeMeta::with_capacity::<Self>(1);
        meta.insert_trait::<TypeTraitDefault>(FromType::<Self>::from_type());
        meta
    }

    fn register_dependencies(registry: &mut TypeRegistry) {
        registry.register::<T>();
    }
}

fn none<T: Graph + Typed>() -> Box<dyn Graph> {
    Box::new(None::<T>)
}

fn some<T: Graph + Typed>(value: Box<dyn Graph>) -> Result<Box<dyn Graph>, Box<dyn Graph>> {
    let value = value.take::<T>()?;
    Ok(Box::new(Some(value)))
}

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::string::String;

    use crate::info::Typed;
    use crate::{Graph, GraphRef};

    #[test]
    fn wraps_and_unwraps() {
        let info = <Option<String>>::type_info();
        assert_eq!(info.type_name(), "Option<String>");
        assert!(info.unwrap_optional().as_str().is_some());

        let option = info.as_option().unwrap();
        let none = option.none().take::<Option<String>>().unwrap();
        assert_eq!(none, None);

        let some = option.some(Box::new(String::from("a"))).unwrap();
        assert_eq!(some.take::<Option<String>>().unwrap().as_deref(), Some("a"));
        assert!(option.some(Box::new(1_u8)).is_err());
    }

    #[test]
    fn graph_ref_exposes_inner() {
        let v: Option<u8> = Some(9);
        match (&v as &dyn Graph).graph_ref() {
            GraphRef::Option(Some(inner)) => assert_eq!(inner.downcast_ref::<u8>(), Some(&9)),
            other => panic!("unexpected {other:?}"),
        }
    }
}
