//! The generic graph walkers.
//!
//! - [`Encoder`]: recursive, used by every strategy but one.
//! - [`WideEncoder`]: iterative, used by `WideCircularSafe`.
//! - [`Decoder`]: iterative and strategy-agnostic.

mod decode;
mod encode;
mod wide;

pub(crate) use decode::{DecodeContext, Decoder};
pub(crate) use encode::{EncodeContext, Encoder, Sink, borrow_shared, element, item_name};
pub(crate) use wide::WideEncoder;

#[cfg(test)]
mod tests {
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    use og_model::derive::Graph;
    use og_model::info::{TypeInfo, Typed};
    use og_model::layout::LayoutCache;
    use og_model::registry::TypeRegistry;
    use og_model::{Array, Graph, GraphRef, Shared, SharedDyn};

    use super::{DecodeContext, Decoder, EncodeContext, Encoder, Sink, WideEncoder};
    use crate::accessor::AccessorCache;
    use crate::error::{CodecError, FormatError};
    use crate::names::{NameTable, NameWriter};
    use crate::tracker::{EncodeTracker, ReuseStrategy};
    use crate::transform::Transforms;
    use crate::wire::{Tag, WireWriter};

    #[derive(Graph, Default, Debug, PartialEq)]
    struct Sample {
        id: u32,
        label: Option<String>,
        scores: Option<Vec<i16>>,
        grid: Vec<Vec<u8>>,
    }

    #[derive(Graph, Default)]
    #[graph(name = "Sample")]
    struct SampleIdOnly {
        id: u32,
    }

    #[derive(Graph, Default)]
    #[graph(name = "Sample")]
    struct SampleWithExtra {
        id: u32,
        extra: bool,
    }

    #[derive(Graph, Default)]
    struct Node {
        value: i32,
        next: Option<Shared<Node>>,
    }

    #[derive(Graph, Default)]
    struct Holder {
        item: Option<SharedDyn>,
    }

    #[derive(Graph, Default)]
    struct Leaf {
        weight: f32,
    }

    /// Reports one element more than it holds.
    struct Short(Vec<u8>);

    impl Graph for Short {
        fn graph_info(&self) -> &'static TypeInfo {
            Vec::<u8>::type_info()
        }

        fn graph_ref(&self) -> GraphRef<'_> {
            GraphRef::Array(self)
        }
    }

    impl Array for Short {
        fn len(&self) -> usize {
            self.0.len() + 1
        }

        fn get(&self, index: usize) -> Option<&dyn Graph> {
            self.0.get(index).map(|v| v as &dyn Graph)
        }
    }

    fn encode(value: &dyn Graph) -> Vec<u8> {
        let table = NameTable::new();
        let layouts = LayoutCache::new();
        let transforms = Transforms::default();
        let mut out = Vec::new();
        let mut sink = Sink::new(WireWriter::new(&mut out), NameWriter::new(&table), 64);
        let cx = EncodeContext {
            layouts: &layouts,
            transforms: &transforms,
        };
        let tracker = EncodeTracker::new(ReuseStrategy::TreeWithReuse, u32::MAX);
        Encoder::new(&mut sink, tracker, cx).encode_value(value).unwrap();
        out
    }

    fn decode_with<T: Typed>(bytes: &[u8], registry: &TypeRegistry) -> Result<Box<dyn Graph>, CodecError> {
        let layouts = LayoutCache::new();
        let transforms = Transforms::default();
        let cx = DecodeContext {
            registry,
            layouts: &layouts,
            transforms: &transforms,
            max_depth: 64,
            max_references: u32::MAX,
        };
        Decoder::new(bytes, cx).decode_root(T::type_info())
    }

    fn decode<T: Typed>(bytes: &[u8]) -> Result<T, CodecError> {
        let value = decode_with::<T>(bytes, &TypeRegistry::new())?;
        Ok(value.take::<T>().unwrap())
    }

    #[test]
    fn record_round_trip() {
        let sample = Sample {
            id: 9,
            label: Some(String::new()),
            scores: None,
            grid: Vec::from([Vec::from([1, 2]), Vec::new()]),
        };
        assert_eq!(decode::<Sample>(&encode(&sample)).unwrap(), sample);
    }

    #[test]
    fn unknown_members_are_skipped() {
        let bytes = encode(&SampleWithExtra { id: 4, extra: true });
        let decoded = decode::<SampleIdOnly>(&bytes).unwrap();
        assert_eq!(decoded.id, 4);
    }

    #[test]
    fn missing_members_are_reported() {
        let bytes = encode(&SampleIdOnly { id: 4 });
        let err = decode::<SampleWithExtra>(&bytes).err().unwrap();
        assert!(matches!(
            err,
            CodecError::MissingField { type_name, member } if type_name == "Sample" && member == "extra"
        ));
    }

    #[test]
    fn back_references_share_one_allocation() {
        let node: Shared<Node> = Rc::new(RefCell::new(Node { value: 3, next: None }));
        node.borrow_mut().next = Some(node.clone());
        let bytes = encode(&node);
        node.borrow_mut().next = None;

        let decoded = decode::<Shared<Node>>(&bytes).unwrap();
        let next = decoded.borrow_mut().next.take().unwrap();
        assert!(Rc::ptr_eq(&decoded, &next));
        assert_eq!(next.borrow().value, 3);
    }

    #[test]
    fn polymorphic_members_use_the_registry() {
        let leaf: SharedDyn = Rc::new(RefCell::new(Leaf { weight: 0.5 }));
        let bytes = encode(&Holder { item: Some(leaf) });

        let err = decode_with::<Holder>(&bytes, &TypeRegistry::new()).err().unwrap();
        assert!(matches!(err, CodecError::UnresolvableType { name } if name == "Leaf"));

        let mut registry = TypeRegistry::new();
        registry.register::<Leaf>();
        let holder = decode_with::<Holder>(&bytes, &registry).unwrap().take::<Holder>().unwrap();
        let item = holder.item.unwrap();
        let item = item.borrow();
        assert_eq!(item.downcast_ref::<Leaf>().map(|l| l.weight), Some(0.5));
    }

    #[test]
    fn malformed_streams() {
        let mut bytes = encode(&7_u32);
        bytes.push(Tag::Null as u8);
        let err = decode::<u32>(&bytes).err().unwrap();
        assert_eq!(err.format_kind(), Some(&FormatError::TrailingBytes(1)));

        let bytes = encode(&7_u32);
        let err = decode::<u32>(&bytes[..3]).err().unwrap();
        assert_eq!(err.format_kind(), Some(&FormatError::UnexpectedEof));

        let err = decode::<i64>(&encode(&7_u32)).err().unwrap();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));

        let err = decode::<String>(&[Tag::Null as u8]).err().unwrap();
        assert!(matches!(err, CodecError::TypeMismatch { found, .. } if found == "null"));
    }

    #[test]
    fn null_arrays_in_either_form() {
        let mut bytes = Vec::new();
        let mut w = WireWriter::new(&mut bytes);
        w.tag(Tag::ArrayStart);
        w.string(None).unwrap();
        w.tag(Tag::ArrayEnd);

        assert_eq!(decode::<Option<Vec<u8>>>(&bytes).unwrap(), None);
        assert_eq!(decode::<Option<Vec<u8>>>(&[Tag::Null as u8]).unwrap(), None);
        let err = decode::<Vec<u8>>(&bytes).err().unwrap();
        assert!(matches!(err, CodecError::TypeMismatch { .. }));
    }

    #[test]
    fn missing_elements_are_reported() {
        let short = Short(Vec::from([1, 2]));
        let layouts = LayoutCache::new();
        let transforms = Transforms::default();
        let cx = EncodeContext {
            layouts: &layouts,
            transforms: &transforms,
        };
        let table = NameTable::new();
        let missing = |err: CodecError| {
            matches!(err, CodecError::TypeMismatch { found, .. } if found == "missing element")
        };

        let mut out = Vec::new();
        let mut sink = Sink::new(WireWriter::new(&mut out), NameWriter::new(&table), 64);
        let tracker = EncodeTracker::new(ReuseStrategy::TreeWithReuse, u32::MAX);
        let err = Encoder::new(&mut sink, tracker, cx).encode_value(&short).unwrap_err();
        assert!(missing(err));

        let mut out = Vec::new();
        let sink = Sink::new(WireWriter::new(&mut out), NameWriter::new(&table), 64);
        let tracker = EncodeTracker::new(ReuseStrategy::WideCircularSafe, u32::MAX);
        let err = WideEncoder::new(sink, tracker, cx).encode_root(&short).unwrap_err();
        assert!(missing(err));

        let entry = AccessorCache::new().get_or_compile(Vec::<u8>::type_info(), &layouts);
        let routine = entry.routine().unwrap();
        let mut out = Vec::new();
        let mut sink = Sink::new(WireWriter::new(&mut out), NameWriter::new(&table), 64);
        let err = routine(&short as &dyn Graph, &mut sink).unwrap_err();
        assert!(missing(err));
    }
}
