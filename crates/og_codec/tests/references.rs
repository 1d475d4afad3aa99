use std::cell::RefCell;
use std::rc::Rc;
use std::thread;

use og_codec::wire::Tag;
use og_codec::{Codec, CodecError, CodecOptions, ReuseStrategy};
use og_model::derive::Graph;
use og_model::registry::{TypeRegistry, TypeRegistryArc};
use og_model::{Shared, SharedDyn};

#[derive(Graph, Default, Debug)]
struct Node {
    id: u32,
    next: Option<Shared<Node>>,
}

#[derive(Graph, Default, Debug)]
struct Pair {
    left: Option<Shared<Leaf>>,
    right: Option<Shared<Leaf>>,
}

#[derive(Graph, Default, Debug, PartialEq)]
struct Leaf {
    value: String,
}

#[derive(Graph, Default)]
struct Fan {
    items: Vec<Shared<Leaf>>,
}

#[derive(Graph, Default)]
struct Loops {
    nodes: Vec<Shared<Node>>,
}

#[derive(Graph, Default)]
struct Bag {
    first: Option<SharedDyn>,
    second: Option<SharedDyn>,
}

fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Nodes `0..len`, each linked to the next.
fn chain(len: u32) -> Shared<Node> {
    let head = shared(Node { id: 0, next: None });
    let mut tail = head.clone();
    for id in 1..len {
        let next = shared(Node { id, next: None });
        tail.borrow_mut().next = Some(next.clone());
        tail = next;
    }
    head
}

/// Takes a chain apart front to back, returning the ids in order.
///
/// Dropping a long chain in one piece would recurse once per node.
fn unlink(head: Shared<Node>) -> Vec<u32> {
    let mut ids = Vec::new();
    let mut cursor = Some(head);
    while let Some(node) = cursor {
        let mut node = node.borrow_mut();
        ids.push(node.id);
        cursor = node.next.take();
    }
    ids
}

fn count(bytes: &[u8], tag: Tag) -> usize {
    bytes.iter().filter(|&&b| b == tag as u8).count()
}

#[test]
fn self_reference_identity() {
    let codec = Codec::new();
    let node = shared(Node { id: 1, next: None });
    node.borrow_mut().next = Some(node.clone());

    for strategy in [ReuseStrategy::TreeWithReuse, ReuseStrategy::WideCircularSafe] {
        let bytes = codec.encode_with(&node, strategy).unwrap();
        let decoded = codec.decode::<Shared<Node>>(&bytes).unwrap();
        let next = decoded.borrow_mut().next.take().unwrap();
        assert!(Rc::ptr_eq(&decoded, &next), "{strategy:?}");
        assert_eq!(next.borrow().id, 1);
    }

    let err = codec.encode_with(&node, ReuseStrategy::NoReuse).unwrap_err();
    assert!(matches!(err, CodecError::CircularReference { type_name } if type_name == "Node"));

    let err = codec.encode_with(&node, ReuseStrategy::NoTrackingFast).unwrap_err();
    assert!(matches!(err, CodecError::DepthLimitExceeded { limit: 256 }));

    node.borrow_mut().next = None;
}

#[test]
fn longer_cycles() {
    let codec = Codec::new();
    let a = shared(Node { id: 1, next: None });
    let b = shared(Node { id: 2, next: Some(a.clone()) });
    let c = shared(Node { id: 3, next: Some(b.clone()) });
    a.borrow_mut().next = Some(c.clone());

    for strategy in [ReuseStrategy::TreeWithReuse, ReuseStrategy::WideCircularSafe] {
        let bytes = codec.encode_with(&a, strategy).unwrap();
        let a2 = codec.decode::<Shared<Node>>(&bytes).unwrap();
        let c2 = a2.borrow().next.clone().unwrap();
        let b2 = c2.borrow().next.clone().unwrap();
        let back = b2.borrow_mut().next.take().unwrap();
        assert!(Rc::ptr_eq(&a2, &back), "{strategy:?}");
        assert_eq!([a2.borrow().id, c2.borrow().id, b2.borrow().id], [1, 3, 2]);
    }

    a.borrow_mut().next = None;
}

#[test]
fn shared_values_are_written_once() {
    let codec = Codec::new();
    let leaf = shared(Leaf {
        value: String::from("one"),
    });
    let pair = Pair {
        left: Some(leaf.clone()),
        right: Some(leaf),
    };

    let bytes = codec.encode_with(&pair, ReuseStrategy::TreeWithReuse).unwrap();
    assert_eq!(count(&bytes, Tag::ReferenceId), 2);
    let decoded = codec.decode::<Pair>(&bytes).unwrap();
    let (left, right) = (decoded.left.unwrap(), decoded.right.unwrap());
    assert!(Rc::ptr_eq(&left, &right));

    let copies = codec.encode_with(&pair, ReuseStrategy::NoReuse).unwrap();
    assert_eq!(count(&copies, Tag::ReferenceId), 0);
    assert!(copies.len() > bytes.len());
    let decoded = codec.decode::<Pair>(&copies).unwrap();
    let (left, right) = (decoded.left.unwrap(), decoded.right.unwrap());
    assert!(!Rc::ptr_eq(&left, &right));
    assert_eq!(*left.borrow(), *right.borrow());
}

#[test]
fn wide_fan_out() {
    const LEN: usize = 100_000;

    let codec = Codec::new();
    let common = shared(Leaf {
        value: String::from("common"),
    });
    let items = (0..LEN)
        .map(|i| match i % 2 {
            0 => common.clone(),
            _ => shared(Leaf {
                value: i.to_string(),
            }),
        })
        .collect();
    let fan = Fan { items };

    let bytes = codec.encode_with(&fan, ReuseStrategy::WideCircularSafe).unwrap();
    let decoded = codec.decode::<Fan>(&bytes).unwrap();
    assert_eq!(decoded.items.len(), LEN);
    assert!(Rc::ptr_eq(&decoded.items[0], &decoded.items[LEN - 2]));
    assert_eq!(decoded.items[LEN - 1].borrow().value, (LEN - 1).to_string());
    assert_eq!(Rc::strong_count(&decoded.items[0]), LEN / 2);
}

#[test]
fn wide_fan_out_of_self_references() {
    const LEN: u32 = 100_000;

    let nodes: Vec<_> = (0..LEN).map(|id| shared(Node { id, next: None })).collect();
    for node in &nodes {
        node.borrow_mut().next = Some(node.clone());
    }
    let loops = Loops { nodes };

    let codec = Codec::new();
    let bytes = codec.encode_with(&loops, ReuseStrategy::WideCircularSafe).unwrap();
    let decoded = codec.decode::<Loops>(&bytes).unwrap();
    assert_eq!(decoded.nodes.len(), LEN as usize);
    for (id, node) in (0..LEN).zip(&decoded.nodes) {
        let next = node.borrow_mut().next.take().unwrap();
        assert!(Rc::ptr_eq(node, &next));
        assert_eq!(node.borrow().id, id);
    }

    for node in &loops.nodes {
        node.borrow_mut().next = None;
    }
}

#[test]
fn deep_chains_need_the_wide_walker() {
    const LEN: u32 = 5_000;

    let head = chain(LEN);
    let codec = Codec::builder().max_depth(64).build();
    let err = codec.encode_with(&head, ReuseStrategy::TreeWithReuse).unwrap_err();
    assert!(matches!(err, CodecError::DepthLimitExceeded { limit: 64 }));

    let bytes = codec.encode_with(&head, ReuseStrategy::WideCircularSafe).unwrap();
    let decoded = codec.decode::<Shared<Node>>(&bytes).unwrap();
    assert_eq!(unlink(decoded), (0..LEN).collect::<Vec<_>>());
    unlink(head);
}

#[test]
fn chains_decode_on_a_small_stack() {
    let len = CodecOptions::DEFAULT_MAX_DEPTH as u32 - 1;
    let head = chain(len);
    let bytes = Codec::new()
        .encode_with(&head, ReuseStrategy::WideCircularSafe)
        .unwrap();
    unlink(head);

    let ids = thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || {
            let decoded = Codec::new().decode::<Shared<Node>>(&bytes).unwrap();
            unlink(decoded)
        })
        .unwrap()
        .join()
        .unwrap();
    assert_eq!(ids.len(), len as usize);
}

#[test]
fn untracked_nesting_counts_against_the_depth_limit() {
    let head = chain(40);
    let writer = Codec::builder().max_depth(64).build();
    let bytes = writer.encode_with(&head, ReuseStrategy::NoReuse).unwrap();
    assert_eq!(count(&bytes, Tag::ReferenceId), 0);
    unlink(head);

    let decoded = writer.decode::<Shared<Node>>(&bytes).unwrap();
    assert_eq!(unlink(decoded).len(), 40);

    let reader = Codec::builder().max_depth(16).build();
    let err = reader.decode::<Shared<Node>>(&bytes).unwrap_err();
    assert!(matches!(err, CodecError::DepthLimitExceeded { limit: 16 }));
}

#[test]
fn reference_limit() {
    let codec = Codec::builder().max_references(1).build();
    let pair = Pair {
        left: Some(shared(Leaf::default())),
        right: Some(shared(Leaf::default())),
    };
    let err = codec.encode(&pair).unwrap_err();
    assert!(matches!(err, CodecError::GraphSizeOverflow { limit: 1 }));

    let bytes = Codec::new().encode(&pair).unwrap();
    let err = codec.decode::<Pair>(&bytes).unwrap_err();
    assert!(matches!(err, CodecError::GraphSizeOverflow { limit: 1 }));
}

#[test]
fn polymorphic_members_keep_identity() {
    let mut registry = TypeRegistry::new();
    registry.register::<Leaf>();
    let codec = Codec::builder()
        .registry(TypeRegistryArc::new(registry))
        .build();

    let leaf: SharedDyn = shared(Leaf {
        value: String::from("dyn"),
    });
    let bag = Bag {
        first: Some(leaf.clone()),
        second: Some(leaf),
    };
    let bytes = codec.encode(&bag).unwrap();
    let decoded = codec.decode::<Bag>(&bytes).unwrap();
    let (first, second) = (decoded.first.unwrap(), decoded.second.unwrap());
    assert!(Rc::ptr_eq(&first, &second));
    let value = first.borrow();
    assert_eq!(value.downcast_ref::<Leaf>().unwrap().value, "dyn");
}
