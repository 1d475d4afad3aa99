use alloc::rc::Rc;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cell::RefCell;

use og_model::derive::Graph;
use og_model::info::Typed;
use og_model::layout::LayoutCache;
use og_model::{Graph, ModelError, Shared, SharedDyn, UnsupportedReason};

use super::AccessorCache;
use crate::error::CodecError;
use crate::names::{DeclaredName, NameTable, NameWriter};
use crate::tracker::{EncodeTracker, ReuseStrategy};
use crate::transform::Transforms;
use crate::walker::{EncodeContext, Encoder, Sink};
use crate::wire::{Tag, WireWriter};

#[derive(Graph, Default)]
struct Point {
    x: f64,
    y: f64,
    tag: Option<String>,
}

#[derive(Graph, Default)]
struct Polyline {
    name: String,
    points: Vec<Point>,
    closed: Option<bool>,
}

#[derive(Graph, Default)]
struct Tree {
    label: String,
    children: Vec<Tree>,
}

#[derive(Graph, Default)]
struct Link {
    next: Option<Shared<Link>>,
    weight: u16,
}

#[derive(Graph, Default)]
struct Left {
    right: Vec<Right>,
}

#[derive(Graph, Default)]
struct Right {
    middle: Vec<Middle>,
}

#[derive(Graph, Default)]
struct Middle {
    right: Vec<Right>,
    left: Vec<Left>,
}

#[derive(Graph, Default)]
struct Open {
    item: Option<SharedDyn>,
}

#[derive(Graph, Default)]
struct Ignoring {
    id: u8,
    #[graph(ignore_specializations)]
    item: Option<SharedDyn>,
}

#[derive(Graph, Default)]
struct Wrapper {
    open: Open,
}

fn generic(value: &dyn Graph) -> Vec<u8> {
    let table = NameTable::new();
    let layouts = LayoutCache::new();
    let transforms = Transforms::default();
    let mut out = Vec::new();
    let mut sink = Sink::new(WireWriter::new(&mut out), NameWriter::new(&table), 64);
    let cx = EncodeContext {
        layouts: &layouts,
        transforms: &transforms,
    };
    let tracker = EncodeTracker::new(ReuseStrategy::NoTrackingFast, u32::MAX);
    Encoder::new(&mut sink, tracker, cx).encode_value(value).unwrap();
    out
}

fn specialized<T: Typed + Graph>(cache: &AccessorCache, value: &T) -> Result<Vec<u8>, CodecError> {
    let table = NameTable::new();
    let entry = cache.get_or_compile(T::type_info(), &LayoutCache::new());
    let routine = entry.routine().unwrap();
    let mut out = Vec::new();
    let mut sink = Sink::new(WireWriter::new(&mut out), NameWriter::new(&table), 64);
    routine(value as &dyn Graph, &mut sink)?;
    Ok(out)
}

#[test]
fn matches_the_generic_walker() {
    let cache = AccessorCache::new();
    let line = Polyline {
        name: String::from("edge"),
        points: Vec::from([
            Point {
                x: 1.0,
                y: -2.5,
                tag: None,
            },
            Point {
                x: 0.0,
                y: 0.0,
                tag: Some(String::from("origin")),
            },
        ]),
        closed: Some(true),
    };
    assert_eq!(specialized(&cache, &line).unwrap(), generic(&line));

    let tree = Tree {
        label: String::from("root"),
        children: Vec::from([
            Tree {
                label: String::from("a"),
                children: Vec::from([Tree::default()]),
            },
            Tree::default(),
        ]),
    };
    assert_eq!(specialized(&cache, &tree).unwrap(), generic(&tree));
}

#[test]
fn self_referencing_records() {
    let cache = AccessorCache::new();
    let tail: Shared<Link> = Rc::new(RefCell::new(Link {
        next: None,
        weight: 2,
    }));
    let head = Link {
        next: Some(tail),
        weight: 1,
    };
    assert_eq!(specialized(&cache, &head).unwrap(), generic(&head));
}

#[test]
fn mutually_recursive_groups() {
    let cache = AccessorCache::new();
    let left = Left {
        right: Vec::from([Right {
            middle: Vec::from([Middle {
                right: Vec::from([Right::default()]),
                left: Vec::from([Left::default()]),
            }]),
        }]),
    };
    assert_eq!(specialized(&cache, &left).unwrap(), generic(&left));

    // `Middle` and `Right` were published with the group rooted at `Left`.
    let middle = Middle {
        right: Vec::new(),
        left: Vec::from([Left::default()]),
    };
    assert_eq!(specialized(&cache, &middle).unwrap(), generic(&middle));
    assert_eq!(cache.len(), 2);
}

#[test]
fn polymorphic_members_are_not_possible() {
    let cache = AccessorCache::new();
    let layouts = LayoutCache::new();

    let entry = cache.get_or_compile(Wrapper::type_info(), &layouts);
    assert!(!entry.is_possible());
    assert_eq!(
        entry.reason(),
        Some(&ModelError::UnsupportedMember {
            type_name: "Open".into(),
            member: "item",
            reason: UnsupportedReason::Polymorphic,
        })
    );

    let again = cache.get_or_compile(Wrapper::type_info(), &layouts);
    assert!(Arc::ptr_eq(&entry, &again));
    assert_eq!(cache.len(), 1);
}

#[test]
fn ignored_specializations_use_the_generic_walker() {
    let cache = AccessorCache::new();
    let leaf: SharedDyn = Rc::new(RefCell::new(Point {
        x: 4.0,
        ..Point::default()
    }));
    let value = Ignoring {
        id: 3,
        item: Some(leaf),
    };
    let bytes = specialized(&cache, &value).unwrap();
    assert_eq!(bytes, generic(&value));
    assert_eq!(bytes[bytes.len() - 2..], [Tag::ObjectEnd as u8, Tag::ObjectEnd as u8]);

    let empty = Ignoring { id: 3, item: None };
    let bytes = specialized(&cache, &empty).unwrap();
    assert_eq!(bytes, generic(&empty));
    assert_eq!(bytes[bytes.len() - 2..], [Tag::Null as u8, Tag::ObjectEnd as u8]);
}

#[test]
fn declared_names_cover_the_shape() {
    let cache = AccessorCache::new();
    let entry = cache.get_or_compile(Polyline::type_info(), &LayoutCache::new());
    let names = entry.names();
    for expected in [
        DeclaredName::of_type("Polyline"),
        DeclaredName::of_type("Point"),
        DeclaredName::of_member("name"),
        DeclaredName::of_member("points"),
        DeclaredName::of_member("closed"),
        DeclaredName::of_member("x"),
        DeclaredName::of_member("tag"),
    ] {
        assert!(names.contains(&expected), "missing {expected:?}");
    }

    let entry = cache.get_or_compile(Open::type_info(), &LayoutCache::new());
    assert_eq!(
        entry.names(),
        [DeclaredName::of_type("Open"), DeclaredName::of_member("item")]
    );
}
