use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;

use crate::derive::Graph;
use crate::info::Typed;
use crate::layout::{LayoutCache, MemberClass, MemberKind, MemberLayout};
use crate::{ModelError, Record, UnsupportedReason};

#[derive(Graph, Default)]
struct Animal {
    name: String,
    legs: u32,
}

#[derive(Graph, Default)]
struct Dog {
    #[graph(base)]
    base: Animal,
    name: String,
    #[graph(optional)]
    good: Option<bool>,
    #[graph(skip)]
    cache: Vec<u8>,
}

#[derive(Graph)]
struct Raw {
    ptr: *const u8,
}

impl Default for Raw {
    fn default() -> Self {
        Self {
            ptr: core::ptr::null(),
        }
    }
}

#[derive(Graph)]
#[graph(error_base)]
struct Failure {
    message: String,
    source: *const u8,
}

impl Default for Failure {
    fn default() -> Self {
        Self {
            message: String::new(),
            source: core::ptr::null(),
        }
    }
}

#[derive(Graph, Default)]
#[graph(deprecated(name = "Name", ty = String, get = Self::full, set = Self::set_full, replacement = "full_name"))]
struct Person {
    full_name: String,
}

impl Person {
    fn full(&self) -> String {
        self.full_name.clone()
    }

    fn set_full(&mut self, value: String) {
        self.full_name = value;
    }
}

#[derive(Graph, Default)]
struct Clash {
    a: u8,
    #[graph(rename = "a")]
    b: u8,
}

fn layout_of<T: Typed>() -> Result<MemberLayout, ModelError> {
    MemberLayout::analyze(T::type_info().as_struct().unwrap())
}

#[test]
fn inherited_members_come_first() {
    let layout = layout_of::<Dog>().unwrap();
    let names: Vec<_> = layout.members().iter().map(|m| m.wire_name()).collect();
    assert_eq!(names, ["Animal.name", "legs", "name", "good"]);
    assert_eq!(layout.excluded(), ["cache"]);

    assert_eq!(layout.member(0).depth(), 1);
    assert_eq!(layout.member(2).depth(), 0);
    assert_eq!(layout.find("name"), Some(2));
    assert_eq!(layout.find("cache"), None);
}

#[test]
fn optional_members_are_not_mandatory() {
    let layout = layout_of::<Dog>().unwrap();
    let good = layout.find("good").unwrap();
    assert_eq!(layout.member(good).class(), MemberClass::OptionalOnRead);
    assert!(!layout.mandatory().contains(good));
    assert_eq!(layout.mandatory().count_ones(..), 3);
}

#[test]
fn members_read_and_write_through_the_base_chain() {
    let layout = layout_of::<Dog>().unwrap();
    let mut dog = Dog::default();
    let record: &mut dyn Record = &mut dog;

    let inherited = layout.member(layout.find("Animal.name").unwrap());
    inherited.set(record, Box::new(String::from("Rex"))).unwrap();
    assert!(inherited.set(record, Box::new(7_u8)).is_err());

    let value = inherited.get(record).unwrap();
    assert_eq!(value.as_graph().downcast_ref::<String>().unwrap(), "Rex");
    assert_eq!(dog.base.name, "Rex");
}

#[test]
fn pointer_like_members_are_rejected() {
    let err = layout_of::<Raw>().unwrap_err();
    assert!(matches!(
        err,
        ModelError::UnsupportedMember {
            member: "ptr",
            reason: UnsupportedReason::PointerLike,
            ..
        }
    ));
}

#[test]
fn error_bases_exclude_pointer_like_members() {
    let layout = layout_of::<Failure>().unwrap();
    assert_eq!(layout.len(), 1);
    assert_eq!(layout.excluded(), ["source"]);
}

#[test]
fn deprecated_members_credit_their_replacement() {
    let layout = layout_of::<Person>().unwrap();
    assert_eq!(layout.len(), 2);

    let index = layout.find("Name").unwrap();
    let member = layout.member(index);
    assert_eq!(
        member.class(),
        MemberClass::Deprecated {
            former: "Name",
            replacement: Some("full_name"),
        }
    );
    assert!(!member.is_mandatory());
    assert!(matches!(
        member.kind(),
        MemberKind::Deprecated { replacement: Some(0), .. }
    ));

    let mut person = Person::default();
    member.set(&mut person, Box::new(String::from("Ada"))).unwrap();
    assert_eq!(person.full_name, "Ada");
    let value = member.get(&person).unwrap();
    assert_eq!(value.as_graph().downcast_ref::<String>().unwrap(), "Ada");
}

#[test]
fn duplicate_wire_names_are_rejected() {
    let err = layout_of::<Clash>().unwrap_err();
    assert!(matches!(err, ModelError::DuplicateMember { .. }));
}

#[test]
fn cache_keeps_results_and_errors() {
    let cache = LayoutCache::new();
    assert!(cache.is_empty());

    let a = cache.get_for(Dog::type_info()).unwrap();
    let b = cache.get_for(Dog::type_info()).unwrap();
    assert!(Arc::ptr_eq(&a, &b));

    assert!(cache.get_for(Raw::type_info()).is_err());
    assert!(cache.get_for(Raw::type_info()).is_err());
    assert!(matches!(
        cache.get_for(u8::type_info()),
        Err(ModelError::NotARecord { .. })
    ));
    assert_eq!(cache.len(), 2);
}
