/// Address derivation for each type shape.

use bootkit::{derive_address, Container, Identity, Injectable, Shape, TypeDescriptor, ERROR_ADDRESS};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

mod app {
    pub mod db {
        pub struct Pool;
        pub struct Typed<T>(pub T);
        bootkit::injectable!(Pool, Typed<u8>, Typed<Pool>);
    }

    pub trait Clock: Send + Sync {}
    impl bootkit::Injectable for dyn Clock {}
}

#[test]
fn test_named_types_use_module_path_and_name() {
    let (address, ok) = derive_address(&app::db::Pool::descriptor(), None);
    assert!(ok);
    assert_eq!(address.as_str(), "unit_key::app::db.Pool");
}

#[test]
fn test_generic_arguments_stay_in_the_name() {
    let (address, _) = derive_address(&app::db::Typed::<u8>::descriptor(), None);
    assert_eq!(address.as_str(), "unit_key::app::db.Typed<u8>");

    let (nested, _) = derive_address(&app::db::Typed::<app::db::Pool>::descriptor(), None);
    assert_eq!(
        nested.as_str(),
        "unit_key::app::db.Typed<unit_key::app::db::Pool>"
    );
}

#[test]
fn test_trait_objects_are_addressed_by_trait_path() {
    let (address, ok) = derive_address(&<dyn app::Clock>::descriptor(), None);
    assert!(ok);
    assert_eq!(address.as_str(), "unit_key::app.Clock");
}

#[test]
fn test_primitives_have_no_scope() {
    assert_eq!(derive_address(&u64::descriptor(), None).0.as_str(), "u64");
    assert_eq!(derive_address(&bool::descriptor(), None).0.as_str(), "bool");
}

#[test]
fn test_pointers_and_arrays_are_transparent() {
    let plain = derive_address(&app::db::Pool::descriptor(), None);
    assert_eq!(derive_address(&<Arc<app::db::Pool>>::descriptor(), None), plain);
    assert_eq!(
        derive_address(&<Arc<Arc<app::db::Pool>>>::descriptor(), None),
        plain
    );
    assert_eq!(derive_address(&<[app::db::Pool; 2]>::descriptor(), None), plain);
}

#[test]
fn test_pointer_to_unnamed_element_is_not_a_dependency() {
    let (_, ok) = derive_address(&<Arc<fn() -> u8>>::descriptor(), None);
    assert!(!ok);
}

#[test]
fn test_maps_and_vectors_are_named_slots() {
    let vec = derive_address(&<Vec<app::db::Pool>>::descriptor(), None);
    let map = derive_address(&<HashMap<String, u8>>::descriptor(), None);
    let tree = derive_address(&<BTreeMap<String, u8>>::descriptor(), None);
    assert!(vec.1 && map.1 && tree.1);
    assert_ne!(map.0, tree.0);
    assert!(vec.0.as_str().starts_with("alloc::vec.Vec<"));
}

#[test]
fn test_error_like_types_share_the_error_address() {
    for descriptor in [
        bootkit::DiError::descriptor(),
        anyhow::Error::descriptor(),
        std::io::Error::descriptor(),
    ] {
        let (address, ok) = derive_address(&descriptor, None);
        assert_eq!(address.as_str(), ERROR_ADDRESS);
        assert!(!ok);
        assert!(descriptor.is_error());
    }
}

#[test]
fn test_callables_need_an_identity() {
    let descriptor = TypeDescriptor::callable::<fn(u8) -> u8>("fn(u8) -> u8");
    let (bare, ok) = derive_address(&descriptor, None);
    assert_eq!(bare.as_str(), "fn(u8) -> u8");
    assert!(!ok);

    let first = Identity::next();
    let second = Identity::next();
    assert_ne!(first, second);

    let (a, ok_a) = derive_address(&descriptor, Some(first));
    let (b, _) = derive_address(&descriptor, Some(second));
    assert!(ok_a);
    assert_ne!(a, b);
    assert_eq!(a.as_str(), format!("fn(u8) -> u8#{}", first.get()));
}

#[test]
fn test_anonymous_types_are_not_dependencies() {
    let descriptor = TypeDescriptor::anonymous::<(u8, u16)>();
    assert_eq!(descriptor.shape(), &Shape::Anonymous);
    assert!(!derive_address(&descriptor, None).1);
}

#[test]
fn test_derivation_is_stable() {
    let first = derive_address(&app::db::Pool::descriptor(), None);
    let second = derive_address(&app::db::Pool::descriptor(), None);
    assert_eq!(first, second);
    assert_eq!(
        Container::address_of::<app::db::Pool>(),
        Some(first.0.clone())
    );
    assert_eq!(Container::address_of::<std::io::Error>(), None);
}
