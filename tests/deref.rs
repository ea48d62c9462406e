use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::Lazy;
use schema_ir::{Kind, ReferenceRegistry, Schema, dereference, get_references, is_equal, z};

static NODE: Lazy<Schema> = Lazy::new(|| {
    z::object([("owner", z::reference("user")), ("next", z::lazy(|| NODE.clone()).optional())])
});

fn shape(schema: &Schema) -> &indexmap::IndexMap<String, Schema> {
    match schema.kind() {
        Kind::Object(def) => &def.shape,
        other => panic!("object expected, got {:?}", other.type_name()),
    }
}

#[test]
fn every_occurrence_shares_one_node() {
    let foo = z::string().min(3);
    let mapping = HashMap::from([("foo".to_string(), foo.clone())]);
    let s = z::object([("a", z::reference("foo")), ("b", z::reference("foo"))]);
    let resolved = dereference(&s, &mapping).unwrap();
    let shape = shape(&resolved);
    assert!(Schema::ptr_eq(&shape["a"], &shape["b"]));
    assert!(Schema::ptr_eq(&shape["a"], &foo));
    assert!(is_equal(&resolved, &z::object([("a", z::string().min(3)), ("b", z::string().min(3))])));
}

#[test]
fn first_missing_uri_is_reported() {
    let mapping: HashMap<String, Schema> = HashMap::new();
    let s = z::union([z::reference("b"), z::reference("a")]);
    let err = dereference(&s, &mapping).unwrap_err();
    assert_eq!(err.uri, "b");
}

#[test]
fn references_are_listed_first_seen_and_unique() {
    let s = z::object([
        ("x", z::reference("b")),
        ("y", z::array(z::reference("a"))),
        ("z", z::reference("b").optional()),
    ]);
    assert_eq!(get_references(&s), vec!["b".to_string(), "a".to_string()]);
    assert!(get_references(&z::string()).is_empty());
}

#[test]
fn references_inside_hooks_and_effects_are_found() {
    let s = z::exactly_one([z::reference("one"), z::not(z::reference("two"))]);
    assert_eq!(get_references(&s), vec!["one".to_string(), "two".to_string()]);
}

#[test]
fn substituted_schemas_are_not_followed() {
    let registry: ReferenceRegistry = [("a", z::reference("b"))].into_iter().collect();
    let resolved = registry.resolve(&z::reference("a")).unwrap();
    assert!(matches!(resolved.kind(), Kind::Ref(uri) if uri == "b"));
}

#[test]
fn recursive_lazy_resolves_and_stays_cyclic() {
    assert_eq!(get_references(&NODE), vec!["user".to_string()]);
    let registry: ReferenceRegistry = [("user", z::string())].into_iter().collect();
    assert_eq!(registry.missing(&NODE), Vec::<String>::new());

    let resolved = registry.resolve(&NODE).unwrap();
    assert!(get_references(&resolved).is_empty());
    let Kind::Optional(next) = shape(&resolved)["next"].kind() else { panic!("optional expected") };
    let Kind::Lazy(thunk) = next.kind() else { panic!("lazy expected") };
    let again = thunk.force();
    assert!(Schema::ptr_eq(&shape(&again)["owner"], &shape(&resolved)["owner"]));
}

#[test]
fn registry_reports_missing_uris() {
    let mut registry = ReferenceRegistry::new();
    registry.register("a", z::number());
    let s = z::union([z::reference("a"), z::reference("b"), z::reference("c")]);
    assert_eq!(registry.missing(&s), vec!["b".to_string(), "c".to_string()]);
    assert_eq!(registry.resolve(&s).unwrap_err().uri, "b");
}

#[test]
fn dereferenced_lazies_are_freed() {
    let token = Arc::new(());
    let held = Arc::clone(&token);
    let source = z::object([
        ("id", z::reference("id")),
        (
            "body",
            z::lazy(move || {
                let _ = &held;
                z::string()
            }),
        ),
    ]);
    let baseline = Arc::strong_count(&token);

    let mapping = HashMap::from([("id".to_string(), z::number())]);
    let resolved = dereference(&source, &mapping).unwrap();
    let Kind::Lazy(thunk) = shape(&resolved)["body"].kind() else { panic!("lazy expected") };
    assert!(is_equal(&thunk.force(), &z::string()));
    assert_eq!(Arc::strong_count(&token), baseline);

    drop(resolved);
    drop(source);
    assert_eq!(Arc::strong_count(&token), baseline - 1);
}

#[test]
fn uri_appearing_on_a_later_force_is_still_resolved() {
    let forces = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&forces);
    let s = z::lazy(move || {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 { z::string() } else { z::reference("late") }
    });
    let empty: HashMap<String, Schema> = HashMap::new();
    assert_eq!(dereference(&s, &empty).unwrap_err().uri, "late");

    let mapping = HashMap::from([("late".to_string(), z::boolean())]);
    let resolved = dereference(&s, &mapping).unwrap();
    let Kind::Lazy(thunk) = resolved.kind() else { panic!("lazy expected") };
    assert!(Schema::ptr_eq(&thunk.force(), &mapping["late"]));
}
