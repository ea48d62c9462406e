//! Property tests for the equality laws, clone and emission.

use proptest::prelude::*;
use schema_ir::{Schema, clone, emit_declaration, is_equal, parse_declaration, z};
use serde_json::json;

fn leaf() -> impl Strategy<Value = Schema> {
    prop_oneof![
        Just(z::string()),
        Just(z::number()),
        Just(z::boolean()),
        Just(z::null()),
        Just(z::any()),
        (0u32..5, 5u32..20).prop_map(|(lo, hi)| z::string().min(lo).max(hi)),
        (-50i32..50).prop_map(|n| z::number().int().gte(n)),
        "[a-z]{1,6}".prop_map(|s| z::literal(json!(s))),
        prop::collection::vec("[a-z]{1,4}", 1..4).prop_map(z::enumeration),
    ]
}

fn tree() -> impl Strategy<Value = Schema> {
    leaf().prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(z::array),
            inner.clone().prop_map(|s| s.optional()),
            inner.clone().prop_map(|s| s.nullable()),
            prop::collection::vec(inner.clone(), 1..4).prop_map(z::union),
            prop::collection::btree_map("[a-z]{1,4}", inner.clone(), 0..4)
                .prop_map(|shape| z::object(shape.iter().map(|(k, v)| (k.as_str(), v.clone())))),
            (inner.clone(), inner).prop_map(|(a, b)| a.and(b)),
        ]
    })
}

#[derive(Clone, Copy, Debug)]
enum NumberOp {
    Min(i32),
    Max(i32),
    Gt(i32),
    Lt(i32),
    Int,
    MultipleOf(u8),
}

fn apply(schema: Schema, op: NumberOp) -> Schema {
    match op {
        NumberOp::Min(n) => schema.min(n),
        NumberOp::Max(n) => schema.max(n),
        NumberOp::Gt(n) => schema.gt(n),
        NumberOp::Lt(n) => schema.lt(n),
        NumberOp::Int => schema.int(),
        NumberOp::MultipleOf(n) => schema.multiple_of(f64::from(n) + 1.0),
    }
}

fn number_op() -> impl Strategy<Value = NumberOp> {
    prop_oneof![
        any::<i32>().prop_map(NumberOp::Min),
        any::<i32>().prop_map(NumberOp::Max),
        any::<i32>().prop_map(NumberOp::Gt),
        any::<i32>().prop_map(NumberOp::Lt),
        Just(NumberOp::Int),
        any::<u8>().prop_map(NumberOp::MultipleOf),
    ]
}

proptest! {
    #[test]
    fn clone_is_equal_and_distinct(schema in tree()) {
        let copy = clone(&schema);
        prop_assert!(is_equal(&copy, &schema));
        prop_assert!(is_equal(&schema, &copy));
        prop_assert!(!Schema::ptr_eq(&copy, &schema));
    }

    #[test]
    fn check_order_is_irrelevant(
        (ops, shuffled) in prop::collection::vec(number_op(), 0..6)
            .prop_flat_map(|ops| (Just(ops.clone()), Just(ops).prop_shuffle()))
    ) {
        let a = ops.into_iter().fold(z::number(), apply);
        let b = shuffled.into_iter().fold(z::number(), apply);
        prop_assert!(is_equal(&a, &b));
    }

    #[test]
    fn union_member_order_is_irrelevant(members in prop::collection::vec(tree(), 1..5)) {
        let reversed: Vec<Schema> = members.iter().rev().cloned().collect();
        prop_assert!(is_equal(&z::union(members), &z::union(reversed)));
    }

    #[test]
    fn property_order_is_irrelevant(shape in prop::collection::btree_map("[a-z]{1,4}", tree(), 0..5)) {
        let forward = z::object(shape.iter().map(|(k, v)| (k.as_str(), v.clone())));
        let backward = z::object(shape.iter().rev().map(|(k, v)| (k.as_str(), v.clone())));
        prop_assert!(is_equal(&forward, &backward));
    }

    #[test]
    fn emission_is_idempotent(schema in tree()) {
        let text = emit_declaration(&schema).unwrap();
        let parsed = parse_declaration(&text).unwrap();
        prop_assert_eq!(emit_declaration(&parsed).unwrap(), text);
        prop_assert!(is_equal(&parsed, &schema));
    }
}
