use schema_ir::{is_equal, z};
use serde_json::json;

#[test]
fn check_order_does_not_matter() {
    assert!(is_equal(&z::string().min(1).max(10), &z::string().max(10).min(1)));
    assert!(is_equal(&z::number().int().nonnegative(), &z::number().nonnegative().int()));
    assert!(is_equal(&z::array(z::string()).min(1).max(3), &z::array(z::string()).max(3).min(1)));
}

#[test]
fn property_and_member_order_do_not_matter() {
    let ab = z::object([("a", z::string()), ("b", z::number())]);
    let ba = z::object([("b", z::number()), ("a", z::string())]);
    assert!(is_equal(&ab, &ba));
    assert!(is_equal(&z::union([z::string(), z::number()]), &z::union([z::number(), z::string()])));
    assert!(is_equal(&z::enumeration(["x", "y"]), &z::enumeration(["y", "x"])));
    assert!(is_equal(&z::string().and(z::number()), &z::number().and(z::string())));
}

#[test]
fn unknown_key_policies_have_canonical_forms() {
    let shape = || z::object([("a", z::string())]);
    assert!(is_equal(&shape().strict(), &shape().catchall(z::never())));
    assert!(is_equal(&shape().passthrough(), &shape().catchall(z::any())));
    assert!(!is_equal(&shape(), &shape().passthrough()));
}

#[test]
fn structural_differences_are_detected() {
    let a = z::object([("a", z::string()), ("b", z::number())]);
    let b = z::object([("a", z::string()), ("b", z::string())]);
    assert!(!is_equal(&a, &b));
    assert!(!is_equal(&z::array(z::string()).max(10), &z::array(z::string())));
    assert!(!is_equal(&z::string().optional(), &z::string().nullable()));
    assert!(!is_equal(&z::string().default(json!("a")), &z::string().default(json!("b"))));
    assert!(!is_equal(&z::tuple([z::string()]), &z::tuple([z::string()]).rest(z::number())));
    assert!(!is_equal(&z::string().brand("A"), &z::string().brand("B")));
}

#[test]
fn record_without_key_means_string_keys() {
    assert!(is_equal(&z::record(z::number()), &z::record_keyed(z::string(), z::number())));
    assert!(!is_equal(&z::record(z::number()), &z::record_keyed(z::string().min(1), z::number())));
}

#[test]
fn metadata_is_ignored() {
    assert!(is_equal(&z::string().describe("a").title("T"), &z::string()));
}

#[test]
fn refinements_compare_by_shape() {
    let a = z::string().refine(|v| v.as_str().is_some_and(|s| s.len() > 2), Some("short"));
    let b = z::string().refine(|_| true, None);
    assert!(is_equal(&a, &b));
    assert!(!is_equal(&a, &z::string()));
}

#[test]
fn operator_matches_function() {
    let a = z::object([("a", z::string())]);
    assert!(a == schema_ir::clone(&a));
    assert!(a.is_equal(&z::object([("a", z::string())])));
    assert!(a != z::object([("a", z::number())]));
}

#[test]
fn lazy_pairs_that_differ_stay_unequal() {
    let la = z::lazy(z::string);
    let ln = z::lazy(z::number);
    let lb = z::lazy(z::number);
    let ls = z::lazy(z::string);
    let left = z::tuple([z::union([la.clone(), ln]), la]);
    let right = z::tuple([z::union([lb.clone(), ls]), lb]);
    assert!(!is_equal(&left, &right));
    assert!(!is_equal(&right, &left));
}
