use schema_ir::{Schema, TypeName, emit_declaration, import_schema, is_equal, parse_declaration, z};
use serde_json::json;

fn corpus() -> Vec<Schema> {
    vec![
        z::string().min(1).max(64).regex("^[a-z]+$").trim(),
        z::string().datetime_with(true, Some(3)).includes_at("T", 10),
        z::number().coerce().gte(-2.5).lt(1e12).finite(),
        z::bigint().positive().multiple_of(3),
        z::date().min(0),
        z::native_enum([("On", json!(1)), ("Off", json!(0))]),
        z::object([("a", z::string()), ("b", z::number().optional())]).passthrough(),
        z::object([("tags", z::set(z::string()).length(2))]).catchall(z::boolean()),
        z::record_keyed(z::enumeration(["x", "y"]), z::number()),
        z::map(z::string(), z::array(z::number()).nonempty()),
        z::discriminated_union("t", [z::object([("t", z::literal(json!("a")))]), z::object([("t", z::literal(json!("b")))])]),
        z::string().or(z::null()).readonly().brand("Tag"),
        z::string().catch(json!("fallback")).promise(),
        z::function(z::tuple([z::string(), z::number()]), z::void()),
        z::string().pipe(z::number().int()),
        z::number().refine_with_source(|v| v.is_number(), "|v| v.is_number()", Some("must be numeric")),
        parse_declaration("z::preprocess(|v| v, z::string())").unwrap().describe("raw").title("Raw"),
        z::string().exactly_one([z::string().email(), z::string().url()]),
        z::object([("a", z::string())]).excluding(z::object([("b", z::any())])).examples([json!({"a": "x"})]),
        z::lazy(|| z::string().uuid()),
        z::reference("#/components/schemas/Pet").nullish(),
    ]
}

#[test]
fn emission_is_idempotent_through_the_reader() {
    for schema in corpus() {
        let first = emit_declaration(&schema).unwrap();
        let parsed = parse_declaration(&first).unwrap_or_else(|e| panic!("{e}\n{first}"));
        assert_eq!(emit_declaration(&parsed).unwrap(), first);
        assert!(is_equal(&parsed, &schema), "{first}");
    }
}

#[test]
fn imported_documents_round_trip() {
    let doc = json!({
        "type": "object",
        "title": "Order",
        "properties": {
            "id": {"type": "string", "format": "uuid"},
            "lines": {"type": "array", "items": {"type": "object", "properties": {"sku": {"type": "string"}}, "required": ["sku"]}},
            "total": {"type": "number", "exclusiveMinimum": 0},
            "state": {"enum": ["new", "paid"], "default": "new"}
        },
        "required": ["id", "lines"],
        "additionalProperties": false
    });
    let schema = import_schema(&doc).unwrap();
    let text = schema.to_declaration().unwrap();
    assert_eq!(emit_declaration(&parse_declaration(&text).unwrap()).unwrap(), text);
}

#[test]
fn unserializable_nodes_report_path_and_kind() {
    let s = z::object([("items", z::array(z::custom_with(|_| true)))]);
    let err = emit_declaration(&s).unwrap_err();
    assert_eq!(err.path, "/items/element");
    assert_eq!(err.kind, TypeName::Custom);

    let err = emit_declaration(&z::number().max(f64::INFINITY)).unwrap_err();
    assert_eq!(err.kind, TypeName::Number);
}

#[test]
fn reader_rejects_malformed_text() {
    for text in ["", "z::", "z::string(", "z::string().min(\"a\")", "z::object([(1, z::string())])", "x::string()"] {
        assert!(parse_declaration(text).is_err(), "{text:?}");
    }
    let err = parse_declaration("z::record(z::string()).pattern_properties([(\"(\", z::string())], None)?").unwrap_err();
    assert!(err.reason.contains("invalid pattern"), "{}", err.reason);
}
