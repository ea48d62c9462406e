use schema_ir::hooks::Route;
use schema_ir::{
    Effect, Error, ImportOptions, Importer, Kind, Schema, TypeName, UnknownFormatPolicy, import_document,
    import_schema, is_equal, z,
};
use serde_json::{Value, json};

fn by_type(schema: &Schema, value: &Value) -> bool {
    match schema.type_name() {
        TypeName::String => value.is_string(),
        TypeName::Number => value.is_number(),
        TypeName::Boolean => value.is_boolean(),
        TypeName::Never => false,
        TypeName::Union => match schema.kind() {
            Kind::Union(options) => options.iter().any(|o| by_type(o, value)),
            _ => false,
        },
        _ => true,
    }
}

#[test]
fn required_and_optional_properties_render() {
    let source = import_document(&json!({
        "type": "object",
        "properties": {"name": {"type": "string"}, "age": {"type": "number"}},
        "required": ["name"]
    }))
    .unwrap();
    assert_eq!(source, r#"z::object([("name", z::string()), ("age", z::number().optional())])"#);
}

#[test]
fn closed_objects_end_in_strict() {
    let source = import_document(&json!({
        "type": "object",
        "properties": {"a": {"type": "boolean"}},
        "required": ["a"],
        "additionalProperties": false
    }))
    .unwrap();
    assert!(source.ends_with(".strict()"), "{source}");
}

#[test]
fn pattern_properties_route_keys() {
    let schema = import_schema(&json!({
        "type": "object",
        "properties": {"id": {"type": "string"}},
        "patternProperties": {"^S_": {"type": "string"}},
        "additionalProperties": {"type": "number"}
    }))
    .unwrap();
    let Kind::Effects(def) = schema.kind() else { panic!("effects expected") };
    let Effect::KeyPatterns(hook) = &def.effect else { panic!("key patterns expected") };

    assert!(matches!(hook.route("S_x"), Route::Pattern(p) if p.source == "^S_"));
    assert!(matches!(hook.route("other"), Route::Fallback(s) if s.type_name() == TypeName::Number));
    assert!(matches!(hook.route("id"), Route::Declared));

    let issues = hook.check(&json!({"id": "x", "S_x": 1, "other": "no", "S_ok": "yes", "n": 3}), by_type);
    let paths: Vec<Vec<String>> = issues.iter().map(|i| i.path.clone()).collect();
    assert_eq!(paths, vec![vec!["S_x".to_string()], vec!["other".to_string()]]);
    assert!(issues.iter().all(|i| i.code == "custom"));
}

#[test]
fn closed_objects_with_pattern_properties_reject_other_keys() {
    let schema = import_schema(&json!({
        "type": "object",
        "properties": {"id": {"type": "string"}},
        "patternProperties": {"^S_": {"type": "string"}},
        "additionalProperties": false
    }))
    .unwrap();
    let Kind::Effects(def) = schema.kind() else { panic!("effects expected") };
    let Effect::KeyPatterns(hook) = &def.effect else { panic!("key patterns expected") };

    assert!(matches!(hook.route("other"), Route::Fallback(s) if s.type_name() == TypeName::Never));
    let issues = hook.check(&json!({"id": "a", "S_x": "ok", "other": "x"}), by_type);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].path, vec!["other".to_string()]);
    assert_eq!(issues[0].message, "Invalid input: must match catchall schema");

    let source = schema.to_declaration().unwrap();
    assert!(source.ends_with(".pattern_properties([(\"^S_\", z::string())], Some(z::never()))?"), "{source}");
}

#[test]
fn type_lists_and_nullable() {
    let s = import_schema(&json!({"type": ["string", "null"]})).unwrap();
    assert!(is_equal(&s, &z::string().nullable()));
    let s = import_schema(&json!({"type": ["string", "number"]})).unwrap();
    assert!(is_equal(&s, &z::union([z::string(), z::number()])));
    let s = import_schema(&json!({"type": "string", "nullable": true})).unwrap();
    assert!(is_equal(&s, &z::string().nullable()));
}

#[test]
fn const_enum_and_booleans() {
    assert!(is_equal(&import_schema(&json!({"const": 3})).unwrap(), &z::literal(json!(3))));
    assert!(is_equal(
        &import_schema(&json!({"enum": ["a", 1]})).unwrap(),
        &z::union([z::literal(json!("a")), z::literal(json!(1))])
    ));
    assert!(is_equal(&import_schema(&json!(true)).unwrap(), &z::any()));
    assert!(is_equal(&import_schema(&json!(false)).unwrap(), &z::never()));
}

#[test]
fn combinators() {
    let s = import_schema(&json!({"anyOf": [{"type": "string"}, {"type": "number"}]})).unwrap();
    assert!(is_equal(&s, &z::union([z::string(), z::number()])));
    let s = import_schema(&json!({"oneOf": [{"type": "string"}, {"type": "number"}]})).unwrap();
    assert!(is_equal(&s, &z::exactly_one([z::string(), z::number()])));
    let s = import_schema(&json!({"not": {"type": "null"}})).unwrap();
    assert!(is_equal(&s, &z::not(z::null())));
}

#[test]
fn modifiers_and_metadata() {
    let source = import_document(&json!({
        "type": "string",
        "description": "Name",
        "readOnly": true,
        "default": "anon",
        "x-zui": {"placeholder": "Your name", "hidden": true}
    }))
    .unwrap();
    assert_eq!(
        source,
        r#"z::string().describe("Name").placeholder("Your name").metadata(json!({"hidden":true})).readonly().default(json!("anon"))"#
    );
}

#[test]
fn references_import_as_placeholders() {
    let s = import_schema(&json!({"type": "object", "properties": {"u": {"$ref": "#/defs/User"}}, "required": ["u"]}))
        .unwrap();
    assert_eq!(schema_ir::get_references(&s), vec!["#/defs/User".to_string()]);
}

#[test]
fn errors_carry_pointers() {
    let err = import_schema(&json!({"properties": {"a": {"type": "frob"}}})).unwrap_err();
    assert_eq!(err.path, "/properties/a/type");
    let err = import_schema(&json!({"enum": []})).unwrap_err();
    assert_eq!(err.path, "/enum");
    let err = import_document(&json!({"type": "string", "pattern": "("})).unwrap_err();
    assert!(matches!(err, Error::InvalidSchema(e) if e.path == "/pattern"));
}

#[test]
fn unknown_formats_follow_policy() {
    let doc = json!({"type": "string", "format": "hostname"});
    assert!(is_equal(&import_schema(&doc).unwrap(), &z::string()));
    let strict = Importer::new(ImportOptions { unknown_format_policy: UnknownFormatPolicy::Reject, ..Default::default() });
    assert_eq!(strict.import(&doc).unwrap_err().path, "/format");
}

#[test]
fn options_deserialize_from_camel_case() {
    let options: ImportOptions =
        serde_json::from_value(json!({"inferObjectMembers": false, "unknownFormatPolicy": "reject"})).unwrap();
    assert!(!options.infer_object_members);
    let s = Importer::new(options).import(&json!({"properties": {"a": {}}})).unwrap();
    assert!(is_equal(&s, &z::any()));
}
