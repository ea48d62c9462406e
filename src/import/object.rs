use regex::Regex;
use serde_json::{Map, Value};

use super::{Importer, invalid};
use crate::error::{InvalidSchemaError, join_pointer};
use crate::ir::{Kind, Schema};
use crate::z;

/// What `additionalProperties` allows.
enum Extra {
    /// Keyword absent.
    Open,
    Closed,
    Anything,
    Typed(Schema),
}

pub(super) fn is_object_shaped(map: &Map<String, Value>) -> bool {
    ["properties", "additionalProperties", "patternProperties"].iter().any(|k| map.contains_key(*k))
}

pub(super) fn parse(importer: &Importer, map: &Map<String, Value>, path: &str) -> Result<Schema, InvalidSchemaError> {
    tracing::debug!(%path, "importing object");

    let required = required_names(map, path)?;
    let properties = match map.get("properties") {
        None => None,
        Some(Value::Object(properties)) => Some(properties),
        Some(_) => return Err(invalid(&join_pointer(path, "properties"), "expected an object")),
    };
    let extra = match map.get("additionalProperties") {
        None => Extra::Open,
        Some(Value::Bool(false)) => Extra::Closed,
        Some(Value::Bool(true)) => Extra::Anything,
        Some(document @ Value::Object(_)) => {
            let schema = importer.node(document, &join_pointer(path, "additionalProperties"))?;
            match schema.kind() {
                Kind::Never if schema.meta().is_empty() => Extra::Closed,
                Kind::Any if schema.meta().is_empty() => Extra::Anything,
                _ => Extra::Typed(schema),
            }
        }
        Some(_) => return Err(invalid(&join_pointer(path, "additionalProperties"), "expected a boolean or a schema")),
    };
    let patterns = pattern_properties(importer, map, path)?;

    if let (Extra::Closed, Some(required)) = (&extra, &required) {
        for (i, name) in required.iter().enumerate() {
            let declared = properties.is_some_and(|p| p.contains_key(name));
            let matched = patterns.iter().any(|(_, regex, _)| regex.is_match(name));
            if !declared && !matched {
                return Err(invalid(
                    &join_pointer(&join_pointer(path, "required"), &i.to_string()),
                    format!("`{name}` is required but additionalProperties is false and no property declares it"),
                ));
            }
        }
    }

    // Undeclared keys accept any pattern schema (or the additional schema);
    // the key-patterns hook then checks each key against its own schema.
    let catchall = {
        let mut members: Vec<Schema> = patterns.iter().map(|(_, _, schema)| schema.clone()).collect();
        if !members.is_empty() {
            match &extra {
                Extra::Typed(schema) => members.push(schema.clone()),
                Extra::Closed => members.push(z::never()),
                Extra::Open | Extra::Anything => {}
            }
        }
        match members.len() {
            0 => None,
            1 => members.pop(),
            _ => Some(z::union(members)),
        }
    };

    let base = match properties {
        Some(properties) => {
            let at = join_pointer(path, "properties");
            let mut shape: Vec<(String, Schema)> = Vec::with_capacity(properties.len());
            for (key, document) in properties {
                let property = importer.node(document, &join_pointer(&at, key))?;
                let is_required = match &required {
                    Some(names) => names.iter().any(|n| n == key),
                    None => document.get("required") == Some(&Value::Bool(true)),
                };
                let has_default = document.get("default").is_some();
                shape.push((key.clone(), if is_required || has_default { property } else { property.optional() }));
            }
            let object = z::object(shape.iter().map(|(k, v)| (k.as_str(), v.clone())));
            match (catchall, &extra) {
                (Some(catchall), _) => object.catchall(catchall),
                (None, Extra::Open) => object,
                (None, Extra::Closed) => object.strict(),
                (None, Extra::Anything) => object.passthrough(),
                (None, Extra::Typed(schema)) => object.catchall(schema.clone()),
            }
        }
        None => z::record(match (catchall, &extra) {
            (Some(catchall), _) => catchall,
            (None, Extra::Closed) => z::never(),
            (None, Extra::Open | Extra::Anything) => z::any(),
            (None, Extra::Typed(schema)) => schema.clone(),
        }),
    };

    if patterns.is_empty() {
        return Ok(base);
    }
    let fallback = match extra {
        Extra::Typed(schema) => Some(schema),
        Extra::Closed => Some(z::never()),
        Extra::Open | Extra::Anything => None,
    };
    base.pattern_properties(patterns.iter().map(|(source, _, schema)| (source.as_str(), schema.clone())), fallback)
        .map_err(|error| invalid(&join_pointer(path, "patternProperties"), error.to_string()))
}

/// `Some` when the object has a `required` array. A boolean `required`
/// belongs to the parent object and is ignored here.
fn required_names(map: &Map<String, Value>, path: &str) -> Result<Option<Vec<String>>, InvalidSchemaError> {
    let at = join_pointer(path, "required");
    match map.get("required") {
        None | Some(Value::Bool(_)) => Ok(None),
        Some(Value::Array(names)) => names
            .iter()
            .enumerate()
            .map(|(i, name)| match name {
                Value::String(name) => Ok(name.clone()),
                _ => Err(invalid(&join_pointer(&at, &i.to_string()), "expected a property name")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
        Some(_) => Err(invalid(&at, "expected an array of property names")),
    }
}

fn pattern_properties(
    importer: &Importer,
    map: &Map<String, Value>,
    path: &str,
) -> Result<Vec<(String, Regex, Schema)>, InvalidSchemaError> {
    let at = join_pointer(path, "patternProperties");
    let patterns = match map.get("patternProperties") {
        None => return Ok(Vec::new()),
        Some(Value::Object(patterns)) => patterns,
        Some(_) => return Err(invalid(&at, "expected an object")),
    };
    let mut out = Vec::with_capacity(patterns.len());
    for (source, document) in patterns {
        let here = join_pointer(&at, source);
        let regex = Regex::new(source).map_err(|error| invalid(&here, format!("invalid regex: {error}")))?;
        out.push((source.clone(), regex, importer.node(document, &here)?));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use crate::equal::is_equal;
    use crate::import::import_schema;
    use crate::ir::{Effect, Kind};
    use crate::z;
    use serde_json::json;

    #[test]
    fn required_and_optional() {
        let s = import_schema(&json!({
            "type": "object",
            "properties": {"a": {"type": "string"}, "b": {"type": "number"}},
            "required": ["a"]
        }))
        .unwrap();
        assert!(is_equal(&s, &z::object([("a", z::string()), ("b", z::number().optional())])));
    }

    #[test]
    fn property_level_required_flag() {
        let s = import_schema(&json!({
            "type": "object",
            "properties": {"a": {"type": "string", "required": true}, "b": {"type": "string", "default": ""}}
        }))
        .unwrap();
        assert!(is_equal(&s, &z::object([("a", z::string()), ("b", z::string().default(json!("")))])));
    }

    #[test]
    fn additional_properties_forms() {
        let with = |extra: serde_json::Value| {
            import_schema(&json!({
                "type": "object", "properties": {"a": {"type": "string"}}, "required": ["a"], "additionalProperties": extra
            }))
            .unwrap()
        };
        let shape = || z::object([("a", z::string())]);
        assert!(is_equal(&with(json!(false)), &shape().strict()));
        assert!(is_equal(&with(json!(true)), &shape().catchall(z::any())));
        assert!(is_equal(&with(json!({})), &shape().passthrough()));
        assert!(is_equal(&with(json!({"type": "number"})), &shape().catchall(z::number())));
    }

    #[test]
    fn records_without_properties() {
        let s = import_schema(&json!({"type": "object", "additionalProperties": {"type": "boolean"}})).unwrap();
        assert!(is_equal(&s, &z::record(z::boolean())));
        let s = import_schema(&json!({"type": "object", "additionalProperties": false})).unwrap();
        assert!(is_equal(&s, &z::record(z::never())));
        let s = import_schema(&json!({"type": "object"})).unwrap();
        assert!(is_equal(&s, &z::record(z::any())));
    }

    #[test]
    fn required_name_forbidden_by_closed_object() {
        let err = import_schema(&json!({
            "type": "object", "properties": {"a": {}}, "required": ["a", "z"], "additionalProperties": false
        }))
        .unwrap_err();
        assert_eq!(err.path, "/required/1");
    }

    #[test]
    fn pattern_properties_build_catchall_and_hook() {
        let s = import_schema(&json!({
            "type": "object",
            "properties": {"id": {"type": "string"}},
            "required": ["id"],
            "patternProperties": {"^S_": {"type": "string"}},
            "additionalProperties": {"type": "number"}
        }))
        .unwrap();
        let Kind::Effects(def) = s.kind() else { panic!("effects expected") };
        let Effect::KeyPatterns(hook) = &def.effect else { panic!("key patterns expected") };
        assert_eq!(hook.declared, vec!["id".to_string()]);
        assert!(hook.fallback.is_some());
        assert!(is_equal(
            &def.inner,
            &z::object([("id", z::string())]).catchall(z::union([z::string(), z::number()]))
        ));
    }

    #[test]
    fn closed_pattern_objects_fall_back_to_never() {
        let s = import_schema(&json!({
            "type": "object",
            "properties": {"id": {"type": "string"}},
            "patternProperties": {"^S_": {"type": "string"}},
            "additionalProperties": false
        }))
        .unwrap();
        let Kind::Effects(def) = s.kind() else { panic!("effects expected") };
        let Effect::KeyPatterns(hook) = &def.effect else { panic!("key patterns expected") };
        assert!(hook.fallback.as_ref().is_some_and(|f| is_equal(f, &z::never())));
        assert!(is_equal(
            &def.inner,
            &z::object([("id", z::string().optional())]).catchall(z::union([z::string(), z::never()]))
        ));
    }

    #[test]
    fn invalid_pattern_names_its_pointer() {
        let err = import_schema(&json!({"type": "object", "patternProperties": {"a/(": {}}})).unwrap_err();
        assert_eq!(err.path, "/patternProperties/a~1(");
    }

    #[test]
    fn combinators_layer_onto_the_object() {
        let member = |key: &str| json!({"required": [key], "properties": {key: {"type": "string"}}});
        let doc = |keyword: &str| {
            json!({
                "type": "object",
                "required": ["a"],
                "properties": {"a": {"type": "string"}},
                keyword: [member("b"), member("c")]
            })
        };
        let base = || z::object([("a", z::string())]);
        let b = || z::object([("b", z::string())]);
        let c = || z::object([("c", z::string())]);

        let any_of = import_schema(&doc("anyOf")).unwrap();
        assert!(is_equal(&any_of, &base().and(z::union([b(), c()]))));
        let all_of = import_schema(&doc("allOf")).unwrap();
        assert!(is_equal(&all_of, &base().and(b().and(c()))));
        let one_of = import_schema(&doc("oneOf")).unwrap();
        assert!(is_equal(&one_of, &base().and(z::exactly_one([b(), c()]))));
    }
}
