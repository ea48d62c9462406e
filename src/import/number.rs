use serde_json::{Map, Value};

use super::{f64_keyword, invalid};
use crate::error::{InvalidSchemaError, join_pointer};
use crate::ir::Schema;
use crate::z;

/// Bound keywords accept both the draft-4 form (`exclusiveMinimum: true`
/// next to `minimum`) and the numeric form (`exclusiveMinimum: 3`).
pub(super) fn parse(map: &Map<String, Value>, path: &str, integer: bool) -> Result<Schema, InvalidSchemaError> {
    let mut schema = z::number();
    if integer {
        schema = schema.int();
    }

    let (exclusive_min_flag, exclusive_min) = exclusive(map, "exclusiveMinimum", path)?;
    if let Some(min) = f64_keyword(map, "minimum", path)? {
        schema = if exclusive_min_flag { schema.gt(min) } else { schema.min(min) };
    }
    if let Some(min) = exclusive_min {
        schema = schema.gt(min);
    }

    let (exclusive_max_flag, exclusive_max) = exclusive(map, "exclusiveMaximum", path)?;
    if let Some(max) = f64_keyword(map, "maximum", path)? {
        schema = if exclusive_max_flag { schema.lt(max) } else { schema.max(max) };
    }
    if let Some(max) = exclusive_max {
        schema = schema.lt(max);
    }

    if let Some(step) = f64_keyword(map, "multipleOf", path)? {
        if step <= 0.0 {
            return Err(invalid(&join_pointer(path, "multipleOf"), "must be greater than 0"));
        }
        schema = schema.multiple_of(step);
    }
    Ok(schema)
}

fn exclusive(map: &Map<String, Value>, key: &str, path: &str) -> Result<(bool, Option<f64>), InvalidSchemaError> {
    match map.get(key) {
        None => Ok((false, None)),
        Some(Value::Bool(flag)) => Ok((*flag, None)),
        Some(Value::Number(_)) => Ok((false, f64_keyword(map, key, path)?)),
        Some(_) => Err(invalid(&join_pointer(path, key), "expected a number or a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use crate::equal::is_equal;
    use crate::import::import_schema;
    use crate::z;
    use serde_json::json;

    #[test]
    fn integer_bounds() {
        let s = import_schema(&json!({"type": "integer", "minimum": 0, "maximum": 10})).unwrap();
        assert!(is_equal(&s, &z::number().max(10).nonnegative().int()));
    }

    #[test]
    fn both_exclusive_forms() {
        let draft4 = import_schema(&json!({"type": "number", "minimum": 1, "exclusiveMinimum": true})).unwrap();
        let modern = import_schema(&json!({"type": "number", "exclusiveMinimum": 1})).unwrap();
        assert!(is_equal(&draft4, &modern));
        assert!(is_equal(&modern, &z::number().gt(1)));
    }

    #[test]
    fn multiple_of_must_be_positive() {
        let err = import_schema(&json!({"type": "number", "multipleOf": 0})).unwrap_err();
        assert_eq!(err.path, "/multipleOf");
    }
}
