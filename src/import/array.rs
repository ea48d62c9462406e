use serde_json::{Map, Value};

use super::{Importer, bool_keyword, invalid, usize_keyword};
use crate::error::{InvalidSchemaError, join_pointer};
use crate::ir::Schema;
use crate::z;

/// `items` as a schema is a list (a set with `uniqueItems`); `prefixItems`, or
/// `items` as an array, is a tuple whose rest comes from `items` /
/// `additionalItems` respectively.
pub(super) fn parse(importer: &Importer, map: &Map<String, Value>, path: &str) -> Result<Schema, InvalidSchemaError> {
    let min = usize_keyword(map, "minItems", path)?;
    let max = usize_keyword(map, "maxItems", path)?;
    let unique = bool_keyword(map, "uniqueItems", path)? == Some(true);

    match (map.get("prefixItems"), map.get("items")) {
        (Some(prefix), rest) => tuple(importer, prefix, &join_pointer(path, "prefixItems"), rest, &join_pointer(path, "items")),
        (None, Some(items @ Value::Array(_))) => tuple(
            importer,
            items,
            &join_pointer(path, "items"),
            map.get("additionalItems"),
            &join_pointer(path, "additionalItems"),
        ),
        (None, items) => {
            let element = match items {
                Some(items) => importer.node(items, &join_pointer(path, "items"))?,
                None => z::any(),
            };
            let mut schema = if unique { z::set(element) } else { z::array(element) };
            if let Some(min) = min {
                schema = schema.min(min as f64);
            }
            if let Some(max) = max {
                schema = schema.max(max as f64);
            }
            Ok(schema)
        }
    }
}

fn tuple(
    importer: &Importer,
    items: &Value,
    items_path: &str,
    rest: Option<&Value>,
    rest_path: &str,
) -> Result<Schema, InvalidSchemaError> {
    let Value::Array(items) = items else {
        return Err(invalid(items_path, "expected an array of schemas"));
    };
    let items = items
        .iter()
        .enumerate()
        .map(|(i, item)| importer.node(item, &join_pointer(items_path, &i.to_string())))
        .collect::<Result<Vec<_>, _>>()?;
    let schema = z::tuple(items);
    match rest {
        None | Some(Value::Bool(false)) => Ok(schema),
        Some(rest) => Ok(schema.rest(importer.node(rest, rest_path)?)),
    }
}

#[cfg(test)]
mod tests {
    use crate::equal::is_equal;
    use crate::import::import_schema;
    use crate::z;
    use serde_json::json;

    #[test]
    fn list_with_bounds() {
        let s = import_schema(&json!({"type": "array", "items": {"type": "string"}, "maxItems": 10})).unwrap();
        assert!(is_equal(&s, &z::array(z::string()).max(10)));
        assert!(!is_equal(&s, &z::array(z::string())));
    }

    #[test]
    fn unique_items_is_a_set() {
        let s = import_schema(&json!({"type": "array", "items": {"type": "number"}, "uniqueItems": true})).unwrap();
        assert!(is_equal(&s, &z::set(z::number())));
    }

    #[test]
    fn tuples_in_both_drafts() {
        let modern = import_schema(&json!({
            "type": "array", "prefixItems": [{"type": "string"}, {"type": "number"}], "items": {"type": "boolean"}
        }))
        .unwrap();
        let draft4 = import_schema(&json!({
            "type": "array", "items": [{"type": "string"}, {"type": "number"}], "additionalItems": {"type": "boolean"}
        }))
        .unwrap();
        let expected = z::tuple([z::string(), z::number()]).rest(z::boolean());
        assert!(is_equal(&modern, &expected));
        assert!(is_equal(&draft4, &expected));
    }

    #[test]
    fn missing_items_means_any() {
        let s = import_schema(&json!({"type": "array"})).unwrap();
        assert!(is_equal(&s, &z::array(z::any())));
    }
}
