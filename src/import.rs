//! JSON-Schema-style documents → schema trees.
//!
//! The importer walks a document top-down and builds the equivalent tree with
//! the same builders a user would call, so [`import_document`] is simply
//! `emit_declaration(import_schema(doc))`.
//!
//! Per node, modifiers are applied in a fixed order so emission is canonical:
//!
//! ```text
//! base (+ checks) → not → metadata → nullable → readonly → default
//! ```
//!
//! `.optional()` is added by the parent object, only for properties that are
//! neither required nor defaulted.
pub mod array;
pub mod number;
pub mod object;
pub mod string;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, InvalidSchemaError, join_pointer};
use crate::ir::Schema;
use crate::z;

// ————————————————————————————————————————————————————————————————————————————
// OPTIONS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFormatPolicy {
    /// Log and import the string without a format check.
    #[default]
    Warn,
    Reject,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImportOptions {
    /// Treat schemas without `type` that carry `properties`,
    /// `additionalProperties` or `patternProperties` as objects.
    pub infer_object_members: bool,
    pub unknown_format_policy: UnknownFormatPolicy,
}

impl Default for ImportOptions {
    fn default() -> Self {
        ImportOptions { infer_object_members: true, unknown_format_policy: UnknownFormatPolicy::Warn }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINTS
// ————————————————————————————————————————————————————————————————————————————

pub fn import_schema(document: &Value) -> Result<Schema, InvalidSchemaError> {
    Importer::default().import(document)
}

/// Import `document` and render the result as constructor source text.
pub fn import_document(document: &Value) -> Result<String, Error> {
    let schema = import_schema(document)?;
    Ok(crate::emit::emit_declaration(&schema)?)
}

#[derive(Clone, Debug, Default)]
pub struct Importer {
    pub options: ImportOptions,
}

impl Importer {
    pub fn new(options: ImportOptions) -> Self {
        Importer { options }
    }

    pub fn import(&self, document: &Value) -> Result<Schema, InvalidSchemaError> {
        self.node(document, "")
    }

    pub(crate) fn node(&self, document: &Value, path: &str) -> Result<Schema, InvalidSchemaError> {
        let map = match document {
            Value::Bool(true) => return Ok(z::any()),
            Value::Bool(false) => return Ok(z::never()),
            Value::Object(map) => map,
            _ => return Err(invalid(path, "expected an object or a boolean")),
        };
        let mut schema = self.base(map, path)?;
        if let Some(not) = map.get("not") {
            schema = schema.excluding(self.node(not, &join_pointer(path, "not"))?);
        }
        schema = annotate(schema, map, path)?;
        if bool_keyword(map, "nullable", path)? == Some(true) {
            schema = schema.nullable();
        }
        if bool_keyword(map, "readOnly", path)? == Some(true) {
            schema = schema.readonly();
        }
        if let Some(value) = map.get("default") {
            schema = schema.default(value.clone());
        }
        Ok(schema)
    }

    fn base(&self, map: &Map<String, Value>, path: &str) -> Result<Schema, InvalidSchemaError> {
        if let Some(uri) = str_keyword(map, "$ref", path)? {
            return Ok(z::reference(uri));
        }
        if let Some(value) = map.get("const") {
            return Ok(z::literal(value.clone()));
        }
        if let Some(values) = map.get("enum") {
            return enumeration(values, &join_pointer(path, "enum"));
        }
        let typed = self.typed(map, path)?;
        let combined = self.combinators(map, path)?;
        Ok(match (typed, combined) {
            (Some(typed), Some(combined)) => typed.and(combined),
            (Some(typed), None) => typed,
            (None, Some(combined)) => combined,
            (None, None) => z::any(),
        })
    }

    fn typed(&self, map: &Map<String, Value>, path: &str) -> Result<Option<Schema>, InvalidSchemaError> {
        match map.get("type") {
            None if self.options.infer_object_members && object::is_object_shaped(map) => {
                object::parse(self, map, path).map(Some)
            }
            None if map.contains_key("items") || map.contains_key("prefixItems") => {
                array::parse(self, map, path).map(Some)
            }
            None => Ok(None),
            Some(Value::String(name)) => self.single_type(name, map, path).map(Some),
            Some(Value::Array(names)) => {
                let at = join_pointer(path, "type");
                let mut rest: Vec<&str> = Vec::new();
                let mut nullable = false;
                for (i, name) in names.iter().enumerate() {
                    match name.as_str() {
                        Some("null") => nullable = true,
                        Some(name) if !rest.contains(&name) => rest.push(name),
                        Some(_) => {}
                        None => return Err(invalid(&join_pointer(&at, &i.to_string()), "expected a type name")),
                    }
                }
                let schema = match rest.as_slice() {
                    [] if nullable => return Ok(Some(z::null())),
                    [] => return Err(invalid(&at, "type list must not be empty")),
                    [one] => self.single_type(one, map, path)?,
                    many => z::union(
                        many.iter().map(|name| self.single_type(name, map, path)).collect::<Result<Vec<_>, _>>()?,
                    ),
                };
                Ok(Some(if nullable { schema.nullable() } else { schema }))
            }
            Some(_) => Err(invalid(&join_pointer(path, "type"), "expected a string or an array of strings")),
        }
    }

    fn single_type(&self, name: &str, map: &Map<String, Value>, path: &str) -> Result<Schema, InvalidSchemaError> {
        match name {
            "string" => string::parse(self, map, path),
            "number" => number::parse(map, path, false),
            "integer" => number::parse(map, path, true),
            "boolean" => Ok(z::boolean()),
            "null" => Ok(z::null()),
            "array" => array::parse(self, map, path),
            "object" => object::parse(self, map, path),
            other => Err(invalid(&join_pointer(path, "type"), format!("unknown type `{other}`"))),
        }
    }

    /// `anyOf`, `oneOf` and `allOf`, intersected with each other when several
    /// are present.
    fn combinators(&self, map: &Map<String, Value>, path: &str) -> Result<Option<Schema>, InvalidSchemaError> {
        let mut parts = Vec::new();
        for keyword in ["anyOf", "oneOf", "allOf"] {
            if let Some(members) = map.get(keyword) {
                parts.push(self.combinator(keyword, members, &join_pointer(path, keyword))?);
            }
        }
        Ok(parts.into_iter().reduce(|acc, part| acc.and(part)))
    }

    fn combinator(&self, keyword: &str, members: &Value, path: &str) -> Result<Schema, InvalidSchemaError> {
        let Value::Array(items) = members else {
            return Err(invalid(path, "expected an array of schemas"));
        };
        tracing::debug!(%path, members = items.len(), "importing {keyword}");
        let mut members = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.node(item, &join_pointer(path, &i.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        if members.is_empty() {
            return Err(invalid(path, "must not be empty"));
        }
        if members.len() == 1 {
            return Ok(members.remove(0));
        }
        Ok(match keyword {
            "anyOf" => z::union(members),
            "oneOf" => z::exactly_one(members),
            // a ∧ (b ∧ c)
            _ => members.into_iter().rev().reduce(|acc, member| member.and(acc)).unwrap_or_else(z::any),
        })
    }
}

// ————————————————————————————————————————————————————————————————————————————
// SHARED KEYWORDS
// ————————————————————————————————————————————————————————————————————————————

fn enumeration(values: &Value, path: &str) -> Result<Schema, InvalidSchemaError> {
    let Value::Array(values) = values else {
        return Err(invalid(path, "expected an array"));
    };
    match values.as_slice() {
        [] => Err(invalid(path, "must not be empty")),
        [one] => Ok(z::literal(one.clone())),
        many if many.iter().all(Value::is_string) => Ok(z::enumeration(many.iter().filter_map(Value::as_str))),
        many => Ok(z::union(many.iter().cloned().map(z::literal))),
    }
}

/// Metadata keywords: `description`, `title`, `examples`, `x-zui`.
fn annotate(mut schema: Schema, map: &Map<String, Value>, path: &str) -> Result<Schema, InvalidSchemaError> {
    if let Some(description) = str_keyword(map, "description", path)? {
        schema = schema.describe(description);
    }
    if let Some(title) = str_keyword(map, "title", path)? {
        schema = schema.title(title);
    }
    match map.get("examples") {
        None => {}
        Some(Value::Array(examples)) => schema = schema.examples(examples.iter().cloned()),
        Some(_) => return Err(invalid(&join_pointer(path, "examples"), "expected an array")),
    }
    match map.get("x-zui") {
        None => {}
        Some(Value::Object(hints)) => {
            let at = join_pointer(path, "x-zui");
            let mut hints = hints.clone();
            match hints.remove("placeholder") {
                None => {}
                Some(Value::String(placeholder)) => schema = schema.placeholder(&placeholder),
                Some(_) => return Err(invalid(&join_pointer(&at, "placeholder"), "expected a string")),
            }
            if !hints.is_empty() {
                schema = schema.metadata(Value::Object(hints));
            }
        }
        Some(_) => return Err(invalid(&join_pointer(path, "x-zui"), "expected an object")),
    }
    Ok(schema)
}

// ------------------------- Keyword accessors ----------------------------- //

pub(crate) fn invalid(path: &str, reason: impl Into<String>) -> InvalidSchemaError {
    InvalidSchemaError { path: path.to_string(), reason: reason.into() }
}

pub(crate) fn str_keyword<'v>(
    map: &'v Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Option<&'v str>, InvalidSchemaError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(invalid(&join_pointer(path, key), "expected a string")),
    }
}

pub(crate) fn bool_keyword(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<bool>, InvalidSchemaError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(invalid(&join_pointer(path, key), "expected a boolean")),
    }
}

pub(crate) fn f64_keyword(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<f64>, InvalidSchemaError> {
    match map.get(key) {
        None => Ok(None),
        Some(Value::Number(n)) => match n.as_f64() {
            Some(x) => Ok(Some(x)),
            None => Err(invalid(&join_pointer(path, key), "number out of range")),
        },
        Some(_) => Err(invalid(&join_pointer(path, key), "expected a number")),
    }
}

/// Non-negative integer (`3` or `3.0`).
pub(crate) fn usize_keyword(map: &Map<String, Value>, key: &str, path: &str) -> Result<Option<usize>, InvalidSchemaError> {
    let Some(value) = f64_keyword(map, key, path)? else { return Ok(None) };
    if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(invalid(&join_pointer(path, key), "expected a non-negative integer"));
    }
    Ok(Some(value as usize))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equal::is_equal;
    use serde_json::json;

    #[test]
    fn booleans_are_any_and_never() {
        assert!(is_equal(&import_schema(&json!(true)).unwrap(), &z::any()));
        assert!(is_equal(&import_schema(&json!(false)).unwrap(), &z::never()));
    }

    #[test]
    fn type_lists_become_unions_or_nullables() {
        let s = import_schema(&json!({"type": ["string", "null"]})).unwrap();
        assert!(is_equal(&s, &z::string().nullable()));
        let s = import_schema(&json!({"type": ["string", "number"]})).unwrap();
        assert!(is_equal(&s, &z::union([z::number(), z::string()])));
    }

    #[test]
    fn enums_pick_the_narrowest_form() {
        let s = import_schema(&json!({"enum": ["a", "b"]})).unwrap();
        assert!(is_equal(&s, &z::enumeration(["b", "a"])));
        let s = import_schema(&json!({"enum": [1]})).unwrap();
        assert!(is_equal(&s, &z::literal(json!(1))));
        let s = import_schema(&json!({"enum": ["a", 1]})).unwrap();
        assert!(is_equal(&s, &z::union([z::literal(json!("a")), z::literal(json!(1))])));
    }

    #[test]
    fn modifiers_apply_in_order() {
        let s = import_schema(&json!({
            "type": "string",
            "description": "d",
            "nullable": true,
            "readOnly": true,
            "default": "x"
        }))
        .unwrap();
        assert!(is_equal(&s, &z::string().nullable().readonly().default(json!("x"))));
    }

    #[test]
    fn unknown_type_is_reported_with_pointer() {
        let err = import_schema(&json!({"properties": {"a/b": {"type": "strang"}}})).unwrap_err();
        assert_eq!(err.path, "/properties/a~1b/type");
        assert!(err.reason.contains("strang"));
    }

    #[test]
    fn empty_enum_is_rejected() {
        let err = import_schema(&json!({"enum": []})).unwrap_err();
        assert_eq!(err.path, "/enum");
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let options: ImportOptions = serde_json::from_value(json!({"unknownFormatPolicy": "reject"})).unwrap();
        assert!(options.infer_object_members);
        assert_eq!(options.unknown_format_policy, UnknownFormatPolicy::Reject);
    }
}
