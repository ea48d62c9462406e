//! Structured post-validation hooks.
//!
//! The importer compiles `patternProperties`, `oneOf` and `not` into these
//! instead of opaque closures, so they stay comparable, cloneable, emittable and
//! exportable. Running them needs a validator, which this crate does not ship:
//! callers pass one in as `validate(schema, value) -> bool`.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::ir::Schema;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug)]
pub struct KeyPattern {
    pub source: String,
    pub regex: Regex,
    pub schema: Schema,
}

/// Routes every undeclared key of an object to the schema its value must
/// satisfy.
#[derive(Clone, Debug)]
pub struct KeyPatterns {
    /// Keys owned by the object's shape; the hook skips them.
    pub declared: Vec<String>,
    /// Tested in declaration order, first match wins.
    pub patterns: Vec<KeyPattern>,
    pub fallback: Option<Schema>,
}

#[derive(Clone, Debug)]
pub struct ExactlyOne {
    pub options: Vec<Schema>,
}

/// Where a key's value is checked.
#[derive(Clone, Copy, Debug)]
pub enum Route<'a> {
    Declared,
    Pattern(&'a KeyPattern),
    Fallback(&'a Schema),
    Unconstrained,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub path: Vec<String>,
    pub code: &'static str,
    pub message: String,
}

impl Issue {
    fn custom(path: Vec<String>, message: impl Into<String>) -> Self {
        Issue { path, code: "custom", message: message.into() }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl KeyPatterns {
    pub fn new<'a>(
        declared: impl IntoIterator<Item = String>,
        patterns: impl IntoIterator<Item = (&'a str, Schema)>,
        fallback: Option<Schema>,
    ) -> Result<Self, regex::Error> {
        let patterns = patterns
            .into_iter()
            .map(|(source, schema)| {
                Ok(KeyPattern { source: source.to_string(), regex: Regex::new(source)?, schema })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(KeyPatterns { declared: declared.into_iter().collect(), patterns, fallback })
    }

    pub fn route(&self, key: &str) -> Route<'_> {
        if self.declared.iter().any(|d| d == key) {
            return Route::Declared;
        }
        if let Some(hit) = self.patterns.iter().find(|p| p.regex.is_match(key)) {
            return Route::Pattern(hit);
        }
        match &self.fallback {
            Some(schema) => Route::Fallback(schema),
            None => Route::Unconstrained,
        }
    }

    /// Issues for every undeclared key whose value its routed schema rejects.
    /// Non-object values produce no issues; the base object schema owns that.
    pub fn check(&self, value: &Value, validate: impl Fn(&Schema, &Value) -> bool) -> Vec<Issue> {
        let Some(map) = value.as_object() else { return Vec::new() };
        let mut issues = Vec::new();
        for (key, item) in map {
            match self.route(key) {
                Route::Declared | Route::Unconstrained => {}
                Route::Pattern(pattern) => {
                    if !validate(&pattern.schema, item) {
                        issues.push(Issue::custom(
                            vec![key.clone()],
                            format!("Invalid input: Key matching regex /{}/ must match schema", pattern.source),
                        ));
                    }
                }
                Route::Fallback(schema) => {
                    if !validate(schema, item) {
                        issues.push(Issue::custom(vec![key.clone()], "Invalid input: must match catchall schema"));
                    }
                }
            }
        }
        issues
    }
}

impl ExactlyOne {
    pub fn new(options: impl IntoIterator<Item = Schema>) -> Self {
        ExactlyOne { options: options.into_iter().collect() }
    }

    pub fn check(&self, value: &Value, validate: impl Fn(&Schema, &Value) -> bool) -> Vec<Issue> {
        let matched = self.options.iter().filter(|s| validate(s, value)).count();
        if matched == 1 {
            return Vec::new();
        }
        vec![Issue::custom(
            Vec::new(),
            format!("Invalid input: must match exactly one schema, matched {matched}"),
        )]
    }
}

pub fn check_not(schema: &Schema, value: &Value, validate: impl Fn(&Schema, &Value) -> bool) -> Vec<Issue> {
    if validate(schema, value) {
        vec![Issue::custom(Vec::new(), "Invalid input: must not match schema")]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TypeName;
    use crate::z;
    use serde_json::json;

    /// Type-only stand-in for a validator.
    fn by_type(schema: &Schema, value: &Value) -> bool {
        match schema.type_name() {
            TypeName::String => value.is_string(),
            TypeName::Number => value.is_number(),
            TypeName::Boolean => value.is_boolean(),
            TypeName::Any => true,
            _ => false,
        }
    }

    fn hook() -> KeyPatterns {
        KeyPatterns::new(
            ["id".to_string()],
            [("^S_", z::string()), ("^N_", z::number())],
            Some(z::number()),
        )
        .unwrap()
    }

    #[test]
    fn routes_first_match_then_fallback() {
        let h = hook();
        assert!(matches!(h.route("id"), Route::Declared));
        assert!(matches!(h.route("S_x"), Route::Pattern(p) if p.source == "^S_"));
        assert!(matches!(h.route("other"), Route::Fallback(_)));
    }

    #[test]
    fn reports_failures_at_key_path() {
        let h = hook();
        let issues = h.check(&json!({"id": true, "S_x": 1, "other": "no", "N_ok": 2}), by_type);
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].path, vec!["S_x".to_string()]);
        assert_eq!(issues[0].message, "Invalid input: Key matching regex /^S_/ must match schema");
        assert_eq!(issues[1].path, vec!["other".to_string()]);
        assert_eq!(issues[1].message, "Invalid input: must match catchall schema");
    }

    #[test]
    fn no_fallback_leaves_key_alone() {
        let h = KeyPatterns::new(Vec::new(), [("^S_", z::string())], None).unwrap();
        assert!(h.check(&json!({"x": 1}), by_type).is_empty());
    }

    #[test]
    fn bad_regex_is_an_error() {
        assert!(KeyPatterns::new(Vec::new(), [("(", z::string())], None).is_err());
    }

    #[test]
    fn exactly_one_counts_matches() {
        let h = ExactlyOne::new([z::string(), z::any()]);
        assert_eq!(h.check(&json!("x"), by_type).len(), 1);
        assert!(h.check(&json!(1), by_type).is_empty());
    }
}
