use regex::Regex;
use serde_json::{Map, Value};

use super::{Importer, UnknownFormatPolicy, invalid, str_keyword, usize_keyword};
use crate::error::{InvalidSchemaError, join_pointer};
use crate::ir::Schema;
use crate::z;

pub(super) fn parse(importer: &Importer, map: &Map<String, Value>, path: &str) -> Result<Schema, InvalidSchemaError> {
    let mut schema = z::string();
    if let Some(n) = usize_keyword(map, "minLength", path)? {
        schema = schema.min(n as f64);
    }
    if let Some(n) = usize_keyword(map, "maxLength", path)? {
        schema = schema.max(n as f64);
    }
    if let Some(pattern) = str_keyword(map, "pattern", path)? {
        if let Err(error) = Regex::new(pattern) {
            return Err(invalid(&join_pointer(path, "pattern"), format!("invalid regex: {error}")));
        }
        schema = schema.regex(pattern);
    }
    if let Some(format) = str_keyword(map, "format", path)? {
        schema = apply_format(schema, format, importer.options.unknown_format_policy, path)?;
    }
    Ok(schema)
}

/// `format` → the matching string check. Names follow the export side, so a
/// tree survives export → import.
fn apply_format(
    schema: Schema,
    format: &str,
    policy: UnknownFormatPolicy,
    path: &str,
) -> Result<Schema, InvalidSchemaError> {
    Ok(match format {
        "email" => schema.email(),
        "uri" | "url" => schema.url(),
        "uuid" => schema.uuid(),
        "date-time" => schema.datetime(),
        "ipv4" => schema.ipv4(),
        "ipv6" => schema.ipv6(),
        "ip" => schema.ip(),
        "emoji" => schema.emoji(),
        "cuid" => schema.cuid(),
        "cuid2" => schema.cuid2(),
        "ulid" => schema.ulid(),
        other => match policy {
            UnknownFormatPolicy::Warn => {
                tracing::warn!(%path, format = other, "unknown string format ignored");
                schema
            }
            UnknownFormatPolicy::Reject => {
                return Err(invalid(&join_pointer(path, "format"), format!("unknown format `{other}`")));
            }
        },
    })
}

#[cfg(test)]
mod tests {
    use crate::equal::is_equal;
    use crate::import::{ImportOptions, Importer, UnknownFormatPolicy, import_schema};
    use crate::z;
    use serde_json::json;

    #[test]
    fn lengths_pattern_and_format() {
        let s = import_schema(&json!({
            "type": "string", "minLength": 1, "maxLength": 5, "pattern": "^a", "format": "email"
        }))
        .unwrap();
        assert!(is_equal(&s, &z::string().email().regex("^a").max(5).min(1)));
    }

    #[test]
    fn bad_pattern_is_rejected() {
        let err = import_schema(&json!({"type": "string", "pattern": "(["})).unwrap_err();
        assert_eq!(err.path, "/pattern");
    }

    #[test]
    fn unknown_format_follows_policy() {
        let doc = json!({"type": "string", "format": "hostname"});
        assert!(is_equal(&import_schema(&doc).unwrap(), &z::string()));
        let strict = Importer::new(ImportOptions {
            unknown_format_policy: UnknownFormatPolicy::Reject,
            ..ImportOptions::default()
        });
        assert_eq!(strict.import(&doc).unwrap_err().path, "/format");
    }

    #[test]
    fn negative_length_is_rejected() {
        assert!(import_schema(&json!({"type": "string", "minLength": -1})).is_err());
    }
}
