//! Schema tree → JSON Schema document.
//!
//! Keyword names match what the importer reads, so an importable tree comes
//! back equal after export → import. Kinds without a JSON Schema counterpart
//! fail with [`NotSerializableError`].
use serde_json::{Map, Value, json};

use crate::checks::*;
use crate::error::{NotSerializableError, join_pointer};
use crate::ir::*;

pub fn export_document(schema: &Schema) -> Result<Value, NotSerializableError> {
    value(schema, "")
}

impl Schema {
    pub fn to_json_schema(&self) -> Result<Value, NotSerializableError> {
        export_document(self)
    }
}

type Doc = Map<String, Value>;

fn unsupported(schema: &Schema, path: &str, reason: &str) -> NotSerializableError {
    NotSerializableError { path: path.to_string(), kind: schema.type_name(), reason: reason.to_string() }
}

fn typed(name: &str) -> Doc {
    let mut doc = Doc::new();
    doc.insert("type".into(), Value::from(name));
    doc
}

fn number(x: f64) -> Value {
    if x.fract() == 0.0 && x.abs() < 9.0e15 { Value::from(x as i64) } else { Value::from(x) }
}

fn node(schema: &Schema, path: &str) -> Result<Doc, NotSerializableError> {
    let mut doc = kind(schema, path)?;
    annotate(&mut doc, schema.meta());
    Ok(doc)
}

/// [`node`] at a subschema position, where a bare `never` is written as
/// `false`.
fn value(schema: &Schema, path: &str) -> Result<Value, NotSerializableError> {
    if matches!(schema.kind(), Kind::Never) && schema.meta().is_empty() {
        return Ok(Value::Bool(false));
    }
    node(schema, path).map(Value::Object)
}

fn list(items: &[Schema], path: &str) -> Result<Value, NotSerializableError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| value(item, &join_pointer(path, &i.to_string())))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn kind(schema: &Schema, path: &str) -> Result<Doc, NotSerializableError> {
    let at = |segment: &str| join_pointer(path, segment);
    Ok(match schema.kind() {
        Kind::String(def) => string(schema, def, path)?,
        Kind::Number(def) => {
            let integer = def.checks.iter().any(|c| matches!(c, NumberCheck::Int));
            let mut doc = typed(if integer { "integer" } else { "number" });
            for check in &def.checks {
                match check {
                    NumberCheck::Min { value, inclusive: true } => doc.insert("minimum".into(), number(*value)),
                    NumberCheck::Min { value, inclusive: false } => doc.insert("exclusiveMinimum".into(), number(*value)),
                    NumberCheck::Max { value, inclusive: true } => doc.insert("maximum".into(), number(*value)),
                    NumberCheck::Max { value, inclusive: false } => doc.insert("exclusiveMaximum".into(), number(*value)),
                    NumberCheck::MultipleOf(step) => doc.insert("multipleOf".into(), number(*step)),
                    NumberCheck::Int | NumberCheck::Finite => None,
                };
            }
            doc
        }
        Kind::Boolean => typed("boolean"),
        Kind::Null => typed("null"),
        Kind::Any | Kind::Unknown | Kind::Custom(None) => Doc::new(),
        Kind::Never => {
            let mut doc = Doc::new();
            doc.insert("not".into(), json!({}));
            doc
        }
        Kind::Literal(value) => {
            let mut doc = Doc::new();
            doc.insert("const".into(), value.clone());
            doc
        }
        Kind::Enum(values) => {
            let mut doc = typed("string");
            doc.insert("enum".into(), Value::Array(values.iter().cloned().map(Value::from).collect()));
            doc
        }
        Kind::BigInt(_) => return Err(unsupported(schema, path, "bigint has no JSON representation")),
        Kind::Date(_) => return Err(unsupported(schema, path, "dates have no JSON representation")),
        Kind::Symbol | Kind::Undefined | Kind::Void | Kind::NaN => {
            return Err(unsupported(schema, path, "not a JSON value"));
        }
        Kind::Custom(Some(_)) => return Err(unsupported(schema, path, "custom predicate")),
        Kind::NativeEnum(_) => return Err(unsupported(schema, path, "native enums are not exported")),

        Kind::Array(def) => {
            let mut doc = typed("array");
            doc.insert("items".into(), value(&def.element, &at("element"))?);
            sizes(&mut doc, &def.checks);
            doc
        }
        Kind::Set(def) => {
            let mut doc = typed("array");
            doc.insert("items".into(), value(&def.element, &at("element"))?);
            doc.insert("uniqueItems".into(), Value::Bool(true));
            sizes(&mut doc, &def.checks);
            doc
        }
        Kind::Tuple(def) => {
            let mut doc = typed("array");
            doc.insert("prefixItems".into(), list(&def.items, path)?);
            let rest = match &def.rest {
                Some(rest) => value(rest, &at("rest"))?,
                None => Value::Bool(false),
            };
            doc.insert("items".into(), rest);
            doc
        }
        Kind::Object(def) => object(def, path)?,
        Kind::Record(def) => {
            let mut doc = typed("object");
            if let Some(key) = &def.key {
                if !matches!(key.kind(), Kind::String(s) if s.checks.is_empty()) {
                    doc.insert("propertyNames".into(), value(key, &at("key"))?);
                }
            }
            doc.insert("additionalProperties".into(), value(&def.value, &at("value"))?);
            doc
        }
        Kind::Map(_) => return Err(unsupported(schema, path, "maps have no JSON representation")),

        Kind::Union(options) => {
            let mut doc = Doc::new();
            doc.insert("anyOf".into(), list(options, path)?);
            doc
        }
        Kind::DiscriminatedUnion(def) => {
            let mut doc = Doc::new();
            doc.insert("anyOf".into(), list(&def.options, path)?);
            doc
        }
        Kind::Intersection(def) => {
            let mut doc = Doc::new();
            let both = vec![value(&def.left, &at("left"))?, value(&def.right, &at("right"))?];
            doc.insert("allOf".into(), Value::Array(both));
            doc
        }

        // Optionality belongs to the parent's `required` list.
        Kind::Optional(inner) => node(inner, &at("optional"))?,
        Kind::Nullable(inner) => {
            let mut doc = Doc::new();
            doc.insert("anyOf".into(), json!([value(inner, &at("nullable"))?, {"type": "null"}]));
            doc
        }
        Kind::Readonly(inner) => {
            let mut doc = node(inner, &at("readonly"))?;
            doc.insert("readOnly".into(), Value::Bool(true));
            doc
        }
        Kind::Default(def) => {
            let mut doc = node(&def.inner, &at("default"))?;
            doc.insert("default".into(), def.fallback.realize());
            doc
        }
        Kind::Effects(def) => effects(schema, def, path)?,
        Kind::Ref(uri) => {
            let mut doc = Doc::new();
            doc.insert("$ref".into(), Value::from(uri.as_str()));
            doc
        }

        Kind::Catch(_) => return Err(unsupported(schema, path, "catch fallbacks are not exported")),
        Kind::Branded(_) => return Err(unsupported(schema, path, "brands are not exported")),
        Kind::Promise(_) => return Err(unsupported(schema, path, "promises have no JSON representation")),
        Kind::Pipeline(_) => return Err(unsupported(schema, path, "pipelines are not exported")),
        Kind::Function(_) => return Err(unsupported(schema, path, "functions have no JSON representation")),
        Kind::Lazy(_) => return Err(unsupported(schema, path, "lazy schemas are not exported")),
    })
}

fn string(schema: &Schema, def: &StringDef, path: &str) -> Result<Doc, NotSerializableError> {
    let mut doc = typed("string");
    let mut patterns = Vec::new();
    let mut formats = Vec::new();
    for check in &def.checks {
        let format = match check {
            StringCheck::Min(n) => {
                doc.insert("minLength".into(), Value::from(*n));
                continue;
            }
            StringCheck::Max(n) => {
                doc.insert("maxLength".into(), Value::from(*n));
                continue;
            }
            StringCheck::Length(n) => {
                doc.insert("minLength".into(), Value::from(*n));
                doc.insert("maxLength".into(), Value::from(*n));
                continue;
            }
            StringCheck::Regex(source) => {
                patterns.push(source.clone());
                continue;
            }
            StringCheck::StartsWith(prefix) => {
                patterns.push(format!("^{}", regex::escape(prefix)));
                continue;
            }
            StringCheck::EndsWith(suffix) => {
                patterns.push(format!("{}$", regex::escape(suffix)));
                continue;
            }
            StringCheck::Includes { value, position: None } => {
                patterns.push(regex::escape(value));
                continue;
            }
            StringCheck::Includes { position: Some(_), .. } => {
                return Err(unsupported(schema, path, "positional includes has no JSON Schema keyword"));
            }
            StringCheck::Trim | StringCheck::ToLowerCase | StringCheck::ToUpperCase => {
                tracing::debug!(%path, "string transform dropped on export");
                continue;
            }
            StringCheck::Email => "email",
            StringCheck::Url => "uri",
            StringCheck::Emoji => "emoji",
            StringCheck::Uuid => "uuid",
            StringCheck::Cuid => "cuid",
            StringCheck::Cuid2 => "cuid2",
            StringCheck::Ulid => "ulid",
            StringCheck::Datetime { .. } => "date-time",
            StringCheck::Ip(None) => "ip",
            StringCheck::Ip(Some(IpVersion::V4)) => "ipv4",
            StringCheck::Ip(Some(IpVersion::V6)) => "ipv6",
        };
        formats.push(format);
    }
    // One `pattern` and one `format` fit on the node itself; the rest go
    // under `allOf`.
    let mut patterns = patterns.into_iter();
    if let Some(first) = patterns.next() {
        doc.insert("pattern".into(), Value::from(first));
    }
    let mut formats = formats.into_iter();
    if let Some(first) = formats.next() {
        doc.insert("format".into(), Value::from(first));
    }
    let rest: Vec<Value> =
        patterns.map(|p| json!({ "pattern": p })).chain(formats.map(|f| json!({ "format": f }))).collect();
    if !rest.is_empty() {
        doc.insert("allOf".into(), Value::Array(rest));
    }
    Ok(doc)
}

fn sizes(doc: &mut Doc, checks: &[SizeCheck]) {
    for check in checks {
        match check {
            SizeCheck::Min(n) => doc.insert("minItems".into(), Value::from(*n)),
            SizeCheck::Max(n) => doc.insert("maxItems".into(), Value::from(*n)),
            SizeCheck::Exact(n) => {
                doc.insert("minItems".into(), Value::from(*n));
                doc.insert("maxItems".into(), Value::from(*n))
            }
        };
    }
}

fn object(def: &ObjectDef, path: &str) -> Result<Doc, NotSerializableError> {
    let mut doc = typed("object");
    let mut properties = Doc::new();
    let mut required = Vec::new();
    for (key, property) in &def.shape {
        let here = join_pointer(path, key);
        properties.insert(key.clone(), value(property, &here)?);
        if !matches!(property.kind(), Kind::Optional(_) | Kind::Default(_)) {
            required.push(Value::from(key.as_str()));
        }
    }
    doc.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        doc.insert("required".into(), Value::Array(required));
    }
    match &def.unknown_keys {
        UnknownKeys::Strip => {}
        UnknownKeys::Strict => {
            doc.insert("additionalProperties".into(), Value::Bool(false));
        }
        UnknownKeys::Passthrough => {
            doc.insert("additionalProperties".into(), Value::Bool(true));
        }
        UnknownKeys::Catchall(schema) => {
            doc.insert("additionalProperties".into(), value(schema, &join_pointer(path, "catchall"))?);
        }
    }
    Ok(doc)
}

fn effects(schema: &Schema, def: &EffectsDef, path: &str) -> Result<Doc, NotSerializableError> {
    let inner_path = join_pointer(path, def.effect.name());
    let bare_any = matches!(def.inner.kind(), Kind::Any) && def.inner.meta().is_empty();
    let mut doc = match &def.effect {
        Effect::Transform(_) | Effect::Preprocess(_) | Effect::Refinement { .. } => {
            return Err(unsupported(schema, path, &format!("{} runs code", def.effect.name())));
        }
        _ if bare_any => Doc::new(),
        _ => node(&def.inner, &inner_path)?,
    };
    match &def.effect {
        Effect::KeyPatterns(hook) => {
            let mut patterns = Doc::new();
            for pattern in &hook.patterns {
                let here = join_pointer(&inner_path, &pattern.source);
                patterns.insert(pattern.source.clone(), value(&pattern.schema, &here)?);
            }
            doc.insert("patternProperties".into(), Value::Object(patterns));
            // The inner catchall is the union of every pattern; the
            // undeclared-key rule proper is the hook's fallback.
            match &hook.fallback {
                Some(fallback) => {
                    doc.insert("additionalProperties".into(), value(fallback, &join_pointer(&inner_path, "fallback"))?);
                }
                None => {
                    doc.remove("additionalProperties");
                }
            }
        }
        Effect::ExactlyOne(hook) => {
            doc.insert("oneOf".into(), list(&hook.options, &inner_path)?);
        }
        Effect::Not(excluded) => {
            doc.insert("not".into(), value(excluded, &inner_path)?);
        }
        Effect::Transform(_) | Effect::Preprocess(_) | Effect::Refinement { .. } => {}
    }
    Ok(doc)
}

fn annotate(doc: &mut Doc, meta: &Meta) {
    if let Some(description) = &meta.description {
        doc.insert("description".into(), Value::from(description.as_str()));
    }
    if let Some(title) = &meta.title {
        doc.insert("title".into(), Value::from(title.as_str()));
    }
    if !meta.examples.is_empty() {
        doc.insert("examples".into(), Value::Array(meta.examples.clone()));
    }
    if meta.placeholder.is_some() || !meta.ui.is_empty() {
        let mut hints = Doc::new();
        if let Some(placeholder) = &meta.placeholder {
            hints.insert("placeholder".into(), Value::from(placeholder.as_str()));
        }
        for (key, value) in &meta.ui {
            hints.insert(key.clone(), value.clone());
        }
        doc.insert("x-zui".into(), Value::Object(hints));
    }
}
