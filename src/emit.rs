//! Declaration emitter: schema tree → constructor source text.
//!
//! The output is a single Rust expression in this crate's builder vocabulary,
//! e.g. `z::object([("a", z::string().min(1))]).strict()`. Checks keep their
//! insertion order, properties their declaration order, so re-emitting a tree
//! read back from the output is byte-identical.
//!
//! Values (`literal`, `default`, examples, ...) go through `json!(...)` with
//! compact JSON inside; strings use Rust string-literal escaping.

use serde_json::Value;

use crate::checks::*;
use crate::error::{NotSerializableError, join_pointer};
use crate::ir::*;
use crate::traverse::Visited;

pub mod typedecl;

pub use typedecl::{DeclarationForm, TypeDeclarationOptions, emit_type_declaration};

pub fn emit_declaration(schema: &Schema) -> Result<String, NotSerializableError> {
    Emitter::default().node(schema, "")
}

impl Schema {
    pub fn to_declaration(&self) -> Result<String, NotSerializableError> {
        emit_declaration(self)
    }
}

#[derive(Default)]
struct Emitter {
    /// Lazy nodes on the current path.
    open_lazies: Visited,
}

pub(crate) fn fail(schema: &Schema, path: &str, reason: impl Into<String>) -> NotSerializableError {
    NotSerializableError { path: path.to_string(), kind: schema.type_name(), reason: reason.into() }
}

fn quote(s: &str) -> String {
    format!("{s:?}")
}

fn json(value: &Value) -> String {
    format!("json!({value})")
}

/// Integral values print without a fraction while they fit an `i32`
/// literal; larger integral values get a `.0` so they read back as floats.
fn num(schema: &Schema, path: &str, x: f64) -> Result<String, NotSerializableError> {
    if !x.is_finite() {
        return Err(fail(schema, path, format!("non-finite bound {x}")));
    }
    if x.fract() == 0.0 {
        if x.abs() <= i32::MAX as f64 {
            return Ok(format!("{}", x as i64));
        }
        return Ok(format!("{x:.1}"));
    }
    Ok(format!("{x:?}"))
}

fn int(x: i64) -> String {
    if x.unsigned_abs() <= i32::MAX as u64 { x.to_string() } else { format!("{x}.0") }
}

impl Emitter {
    fn node(&mut self, schema: &Schema, path: &str) -> Result<String, NotSerializableError> {
        let mut out = self.kind(schema, path)?;
        out.push_str(&meta(schema.meta()));
        Ok(out)
    }

    fn list(&mut self, items: &[Schema], path: &str) -> Result<String, NotSerializableError> {
        let parts = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.node(item, &join_pointer(path, &i.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(format!("[{}]", parts.join(", ")))
    }

    fn kind(&mut self, schema: &Schema, path: &str) -> Result<String, NotSerializableError> {
        let at = |segment: &str| join_pointer(path, segment);
        Ok(match schema.kind() {
            Kind::String(def) => {
                let mut out = String::from("z::string()");
                if def.coerce {
                    out.push_str(".coerce()");
                }
                for check in &def.checks {
                    out.push_str(&string_check(check));
                }
                out
            }
            Kind::Number(def) => {
                let mut out = String::from("z::number()");
                if def.coerce {
                    out.push_str(".coerce()");
                }
                for check in &def.checks {
                    out.push_str(&match check {
                        NumberCheck::Min { value, inclusive: true } => format!(".min({})", num(schema, path, *value)?),
                        NumberCheck::Min { value, inclusive: false } => format!(".gt({})", num(schema, path, *value)?),
                        NumberCheck::Max { value, inclusive: true } => format!(".max({})", num(schema, path, *value)?),
                        NumberCheck::Max { value, inclusive: false } => format!(".lt({})", num(schema, path, *value)?),
                        NumberCheck::Int => ".int()".to_string(),
                        NumberCheck::MultipleOf(step) => format!(".multiple_of({})", num(schema, path, *step)?),
                        NumberCheck::Finite => ".finite()".to_string(),
                    });
                }
                out
            }
            Kind::BigInt(def) => {
                let mut out = String::from("z::bigint()");
                if def.coerce {
                    out.push_str(".coerce()");
                }
                for check in &def.checks {
                    out.push_str(&match check {
                        BigIntCheck::Min { value, inclusive: true } => format!(".min({})", int(*value)),
                        BigIntCheck::Min { value, inclusive: false } => format!(".gt({})", int(*value)),
                        BigIntCheck::Max { value, inclusive: true } => format!(".max({})", int(*value)),
                        BigIntCheck::Max { value, inclusive: false } => format!(".lt({})", int(*value)),
                        BigIntCheck::MultipleOf(step) => format!(".multiple_of({})", int(*step)),
                    });
                }
                out
            }
            Kind::Date(def) => {
                let mut out = String::from("z::date()");
                if def.coerce {
                    out.push_str(".coerce()");
                }
                for check in &def.checks {
                    out.push_str(&match check {
                        DateCheck::Min(ms) => format!(".min({})", int(*ms)),
                        DateCheck::Max(ms) => format!(".max({})", int(*ms)),
                    });
                }
                out
            }
            Kind::Boolean => "z::boolean()".into(),
            Kind::Symbol => "z::symbol()".into(),
            Kind::Null => "z::null()".into(),
            Kind::Undefined => "z::undefined()".into(),
            Kind::Void => "z::void()".into(),
            Kind::Never => "z::never()".into(),
            Kind::Unknown => "z::unknown()".into(),
            Kind::Any => "z::any()".into(),
            Kind::NaN => "z::nan()".into(),
            Kind::Custom(None) => "z::custom()".into(),
            Kind::Custom(Some(predicate)) => match &predicate.source {
                Some(source) => format!("z::custom_with({source})"),
                None => return Err(fail(schema, path, "custom predicate has no source text")),
            },
            Kind::Literal(value) => format!("z::literal({})", json(value)),
            Kind::Enum(values) => {
                let values: Vec<String> = values.iter().map(|v| quote(v)).collect();
                format!("z::enumeration([{}])", values.join(", "))
            }
            Kind::NativeEnum(mapping) => {
                let entries: Vec<String> = mapping.iter().map(|(k, v)| format!("({}, {})", quote(k), json(v))).collect();
                format!("z::native_enum([{}])", entries.join(", "))
            }

            Kind::Array(def) => format!("z::array({}){}", self.node(&def.element, &at("element"))?, size_checks(&def.checks)),
            Kind::Set(def) => format!("z::set({}){}", self.node(&def.element, &at("element"))?, size_checks(&def.checks)),
            Kind::Tuple(def) => {
                let mut out = format!("z::tuple({})", self.list(&def.items, path)?);
                if let Some(rest) = &def.rest {
                    out.push_str(&format!(".rest({})", self.node(rest, &at("rest"))?));
                }
                out
            }
            Kind::Object(def) => {
                let mut entries = Vec::with_capacity(def.shape.len());
                for (key, value) in &def.shape {
                    entries.push(format!("({}, {})", quote(key), self.node(value, &at(key))?));
                }
                let mut out = format!("z::object([{}])", entries.join(", "));
                match &def.unknown_keys {
                    UnknownKeys::Strip => {}
                    UnknownKeys::Strict => out.push_str(".strict()"),
                    UnknownKeys::Passthrough => out.push_str(".passthrough()"),
                    UnknownKeys::Catchall(s) => out.push_str(&format!(".catchall({})", self.node(s, &at("catchall"))?)),
                }
                out
            }
            Kind::Record(def) => match &def.key {
                None => format!("z::record({})", self.node(&def.value, &at("value"))?),
                Some(key) => format!(
                    "z::record_keyed({}, {})",
                    self.node(key, &at("key"))?,
                    self.node(&def.value, &at("value"))?
                ),
            },
            Kind::Map(def) => {
                format!("z::map({}, {})", self.node(&def.key, &at("key"))?, self.node(&def.value, &at("value"))?)
            }

            Kind::Union(options) => format!("z::union({})", self.list(options, path)?),
            Kind::DiscriminatedUnion(def) => {
                format!("z::discriminated_union({}, {})", quote(&def.discriminator), self.list(&def.options, path)?)
            }
            Kind::Intersection(def) => {
                format!("{}.and({})", self.node(&def.left, &at("left"))?, self.node(&def.right, &at("right"))?)
            }

            Kind::Optional(inner) => format!("{}.optional()", self.node(inner, &at("optional"))?),
            Kind::Nullable(inner) => format!("{}.nullable()", self.node(inner, &at("nullable"))?),
            Kind::Readonly(inner) => format!("{}.readonly()", self.node(inner, &at("readonly"))?),
            Kind::Promise(inner) => format!("{}.promise()", self.node(inner, &at("promise"))?),
            Kind::Branded(def) => format!("{}.brand({})", self.node(&def.inner, &at("branded"))?, quote(&def.brand)),
            Kind::Default(def) => {
                format!("{}.default({})", self.node(&def.inner, &at("default"))?, json(&def.fallback.realize()))
            }
            Kind::Catch(def) => format!("{}.catch({})", self.node(&def.inner, &at("catch"))?, json(&def.fallback.realize())),
            Kind::Effects(def) => self.effects(schema, def, path)?,
            Kind::Pipeline(def) => {
                format!("{}.pipe({})", self.node(&def.input, &at("input"))?, self.node(&def.output, &at("output"))?)
            }
            Kind::Function(def) => {
                format!("z::function({}, {})", self.node(&def.args, &at("args"))?, self.node(&def.returns, &at("returns"))?)
            }
            Kind::Lazy(thunk) => {
                if !self.open_lazies.first_visit(schema) {
                    return Err(fail(schema, path, "lazy schema refers to itself"));
                }
                let body = self.node(&thunk.force(), &at("lazy"));
                self.open_lazies.leave(schema);
                format!("z::lazy(|| {})", body?)
            }

            Kind::Ref(uri) => format!("z::reference({})", quote(uri)),
        })
    }

    fn effects(&mut self, schema: &Schema, def: &EffectsDef, path: &str) -> Result<String, NotSerializableError> {
        let bare_any = matches!(def.inner.kind(), Kind::Any) && def.inner.meta().is_empty();
        let inner_path = join_pointer(path, def.effect.name());
        let source = |opaque_source: &Option<String>| match opaque_source {
            Some(source) => Ok(source.clone()),
            None => Err(fail(schema, path, format!("{} has no source text", def.effect.name()))),
        };
        Ok(match &def.effect {
            Effect::Transform(f) => format!("{}.transform({})", self.node(&def.inner, &inner_path)?, source(&f.source)?),
            Effect::Preprocess(f) => format!("z::preprocess({}, {})", source(&f.source)?, self.node(&def.inner, &inner_path)?),
            Effect::Refinement { predicate, message } => format!(
                "{}.refine({}, {})",
                self.node(&def.inner, &inner_path)?,
                source(&predicate.source)?,
                match message {
                    Some(message) => format!("Some({})", quote(message)),
                    None => "None".to_string(),
                }
            ),
            Effect::KeyPatterns(hook) => {
                let mut patterns = Vec::with_capacity(hook.patterns.len());
                for pattern in &hook.patterns {
                    let here = join_pointer(&inner_path, &pattern.source);
                    patterns.push(format!("({}, {})", quote(&pattern.source), self.node(&pattern.schema, &here)?));
                }
                let fallback = match &hook.fallback {
                    Some(fallback) => format!("Some({})", self.node(fallback, &join_pointer(&inner_path, "fallback"))?),
                    None => "None".to_string(),
                };
                format!(
                    "{}.pattern_properties([{}], {})?",
                    self.node(&def.inner, &inner_path)?,
                    patterns.join(", "),
                    fallback
                )
            }
            Effect::ExactlyOne(hook) if bare_any => format!("z::exactly_one({})", self.list(&hook.options, &inner_path)?),
            Effect::ExactlyOne(hook) => format!(
                "{}.exactly_one({})",
                self.node(&def.inner, &inner_path)?,
                self.list(&hook.options, &inner_path)?
            ),
            Effect::Not(excluded) if bare_any => format!("z::not({})", self.node(excluded, &inner_path)?),
            Effect::Not(excluded) => {
                format!("{}.excluding({})", self.node(&def.inner, &inner_path)?, self.node(excluded, &inner_path)?)
            }
        })
    }
}

fn string_check(check: &StringCheck) -> String {
    match check {
        StringCheck::Min(n) => format!(".min({n})"),
        StringCheck::Max(n) => format!(".max({n})"),
        StringCheck::Length(n) => format!(".length({n})"),
        StringCheck::Email => ".email()".into(),
        StringCheck::Url => ".url()".into(),
        StringCheck::Emoji => ".emoji()".into(),
        StringCheck::Uuid => ".uuid()".into(),
        StringCheck::Cuid => ".cuid()".into(),
        StringCheck::Cuid2 => ".cuid2()".into(),
        StringCheck::Ulid => ".ulid()".into(),
        StringCheck::Includes { value, position: None } => format!(".includes({})", quote(value)),
        StringCheck::Includes { value, position: Some(at) } => format!(".includes_at({}, {at})", quote(value)),
        StringCheck::StartsWith(s) => format!(".starts_with({})", quote(s)),
        StringCheck::EndsWith(s) => format!(".ends_with({})", quote(s)),
        StringCheck::Regex(s) => format!(".regex({})", quote(s)),
        StringCheck::Trim => ".trim()".into(),
        StringCheck::ToLowerCase => ".to_lower_case()".into(),
        StringCheck::ToUpperCase => ".to_upper_case()".into(),
        StringCheck::Datetime { offset: false, precision: None } => ".datetime()".into(),
        StringCheck::Datetime { offset, precision } => format!(
            ".datetime_with({offset}, {})",
            precision.map(|p| format!("Some({p})")).unwrap_or_else(|| "None".into())
        ),
        StringCheck::Ip(None) => ".ip()".into(),
        StringCheck::Ip(Some(IpVersion::V4)) => ".ipv4()".into(),
        StringCheck::Ip(Some(IpVersion::V6)) => ".ipv6()".into(),
    }
}

fn size_checks(checks: &[SizeCheck]) -> String {
    checks
        .iter()
        .map(|check| match check {
            SizeCheck::Min(n) => format!(".min({n})"),
            SizeCheck::Max(n) => format!(".max({n})"),
            SizeCheck::Exact(n) => format!(".length({n})"),
        })
        .collect()
}

fn meta(meta: &Meta) -> String {
    let mut out = String::new();
    if let Some(description) = &meta.description {
        out.push_str(&format!(".describe({})", quote(description)));
    }
    if let Some(title) = &meta.title {
        out.push_str(&format!(".title({})", quote(title)));
    }
    if let Some(placeholder) = &meta.placeholder {
        out.push_str(&format!(".placeholder({})", quote(placeholder)));
    }
    if !meta.examples.is_empty() {
        let examples: Vec<String> = meta.examples.iter().map(json).collect();
        out.push_str(&format!(".examples([{}])", examples.join(", ")));
    }
    if !meta.ui.is_empty() {
        let hints: serde_json::Map<String, Value> = meta.ui.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        out.push_str(&format!(".metadata({})", json(&Value::Object(hints))));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::z;
    use once_cell::sync::Lazy;
    use serde_json::json;

    static SELF_REF: Lazy<Schema> = Lazy::new(|| z::object([("next", z::lazy(|| SELF_REF.clone()))]));

    #[test]
    fn object_with_checks_and_modifiers() {
        let s = z::object([("name", z::string().min(1)), ("age", z::number().int().nonnegative().optional())]).strict();
        assert_eq!(
            emit_declaration(&s).unwrap(),
            r#"z::object([("name", z::string().min(1)), ("age", z::number().int().min(0).optional())]).strict()"#
        );
    }

    #[test]
    fn numbers_print_as_literals() {
        let s = z::number().gt(0.5).max(1e10);
        assert_eq!(emit_declaration(&s).unwrap(), "z::number().gt(0.5).max(10000000000.0)");
    }

    #[test]
    fn values_and_metadata() {
        let s = z::enumeration(["a", "b"]).default(json!("a")).describe("pick \"one\"");
        assert_eq!(
            emit_declaration(&s).unwrap(),
            r#"z::enumeration(["a", "b"]).default(json!("a")).describe("pick \"one\"")"#
        );
    }

    #[test]
    fn opaque_without_source_is_not_serializable() {
        let s = z::object([("a", z::string().transform(|v| v))]);
        let err = emit_declaration(&s).unwrap_err();
        assert_eq!(err.path, "/a");
        assert_eq!(err.kind, TypeName::Effects);
        let s = z::string().transform_with_source(|v| v, "|v| v");
        assert_eq!(emit_declaration(&s).unwrap(), "z::string().transform(|v| v)");
    }

    #[test]
    fn self_referencing_lazy_is_not_serializable() {
        let err = emit_declaration(&SELF_REF).unwrap_err();
        assert_eq!(err.kind, TypeName::Lazy);
    }

    #[test]
    fn non_recursive_lazy_is_inlined() {
        let s = z::lazy(|| z::string());
        assert_eq!(emit_declaration(&s).unwrap(), "z::lazy(|| z::string())");
    }

    #[test]
    fn hooks_have_builder_forms() {
        assert_eq!(emit_declaration(&z::not(z::string())).unwrap(), "z::not(z::string())");
        let s = z::record(z::string()).pattern_properties([("^a", z::string())], None).unwrap();
        assert_eq!(
            emit_declaration(&s).unwrap(),
            r#"z::record(z::string()).pattern_properties([("^a", z::string())], None)?"#
        );
    }
}
