//! Builder methods on [`Schema`].
//!
//! Every method returns a new node. Check methods (`min`, `email`, ...) look at
//! the receiver's kind and attach the matching check; on a kind that carries no
//! such check they fail a debug assertion and, in release builds, log a warning
//! and return the receiver unchanged.

use std::sync::Arc;

use serde_json::Value;

use crate::checks::*;
use crate::hooks::{ExactlyOne, KeyPatterns};
use crate::ir::*;
use crate::z;

fn size(n: f64) -> usize {
    if n <= 0.0 { 0 } else { n as usize }
}

// ------------------------------- Checks ---------------------------------- //

impl Schema {
    fn misuse(&self, method: &'static str) -> Schema {
        tracing::warn!(method, kind = %self.type_name(), "builder method does not apply; ignored");
        debug_assert!(false, "`{method}` does not apply to {}", self.type_name());
        self.clone()
    }

    fn string_check(&self, method: &'static str, check: StringCheck) -> Schema {
        match self.kind() {
            Kind::String(def) => {
                let mut def = def.clone();
                push_unique(&mut def.checks, check);
                self.rebuild(Kind::String(def))
            }
            _ => self.misuse(method),
        }
    }

    fn number_check(&self, method: &'static str, check: NumberCheck) -> Schema {
        match self.kind() {
            Kind::Number(def) => {
                let mut def = def.clone();
                push_unique(&mut def.checks, check);
                self.rebuild(Kind::Number(def))
            }
            _ => self.misuse(method),
        }
    }

    fn bigint_check(&self, method: &'static str, check: BigIntCheck) -> Schema {
        match self.kind() {
            Kind::BigInt(def) => {
                let mut def = def.clone();
                push_unique(&mut def.checks, check);
                self.rebuild(Kind::BigInt(def))
            }
            _ => self.misuse(method),
        }
    }

    fn date_check(&self, method: &'static str, check: DateCheck) -> Schema {
        match self.kind() {
            Kind::Date(def) => {
                let mut def = def.clone();
                push_unique(&mut def.checks, check);
                self.rebuild(Kind::Date(def))
            }
            _ => self.misuse(method),
        }
    }

    fn size_check(&self, method: &'static str, check: SizeCheck) -> Schema {
        match self.kind() {
            Kind::Array(def) => {
                let mut def = def.clone();
                push_unique(&mut def.checks, check);
                self.rebuild(Kind::Array(def))
            }
            Kind::Set(def) => {
                let mut def = def.clone();
                push_unique(&mut def.checks, check);
                self.rebuild(Kind::Set(def))
            }
            _ => self.misuse(method),
        }
    }

    /// Lower bound: string length, number value (inclusive), bigint value,
    /// date (ms since epoch), array length or set size.
    pub fn min(&self, n: impl Into<f64>) -> Schema {
        let n = n.into();
        match self.kind() {
            Kind::String(_) => self.string_check("min", StringCheck::Min(size(n))),
            Kind::Number(_) => self.number_check("min", NumberCheck::Min { value: n, inclusive: true }),
            Kind::BigInt(_) => self.bigint_check("min", BigIntCheck::Min { value: n as i64, inclusive: true }),
            Kind::Date(_) => self.date_check("min", DateCheck::Min(n as i64)),
            _ => self.size_check("min", SizeCheck::Min(size(n))),
        }
    }

    /// Upper bound, mirror of [`Schema::min`].
    pub fn max(&self, n: impl Into<f64>) -> Schema {
        let n = n.into();
        match self.kind() {
            Kind::String(_) => self.string_check("max", StringCheck::Max(size(n))),
            Kind::Number(_) => self.number_check("max", NumberCheck::Max { value: n, inclusive: true }),
            Kind::BigInt(_) => self.bigint_check("max", BigIntCheck::Max { value: n as i64, inclusive: true }),
            Kind::Date(_) => self.date_check("max", DateCheck::Max(n as i64)),
            _ => self.size_check("max", SizeCheck::Max(size(n))),
        }
    }

    pub fn length(&self, n: usize) -> Schema {
        match self.kind() {
            Kind::String(_) => self.string_check("length", StringCheck::Length(n)),
            _ => self.size_check("length", SizeCheck::Exact(n)),
        }
    }

    pub fn nonempty(&self) -> Schema {
        self.min(1)
    }

    pub fn gt(&self, n: impl Into<f64>) -> Schema {
        let n = n.into();
        match self.kind() {
            Kind::BigInt(_) => self.bigint_check("gt", BigIntCheck::Min { value: n as i64, inclusive: false }),
            _ => self.number_check("gt", NumberCheck::Min { value: n, inclusive: false }),
        }
    }

    pub fn gte(&self, n: impl Into<f64>) -> Schema {
        self.min(n)
    }

    pub fn lt(&self, n: impl Into<f64>) -> Schema {
        let n = n.into();
        match self.kind() {
            Kind::BigInt(_) => self.bigint_check("lt", BigIntCheck::Max { value: n as i64, inclusive: false }),
            _ => self.number_check("lt", NumberCheck::Max { value: n, inclusive: false }),
        }
    }

    pub fn lte(&self, n: impl Into<f64>) -> Schema {
        self.max(n)
    }

    pub fn positive(&self) -> Schema {
        self.gt(0)
    }

    pub fn nonnegative(&self) -> Schema {
        self.gte(0)
    }

    pub fn negative(&self) -> Schema {
        self.lt(0)
    }

    pub fn nonpositive(&self) -> Schema {
        self.lte(0)
    }

    pub fn int(&self) -> Schema {
        self.number_check("int", NumberCheck::Int)
    }

    pub fn finite(&self) -> Schema {
        self.number_check("finite", NumberCheck::Finite)
    }

    pub fn multiple_of(&self, n: impl Into<f64>) -> Schema {
        let n = n.into();
        match self.kind() {
            Kind::BigInt(_) => self.bigint_check("multipleOf", BigIntCheck::MultipleOf(n as i64)),
            _ => self.number_check("multipleOf", NumberCheck::MultipleOf(n)),
        }
    }

    pub fn email(&self) -> Schema {
        self.string_check("email", StringCheck::Email)
    }

    pub fn url(&self) -> Schema {
        self.string_check("url", StringCheck::Url)
    }

    pub fn emoji(&self) -> Schema {
        self.string_check("emoji", StringCheck::Emoji)
    }

    pub fn uuid(&self) -> Schema {
        self.string_check("uuid", StringCheck::Uuid)
    }

    pub fn cuid(&self) -> Schema {
        self.string_check("cuid", StringCheck::Cuid)
    }

    pub fn cuid2(&self) -> Schema {
        self.string_check("cuid2", StringCheck::Cuid2)
    }

    pub fn ulid(&self) -> Schema {
        self.string_check("ulid", StringCheck::Ulid)
    }

    /// Pattern is stored as written; compile it first if it comes from
    /// untrusted input.
    pub fn regex(&self, pattern: &str) -> Schema {
        self.string_check("regex", StringCheck::Regex(pattern.to_string()))
    }

    pub fn includes(&self, value: &str) -> Schema {
        self.string_check("includes", StringCheck::Includes { value: value.to_string(), position: None })
    }

    pub fn includes_at(&self, value: &str, position: usize) -> Schema {
        self.string_check("includes", StringCheck::Includes { value: value.to_string(), position: Some(position) })
    }

    pub fn starts_with(&self, prefix: &str) -> Schema {
        self.string_check("startsWith", StringCheck::StartsWith(prefix.to_string()))
    }

    pub fn ends_with(&self, suffix: &str) -> Schema {
        self.string_check("endsWith", StringCheck::EndsWith(suffix.to_string()))
    }

    pub fn trim(&self) -> Schema {
        self.string_check("trim", StringCheck::Trim)
    }

    pub fn to_lower_case(&self) -> Schema {
        self.string_check("toLowerCase", StringCheck::ToLowerCase)
    }

    pub fn to_upper_case(&self) -> Schema {
        self.string_check("toUpperCase", StringCheck::ToUpperCase)
    }

    pub fn datetime(&self) -> Schema {
        self.datetime_with(false, None)
    }

    pub fn datetime_with(&self, offset: bool, precision: Option<usize>) -> Schema {
        self.string_check("datetime", StringCheck::Datetime { offset, precision })
    }

    pub fn ip(&self) -> Schema {
        self.string_check("ip", StringCheck::Ip(None))
    }

    pub fn ipv4(&self) -> Schema {
        self.string_check("ip", StringCheck::Ip(Some(IpVersion::V4)))
    }

    pub fn ipv6(&self) -> Schema {
        self.string_check("ip", StringCheck::Ip(Some(IpVersion::V6)))
    }

    /// Coerce input to the primitive before checking it.
    pub fn coerce(&self) -> Schema {
        match self.kind() {
            Kind::String(def) => self.rebuild(Kind::String(StringDef { coerce: true, ..def.clone() })),
            Kind::Number(def) => self.rebuild(Kind::Number(NumberDef { coerce: true, ..def.clone() })),
            Kind::BigInt(def) => self.rebuild(Kind::BigInt(BigIntDef { coerce: true, ..def.clone() })),
            Kind::Date(def) => self.rebuild(Kind::Date(DateDef { coerce: true, ..def.clone() })),
            _ => self.misuse("coerce"),
        }
    }
}

// ---------------------------- Containers --------------------------------- //

impl Schema {
    fn unknown_keys(&self, method: &'static str, mode: UnknownKeys) -> Schema {
        match self.kind() {
            Kind::Object(def) => self.rebuild(Kind::Object(ObjectDef { shape: def.shape.clone(), unknown_keys: mode })),
            _ => self.misuse(method),
        }
    }

    pub fn strict(&self) -> Schema {
        self.unknown_keys("strict", UnknownKeys::Strict)
    }

    pub fn passthrough(&self) -> Schema {
        self.unknown_keys("passthrough", UnknownKeys::Passthrough)
    }

    pub fn strip(&self) -> Schema {
        self.unknown_keys("strip", UnknownKeys::Strip)
    }

    pub fn catchall(&self, schema: Schema) -> Schema {
        self.unknown_keys("catchall", UnknownKeys::Catchall(schema))
    }

    /// Add or replace properties.
    pub fn extend<'a>(&self, shape: impl IntoIterator<Item = (&'a str, Schema)>) -> Schema {
        match self.kind() {
            Kind::Object(def) => {
                let mut def = def.clone();
                for (key, value) in shape {
                    def.shape.insert(key.to_string(), value);
                }
                self.rebuild(Kind::Object(def))
            }
            _ => self.misuse("extend"),
        }
    }

    pub fn rest(&self, schema: Schema) -> Schema {
        match self.kind() {
            Kind::Tuple(def) => self.rebuild(Kind::Tuple(TupleDef { items: def.items.clone(), rest: Some(schema) })),
            _ => self.misuse("rest"),
        }
    }

    pub fn array(&self) -> Schema {
        z::array(self.clone())
    }
}

// --------------------------- Combinators --------------------------------- //

impl Schema {
    pub fn and(&self, other: Schema) -> Schema {
        z::intersection(self.clone(), other)
    }

    pub fn or(&self, other: Schema) -> Schema {
        z::union([self.clone(), other])
    }
}

// ----------------------------- Wrappers ---------------------------------- //

impl Schema {
    pub fn optional(&self) -> Schema {
        Schema::new(Kind::Optional(self.clone()))
    }

    pub fn nullable(&self) -> Schema {
        Schema::new(Kind::Nullable(self.clone()))
    }

    pub fn nullish(&self) -> Schema {
        self.nullable().optional()
    }

    pub fn readonly(&self) -> Schema {
        Schema::new(Kind::Readonly(self.clone()))
    }

    pub fn brand(&self, brand: &str) -> Schema {
        Schema::new(Kind::Branded(BrandedDef { inner: self.clone(), brand: brand.to_string() }))
    }

    pub fn default(&self, value: Value) -> Schema {
        Schema::new(Kind::Default(FallbackDef { inner: self.clone(), fallback: Fallback::value(value) }))
    }

    pub fn default_with(&self, factory: impl Fn() -> Value + Send + Sync + 'static) -> Schema {
        Schema::new(Kind::Default(FallbackDef { inner: self.clone(), fallback: Fallback(Arc::new(factory)) }))
    }

    pub fn catch(&self, value: Value) -> Schema {
        Schema::new(Kind::Catch(FallbackDef { inner: self.clone(), fallback: Fallback::value(value) }))
    }

    pub fn catch_with(&self, factory: impl Fn() -> Value + Send + Sync + 'static) -> Schema {
        Schema::new(Kind::Catch(FallbackDef { inner: self.clone(), fallback: Fallback(Arc::new(factory)) }))
    }

    pub fn promise(&self) -> Schema {
        Schema::new(Kind::Promise(self.clone()))
    }

    pub fn pipe(&self, output: Schema) -> Schema {
        Schema::new(Kind::Pipeline(PipelineDef { input: self.clone(), output }))
    }

    fn effect(&self, effect: Effect) -> Schema {
        Schema::new(Kind::Effects(EffectsDef { inner: self.clone(), effect }))
    }

    pub fn transform(&self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Schema {
        self.effect(Effect::Transform(Opaque::new(Arc::new(f))))
    }

    /// Like [`Schema::transform`], keeping `source` so the node can be emitted.
    pub fn transform_with_source(&self, f: impl Fn(Value) -> Value + Send + Sync + 'static, source: &str) -> Schema {
        self.effect(Effect::Transform(Opaque::with_source(Arc::new(f), source)))
    }

    pub fn refine(&self, predicate: impl Fn(&Value) -> bool + Send + Sync + 'static, message: Option<&str>) -> Schema {
        self.effect(Effect::Refinement {
            predicate: Opaque::new(Arc::new(predicate)),
            message: message.map(str::to_string),
        })
    }

    pub fn refine_with_source(
        &self,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
        source: &str,
        message: Option<&str>,
    ) -> Schema {
        self.effect(Effect::Refinement {
            predicate: Opaque::with_source(Arc::new(predicate), source),
            message: message.map(str::to_string),
        })
    }

    pub fn exactly_one(&self, options: impl IntoIterator<Item = Schema>) -> Schema {
        self.effect(Effect::ExactlyOne(ExactlyOne::new(options)))
    }

    pub fn excluding(&self, schema: Schema) -> Schema {
        self.effect(Effect::Not(schema))
    }

    /// Route undeclared keys through `patterns` (first match wins), then
    /// `fallback`. Declared keys are taken from the receiver's object shape.
    pub fn pattern_properties<'a>(
        &self,
        patterns: impl IntoIterator<Item = (&'a str, Schema)>,
        fallback: Option<Schema>,
    ) -> Result<Schema, regex::Error> {
        let declared: Vec<String> = match self.naked().kind() {
            Kind::Object(def) => def.shape.keys().cloned().collect(),
            _ => Vec::new(),
        };
        let hook = KeyPatterns::new(declared, patterns, fallback)?;
        Ok(self.effect(Effect::KeyPatterns(hook)))
    }
}

// ----------------------------- Metadata ---------------------------------- //

impl Schema {
    pub fn describe(&self, description: &str) -> Schema {
        self.remeta(|m| m.description = Some(description.to_string()))
    }

    pub fn title(&self, title: &str) -> Schema {
        self.remeta(|m| m.title = Some(title.to_string()))
    }

    pub fn placeholder(&self, placeholder: &str) -> Schema {
        self.remeta(|m| m.placeholder = Some(placeholder.to_string()))
    }

    pub fn examples(&self, examples: impl IntoIterator<Item = Value>) -> Schema {
        let examples: Vec<Value> = examples.into_iter().collect();
        self.remeta(|m| m.examples = examples)
    }

    /// Merge UI hints. Expects a JSON object; other values are ignored.
    pub fn metadata(&self, hints: Value) -> Schema {
        let Value::Object(hints) = hints else {
            tracing::warn!("metadata expects an object; ignored");
            return self.clone();
        };
        self.remeta(|m| m.ui.extend(hints))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn string_checks(s: &Schema) -> Vec<StringCheck> {
        match s.kind() {
            Kind::String(def) => def.checks.clone(),
            other => panic!("string expected, got {:?}", other.type_name()),
        }
    }

    #[test]
    fn builders_do_not_mutate() {
        let base = z::string();
        let min = base.min(1);
        assert!(string_checks(&base).is_empty());
        assert_eq!(string_checks(&min), vec![StringCheck::Min(1)]);
    }

    #[test]
    fn checks_dispatch_on_kind() {
        let Kind::Array(def) = z::array(z::string()).max(10).kind().clone() else { panic!() };
        assert_eq!(def.checks, vec![SizeCheck::Max(10)]);
        let Kind::Number(def) = z::number().positive().kind().clone() else { panic!() };
        assert_eq!(def.checks, vec![NumberCheck::Min { value: 0.0, inclusive: false }]);
    }

    #[test]
    fn metadata_survives_later_checks() {
        let s = z::string().describe("name").min(2);
        assert_eq!(s.meta().description.as_deref(), Some("name"));
        assert_eq!(string_checks(&s), vec![StringCheck::Min(2)]);
    }

    #[test]
    fn metadata_merges_hints() {
        let s = z::string().metadata(json!({"hidden": true})).metadata(json!({"displayAs": "textarea"}));
        assert_eq!(s.meta().ui.len(), 2);
    }

    #[test]
    fn pattern_properties_take_declared_keys() {
        let s = z::object([("a", z::string())])
            .catchall(z::number())
            .pattern_properties([("^n_", z::number())], None)
            .unwrap();
        let Kind::Effects(EffectsDef { effect: Effect::KeyPatterns(hook), .. }) = s.kind() else { panic!() };
        assert_eq!(hook.declared, vec!["a".to_string()]);
    }

    #[test]
    #[should_panic]
    #[cfg(debug_assertions)]
    fn misuse_fails_loudly() {
        let _ = z::boolean().email();
    }
}
