//! Constructors. Every function returns a plain [`Schema`]; refinements are
//! methods on `Schema` (see `build.rs`).
//!
//! ```
//! use schema_ir::z;
//! let user = z::object([
//!     ("name", z::string().min(1)),
//!     ("age", z::number().int().nonnegative().optional()),
//! ])
//! .strict();
//! assert!(user.is_equal(&schema_ir::clone(&user)));
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::ir::*;

// ------------------------------ Leaves ----------------------------------- //

pub fn string() -> Schema {
    Schema::new(Kind::String(StringDef::default()))
}

pub fn number() -> Schema {
    Schema::new(Kind::Number(NumberDef::default()))
}

pub fn bigint() -> Schema {
    Schema::new(Kind::BigInt(BigIntDef::default()))
}

pub fn boolean() -> Schema {
    Schema::new(Kind::Boolean)
}

pub fn date() -> Schema {
    Schema::new(Kind::Date(DateDef::default()))
}

pub fn symbol() -> Schema {
    Schema::new(Kind::Symbol)
}

pub fn null() -> Schema {
    Schema::new(Kind::Null)
}

pub fn undefined() -> Schema {
    Schema::new(Kind::Undefined)
}

pub fn void() -> Schema {
    Schema::new(Kind::Void)
}

pub fn never() -> Schema {
    Schema::new(Kind::Never)
}

pub fn unknown() -> Schema {
    Schema::new(Kind::Unknown)
}

pub fn any() -> Schema {
    Schema::new(Kind::Any)
}

pub fn nan() -> Schema {
    Schema::new(Kind::NaN)
}

pub fn custom() -> Schema {
    Schema::new(Kind::Custom(None))
}

pub fn custom_with(predicate: impl Fn(&Value) -> bool + Send + Sync + 'static) -> Schema {
    Schema::new(Kind::Custom(Some(Opaque::new(Arc::new(predicate)))))
}

pub fn literal(value: Value) -> Schema {
    Schema::new(Kind::Literal(value))
}

pub fn enumeration<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Schema {
    let mut out: Vec<String> = Vec::new();
    for value in values {
        let value = value.into();
        if !out.contains(&value) {
            out.push(value);
        }
    }
    Schema::new(Kind::Enum(out))
}

pub fn native_enum<'a>(entries: impl IntoIterator<Item = (&'a str, Value)>) -> Schema {
    let mapping: IndexMap<String, Value> = entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    Schema::new(Kind::NativeEnum(mapping))
}

// ---------------------------- Containers --------------------------------- //

pub fn array(element: Schema) -> Schema {
    Schema::new(Kind::Array(ArrayDef { element, checks: Vec::new() }))
}

pub fn tuple(items: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::new(Kind::Tuple(TupleDef { items: items.into_iter().collect(), rest: None }))
}

/// Open object (unknown keys stripped). Later duplicates of a key replace
/// earlier ones in place.
pub fn object<'a>(shape: impl IntoIterator<Item = (&'a str, Schema)>) -> Schema {
    let shape: IndexMap<String, Schema> = shape.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    Schema::new(Kind::Object(ObjectDef { shape, unknown_keys: UnknownKeys::Strip }))
}

/// Record with string keys.
pub fn record(value: Schema) -> Schema {
    Schema::new(Kind::Record(RecordDef { key: None, value }))
}

pub fn record_keyed(key: Schema, value: Schema) -> Schema {
    Schema::new(Kind::Record(RecordDef { key: Some(key), value }))
}

pub fn map(key: Schema, value: Schema) -> Schema {
    Schema::new(Kind::Map(MapDef { key, value }))
}

pub fn set(element: Schema) -> Schema {
    Schema::new(Kind::Set(SetDef { element, checks: Vec::new() }))
}

// ---------------------------- Combinators -------------------------------- //

pub fn union(options: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::new(Kind::Union(options.into_iter().collect()))
}

pub fn discriminated_union(discriminator: &str, options: impl IntoIterator<Item = Schema>) -> Schema {
    Schema::new(Kind::DiscriminatedUnion(DiscriminatedUnionDef {
        discriminator: discriminator.to_string(),
        options: options.into_iter().collect(),
    }))
}

pub fn intersection(left: Schema, right: Schema) -> Schema {
    Schema::new(Kind::Intersection(IntersectionDef { left, right }))
}

/// Accepts anything that exactly one option accepts.
pub fn exactly_one(options: impl IntoIterator<Item = Schema>) -> Schema {
    any().exactly_one(options)
}

/// Accepts anything `schema` rejects.
pub fn not(schema: Schema) -> Schema {
    any().excluding(schema)
}

// ----------------------------- Wrappers ---------------------------------- //

pub fn optional(inner: Schema) -> Schema {
    inner.optional()
}

pub fn nullable(inner: Schema) -> Schema {
    inner.nullable()
}

pub fn promise(inner: Schema) -> Schema {
    inner.promise()
}

pub fn preprocess(f: impl Fn(Value) -> Value + Send + Sync + 'static, inner: Schema) -> Schema {
    Schema::new(Kind::Effects(EffectsDef { inner, effect: Effect::Preprocess(Opaque::new(Arc::new(f))) }))
}

pub fn pipeline(input: Schema, output: Schema) -> Schema {
    input.pipe(output)
}

/// `args` should be a tuple; anything else is wrapped in a one-item tuple.
pub fn function(args: Schema, returns: Schema) -> Schema {
    let args = match args.kind() {
        Kind::Tuple(_) => args,
        _ => tuple([args]),
    };
    Schema::new(Kind::Function(FunctionDef { args, returns }))
}

pub fn lazy(thunk: impl Fn() -> Schema + Send + Sync + 'static) -> Schema {
    Schema::new(Kind::Lazy(Thunk(Arc::new(thunk))))
}

// ----------------------------- Reference --------------------------------- //

pub fn reference(uri: &str) -> Schema {
    Schema::new(Kind::Ref(uri.to_string()))
}
