//! Deep clone. Every node of the result is a fresh allocation with fresh
//! property maps, member vectors and check lists; functions, predicates,
//! fallback factories and lazy thunks are shared.

use crate::hooks::{ExactlyOne, KeyPattern, KeyPatterns};
use crate::ir::*;

pub fn clone(schema: &Schema) -> Schema {
    let deep = |s: &Schema| clone(s);
    let many = |xs: &[Schema]| xs.iter().map(clone).collect::<Vec<_>>();
    let kind = match schema.kind() {
        Kind::String(def) => Kind::String(def.clone()),
        Kind::Number(def) => Kind::Number(def.clone()),
        Kind::BigInt(def) => Kind::BigInt(def.clone()),
        Kind::Date(def) => Kind::Date(def.clone()),
        Kind::Boolean => Kind::Boolean,
        Kind::Symbol => Kind::Symbol,
        Kind::Null => Kind::Null,
        Kind::Undefined => Kind::Undefined,
        Kind::Void => Kind::Void,
        Kind::Never => Kind::Never,
        Kind::Unknown => Kind::Unknown,
        Kind::Any => Kind::Any,
        Kind::NaN => Kind::NaN,
        Kind::Custom(predicate) => Kind::Custom(predicate.clone()),
        Kind::Literal(value) => Kind::Literal(value.clone()),
        Kind::Enum(values) => Kind::Enum(values.clone()),
        Kind::NativeEnum(mapping) => Kind::NativeEnum(mapping.clone()),

        Kind::Array(def) => Kind::Array(ArrayDef { element: deep(&def.element), checks: def.checks.clone() }),
        Kind::Set(def) => Kind::Set(SetDef { element: deep(&def.element), checks: def.checks.clone() }),
        Kind::Tuple(def) => Kind::Tuple(TupleDef { items: many(&def.items), rest: def.rest.as_ref().map(deep) }),
        Kind::Object(def) => Kind::Object(ObjectDef {
            shape: def.shape.iter().map(|(k, v)| (k.clone(), deep(v))).collect(),
            unknown_keys: match &def.unknown_keys {
                UnknownKeys::Strip => UnknownKeys::Strip,
                UnknownKeys::Strict => UnknownKeys::Strict,
                UnknownKeys::Passthrough => UnknownKeys::Passthrough,
                UnknownKeys::Catchall(s) => UnknownKeys::Catchall(deep(s)),
            },
        }),
        Kind::Record(def) => Kind::Record(RecordDef { key: def.key.as_ref().map(deep), value: deep(&def.value) }),
        Kind::Map(def) => Kind::Map(MapDef { key: deep(&def.key), value: deep(&def.value) }),

        Kind::Union(options) => Kind::Union(many(options)),
        Kind::DiscriminatedUnion(def) => Kind::DiscriminatedUnion(DiscriminatedUnionDef {
            discriminator: def.discriminator.clone(),
            options: many(&def.options),
        }),
        Kind::Intersection(def) => {
            Kind::Intersection(IntersectionDef { left: deep(&def.left), right: deep(&def.right) })
        }

        Kind::Optional(inner) => Kind::Optional(deep(inner)),
        Kind::Nullable(inner) => Kind::Nullable(deep(inner)),
        Kind::Readonly(inner) => Kind::Readonly(deep(inner)),
        Kind::Promise(inner) => Kind::Promise(deep(inner)),
        Kind::Branded(def) => Kind::Branded(BrandedDef { inner: deep(&def.inner), brand: def.brand.clone() }),
        Kind::Default(def) => Kind::Default(FallbackDef { inner: deep(&def.inner), fallback: def.fallback.clone() }),
        Kind::Catch(def) => Kind::Catch(FallbackDef { inner: deep(&def.inner), fallback: def.fallback.clone() }),
        Kind::Effects(def) => Kind::Effects(EffectsDef { inner: deep(&def.inner), effect: clone_effect(&def.effect) }),
        Kind::Pipeline(def) => Kind::Pipeline(PipelineDef { input: deep(&def.input), output: deep(&def.output) }),
        Kind::Function(def) => Kind::Function(FunctionDef { args: deep(&def.args), returns: deep(&def.returns) }),
        Kind::Lazy(thunk) => Kind::Lazy(thunk.clone()),

        Kind::Ref(uri) => Kind::Ref(uri.clone()),
    };
    Schema::with_meta(kind, schema.meta().clone())
}

fn clone_effect(effect: &Effect) -> Effect {
    match effect {
        Effect::Transform(f) => Effect::Transform(f.clone()),
        Effect::Preprocess(f) => Effect::Preprocess(f.clone()),
        Effect::Refinement { predicate, message } => {
            Effect::Refinement { predicate: predicate.clone(), message: message.clone() }
        }
        Effect::KeyPatterns(hook) => Effect::KeyPatterns(KeyPatterns {
            declared: hook.declared.clone(),
            patterns: hook
                .patterns
                .iter()
                .map(|p| KeyPattern { source: p.source.clone(), regex: p.regex.clone(), schema: clone(&p.schema) })
                .collect(),
            fallback: hook.fallback.as_ref().map(clone),
        }),
        Effect::ExactlyOne(hook) => Effect::ExactlyOne(ExactlyOne { options: hook.options.iter().map(clone).collect() }),
        Effect::Not(schema) => Effect::Not(clone(schema)),
    }
}
