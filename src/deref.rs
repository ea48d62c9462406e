//! Reference resolution.
//!
//! [`dereference`] replaces every `ref(uri)` with the schema the mapping holds
//! for `uri`. All occurrences of one uri become the very same node, and the
//! substituted schemas are used as-is (their own refs are not followed).
//! [`get_references`] lists the uris a tree depends on, first seen first.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use once_cell::sync::OnceCell;

use crate::error::ReferenceResolutionError;
use crate::hooks::{ExactlyOne, KeyPattern, KeyPatterns};
use crate::ir::*;
use crate::traverse;
use crate::z;

// ————————————————————————————————————————————————————————————————————————————
// MAPPINGS
// ————————————————————————————————————————————————————————————————————————————

/// Anything that can answer "which schema does this uri name".
pub trait ReferenceSource {
    fn lookup(&self, uri: &str) -> Option<Schema>;
}

impl<S: BuildHasher> ReferenceSource for HashMap<String, Schema, S> {
    fn lookup(&self, uri: &str) -> Option<Schema> {
        self.get(uri).cloned()
    }
}

impl<S: BuildHasher> ReferenceSource for IndexMap<String, Schema, S> {
    fn lookup(&self, uri: &str) -> Option<Schema> {
        self.get(uri).cloned()
    }
}

impl ReferenceSource for BTreeMap<String, Schema> {
    fn lookup(&self, uri: &str) -> Option<Schema> {
        self.get(uri).cloned()
    }
}

/// Named schemas, kept in registration order.
#[derive(Clone, Debug, Default)]
pub struct ReferenceRegistry {
    entries: IndexMap<String, Schema>,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the schema previously registered under `uri`, if any.
    pub fn register(&mut self, uri: impl Into<String>, schema: Schema) -> Option<Schema> {
        self.entries.insert(uri.into(), schema)
    }

    pub fn get(&self, uri: &str) -> Option<&Schema> {
        self.entries.get(uri)
    }

    pub fn uris(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, schema: &Schema) -> Result<Schema, ReferenceResolutionError> {
        dereference(schema, self)
    }

    /// Uris `schema` depends on that are not registered, first seen first.
    pub fn missing(&self, schema: &Schema) -> Vec<String> {
        get_references(schema).into_iter().filter(|uri| !self.entries.contains_key(uri)).collect()
    }
}

impl ReferenceSource for ReferenceRegistry {
    fn lookup(&self, uri: &str) -> Option<Schema> {
        self.entries.get(uri).cloned()
    }
}

impl<K: Into<String>> FromIterator<(K, Schema)> for ReferenceRegistry {
    fn from_iter<I: IntoIterator<Item = (K, Schema)>>(iter: I) -> Self {
        ReferenceRegistry { entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// COLLECTION
// ————————————————————————————————————————————————————————————————————————————

/// Depth-first, first-seen order, de-duplicated. Lazy thunks are forced once
/// per lazy node.
pub fn get_references(schema: &Schema) -> Vec<String> {
    let mut out = IndexSet::<String>::new();
    traverse::walk(schema, &mut |node| {
        if let Kind::Ref(uri) = node.kind() {
            out.insert(uri.clone());
        }
    });
    out.into_iter().collect()
}

// ————————————————————————————————————————————————————————————————————————————
// SUBSTITUTION
// ————————————————————————————————————————————————————————————————————————————

/// State of one `dereference` call.
struct Resolved {
    /// uri → the mapping's schema for it, filled before substitution starts.
    nodes: IndexMap<String, Schema>,
    /// Source lazy id → (source lazy, its dereferenced counterpart). The
    /// source is kept alive so its address can not be reused.
    lazies: HashMap<usize, (Schema, Schema)>,
}

/// Replace every `ref` in `schema` with `mapping[uri]`.
///
/// Every uri reachable from `schema`, including through lazy thunks, must be
/// present; the first missing one (in reference order) is reported. Lazy
/// bodies are dereferenced during the call, so a thunk that yields a new uri
/// on a later force is reported here too. Resolved trees that go through a
/// recursive lazy are cyclic and are not freed.
pub fn dereference<M: ReferenceSource + ?Sized>(
    schema: &Schema,
    mapping: &M,
) -> Result<Schema, ReferenceResolutionError> {
    let mut nodes = IndexMap::new();
    for uri in get_references(schema) {
        match mapping.lookup(&uri) {
            Some(found) => {
                tracing::trace!(%uri, "resolved reference");
                nodes.insert(uri, found);
            }
            None => return Err(ReferenceResolutionError { uri }),
        }
    }
    let mut cx = Resolved { nodes, lazies: HashMap::new() };
    substitute(&mut cx, mapping, schema)
}

fn substitute<M: ReferenceSource + ?Sized>(
    cx: &mut Resolved,
    mapping: &M,
    schema: &Schema,
) -> Result<Schema, ReferenceResolutionError> {
    macro_rules! go {
        ($s:expr) => {
            substitute(cx, mapping, $s)?
        };
    }
    macro_rules! many {
        ($xs:expr) => {
            $xs.iter().map(|s| substitute(cx, mapping, s)).collect::<Result<Vec<_>, _>>()?
        };
    }
    macro_rules! maybe {
        ($o:expr) => {
            match $o {
                Some(s) => Some(substitute(cx, mapping, s)?),
                None => None,
            }
        };
    }
    let kind = match schema.kind() {
        Kind::Ref(uri) => {
            if let Some(node) = cx.nodes.get(uri) {
                tracing::trace!(%uri, "substituted reference");
                return Ok(node.clone());
            }
            // A thunk yielded a uri the up-front scan did not see.
            let node = mapping.lookup(uri).ok_or_else(|| ReferenceResolutionError { uri: uri.clone() })?;
            tracing::trace!(%uri, "resolved late reference");
            cx.nodes.insert(uri.clone(), node.clone());
            return Ok(node);
        }
        Kind::Lazy(thunk) => return substitute_lazy(cx, mapping, schema, thunk),

        Kind::String(_)
        | Kind::Number(_)
        | Kind::BigInt(_)
        | Kind::Boolean
        | Kind::Date(_)
        | Kind::Symbol
        | Kind::Null
        | Kind::Undefined
        | Kind::Void
        | Kind::Never
        | Kind::Unknown
        | Kind::Any
        | Kind::NaN
        | Kind::Custom(_)
        | Kind::Literal(_)
        | Kind::Enum(_)
        | Kind::NativeEnum(_) => return Ok(schema.clone()),

        Kind::Array(def) => Kind::Array(ArrayDef { element: go!(&def.element), checks: def.checks.clone() }),
        Kind::Set(def) => Kind::Set(SetDef { element: go!(&def.element), checks: def.checks.clone() }),
        Kind::Tuple(def) => Kind::Tuple(TupleDef { items: many!(def.items), rest: maybe!(def.rest.as_ref()) }),
        Kind::Object(def) => {
            let mut shape = IndexMap::with_capacity(def.shape.len());
            for (key, value) in &def.shape {
                shape.insert(key.clone(), go!(value));
            }
            let unknown_keys = match &def.unknown_keys {
                UnknownKeys::Catchall(s) => UnknownKeys::Catchall(go!(s)),
                other => other.clone(),
            };
            Kind::Object(ObjectDef { shape, unknown_keys })
        }
        Kind::Record(def) => Kind::Record(RecordDef { key: maybe!(def.key.as_ref()), value: go!(&def.value) }),
        Kind::Map(def) => Kind::Map(MapDef { key: go!(&def.key), value: go!(&def.value) }),

        Kind::Union(options) => Kind::Union(many!(options)),
        Kind::DiscriminatedUnion(def) => Kind::DiscriminatedUnion(DiscriminatedUnionDef {
            discriminator: def.discriminator.clone(),
            options: many!(def.options),
        }),
        Kind::Intersection(def) => {
            Kind::Intersection(IntersectionDef { left: go!(&def.left), right: go!(&def.right) })
        }

        Kind::Optional(inner) => Kind::Optional(go!(inner)),
        Kind::Nullable(inner) => Kind::Nullable(go!(inner)),
        Kind::Readonly(inner) => Kind::Readonly(go!(inner)),
        Kind::Promise(inner) => Kind::Promise(go!(inner)),
        Kind::Branded(def) => Kind::Branded(BrandedDef { inner: go!(&def.inner), brand: def.brand.clone() }),
        Kind::Default(def) => Kind::Default(FallbackDef { inner: go!(&def.inner), fallback: def.fallback.clone() }),
        Kind::Catch(def) => Kind::Catch(FallbackDef { inner: go!(&def.inner), fallback: def.fallback.clone() }),
        Kind::Effects(def) => {
            let effect = match &def.effect {
                Effect::KeyPatterns(hook) => {
                    let mut patterns = Vec::with_capacity(hook.patterns.len());
                    for p in &hook.patterns {
                        patterns.push(KeyPattern {
                            source: p.source.clone(),
                            regex: p.regex.clone(),
                            schema: go!(&p.schema),
                        });
                    }
                    Effect::KeyPatterns(KeyPatterns {
                        declared: hook.declared.clone(),
                        patterns,
                        fallback: maybe!(hook.fallback.as_ref()),
                    })
                }
                Effect::ExactlyOne(hook) => Effect::ExactlyOne(ExactlyOne { options: many!(hook.options) }),
                Effect::Not(s) => Effect::Not(go!(s)),
                other => other.clone(),
            };
            Kind::Effects(EffectsDef { inner: go!(&def.inner), effect })
        }
        Kind::Pipeline(def) => Kind::Pipeline(PipelineDef { input: go!(&def.input), output: go!(&def.output) }),
        Kind::Function(def) => Kind::Function(FunctionDef { args: go!(&def.args), returns: go!(&def.returns) }),
    };
    Ok(schema.rebuild(kind))
}

/// One dereferenced lazy per source lazy, so a recursive type stays a cycle
/// instead of unrolling on every force. The body is filled in once the
/// source thunk's output is dereferenced; only a recursive body holds its
/// own lazy.
fn substitute_lazy<M: ReferenceSource + ?Sized>(
    cx: &mut Resolved,
    mapping: &M,
    schema: &Schema,
    thunk: &Thunk,
) -> Result<Schema, ReferenceResolutionError> {
    if let Some((_, derived)) = cx.lazies.get(&schema.id()) {
        return Ok(derived.clone());
    }
    let body: Arc<OnceCell<Schema>> = Arc::new(OnceCell::new());
    let slot = Arc::clone(&body);
    // Set before `dereference` returns.
    let derived = schema.rebuild(Kind::Lazy(Thunk(Arc::new(move || slot.get().cloned().unwrap_or_else(z::never)))));
    cx.lazies.insert(schema.id(), (schema.clone(), derived.clone()));
    let resolved = substitute(cx, mapping, &thunk.force())?;
    let _ = body.set(resolved);
    Ok(derived)
}
