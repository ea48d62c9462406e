//! Schema node model.
//!
//! A [`Schema`] is a cheap, shareable handle (`Arc`) to an immutable [`Node`].
//! Every node carries [`Meta`] plus a [`Kind`] payload. Algorithms (equality,
//! clone, dereference, emission, export) match on `Kind` exhaustively, so a new
//! kind does not compile until each of them handles it.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checks::{BigIntCheck, DateCheck, NumberCheck, SizeCheck, StringCheck};
use crate::hooks::{ExactlyOne, KeyPatterns};

// ————————————————————————————————————————————————————————————————————————————
// HANDLE
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone)]
pub struct Schema(Arc<Node>);

#[derive(Debug)]
pub struct Node {
    pub meta: Meta,
    pub kind: Kind,
}

impl Schema {
    pub fn new(kind: Kind) -> Self {
        Schema(Arc::new(Node { meta: Meta::default(), kind }))
    }

    pub fn with_meta(kind: Kind, meta: Meta) -> Self {
        Schema(Arc::new(Node { meta, kind }))
    }

    pub fn node(&self) -> &Node {
        &self.0
    }

    pub fn kind(&self) -> &Kind {
        &self.0.kind
    }

    pub fn meta(&self) -> &Meta {
        &self.0.meta
    }

    pub fn type_name(&self) -> TypeName {
        self.0.kind.type_name()
    }

    /// Same node instance (not merely structurally equal).
    pub fn ptr_eq(a: &Schema, b: &Schema) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Address of the node, used as an identity key by cycle guards.
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Rebuild this node with a different payload, keeping metadata.
    pub(crate) fn rebuild(&self, kind: Kind) -> Schema {
        Schema::with_meta(kind, self.0.meta.clone())
    }

    /// Rebuild this node with different metadata, keeping the payload.
    pub(crate) fn remeta(&self, f: impl FnOnce(&mut Meta)) -> Schema {
        let mut meta = self.0.meta.clone();
        f(&mut meta);
        Schema::with_meta(self.0.kind.clone(), meta)
    }

    /// Strip wrappers down to the node that describes the actual data.
    pub fn naked(&self) -> &Schema {
        match self.kind() {
            Kind::Optional(inner)
            | Kind::Nullable(inner)
            | Kind::Readonly(inner)
            | Kind::Promise(inner) => inner.naked(),
            Kind::Branded(def) => def.inner.naked(),
            Kind::Default(def) | Kind::Catch(def) => def.inner.naked(),
            _ => self,
        }
    }

    /// Structural optionality: an `optional` wrapper, `undefined`, or a union
    /// with an optional member. `default` keeps the inner answer.
    pub fn is_optional(&self) -> bool {
        match self.kind() {
            Kind::Optional(_) | Kind::Undefined | Kind::Void | Kind::Any | Kind::Unknown => true,
            Kind::Union(options) => options.iter().any(Schema::is_optional),
            Kind::Nullable(inner) | Kind::Readonly(inner) => inner.is_optional(),
            Kind::Default(_) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// METADATA
// ————————————————————————————————————————————————————————————————————————————

/// Annotations carried opaquely by every algorithm except emission/export.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Free-form UI hints (`hidden`, `disabled`, `displayAs`, ...).
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub ui: IndexMap<String, Value>,
}

impl Meta {
    pub fn is_empty(&self) -> bool {
        self == &Meta::default()
    }
}

// ————————————————————————————————————————————————————————————————————————————
// OPAQUE PAYLOADS
// ————————————————————————————————————————————————————————————————————————————

pub type TransformFn = dyn Fn(Value) -> Value + Send + Sync;
pub type PredicateFn = dyn Fn(&Value) -> bool + Send + Sync;
pub type ValueFn = dyn Fn() -> Value + Send + Sync;
pub type ThunkFn = dyn Fn() -> Schema + Send + Sync;

/// Behavior carried by reference. `source` is the literal text of the
/// function when one is known; emission prints it verbatim. Nodes read back
/// from declaration text carry the source only (`func` is `None`).
pub struct Opaque<F: ?Sized> {
    pub func: Option<Arc<F>>,
    pub source: Option<String>,
}

impl<F: ?Sized> Opaque<F> {
    pub fn new(func: Arc<F>) -> Self {
        Opaque { func: Some(func), source: None }
    }
    pub fn with_source(func: Arc<F>, source: impl Into<String>) -> Self {
        Opaque { func: Some(func), source: Some(source.into()) }
    }
    pub fn detached(source: impl Into<String>) -> Self {
        Opaque { func: None, source: Some(source.into()) }
    }
}

impl<F: ?Sized> Clone for Opaque<F> {
    fn clone(&self) -> Self {
        Opaque { func: self.func.clone(), source: self.source.clone() }
    }
}

impl<F: ?Sized> fmt::Debug for Opaque<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(src) => write!(f, "Opaque({src})"),
            None => f.write_str("Opaque(<fn>)"),
        }
    }
}

/// Factory for `default`/`catch` values. Compared by the value it yields.
#[derive(Clone)]
pub struct Fallback(pub Arc<ValueFn>);

impl Fallback {
    pub fn value(value: Value) -> Self {
        Fallback(Arc::new(move || value.clone()))
    }
    pub fn realize(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fallback({})", self.realize())
    }
}

/// Deferred schema for recursive types.
#[derive(Clone)]
pub struct Thunk(pub Arc<ThunkFn>);

impl Thunk {
    pub fn force(&self) -> Schema {
        (self.0)()
    }
}

impl fmt::Debug for Thunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Thunk(<fn>)")
    }
}

// ————————————————————————————————————————————————————————————————————————————
// PAYLOADS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug, Default)]
pub struct StringDef {
    pub checks: Vec<StringCheck>,
    pub coerce: bool,
}

#[derive(Clone, Debug, Default)]
pub struct NumberDef {
    pub checks: Vec<NumberCheck>,
    pub coerce: bool,
}

#[derive(Clone, Debug, Default)]
pub struct BigIntDef {
    pub checks: Vec<BigIntCheck>,
    pub coerce: bool,
}

#[derive(Clone, Debug, Default)]
pub struct DateDef {
    pub checks: Vec<DateCheck>,
    pub coerce: bool,
}

#[derive(Clone, Debug)]
pub struct ArrayDef {
    pub element: Schema,
    pub checks: Vec<SizeCheck>,
}

#[derive(Clone, Debug)]
pub struct SetDef {
    pub element: Schema,
    pub checks: Vec<SizeCheck>,
}

#[derive(Clone, Debug)]
pub struct TupleDef {
    pub items: Vec<Schema>,
    pub rest: Option<Schema>,
}

/// What happens to keys not declared in the shape.
#[derive(Clone, Debug)]
pub enum UnknownKeys {
    /// Open object: extra keys are dropped, never rejected.
    Strip,
    /// Same as `Catchall(never)`.
    Strict,
    /// Same as `Catchall(any)`.
    Passthrough,
    Catchall(Schema),
}

#[derive(Clone, Debug)]
pub struct ObjectDef {
    pub shape: IndexMap<String, Schema>,
    pub unknown_keys: UnknownKeys,
}

impl ObjectDef {
    /// Effective schema for undeclared keys; `None` for an open object.
    pub fn additional_properties(&self) -> Option<Schema> {
        match &self.unknown_keys {
            UnknownKeys::Strip => None,
            UnknownKeys::Strict => Some(Schema::new(Kind::Never)),
            UnknownKeys::Passthrough => Some(Schema::new(Kind::Any)),
            UnknownKeys::Catchall(schema) => Some(schema.clone()),
        }
    }
}

/// `key` is `None` when the record was built without a key schema; it
/// means string keys.
#[derive(Clone, Debug)]
pub struct RecordDef {
    pub key: Option<Schema>,
    pub value: Schema,
}

#[derive(Clone, Debug)]
pub struct MapDef {
    pub key: Schema,
    pub value: Schema,
}

#[derive(Clone, Debug)]
pub struct DiscriminatedUnionDef {
    pub discriminator: String,
    pub options: Vec<Schema>,
}

#[derive(Clone, Debug)]
pub struct IntersectionDef {
    pub left: Schema,
    pub right: Schema,
}

#[derive(Clone, Debug)]
pub struct BrandedDef {
    pub inner: Schema,
    pub brand: String,
}

#[derive(Clone, Debug)]
pub struct FallbackDef {
    pub inner: Schema,
    pub fallback: Fallback,
}

#[derive(Clone, Debug)]
pub struct PipelineDef {
    pub input: Schema,
    pub output: Schema,
}

/// `args` is always a tuple node.
#[derive(Clone, Debug)]
pub struct FunctionDef {
    pub args: Schema,
    pub returns: Schema,
}

#[derive(Clone, Debug)]
pub enum Effect {
    Transform(Opaque<TransformFn>),
    Preprocess(Opaque<TransformFn>),
    Refinement { predicate: Opaque<PredicateFn>, message: Option<String> },
    /// Post-validation routing of undeclared keys through `patternProperties`.
    KeyPatterns(KeyPatterns),
    /// Exactly one of the listed schemas must accept the value.
    ExactlyOne(ExactlyOne),
    /// The listed schema must reject the value.
    Not(Schema),
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::Transform(_) => "transform",
            Effect::Preprocess(_) => "preprocess",
            Effect::Refinement { .. } => "refinement",
            Effect::KeyPatterns(_) => "keyPatterns",
            Effect::ExactlyOne(_) => "exactlyOne",
            Effect::Not(_) => "not",
        }
    }
}

#[derive(Clone, Debug)]
pub struct EffectsDef {
    pub inner: Schema,
    pub effect: Effect,
}

// ————————————————————————————————————————————————————————————————————————————
// KINDS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Clone, Debug)]
pub enum Kind {
    // primitive leaves
    String(StringDef),
    Number(NumberDef),
    BigInt(BigIntDef),
    Boolean,
    Date(DateDef),
    Symbol,
    Null,
    Undefined,
    Void,
    Never,
    Unknown,
    Any,
    NaN,
    Custom(Option<Opaque<PredicateFn>>),
    Literal(Value),
    Enum(Vec<String>),
    NativeEnum(IndexMap<String, Value>),

    // containers
    Array(ArrayDef),
    Tuple(TupleDef),
    Object(ObjectDef),
    Record(RecordDef),
    Map(MapDef),
    Set(SetDef),

    // combinators
    Union(Vec<Schema>),
    DiscriminatedUnion(DiscriminatedUnionDef),
    Intersection(IntersectionDef),

    // wrappers
    Optional(Schema),
    Nullable(Schema),
    Readonly(Schema),
    Branded(BrandedDef),
    Default(FallbackDef),
    Catch(FallbackDef),
    Promise(Schema),
    Effects(EffectsDef),
    Pipeline(PipelineDef),
    Function(FunctionDef),
    Lazy(Thunk),

    // reference
    Ref(String),
}

/// Discriminant of [`Kind`], without payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeName {
    String,
    Number,
    BigInt,
    Boolean,
    Date,
    Symbol,
    Null,
    Undefined,
    Void,
    Never,
    Unknown,
    Any,
    NaN,
    Custom,
    Literal,
    Enum,
    NativeEnum,
    Array,
    Tuple,
    Object,
    Record,
    Map,
    Set,
    Union,
    DiscriminatedUnion,
    Intersection,
    Optional,
    Nullable,
    Readonly,
    Branded,
    Default,
    Catch,
    Promise,
    Effects,
    Pipeline,
    Function,
    Lazy,
    Ref,
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Kind {
    pub fn type_name(&self) -> TypeName {
        match self {
            Kind::String(_) => TypeName::String,
            Kind::Number(_) => TypeName::Number,
            Kind::BigInt(_) => TypeName::BigInt,
            Kind::Boolean => TypeName::Boolean,
            Kind::Date(_) => TypeName::Date,
            Kind::Symbol => TypeName::Symbol,
            Kind::Null => TypeName::Null,
            Kind::Undefined => TypeName::Undefined,
            Kind::Void => TypeName::Void,
            Kind::Never => TypeName::Never,
            Kind::Unknown => TypeName::Unknown,
            Kind::Any => TypeName::Any,
            Kind::NaN => TypeName::NaN,
            Kind::Custom(_) => TypeName::Custom,
            Kind::Literal(_) => TypeName::Literal,
            Kind::Enum(_) => TypeName::Enum,
            Kind::NativeEnum(_) => TypeName::NativeEnum,
            Kind::Array(_) => TypeName::Array,
            Kind::Tuple(_) => TypeName::Tuple,
            Kind::Object(_) => TypeName::Object,
            Kind::Record(_) => TypeName::Record,
            Kind::Map(_) => TypeName::Map,
            Kind::Set(_) => TypeName::Set,
            Kind::Union(_) => TypeName::Union,
            Kind::DiscriminatedUnion(_) => TypeName::DiscriminatedUnion,
            Kind::Intersection(_) => TypeName::Intersection,
            Kind::Optional(_) => TypeName::Optional,
            Kind::Nullable(_) => TypeName::Nullable,
            Kind::Readonly(_) => TypeName::Readonly,
            Kind::Branded(_) => TypeName::Branded,
            Kind::Default(_) => TypeName::Default,
            Kind::Catch(_) => TypeName::Catch,
            Kind::Promise(_) => TypeName::Promise,
            Kind::Effects(_) => TypeName::Effects,
            Kind::Pipeline(_) => TypeName::Pipeline,
            Kind::Function(_) => TypeName::Function,
            Kind::Lazy(_) => TypeName::Lazy,
            Kind::Ref(_) => TypeName::Ref,
        }
    }
}
