//! Structural equality.
//!
//! Two trees are equal when they denote the same type. Construction details
//! that do not change the type are ignored: property declaration order, check
//! order, member order of unions and enums, operand order of intersections,
//! and metadata. Opaque behavior (transforms, refinements, custom predicates)
//! is compared by shape only.

use once_cell::sync::Lazy;

use crate::checks::same_set;
use crate::hooks::KeyPatterns;
use crate::ir::*;
use crate::traverse::Visited;
use crate::z;

/// Key schema of a record built without one.
static STRING_KEYS: Lazy<Schema> = Lazy::new(z::string);

pub fn is_equal(a: &Schema, b: &Schema) -> bool {
    Equality::default().eq(a, b)
}

impl Schema {
    pub fn is_equal(&self, other: &Schema) -> bool {
        is_equal(self, other)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Schema) -> bool {
        is_equal(self, other)
    }
}

#[derive(Default)]
struct Equality {
    /// Lazy pairs currently under comparison; meeting one again means the
    /// comparison is cyclic and holds so far. Pairs leave once decided.
    lazies: Visited,
}

impl Equality {
    fn eq(&mut self, a: &Schema, b: &Schema) -> bool {
        if Schema::ptr_eq(a, b) {
            return true;
        }
        match (a.kind(), b.kind()) {
            (Kind::String(x), Kind::String(y)) => x.coerce == y.coerce && same_set(&x.checks, &y.checks),
            (Kind::Number(x), Kind::Number(y)) => x.coerce == y.coerce && same_set(&x.checks, &y.checks),
            (Kind::BigInt(x), Kind::BigInt(y)) => x.coerce == y.coerce && same_set(&x.checks, &y.checks),
            (Kind::Date(x), Kind::Date(y)) => x.coerce == y.coerce && same_set(&x.checks, &y.checks),
            (Kind::Boolean, Kind::Boolean)
            | (Kind::Symbol, Kind::Symbol)
            | (Kind::Null, Kind::Null)
            | (Kind::Undefined, Kind::Undefined)
            | (Kind::Void, Kind::Void)
            | (Kind::Never, Kind::Never)
            | (Kind::Unknown, Kind::Unknown)
            | (Kind::Any, Kind::Any)
            | (Kind::NaN, Kind::NaN)
            | (Kind::Custom(_), Kind::Custom(_)) => true,
            (Kind::Literal(x), Kind::Literal(y)) => x == y,
            (Kind::Enum(x), Kind::Enum(y)) => x.iter().all(|v| y.contains(v)) && y.iter().all(|v| x.contains(v)),
            (Kind::NativeEnum(x), Kind::NativeEnum(y)) => {
                x.len() == y.len() && x.iter().all(|(k, v)| y.get(k) == Some(v))
            }

            (Kind::Array(x), Kind::Array(y)) => same_set(&x.checks, &y.checks) && self.eq(&x.element, &y.element),
            (Kind::Set(x), Kind::Set(y)) => same_set(&x.checks, &y.checks) && self.eq(&x.element, &y.element),
            (Kind::Tuple(x), Kind::Tuple(y)) => {
                self.pairwise(&x.items, &y.items) && self.eq_opt(x.rest.as_ref(), y.rest.as_ref())
            }
            (Kind::Object(x), Kind::Object(y)) => self.objects(x, y),
            (Kind::Record(x), Kind::Record(y)) => {
                let kx = x.key.as_ref().unwrap_or(&STRING_KEYS);
                let ky = y.key.as_ref().unwrap_or(&STRING_KEYS);
                self.eq(kx, ky) && self.eq(&x.value, &y.value)
            }
            (Kind::Map(x), Kind::Map(y)) => self.eq(&x.key, &y.key) && self.eq(&x.value, &y.value),

            (Kind::Union(x), Kind::Union(y)) => self.same_members(x, y),
            (Kind::DiscriminatedUnion(x), Kind::DiscriminatedUnion(y)) => {
                x.discriminator == y.discriminator && self.same_members(&x.options, &y.options)
            }
            (Kind::Intersection(x), Kind::Intersection(y)) => {
                (self.eq(&x.left, &y.left) && self.eq(&x.right, &y.right))
                    || (self.eq(&x.left, &y.right) && self.eq(&x.right, &y.left))
            }

            (Kind::Optional(x), Kind::Optional(y))
            | (Kind::Nullable(x), Kind::Nullable(y))
            | (Kind::Readonly(x), Kind::Readonly(y))
            | (Kind::Promise(x), Kind::Promise(y)) => self.eq(x, y),
            (Kind::Branded(x), Kind::Branded(y)) => x.brand == y.brand && self.eq(&x.inner, &y.inner),
            (Kind::Default(x), Kind::Default(y)) | (Kind::Catch(x), Kind::Catch(y)) => {
                x.fallback.realize() == y.fallback.realize() && self.eq(&x.inner, &y.inner)
            }
            (Kind::Effects(x), Kind::Effects(y)) => self.effects(&x.effect, &y.effect) && self.eq(&x.inner, &y.inner),
            (Kind::Pipeline(x), Kind::Pipeline(y)) => self.eq(&x.input, &y.input) && self.eq(&x.output, &y.output),
            (Kind::Function(x), Kind::Function(y)) => self.eq(&x.args, &y.args) && self.eq(&x.returns, &y.returns),
            (Kind::Lazy(x), Kind::Lazy(y)) => {
                if !self.lazies.first_visit_pair(a, b) {
                    return true;
                }
                let equal = self.eq(&x.force(), &y.force());
                self.lazies.leave_pair(a, b);
                equal
            }

            (Kind::Ref(x), Kind::Ref(y)) => x == y,

            // Kinds differ. Listed out so a new kind must be placed above.
            (
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
                | Kind::NativeEnum(_)
                | Kind::Array(_)
                | Kind::Tuple(_)
                | Kind::Object(_)
                | Kind::Record(_)
                | Kind::Map(_)
                | Kind::Set(_)
                | Kind::Union(_)
                | Kind::DiscriminatedUnion(_)
                | Kind::Intersection(_)
                | Kind::Optional(_)
                | Kind::Nullable(_)
                | Kind::Readonly(_)
                | Kind::Branded(_)
                | Kind::Default(_)
                | Kind::Catch(_)
                | Kind::Promise(_)
                | Kind::Effects(_)
                | Kind::Pipeline(_)
                | Kind::Function(_)
                | Kind::Lazy(_)
                | Kind::Ref(_),
                _,
            ) => false,
        }
    }

    fn eq_opt(&mut self, a: Option<&Schema>, b: Option<&Schema>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.eq(a, b),
            _ => false,
        }
    }

    fn pairwise(&mut self, a: &[Schema], b: &[Schema]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.eq(x, y))
    }

    /// Mutual containment: every member of each side has an equal member on
    /// the other side.
    fn same_members(&mut self, a: &[Schema], b: &[Schema]) -> bool {
        self.contained(a, b) && self.contained(b, a)
    }

    fn contained(&mut self, a: &[Schema], b: &[Schema]) -> bool {
        for x in a {
            let mut found = false;
            for y in b {
                if self.eq(x, y) {
                    found = true;
                    break;
                }
            }
            if !found {
                return false;
            }
        }
        true
    }

    fn objects(&mut self, x: &ObjectDef, y: &ObjectDef) -> bool {
        if x.shape.len() != y.shape.len() {
            return false;
        }
        for (key, value) in &x.shape {
            match y.shape.get(key) {
                Some(other) if self.eq(value, other) => {}
                _ => return false,
            }
        }
        // strict ≡ catchall(never), passthrough ≡ catchall(any); an open
        // object only equals another open object.
        match (x.additional_properties(), y.additional_properties()) {
            (None, None) => true,
            (Some(a), Some(b)) => self.eq(&a, &b),
            _ => false,
        }
    }

    fn effects(&mut self, a: &Effect, b: &Effect) -> bool {
        match (a, b) {
            (Effect::Transform(_), Effect::Transform(_))
            | (Effect::Preprocess(_), Effect::Preprocess(_))
            | (Effect::Refinement { .. }, Effect::Refinement { .. }) => true,
            (Effect::KeyPatterns(x), Effect::KeyPatterns(y)) => self.key_patterns(x, y),
            (Effect::ExactlyOne(x), Effect::ExactlyOne(y)) => self.same_members(&x.options, &y.options),
            (Effect::Not(x), Effect::Not(y)) => self.eq(x, y),
            (
                Effect::Transform(_)
                | Effect::Preprocess(_)
                | Effect::Refinement { .. }
                | Effect::KeyPatterns(_)
                | Effect::ExactlyOne(_)
                | Effect::Not(_),
                _,
            ) => false,
        }
    }

    /// Pattern order matters (first match wins); declared keys compare as a set.
    fn key_patterns(&mut self, x: &KeyPatterns, y: &KeyPatterns) -> bool {
        let declared = x.declared.len() == y.declared.len() && x.declared.iter().all(|k| y.declared.contains(k));
        declared
            && x.patterns.len() == y.patterns.len()
            && x.patterns.iter().zip(&y.patterns).all(|(p, q)| p.source == q.source && self.eq(&p.schema, &q.schema))
            && self.eq_opt(x.fallback.as_ref(), y.fallback.as_ref())
    }
}
