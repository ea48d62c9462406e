//! Shared traversal utilities: child enumeration in reference order, and the
//! identity-keyed guard every recursive algorithm uses to stop at `lazy`
//! cycles.
//!
//! Cycles are detected by node identity, so a recursive lazy schema must hand
//! back a shared instance from its thunk (for example a `once_cell` static).
//! A thunk that builds a fresh tree on every call can not be guarded.

use std::collections::HashSet;

use crate::ir::{Effect, Kind, Schema, UnknownKeys};

/// Identity-keyed visited set, for single nodes or ordered node pairs.
#[derive(Debug, Default)]
pub struct Visited(HashSet<(usize, usize)>);

impl Visited {
    /// `true` the first time `node` is seen.
    pub fn first_visit(&mut self, node: &Schema) -> bool {
        self.0.insert((node.id(), 0))
    }

    /// `true` the first time the pair `(a, b)` is seen.
    pub fn first_visit_pair(&mut self, a: &Schema, b: &Schema) -> bool {
        self.0.insert((a.id(), b.id()))
    }

    pub fn leave(&mut self, node: &Schema) {
        self.0.remove(&(node.id(), 0));
    }

    pub fn leave_pair(&mut self, a: &Schema, b: &Schema) {
        self.0.remove(&(a.id(), b.id()));
    }
}

/// Direct sub-schemas in dependency order. `lazy` yields its forced thunk.
pub fn children(schema: &Schema) -> Vec<Schema> {
    match schema.kind() {
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
        | Kind::Ref(_) => Vec::new(),

        Kind::Array(def) => vec![def.element.clone()],
        Kind::Set(def) => vec![def.element.clone()],
        Kind::Tuple(def) => def.items.iter().chain(def.rest.iter()).cloned().collect(),
        Kind::Object(def) => {
            let mut out: Vec<Schema> = def.shape.values().cloned().collect();
            if let UnknownKeys::Catchall(schema) = &def.unknown_keys {
                out.push(schema.clone());
            }
            out
        }
        Kind::Record(def) => def.key.iter().chain(std::iter::once(&def.value)).cloned().collect(),
        Kind::Map(def) => vec![def.key.clone(), def.value.clone()],

        Kind::Union(options) => options.clone(),
        Kind::DiscriminatedUnion(def) => def.options.clone(),
        Kind::Intersection(def) => vec![def.left.clone(), def.right.clone()],

        Kind::Optional(inner) | Kind::Nullable(inner) | Kind::Readonly(inner) | Kind::Promise(inner) => {
            vec![inner.clone()]
        }
        Kind::Branded(def) => vec![def.inner.clone()],
        Kind::Default(def) | Kind::Catch(def) => vec![def.inner.clone()],
        Kind::Effects(def) => {
            let mut out = vec![def.inner.clone()];
            match &def.effect {
                Effect::Transform(_) | Effect::Preprocess(_) | Effect::Refinement { .. } => {}
                Effect::KeyPatterns(hook) => {
                    out.extend(hook.patterns.iter().map(|p| p.schema.clone()));
                    out.extend(hook.fallback.iter().cloned());
                }
                Effect::ExactlyOne(hook) => out.extend(hook.options.iter().cloned()),
                Effect::Not(schema) => out.push(schema.clone()),
            }
            out
        }
        Kind::Pipeline(def) => vec![def.input.clone(), def.output.clone()],
        Kind::Function(def) => vec![def.args.clone(), def.returns.clone()],
        Kind::Lazy(thunk) => vec![thunk.force()],
    }
}

/// Pre-order depth-first walk. Each `lazy` node is expanded once.
pub fn walk(schema: &Schema, visit: &mut impl FnMut(&Schema)) {
    fn go(schema: &Schema, visited: &mut Visited, visit: &mut impl FnMut(&Schema)) {
        visit(schema);
        if matches!(schema.kind(), Kind::Lazy(_)) && !visited.first_visit(schema) {
            return;
        }
        for child in children(schema) {
            go(&child, visited, visit);
        }
    }
    go(schema, &mut Visited::default(), visit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TypeName;
    use crate::z;
    use once_cell::sync::Lazy;

    static NODE: Lazy<Schema> = Lazy::new(|| {
        z::object([("value", z::number()), ("next", z::lazy(|| NODE.clone()).optional())])
    });

    #[test]
    fn object_children_end_with_catchall() {
        let s = z::object([("b", z::string()), ("a", z::number())]).catchall(z::boolean());
        let names: Vec<TypeName> = children(&s).iter().map(Schema::type_name).collect();
        assert_eq!(names, vec![TypeName::String, TypeName::Number, TypeName::Boolean]);
    }

    #[test]
    fn walk_terminates_on_recursive_lazy() {
        let mut count = 0;
        walk(&NODE, &mut |_| count += 1);
        // object, number, optional, lazy, object again (then stop at the lazy)
        assert!(count > 4 && count < 20, "count = {count}");
    }
}
