//! Schema tree → TypeScript type text, e.g. `type User = { id: string; age?: number };`.
//!
//! Types only: checks, defaults and metadata other than descriptions are not
//! rendered. `ref` nodes become type parameters, which only a `type`
//! declaration can carry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fail;
use crate::deref::get_references;
use crate::error::{NotSerializableError, join_pointer};
use crate::ir::*;
use crate::traverse::Visited;

/// What surrounds the rendered type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclarationForm {
    /// The bare type.
    #[default]
    None,
    /// `declare const Title: T;`, or `declare function Title(..): R;`.
    Variable,
    /// `type Title<Refs> = T;`
    Type,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeDeclarationOptions {
    pub declaration: DeclarationForm,
    /// Render `default` properties as optional keys.
    pub treat_default_as_optional: bool,
}

pub fn emit_type_declaration(schema: &Schema, options: &TypeDeclarationOptions) -> Result<String, NotSerializableError> {
    let generics: Vec<String> = get_references(schema).iter().map(String::as_str).map(type_argument_name).collect();
    if !generics.is_empty() && options.declaration != DeclarationForm::Type {
        return Err(fail(schema, "", "references can only become type parameters of a `type` declaration"));
    }
    let mut renderer = Renderer { options, open_lazies: Visited::default() };
    if options.declaration == DeclarationForm::None {
        return renderer.node(schema, "");
    }

    let Some(title) = schema.meta().title.as_deref() else {
        return Err(fail(schema, "", "a declaration needs a title"));
    };
    let comment = doc_comment(schema.meta().description.as_deref());
    match (options.declaration, schema.kind()) {
        (DeclarationForm::Variable, Kind::Function(def)) => {
            let (args, returns) = renderer.signature(def, "")?;
            Ok(format!("{comment}declare function {title}({args}): {returns};"))
        }
        (DeclarationForm::Variable, _) => Ok(format!("{comment}declare const {title}: {};", renderer.kind(schema, "")?)),
        _ => {
            let generics = if generics.is_empty() { String::new() } else { format!("<{}>", generics.join(", ")) };
            Ok(format!("{comment}type {title}{generics} = {};", renderer.kind(schema, "")?))
        }
    }
}

impl Schema {
    pub fn to_type_declaration(&self, options: &TypeDeclarationOptions) -> Result<String, NotSerializableError> {
        emit_type_declaration(self, options)
    }
}

struct Renderer<'a> {
    options: &'a TypeDeclarationOptions,
    /// Lazy nodes on the current path.
    open_lazies: Visited,
}

const KEYWORDS: [&str; 12] =
    ["string", "number", "boolean", "unknown", "void", "any", "null", "undefined", "never", "bigint", "symbol", "object"];

/// `#/$defs/T` → `DefsT`.
fn type_argument_name(uri: &str) -> String {
    uri.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn property_key(key: &str) -> String {
    let mut chars = key.chars();
    let identifier = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if identifier { key.to_string() } else { Value::from(key).to_string() }
}

fn doc_comment(description: Option<&str>) -> String {
    match description.map(str::trim) {
        None | Some("") => String::new(),
        Some(text) if !text.contains('\n') => format!("/** {text} */\n"),
        Some(text) => {
            let lines: String = text.lines().map(|line| format!(" * {line}\n")).collect();
            format!("/**\n{lines} */\n")
        }
    }
}

impl Renderer<'_> {
    fn node(&mut self, schema: &Schema, path: &str) -> Result<String, NotSerializableError> {
        let comment = doc_comment(schema.meta().description.as_deref());
        Ok(comment + &self.kind(schema, path)?)
    }

    fn members(&mut self, items: &[Schema], path: &str, separator: &str) -> Result<String, NotSerializableError> {
        let parts = items
            .iter()
            .enumerate()
            .map(|(i, item)| self.node(item, &join_pointer(path, &i.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(separator))
    }

    fn kind(&mut self, schema: &Schema, path: &str) -> Result<String, NotSerializableError> {
        let at = |segment: &str| join_pointer(path, segment);
        Ok(match schema.kind() {
            Kind::String(_) => "string".into(),
            Kind::Number(_) | Kind::NaN | Kind::BigInt(_) => "number".into(),
            Kind::Boolean => "boolean".into(),
            Kind::Date(_) => "Date".into(),
            Kind::Symbol => "symbol".into(),
            Kind::Null => "null".into(),
            Kind::Undefined => "undefined".into(),
            Kind::Void => "void".into(),
            Kind::Never => "never".into(),
            Kind::Unknown | Kind::Custom(None) => "unknown".into(),
            Kind::Any => "any".into(),
            Kind::Custom(Some(_)) => return Err(fail(schema, path, "a custom predicate has no declared type")),
            Kind::Literal(value) => match value {
                Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => value.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(fail(schema, path, "only primitive literals have a literal type"));
                }
            },
            Kind::Enum(values) => values.iter().map(|v| Value::from(v.as_str()).to_string()).collect::<Vec<_>>().join(" | "),
            Kind::NativeEnum(_) => return Err(fail(schema, path, "native enums have no inline type")),

            Kind::Array(def) => {
                let item = self.node(&def.element, &at("element"))?;
                if KEYWORDS.contains(&item.as_str()) { format!("{item}[]") } else { format!("Array<{item}>") }
            }
            Kind::Set(def) => format!("Set<{}>", self.node(&def.element, &at("element"))?),
            Kind::Tuple(def) => {
                let mut items = Vec::with_capacity(def.items.len() + 1);
                for (i, item) in def.items.iter().enumerate() {
                    items.push(self.node(item, &join_pointer(path, &i.to_string()))?);
                }
                if let Some(rest) = &def.rest {
                    items.push(format!("...Array<{}>", self.node(rest, &at("rest"))?));
                }
                format!("[{}]", items.join(", "))
            }
            Kind::Object(def) => {
                let mut properties = Vec::with_capacity(def.shape.len());
                for (key, value) in &def.shape {
                    properties.push(self.property(key, value, &join_pointer(path, key))?);
                }
                if properties.is_empty() { "{}".into() } else { format!("{{ {} }}", properties.join("; ")) }
            }
            Kind::Record(def) => {
                let key = match &def.key {
                    Some(key) => self.node(key, &at("key"))?,
                    None => "string".into(),
                };
                format!("{{ [key: {key}]: {} }}", self.node(&def.value, &at("value"))?)
            }
            Kind::Map(def) => {
                format!("Map<{}, {}>", self.node(&def.key, &at("key"))?, self.node(&def.value, &at("value"))?)
            }

            Kind::Union(options) => self.members(options, path, " | ")?,
            Kind::DiscriminatedUnion(def) => self.members(&def.options, path, " | ")?,
            Kind::Intersection(def) => {
                format!("{} & {}", self.node(&def.left, &at("left"))?, self.node(&def.right, &at("right"))?)
            }

            Kind::Optional(inner) => format!("{} | undefined", self.node(inner, &at("optional"))?),
            Kind::Nullable(inner) => format!("{} | null", self.node(inner, &at("nullable"))?),
            Kind::Readonly(inner) => format!("Readonly<{}>", self.node(inner, &at("readonly"))?),
            Kind::Promise(inner) => format!("Promise<{}>", self.node(inner, &at("promise"))?),
            Kind::Branded(def) => self.node(&def.inner, &at("branded"))?,
            Kind::Default(def) if self.options.treat_default_as_optional => {
                format!("{} | undefined", self.node(&def.inner, &at("default"))?)
            }
            Kind::Default(def) => self.node(&def.inner, &at("default"))?,
            Kind::Catch(def) => self.node(&def.inner, &at("catch"))?,
            Kind::Pipeline(def) => self.node(&def.input, &at("input"))?,
            Kind::Effects(def) => match &def.effect {
                Effect::Transform(_) => return Err(fail(schema, path, "a transform's output type is unknown")),
                _ => self.node(&def.inner, &at(def.effect.name()))?,
            },
            Kind::Function(def) => {
                let (args, returns) = self.signature(def, path)?;
                format!("({args}) => {returns}")
            }
            Kind::Lazy(thunk) => {
                if !self.open_lazies.first_visit(schema) {
                    return Err(fail(schema, path, "a recursive lazy has no inline type"));
                }
                let out = self.node(&thunk.force(), &at("lazy"));
                self.open_lazies.leave(schema);
                out?
            }
            Kind::Ref(uri) => type_argument_name(uri),
        })
    }

    /// `key: T`, or `key?: T` for optional members.
    fn property(&mut self, key: &str, value: &Schema, path: &str) -> Result<String, NotSerializableError> {
        let comment = doc_comment(value.meta().description.as_deref());
        let key = property_key(key);
        let optional_inner = match value.kind() {
            Kind::Optional(inner) => Some((inner, join_pointer(path, "optional"))),
            Kind::Default(def) if self.options.treat_default_as_optional => {
                Some((&def.inner, join_pointer(path, "default")))
            }
            _ => None,
        };
        Ok(match optional_inner {
            Some((inner, at)) => format!("{comment}{key}?: {}", self.node(inner, &at)?),
            None => format!("{comment}{key}: {}", self.kind(value, path)?),
        })
    }

    /// Argument list and return type. Arguments are named by their title,
    /// else `argN`.
    fn signature(&mut self, def: &FunctionDef, path: &str) -> Result<(String, String), NotSerializableError> {
        let args_path = join_pointer(path, "args");
        let args = match def.args.kind() {
            Kind::Tuple(tuple) => {
                let mut args = Vec::with_capacity(tuple.items.len());
                for (i, item) in tuple.items.iter().enumerate() {
                    let name = item.meta().title.clone().unwrap_or_else(|| format!("arg{i}"));
                    args.push(self.property(&name, item, &join_pointer(&args_path, &i.to_string()))?);
                }
                if let Some(rest) = &tuple.rest {
                    args.push(format!("...rest: Array<{}>", self.node(rest, &join_pointer(&args_path, "rest"))?));
                }
                args.join(", ")
            }
            _ => format!("...args: {}", self.node(&def.args, &args_path)?),
        };
        let returns = self.node(&def.returns, &join_pointer(path, "returns"))?;
        Ok((args, returns))
    }
}
