//! Declaration reader: constructor source text → schema tree.
//!
//! Accepts exactly the expression grammar the emitter produces:
//!
//! ```text
//! expr    := "z" "::" ident "(" args ")" postfix*
//! postfix := "." ident "(" args ")" | "?"
//! arg     := expr | string | number | true | false | None | Some(arg)
//!          | json!(...) | [args] | (args) | closure
//! ```
//!
//! Closures are kept as source text. `z::lazy(|| expr)` parses its body; the
//! bodies of transforms, refinements and custom predicates are not evaluated,
//! so nodes read back carry their source without a callable.

use serde_json::Value;

use crate::error::ParseError;
use crate::ir::*;
use crate::z;

pub fn parse_declaration(source: &str) -> Result<Schema, ParseError> {
    let mut parser = Parser { src: source, pos: 0 };
    let schema = parser.expr()?;
    parser.skip_ws();
    if parser.pos != source.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(schema)
}

#[derive(Debug)]
enum Arg {
    Schema(Schema),
    Str(String),
    Num(f64),
    Bool(bool),
    Json(Value),
    List(Vec<Arg>),
    Tuple(Vec<Arg>),
    Some(Box<Arg>),
    None,
    Closure { source: String, body: Option<Schema> },
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

// ------------------------------- Lexing ---------------------------------- //

impl<'a> Parser<'a> {
    fn error(&self, reason: impl Into<String>) -> ParseError {
        ParseError { offset: self.pos, reason: reason.into() }
    }

    fn error_at(&self, offset: usize, reason: impl Into<String>) -> ParseError {
        ParseError { offset, reason: reason.into() }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), ParseError> {
        if self.eat(token) { Ok(()) } else { Err(self.error(format!("expected `{token}`"))) }
    }

    fn ident(&mut self) -> Result<&'a str, ParseError> {
        self.skip_ws();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            self.bump();
        }
        if start == self.pos || self.src[start..].starts_with(|c: char| c.is_ascii_digit()) {
            return Err(self.error_at(start, "expected an identifier"));
        }
        Ok(&self.src[start..self.pos])
    }

    /// Rust string literal with the escapes `{:?}` produces.
    fn string(&mut self) -> Result<String, ParseError> {
        self.expect("\"")?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some('\'') => out.push('\''),
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some('0') => out.push('\0'),
                    Some('u') => {
                        self.expect("{")?;
                        let start = self.pos;
                        while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                            self.bump();
                        }
                        let code = u32::from_str_radix(&self.src[start..self.pos], 16)
                            .ok()
                            .and_then(char::from_u32)
                            .ok_or_else(|| self.error_at(start, "invalid unicode escape"))?;
                        self.expect("}")?;
                        out.push(code);
                    }
                    _ => return Err(self.error("unknown escape")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<f64, ParseError> {
        self.skip_ws();
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-')) {
            self.bump();
        }
        self.src[start..self.pos].parse::<f64>().map_err(|_| self.error_at(start, "invalid number"))
    }

    /// Skip a balanced region starting at an opening bracket. Strings are
    /// skipped whole so brackets inside them do not count.
    fn balanced(&mut self) -> Result<&'a str, ParseError> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            match c {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(&self.src[start..self.pos]);
                    }
                }
                '"' => self.skip_string_body()?,
                _ => {}
            }
        }
        Err(self.error_at(start, "unbalanced brackets"))
    }

    fn skip_string_body(&mut self) -> Result<(), ParseError> {
        while let Some(c) = self.bump() {
            match c {
                '\\' => {
                    self.bump();
                }
                '"' => return Ok(()),
                _ => {}
            }
        }
        Err(self.error("unterminated string"))
    }

    /// Closure text up to the end of the current argument.
    fn closure_source(&mut self) -> Result<&'a str, ParseError> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' if depth == 0 => break,
                ')' | ']' | '}' => depth -= 1,
                ',' if depth == 0 => break,
                '"' => {
                    self.bump();
                    self.skip_string_body()?;
                    continue;
                }
                _ => {}
            }
            self.bump();
        }
        Ok(self.src[start..self.pos].trim_end())
    }
}

// ------------------------------- Grammar --------------------------------- //

impl<'a> Parser<'a> {
    fn expr(&mut self) -> Result<Schema, ParseError> {
        self.skip_ws();
        let start = self.pos;
        if self.ident()? != "z" {
            return Err(self.error_at(start, "expected `z::`"));
        }
        self.expect("::")?;
        let name_at = self.pos;
        let name = self.ident()?;
        let args = self.call_args()?;
        let mut schema = constructor(name, &args).ok_or_else(|| self.error_at(name_at, format!("invalid call `z::{name}`")))?;
        loop {
            if self.eat("?") {
                continue;
            }
            if !self.eat(".") {
                return Ok(schema);
            }
            let name_at = self.pos;
            let name = self.ident()?;
            let args = self.call_args()?;
            schema = method(&schema, name, &args).map_err(|reason| self.error_at(name_at, reason))?;
        }
    }

    fn call_args(&mut self) -> Result<Vec<Arg>, ParseError> {
        self.expect("(")?;
        self.args_until(")")
    }

    fn args_until(&mut self, close: &str) -> Result<Vec<Arg>, ParseError> {
        let mut out = Vec::new();
        if self.eat(close) {
            return Ok(out);
        }
        loop {
            out.push(self.arg()?);
            if self.eat(close) {
                return Ok(out);
            }
            self.expect(",")?;
            if self.eat(close) {
                return Ok(out);
            }
        }
    }

    fn arg(&mut self) -> Result<Arg, ParseError> {
        self.skip_ws();
        let start = self.pos;
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('"') => self.string().map(Arg::Str),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number().map(Arg::Num),
            Some('[') => {
                self.bump();
                self.args_until("]").map(Arg::List)
            }
            Some('(') => {
                self.bump();
                self.args_until(")").map(Arg::Tuple)
            }
            Some('|') => self.closure(start),
            Some(_) => match self.ident()? {
                "move" => {
                    self.pos = start;
                    self.closure(start)
                }
                "true" => Ok(Arg::Bool(true)),
                "false" => Ok(Arg::Bool(false)),
                "None" => Ok(Arg::None),
                "Some" => {
                    self.expect("(")?;
                    let inner = self.arg()?;
                    self.expect(")")?;
                    Ok(Arg::Some(Box::new(inner)))
                }
                "json" => {
                    self.expect("!")?;
                    self.skip_ws();
                    if self.peek() != Some('(') {
                        return Err(self.error("expected `(` after `json!`"));
                    }
                    let body = self.balanced()?;
                    let inner = &body[1..body.len() - 1];
                    serde_json::from_str(inner)
                        .map(Arg::Json)
                        .map_err(|e| self.error_at(start, format!("invalid json: {e}")))
                }
                "z" => {
                    self.pos = start;
                    self.expr().map(Arg::Schema)
                }
                other => Err(self.error_at(start, format!("unexpected `{other}`"))),
            },
        }
    }
}

impl Parser<'_> {
    fn closure(&mut self, start: usize) -> Result<Arg, ParseError> {
        let source = self.closure_source()?.to_string();
        let body = match source.strip_prefix("||") {
            Some(body) => {
                let skipped = source.len() - body.trim_start().len();
                let body = parse_declaration(body.trim())
                    .map_err(|e| ParseError { offset: start + skipped + e.offset, reason: e.reason })?;
                Some(body)
            }
            None => None,
        };
        Ok(Arg::Closure { source, body })
    }
}

// ------------------------------ Arguments -------------------------------- //

fn schemas(args: &[Arg]) -> Option<Vec<Schema>> {
    args.iter()
        .map(|a| match a {
            Arg::Schema(s) => Some(s.clone()),
            _ => None,
        })
        .collect()
}

fn jsons(args: &[Arg]) -> Option<Vec<Value>> {
    args.iter()
        .map(|a| match a {
            Arg::Json(v) => Some(v.clone()),
            _ => None,
        })
        .collect()
}

fn strings(args: &[Arg]) -> Option<Vec<String>> {
    args.iter()
        .map(|a| match a {
            Arg::Str(s) => Some(s.clone()),
            _ => None,
        })
        .collect()
}

fn schema_pairs(args: &[Arg]) -> Option<Vec<(String, Schema)>> {
    args.iter()
        .map(|a| match a {
            Arg::Tuple(pair) => match pair.as_slice() {
                [Arg::Str(k), Arg::Schema(s)] => Some((k.clone(), s.clone())),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

fn json_pairs(args: &[Arg]) -> Option<Vec<(String, Value)>> {
    args.iter()
        .map(|a| match a {
            Arg::Tuple(pair) => match pair.as_slice() {
                [Arg::Str(k), Arg::Json(v)] => Some((k.clone(), v.clone())),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

fn opt_schema(arg: &Arg) -> Option<Option<Schema>> {
    match arg {
        Arg::None => Some(None),
        Arg::Some(inner) => match inner.as_ref() {
            Arg::Schema(s) => Some(Some(s.clone())),
            _ => None,
        },
        _ => None,
    }
}

fn opt_str(arg: &Arg) -> Option<Option<String>> {
    match arg {
        Arg::None => Some(None),
        Arg::Some(inner) => match inner.as_ref() {
            Arg::Str(s) => Some(Some(s.clone())),
            _ => None,
        },
        _ => None,
    }
}

fn opt_num(arg: &Arg) -> Option<Option<f64>> {
    match arg {
        Arg::None => Some(None),
        Arg::Some(inner) => match inner.as_ref() {
            Arg::Num(n) => Some(Some(*n)),
            _ => None,
        },
        _ => None,
    }
}

fn size(n: f64) -> Option<usize> {
    (n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
}

fn borrowed(pairs: &[(String, Schema)]) -> impl Iterator<Item = (&str, Schema)> {
    pairs.iter().map(|(k, v)| (k.as_str(), v.clone()))
}

fn effect(inner: &Schema, effect: Effect) -> Schema {
    Schema::new(Kind::Effects(EffectsDef { inner: inner.clone(), effect }))
}

// ------------------------------- Calls ----------------------------------- //

fn constructor(name: &str, args: &[Arg]) -> Option<Schema> {
    Some(match (name, args) {
        ("string", []) => z::string(),
        ("number", []) => z::number(),
        ("bigint", []) => z::bigint(),
        ("boolean", []) => z::boolean(),
        ("date", []) => z::date(),
        ("symbol", []) => z::symbol(),
        ("null", []) => z::null(),
        ("undefined", []) => z::undefined(),
        ("void", []) => z::void(),
        ("never", []) => z::never(),
        ("unknown", []) => z::unknown(),
        ("any", []) => z::any(),
        ("nan", []) => z::nan(),
        ("custom", []) => z::custom(),
        ("custom_with", [Arg::Closure { source, .. }]) => Schema::new(Kind::Custom(Some(Opaque::detached(source.as_str())))),
        ("literal", [Arg::Json(value)]) => z::literal(value.clone()),
        ("enumeration", [Arg::List(values)]) => z::enumeration(strings(values)?),
        ("native_enum", [Arg::List(entries)]) => {
            let entries = json_pairs(entries)?;
            z::native_enum(entries.iter().map(|(k, v)| (k.as_str(), v.clone())))
        }

        ("array", [Arg::Schema(element)]) => z::array(element.clone()),
        ("set", [Arg::Schema(element)]) => z::set(element.clone()),
        ("tuple", [Arg::List(items)]) => z::tuple(schemas(items)?),
        ("object", [Arg::List(entries)]) => z::object(borrowed(&schema_pairs(entries)?)),
        ("record", [Arg::Schema(value)]) => z::record(value.clone()),
        ("record_keyed", [Arg::Schema(key), Arg::Schema(value)]) => z::record_keyed(key.clone(), value.clone()),
        ("map", [Arg::Schema(key), Arg::Schema(value)]) => z::map(key.clone(), value.clone()),

        ("union", [Arg::List(options)]) => z::union(schemas(options)?),
        ("discriminated_union", [Arg::Str(key), Arg::List(options)]) => z::discriminated_union(key, schemas(options)?),
        ("intersection", [Arg::Schema(left), Arg::Schema(right)]) => z::intersection(left.clone(), right.clone()),
        ("exactly_one", [Arg::List(options)]) => z::exactly_one(schemas(options)?),
        ("not", [Arg::Schema(excluded)]) => z::not(excluded.clone()),

        ("optional", [Arg::Schema(inner)]) => z::optional(inner.clone()),
        ("nullable", [Arg::Schema(inner)]) => z::nullable(inner.clone()),
        ("promise", [Arg::Schema(inner)]) => z::promise(inner.clone()),
        ("preprocess", [Arg::Closure { source, .. }, Arg::Schema(inner)]) => {
            effect(inner, Effect::Preprocess(Opaque::detached(source.as_str())))
        }
        ("pipeline", [Arg::Schema(input), Arg::Schema(output)]) => z::pipeline(input.clone(), output.clone()),
        ("function", [Arg::Schema(args), Arg::Schema(returns)]) => z::function(args.clone(), returns.clone()),
        ("lazy", [Arg::Closure { body: Some(body), .. }]) => {
            let body = body.clone();
            z::lazy(move || body.clone())
        }

        ("reference", [Arg::Str(uri)]) => z::reference(uri),
        _ => return None,
    })
}

fn method(receiver: &Schema, name: &str, args: &[Arg]) -> Result<Schema, String> {
    use TypeName as T;
    let kind = receiver.type_name();
    let is = |kinds: &[TypeName]| kinds.contains(&kind);
    let sized = is(&[T::String, T::Number, T::BigInt, T::Date, T::Array, T::Set]);
    let countable = is(&[T::String, T::Array, T::Set]);
    let numeric = is(&[T::Number, T::BigInt]);
    let string = kind == T::String;
    let object = kind == T::Object;
    let invalid = || format!("`.{name}(..)` is not valid on {kind} with these arguments");

    Ok(match (name, args) {
        ("min", [Arg::Num(n)]) if sized => receiver.min(*n),
        ("max", [Arg::Num(n)]) if sized => receiver.max(*n),
        ("length", [Arg::Num(n)]) if countable => receiver.length(size(*n).ok_or_else(invalid)?),
        ("nonempty", []) if countable => receiver.nonempty(),
        ("gt", [Arg::Num(n)]) if numeric => receiver.gt(*n),
        ("gte", [Arg::Num(n)]) if numeric => receiver.gte(*n),
        ("lt", [Arg::Num(n)]) if numeric => receiver.lt(*n),
        ("lte", [Arg::Num(n)]) if numeric => receiver.lte(*n),
        ("positive", []) if numeric => receiver.positive(),
        ("nonnegative", []) if numeric => receiver.nonnegative(),
        ("negative", []) if numeric => receiver.negative(),
        ("nonpositive", []) if numeric => receiver.nonpositive(),
        ("multiple_of", [Arg::Num(n)]) if numeric => receiver.multiple_of(*n),
        ("int", []) if kind == T::Number => receiver.int(),
        ("finite", []) if kind == T::Number => receiver.finite(),
        ("coerce", []) if is(&[T::String, T::Number, T::BigInt, T::Date]) => receiver.coerce(),

        ("email", []) if string => receiver.email(),
        ("url", []) if string => receiver.url(),
        ("emoji", []) if string => receiver.emoji(),
        ("uuid", []) if string => receiver.uuid(),
        ("cuid", []) if string => receiver.cuid(),
        ("cuid2", []) if string => receiver.cuid2(),
        ("ulid", []) if string => receiver.ulid(),
        ("regex", [Arg::Str(p)]) if string => receiver.regex(p),
        ("includes", [Arg::Str(s)]) if string => receiver.includes(s),
        ("includes_at", [Arg::Str(s), Arg::Num(at)]) if string => receiver.includes_at(s, size(*at).ok_or_else(invalid)?),
        ("starts_with", [Arg::Str(s)]) if string => receiver.starts_with(s),
        ("ends_with", [Arg::Str(s)]) if string => receiver.ends_with(s),
        ("trim", []) if string => receiver.trim(),
        ("to_lower_case", []) if string => receiver.to_lower_case(),
        ("to_upper_case", []) if string => receiver.to_upper_case(),
        ("datetime", []) if string => receiver.datetime(),
        ("datetime_with", [Arg::Bool(offset), precision]) if string => {
            let precision = opt_num(precision).ok_or_else(invalid)?;
            let precision = match precision {
                Some(p) => Some(size(p).ok_or_else(invalid)?),
                None => None,
            };
            receiver.datetime_with(*offset, precision)
        }
        ("ip", []) if string => receiver.ip(),
        ("ipv4", []) if string => receiver.ipv4(),
        ("ipv6", []) if string => receiver.ipv6(),

        ("strict", []) if object => receiver.strict(),
        ("passthrough", []) if object => receiver.passthrough(),
        ("strip", []) if object => receiver.strip(),
        ("catchall", [Arg::Schema(s)]) if object => receiver.catchall(s.clone()),
        ("extend", [Arg::List(entries)]) if object => receiver.extend(borrowed(&schema_pairs(entries).ok_or_else(invalid)?)),
        ("rest", [Arg::Schema(s)]) if kind == T::Tuple => receiver.rest(s.clone()),
        ("array", []) => receiver.array(),

        ("and", [Arg::Schema(s)]) => receiver.and(s.clone()),
        ("or", [Arg::Schema(s)]) => receiver.or(s.clone()),
        ("optional", []) => receiver.optional(),
        ("nullable", []) => receiver.nullable(),
        ("nullish", []) => receiver.nullish(),
        ("readonly", []) => receiver.readonly(),
        ("promise", []) => receiver.promise(),
        ("brand", [Arg::Str(tag)]) => receiver.brand(tag),
        ("default", [Arg::Json(v)]) => receiver.default(v.clone()),
        ("catch", [Arg::Json(v)]) => receiver.catch(v.clone()),
        ("pipe", [Arg::Schema(s)]) => receiver.pipe(s.clone()),
        ("transform", [Arg::Closure { source, .. }]) => {
            effect(receiver, Effect::Transform(Opaque::detached(source.as_str())))
        }
        ("refine", [Arg::Closure { source, .. }, message]) => effect(
            receiver,
            Effect::Refinement { predicate: Opaque::detached(source.as_str()), message: opt_str(message).ok_or_else(invalid)? },
        ),
        ("exactly_one", [Arg::List(options)]) => receiver.exactly_one(schemas(options).ok_or_else(invalid)?),
        ("excluding", [Arg::Schema(s)]) => receiver.excluding(s.clone()),
        ("pattern_properties", [Arg::List(patterns), fallback]) => {
            let patterns = schema_pairs(patterns).ok_or_else(invalid)?;
            let fallback = opt_schema(fallback).ok_or_else(invalid)?;
            receiver.pattern_properties(borrowed(&patterns), fallback).map_err(|e| format!("invalid pattern: {e}"))?
        }

        ("describe", [Arg::Str(s)]) => receiver.describe(s),
        ("title", [Arg::Str(s)]) => receiver.title(s),
        ("placeholder", [Arg::Str(s)]) => receiver.placeholder(s),
        ("examples", [Arg::List(values)]) => receiver.examples(jsons(values).ok_or_else(invalid)?),
        ("metadata", [Arg::Json(hints @ Value::Object(_))]) => receiver.metadata(hints.clone()),
        _ => return Err(invalid()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::emit_declaration;
    use crate::equal::is_equal;
    use serde_json::json;

    fn round_trip(text: &str) {
        let schema = parse_declaration(text).unwrap();
        assert_eq!(emit_declaration(&schema).unwrap(), text);
    }

    #[test]
    fn reads_back_emitted_text() {
        round_trip(r#"z::object([("name", z::string().min(1).email()), ("tags", z::array(z::string()).max(10).optional())]).strict()"#);
        round_trip(r#"z::union([z::literal(json!({"a":[1,2]})), z::null()]).default(json!(null)).describe("x")"#);
        round_trip(r#"z::record(z::string()).pattern_properties([("^a(b)", z::string())], Some(z::number()))?"#);
        round_trip("z::number().gt(-1.5).lt(3).multiple_of(0.5)");
        round_trip("z::lazy(|| z::tuple([z::string(), z::number()]).rest(z::boolean()))");
        round_trip(r#"z::string().refine(|v| v.as_str() != Some(")"), Some("no parens"))"#);
    }

    #[test]
    fn builds_equal_trees() {
        let parsed = parse_declaration(r#"z::object([("b", z::number()), ("a", z::string())])"#).unwrap();
        assert!(is_equal(&parsed, &z::object([("a", z::string()), ("b", z::number())])));
        let parsed = parse_declaration(r#"z::string().default(json!("x"))"#).unwrap();
        assert!(is_equal(&parsed, &z::string().default(json!("x"))));
    }

    #[test]
    fn unicode_escapes() {
        let parsed = parse_declaration(r#"z::string().describe("a\u{1}b\n")"#).unwrap();
        assert_eq!(parsed.meta().description.as_deref(), Some("a\u{1}b\n"));
    }

    #[test]
    fn misapplied_method_is_an_error_not_a_panic() {
        let err = parse_declaration("z::boolean().email()").unwrap_err();
        assert_eq!(err.offset, 13);
    }

    #[test]
    fn trailing_input_is_rejected() {
        assert!(parse_declaration("z::string() z::number()").is_err());
        assert!(parse_declaration("z::strang()").is_err());
    }
}
