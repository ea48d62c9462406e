//! Check vocabulary for primitive and sized nodes.
//!
//! A node's checks are stored in the order they were added (emission keeps
//! that order) but compare as a set keyed by `(kind, normalized args)`.
//! Adding a check whose key is already present is a no-op.

use std::collections::BTreeSet;
use ordered_float::OrderedFloat;

// ------------------------------- Keys ------------------------------------ //

/// Normalized argument of a check key. Floats go through `OrderedFloat` so
/// keys are totally ordered; `-0.0` folds into `0.0`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CheckArg {
    Absent,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
}

impl CheckArg {
    pub fn float(x: f64) -> Self {
        if x == 0.0 { CheckArg::Float(OrderedFloat(0.0)) } else { CheckArg::Float(OrderedFloat(x)) }
    }
    pub fn size(n: usize) -> Self {
        CheckArg::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
    pub fn opt_size(n: Option<usize>) -> Self {
        n.map(Self::size).unwrap_or(CheckArg::Absent)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CheckKey {
    pub kind: &'static str,
    pub args: Vec<CheckArg>,
}

pub trait Check: Clone + std::fmt::Debug + Send + Sync {
    fn kind(&self) -> &'static str;
    fn args(&self) -> Vec<CheckArg>;
    fn key(&self) -> CheckKey {
        CheckKey { kind: self.kind(), args: self.args() }
    }
}

/// Set equality over two check lists.
pub fn same_set<C: Check>(a: &[C], b: &[C]) -> bool {
    let ka: BTreeSet<CheckKey> = a.iter().map(Check::key).collect();
    let kb: BTreeSet<CheckKey> = b.iter().map(Check::key).collect();
    ka == kb
}

/// Append `check` unless an equal-keyed check is already present.
pub fn push_unique<C: Check>(checks: &mut Vec<C>, check: C) {
    let key = check.key();
    if !checks.iter().any(|c| c.key() == key) {
        checks.push(check);
    }
}

// ------------------------------ String ----------------------------------- //

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IpVersion {
    V4,
    V6,
}

#[derive(Clone, Debug, PartialEq)]
pub enum StringCheck {
    Min(usize),
    Max(usize),
    Length(usize),
    Email,
    Url,
    Emoji,
    Uuid,
    Cuid,
    Cuid2,
    Ulid,
    Includes { value: String, position: Option<usize> },
    StartsWith(String),
    EndsWith(String),
    Regex(String),
    Trim,
    ToLowerCase,
    ToUpperCase,
    Datetime { offset: bool, precision: Option<usize> },
    Ip(Option<IpVersion>),
}

impl Check for StringCheck {
    fn kind(&self) -> &'static str {
        match self {
            StringCheck::Min(_) => "min",
            StringCheck::Max(_) => "max",
            StringCheck::Length(_) => "length",
            StringCheck::Email => "email",
            StringCheck::Url => "url",
            StringCheck::Emoji => "emoji",
            StringCheck::Uuid => "uuid",
            StringCheck::Cuid => "cuid",
            StringCheck::Cuid2 => "cuid2",
            StringCheck::Ulid => "ulid",
            StringCheck::Includes { .. } => "includes",
            StringCheck::StartsWith(_) => "startsWith",
            StringCheck::EndsWith(_) => "endsWith",
            StringCheck::Regex(_) => "regex",
            StringCheck::Trim => "trim",
            StringCheck::ToLowerCase => "toLowerCase",
            StringCheck::ToUpperCase => "toUpperCase",
            StringCheck::Datetime { .. } => "datetime",
            StringCheck::Ip(_) => "ip",
        }
    }

    fn args(&self) -> Vec<CheckArg> {
        match self {
            StringCheck::Min(n) | StringCheck::Max(n) | StringCheck::Length(n) => vec![CheckArg::size(*n)],
            StringCheck::Includes { value, position } => {
                vec![CheckArg::Str(value.clone()), CheckArg::opt_size(*position)]
            }
            StringCheck::StartsWith(s) | StringCheck::EndsWith(s) | StringCheck::Regex(s) => {
                vec![CheckArg::Str(s.clone())]
            }
            StringCheck::Datetime { offset, precision } => {
                vec![CheckArg::Bool(*offset), CheckArg::opt_size(*precision)]
            }
            StringCheck::Ip(version) => vec![match version {
                None => CheckArg::Absent,
                Some(IpVersion::V4) => CheckArg::Int(4),
                Some(IpVersion::V6) => CheckArg::Int(6),
            }],
            StringCheck::Email
            | StringCheck::Url
            | StringCheck::Emoji
            | StringCheck::Uuid
            | StringCheck::Cuid
            | StringCheck::Cuid2
            | StringCheck::Ulid
            | StringCheck::Trim
            | StringCheck::ToLowerCase
            | StringCheck::ToUpperCase => Vec::new(),
        }
    }
}

// ------------------------------ Number ----------------------------------- //

#[derive(Clone, Debug, PartialEq)]
pub enum NumberCheck {
    Min { value: f64, inclusive: bool },
    Max { value: f64, inclusive: bool },
    Int,
    MultipleOf(f64),
    Finite,
}

impl Check for NumberCheck {
    fn kind(&self) -> &'static str {
        match self {
            NumberCheck::Min { .. } => "min",
            NumberCheck::Max { .. } => "max",
            NumberCheck::Int => "int",
            NumberCheck::MultipleOf(_) => "multipleOf",
            NumberCheck::Finite => "finite",
        }
    }

    fn args(&self) -> Vec<CheckArg> {
        match self {
            NumberCheck::Min { value, inclusive } | NumberCheck::Max { value, inclusive } => {
                vec![CheckArg::float(*value), CheckArg::Bool(*inclusive)]
            }
            NumberCheck::MultipleOf(step) => vec![CheckArg::float(*step)],
            NumberCheck::Int | NumberCheck::Finite => Vec::new(),
        }
    }
}

// ------------------------------ BigInt ----------------------------------- //

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BigIntCheck {
    Min { value: i64, inclusive: bool },
    Max { value: i64, inclusive: bool },
    MultipleOf(i64),
}

impl Check for BigIntCheck {
    fn kind(&self) -> &'static str {
        match self {
            BigIntCheck::Min { .. } => "min",
            BigIntCheck::Max { .. } => "max",
            BigIntCheck::MultipleOf(_) => "multipleOf",
        }
    }

    fn args(&self) -> Vec<CheckArg> {
        match self {
            BigIntCheck::Min { value, inclusive } | BigIntCheck::Max { value, inclusive } => {
                vec![CheckArg::Int(*value), CheckArg::Bool(*inclusive)]
            }
            BigIntCheck::MultipleOf(step) => vec![CheckArg::Int(*step)],
        }
    }
}

// ------------------------------- Date ------------------------------------ //

/// Bounds are milliseconds since the Unix epoch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DateCheck {
    Min(i64),
    Max(i64),
}

impl Check for DateCheck {
    fn kind(&self) -> &'static str {
        match self {
            DateCheck::Min(_) => "min",
            DateCheck::Max(_) => "max",
        }
    }

    fn args(&self) -> Vec<CheckArg> {
        match self {
            DateCheck::Min(ms) | DateCheck::Max(ms) => vec![CheckArg::Int(*ms)],
        }
    }
}

// --------------------------- Array / Set --------------------------------- //

/// Item count bounds for arrays, size bounds for sets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SizeCheck {
    Min(usize),
    Max(usize),
    Exact(usize),
}

impl Check for SizeCheck {
    fn kind(&self) -> &'static str {
        match self {
            SizeCheck::Min(_) => "min",
            SizeCheck::Max(_) => "max",
            SizeCheck::Exact(_) => "length",
        }
    }

    fn args(&self) -> Vec<CheckArg> {
        match self {
            SizeCheck::Min(n) | SizeCheck::Max(n) | SizeCheck::Exact(n) => vec![CheckArg::size(*n)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_does_not_matter() {
        let a = vec![NumberCheck::Int, NumberCheck::Min { value: 0.0, inclusive: true }];
        let b = vec![NumberCheck::Min { value: 0.0, inclusive: true }, NumberCheck::Int];
        assert!(same_set(&a, &b));
    }

    #[test]
    fn negative_zero_folds() {
        let a = vec![NumberCheck::Min { value: -0.0, inclusive: true }];
        let b = vec![NumberCheck::Min { value: 0.0, inclusive: true }];
        assert!(same_set(&a, &b));
    }

    #[test]
    fn duplicates_collapse() {
        let mut checks = Vec::new();
        push_unique(&mut checks, StringCheck::Min(1));
        push_unique(&mut checks, StringCheck::Email);
        push_unique(&mut checks, StringCheck::Min(1));
        assert_eq!(checks.len(), 2);
        assert!(same_set(&checks, &[StringCheck::Email, StringCheck::Min(1), StringCheck::Email]));
    }

    #[test]
    fn distinct_args_stay_distinct() {
        let a = vec![SizeCheck::Max(10)];
        let b = vec![SizeCheck::Max(11)];
        assert!(!same_set(&a, &b));
        assert!(!same_set(&a, &[]));
    }
}
