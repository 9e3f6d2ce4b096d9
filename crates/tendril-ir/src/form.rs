//! Form types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// An identifier as written in source.
pub type Id = String;

/// An ordered sequence of forms: a module body or a function body.
pub type Block = Vec<Form>;

/// A bare identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CuSymbol(Id);

impl CuSymbol {
    /// Creates a symbol.
    pub fn new(id: impl Into<Id>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CuSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error returned when a dotted name does not have at least two non-empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid property access: {0:?}")]
pub struct InvalidPropertyAccess(pub String);

/// A dotted name such as `console.log`.
///
/// Always holds at least two segments, none of them empty; the fields are
/// private so the invariant cannot be bypassed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Id>", into = "Vec<Id>")]
pub struct PropertyAccess {
    segments: Vec<Id>,
}

impl PropertyAccess {
    /// Creates a property access from its segments.
    pub fn new<I, S>(segments: I) -> Result<Self, InvalidPropertyAccess>
    where
        I: IntoIterator<Item = S>,
        S: Into<Id>,
    {
        let segments: Vec<Id> = segments.into_iter().map(Into::into).collect();
        if segments.len() < 2 || segments.iter().any(|segment| segment.is_empty()) {
            return Err(InvalidPropertyAccess(segments.join(".")));
        }
        Ok(Self { segments })
    }

    /// Splits a dotted token such as `a.b.c`.
    pub fn parse(token: &str) -> Result<Self, InvalidPropertyAccess> {
        Self::new(token.split('.'))
    }

    /// The first segment, the part resolved against the environment.
    pub fn head(&self) -> &str {
        &self.segments[0]
    }

    /// Every segment after the first.
    pub fn tail(&self) -> &[Id] {
        &self.segments[1..]
    }

    pub fn segments(&self) -> &[Id] {
        &self.segments
    }
}

impl TryFrom<Vec<Id>> for PropertyAccess {
    type Error = InvalidPropertyAccess;

    fn try_from(segments: Vec<Id>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<PropertyAccess> for Vec<Id> {
    fn from(access: PropertyAccess) -> Self {
        access.segments
    }
}

impl fmt::Display for PropertyAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

/// One entry of a key-values form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KeyValue {
    /// `{ name }`: the key and the value are the same identifier.
    Shorthand(CuSymbol),
    /// `{ key: value }`. The key is usually a symbol, but may be any form
    /// (a string, or a one-element literal array for a computed key).
    Pair { key: Form, value: Form },
}

/// A parsed syntactic unit.
///
/// `List` is used both for calls and for nested lists such as parameter
/// lists; the head element decides which.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Form {
    Integer32(i32),
    Float64(f64),
    String(String),
    Bool(bool),
    Undefined,
    Symbol(CuSymbol),
    PropertyAccess(PropertyAccess),
    List(Vec<Form>),
    LiteralArray(Vec<Form>),
    KeyValues(Vec<KeyValue>),
}

impl Form {
    /// Creates a symbol form.
    pub fn symbol(id: impl Into<Id>) -> Self {
        Form::Symbol(CuSymbol::new(id))
    }

    /// Creates a string form.
    pub fn string(value: impl Into<String>) -> Self {
        Form::String(value.into())
    }

    /// Creates a call form whose head is the symbol `head`.
    pub fn call(head: impl Into<Id>, args: Vec<Form>) -> Self {
        let mut items = Vec::with_capacity(args.len() + 1);
        items.push(Form::symbol(head));
        items.extend(args);
        Form::List(items)
    }

    /// Returns the symbol if this is a `Symbol`.
    pub fn as_symbol(&self) -> Option<&CuSymbol> {
        match self {
            Form::Symbol(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// Returns the items if this is a `List`.
    pub fn as_list(&self) -> Option<&[Form]> {
        match self {
            Form::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the head and the arguments if this is a non-empty `List`.
    pub fn as_call(&self) -> Option<(&Form, &[Form])> {
        self.as_list().and_then(<[Form]>::split_first)
    }

    /// Returns true for every variant that is not a list, array or key-values.
    pub fn is_atom(&self) -> bool {
        !matches!(
            self,
            Form::List(_) | Form::LiteralArray(_) | Form::KeyValues(_)
        )
    }
}

impl From<i32> for Form {
    fn from(value: i32) -> Self {
        Form::Integer32(value)
    }
}

impl From<f64> for Form {
    fn from(value: f64) -> Self {
        Form::Float64(value)
    }
}

impl From<bool> for Form {
    fn from(value: bool) -> Self {
        Form::Bool(value)
    }
}

impl From<&str> for Form {
    fn from(value: &str) -> Self {
        Form::string(value)
    }
}

impl From<CuSymbol> for Form {
    fn from(symbol: CuSymbol) -> Self {
        Form::Symbol(symbol)
    }
}

impl From<PropertyAccess> for Form {
    fn from(access: PropertyAccess) -> Self {
        Form::PropertyAccess(access)
    }
}
