//! The tagged value type shared by facts, criteria, and predicates.
//!
//! [`Value`] is a borrowed view over one of five primitive shapes, returned
//! by a fact source for the duration of a single match call. [`OwnedValue`]
//! is the same five shapes with an owned string, used anywhere a value must
//! outlive a single call — most notably a [`Criteria`](../sfpm_criteria)'s
//! `expected` comparand, which is set once at rule-construction time and
//! lives as long as the rule.

use std::cmp::Ordering;

/// Discriminant for [`Value`]/[`OwnedValue`]. Two values with different
/// tags never compare equal and a comparison between them is a miss, not
/// an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    Int,
    Float,
    Double,
    Str,
    Bool,
}

/// A value borrowed from a fact source for the lifetime of one match call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Int(i64),
    Float(f32),
    Double(f64),
    Str(&'a str),
    Bool(bool),
}

impl<'a> Value<'a> {
    /// The tag of this value.
    #[must_use]
    pub const fn tag(&self) -> ValueTag {
        match self {
            Self::Int(_) => ValueTag::Int,
            Self::Float(_) => ValueTag::Float,
            Self::Double(_) => ValueTag::Double,
            Self::Str(_) => ValueTag::Str,
            Self::Bool(_) => ValueTag::Bool,
        }
    }

    /// Copy this borrowed value into an owned one.
    #[must_use]
    pub fn to_owned_value(self) -> OwnedValue {
        match self {
            Self::Int(v) => OwnedValue::Int(v),
            Self::Float(v) => OwnedValue::Float(v),
            Self::Double(v) => OwnedValue::Double(v),
            Self::Str(v) => OwnedValue::Str(v.to_owned()),
            Self::Bool(v) => OwnedValue::Bool(v),
        }
    }
}

/// A value that owns its data, used wherever a value must outlive a
/// single match call (e.g. a criterion's expected comparand).
#[derive(Debug, Clone, PartialEq)]
pub enum OwnedValue {
    Int(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Bool(bool),
}

impl OwnedValue {
    /// Borrow this owned value as a [`Value`].
    #[must_use]
    pub fn as_value(&self) -> Value<'_> {
        match self {
            Self::Int(v) => Value::Int(*v),
            Self::Float(v) => Value::Float(*v),
            Self::Double(v) => Value::Double(*v),
            Self::Str(v) => Value::Str(v.as_str()),
            Self::Bool(v) => Value::Bool(*v),
        }
    }

    /// The tag of this value.
    #[must_use]
    pub fn tag(&self) -> ValueTag {
        self.as_value().tag()
    }
}

impl From<i64> for OwnedValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for OwnedValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for OwnedValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<bool> for OwnedValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for OwnedValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<&str> for OwnedValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

/// Three-way compare two values of matching tag.
///
/// Returns `None` on a tag mismatch (a miss, never an error). Floats and
/// doubles use `total_cmp`, giving NaN a total, documented order rather
/// than leaving its comparison behavior unspecified.
#[must_use]
pub fn compare(a: Value<'_>, b: Value<'_>) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(&y)),
        (Value::Float(x), Value::Float(y)) => Some(x.total_cmp(&y)),
        (Value::Double(x), Value::Double(y)) => Some(x.total_cmp(&y)),
        (Value::Str(x), Value::Str(y)) => Some(x.as_bytes().cmp(y.as_bytes())),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(&y)),
        _ => None,
    }
}
