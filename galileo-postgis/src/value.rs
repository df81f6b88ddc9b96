//! Values passed into statements and stored in record attributes.

use std::fmt::{Display, Formatter};

use geojson::Geometry;

/// Trusted SQL text that is embedded into a statement as is.
///
/// Expressions bypass both identifier quoting and parameter binding, so they must only be
/// constructed from text produced by the crate itself (grammar output, [`encode_for_storage`]
/// results) or from constants.
///
/// [`encode_for_storage`]: crate::codec::encode_for_storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expression(String);

impl Expression {
    /// Wraps the given SQL text.
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    /// SQL text of the expression.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Expression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single value of a record attribute or a statement binding.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL `NULL`.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value. Spatial columns arrive from the backend as GeoJSON text.
    Text(String),
    /// Decoded geometry.
    Geometry(Geometry),
    /// Raw SQL expression, rendered inline instead of being bound.
    Expression(Expression),
}

impl Value {
    /// Returns true for `NULL` and empty text.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Returns the text content, if the value is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the expression, if the value is a raw SQL expression.
    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Value::Expression(e) => Some(e),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Geometry> for Value {
    fn from(value: Geometry) -> Self {
        Self::Geometry(value)
    }
}

impl From<Expression> for Value {
    fn from(value: Expression) -> Self {
        Self::Expression(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}
