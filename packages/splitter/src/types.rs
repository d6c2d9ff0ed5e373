//! Core types for the order splitter

use crate::error::SplitterError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Represents any field value on an order-line record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null/None value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Object/Map of values
    Object(HashMap<String, Value>),
}

impl Value {
    /// Try to get value as string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get value as object reference
    pub fn as_object(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Loose equality with numeric coercion: `Int(42) == Float(42.0)`.
    ///
    /// Values of unrelated types are simply unequal.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(_), Value::Float(_)) | (Value::Float(_), Value::Int(_)) => {
                self.numeric_cmp(other) == Some(Ordering::Equal)
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            _ => self == other,
        }
    }

    /// Total order used for dimension grouping.
    ///
    /// Values of different kinds order by kind:
    /// `null < bool < number < string < array < object`. Integers and floats
    /// share the number kind and compare exactly (see [`Value::numeric_cmp`]);
    /// NaN sorts after every other number. Objects compare by their sorted
    /// entries.
    pub fn total_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => self
                .numeric_cmp(other)
                .unwrap_or_else(|| self.is_nan().cmp(&other.is_nan())),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => {
                for (x, y) in a.iter().zip(b) {
                    let ord = x.total_cmp(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Object(a), Value::Object(b)) => {
                let mut left: Vec<_> = a.iter().collect();
                let mut right: Vec<_> = b.iter().collect();
                left.sort_by(|x, y| x.0.cmp(y.0));
                right.sort_by(|x, y| x.0.cmp(y.0));
                for ((ka, va), (kb, vb)) in left.iter().zip(&right) {
                    let ord = ka.cmp(kb).then_with(|| va.total_cmp(vb));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                left.len().cmp(&right.len())
            }
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }

    /// Exact order between two numbers.
    ///
    /// Integers are never rounded through `f64`, so `Int(2^53 + 1)` stays
    /// above `Float(2^53)`. `None` when either side is not a number or is
    /// NaN.
    pub fn numeric_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Int(i), Value::Float(f)) => cmp_int_float(*i, *f),
            (Value::Float(f), Value::Int(i)) => cmp_int_float(*i, *f).map(Ordering::reverse),
            _ => None,
        }
    }

    fn is_nan(&self) -> bool {
        matches!(self, Value::Float(f) if f.is_nan())
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
}

/// Compare an integer with a float without losing integer precision.
fn cmp_int_float(i: i64, f: f64) -> Option<Ordering> {
    // 2^63: first float above i64::MAX
    const BOUND: f64 = 9_223_372_036_854_775_808.0;

    if f.is_nan() {
        return None;
    }
    if f >= BOUND {
        return Some(Ordering::Less);
    }
    if f < -BOUND {
        return Some(Ordering::Greater);
    }

    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(f - whole)),
        ord => Some(ord),
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(obj) => {
                let mut entries: Vec<_> = obj.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                write!(f, "{{")?;
                for (i, (k, v)) in entries.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{}': {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Value::Float(f)
                } else {
                    Value::Null
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// Operators supported by the condition expression language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    // String/collection methods taking one operand (3)
    StartsWith,
    EndsWith,
    Contains,

    // String methods without operand (4)
    IsDigit,
    IsAlpha,
    IsUpper,
    IsLower,

    // Comparison operators (6)
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
}

impl Operator {
    /// Look up a method-call operator by name (`startswith`, `starts_with`, ...).
    pub fn from_method(name: &str) -> Option<Self> {
        match name {
            "startswith" | "starts_with" => Some(Operator::StartsWith),
            "endswith" | "ends_with" => Some(Operator::EndsWith),
            "contains" | "__contains__" => Some(Operator::Contains),
            "isdigit" => Some(Operator::IsDigit),
            "isalpha" => Some(Operator::IsAlpha),
            "isupper" => Some(Operator::IsUpper),
            "islower" => Some(Operator::IsLower),
            _ => None,
        }
    }

    /// Look up a comparison operator by its symbol.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(Operator::Equals),
            "!=" => Some(Operator::NotEquals),
            ">" => Some(Operator::GreaterThan),
            "<" => Some(Operator::LessThan),
            ">=" => Some(Operator::GreaterThanOrEqual),
            "<=" => Some(Operator::LessThanOrEqual),
            _ => None,
        }
    }

    /// Check if this is a comparison operator
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::Equals
                | Operator::NotEquals
                | Operator::GreaterThan
                | Operator::LessThan
                | Operator::GreaterThanOrEqual
                | Operator::LessThanOrEqual
        )
    }

    /// Number of literal arguments the operator expects.
    pub fn arity(&self) -> usize {
        match self {
            Operator::IsDigit | Operator::IsAlpha | Operator::IsUpper | Operator::IsLower => 0,
            _ => 1,
        }
    }
}

/// How a condition reads a field from a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessor {
    /// `get`-by-key lookup
    #[default]
    Mapping,
    /// Attribute-by-name lookup, dotted paths allowed
    Attribute,
}

impl FromStr for Accessor {
    type Err = SplitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mapping" | "get" => Ok(Accessor::Mapping),
            "attribute" | "__getattr__" => Ok(Accessor::Attribute),
            other => Err(SplitterError::UnknownAccessor(other.to_string())),
        }
    }
}

/// Traversal strategy for granularity stages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Each stage only sees what earlier stages left unmatched
    #[default]
    Remains,
    /// Each stage sees the whole group; outputs may overlap
    Full,
}

impl FromStr for SplitMode {
    type Err = SplitterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "remains" => Ok(SplitMode::Remains),
            "full" => Ok(SplitMode::Full),
            other => Err(SplitterError::UnknownSplitMode(other.to_string())),
        }
    }
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitMode::Remains => write!(f, "remains"),
            SplitMode::Full => write!(f, "full"),
        }
    }
}
