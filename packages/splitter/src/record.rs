//! Field access on order-line records
//!
//! The splitter never inspects records directly. Conditions and dimensions
//! read fields through the [`Record`] trait, using one of two access styles
//! chosen at construction time (see [`Accessor`]):
//!
//! - **Mapping**: `get`-by-key on the top level of the record
//! - **Attribute**: attribute-by-name, with dotted paths into nested objects
//!   (`customer.address.city`) and numeric indexing into arrays (`lines.0`)

use crate::config;
use crate::error::{Result, SplitterError};
use crate::types::{Accessor, Value};
use std::collections::{BTreeMap, HashMap};

/// A record the splitter can read fields from.
///
/// Implementations return owned values; a missing field is
/// `Err(SplitterError::FieldNotFound)`.
///
/// # Example Implementation
///
/// ```ignore
/// struct OrderLine { sku: String, qty: i64 }
///
/// impl Record for OrderLine {
///     fn field(&self, name: &str) -> Result<Value> {
///         match name {
///             "sku" => Ok(Value::from(self.sku.as_str())),
///             "qty" => Ok(Value::Int(self.qty)),
///             _ => Err(SplitterError::FieldNotFound(name.to_string())),
///         }
///     }
/// }
/// ```
pub trait Record {
    /// Mapping-style lookup of a top-level key.
    fn field(&self, name: &str) -> Result<Value>;

    /// Attribute-style lookup.
    ///
    /// The default resolves the first path segment with [`Record::field`] and
    /// walks the remaining segments through nested values.
    fn attribute(&self, name: &str) -> Result<Value> {
        match name.split_once('.') {
            Some((base, rest)) => get_property(&self.field(base)?, rest, 0),
            None => self.field(name),
        }
    }

    /// Read a field with the given access style.
    fn read(&self, name: &str, accessor: Accessor) -> Result<Value> {
        match accessor {
            Accessor::Mapping => self.field(name),
            Accessor::Attribute => self.attribute(name),
        }
    }
}

impl Record for HashMap<String, Value> {
    fn field(&self, name: &str) -> Result<Value> {
        self.get(name)
            .cloned()
            .ok_or_else(|| SplitterError::FieldNotFound(name.to_string()))
    }
}

impl Record for BTreeMap<String, Value> {
    fn field(&self, name: &str) -> Result<Value> {
        self.get(name)
            .cloned()
            .ok_or_else(|| SplitterError::FieldNotFound(name.to_string()))
    }
}

impl Record for Value {
    fn field(&self, name: &str) -> Result<Value> {
        let obj = self.as_object().ok_or_else(|| SplitterError::TypeMismatch {
            expected: "object".to_string(),
            actual: self.type_name().to_string(),
        })?;
        obj.get(name)
            .cloned()
            .ok_or_else(|| SplitterError::FieldNotFound(name.to_string()))
    }
}

impl<R: Record + ?Sized> Record for &R {
    fn field(&self, name: &str) -> Result<Value> {
        (**self).field(name)
    }

    fn attribute(&self, name: &str) -> Result<Value> {
        (**self).attribute(name)
    }
}

/// Get a property from a Value, supporting nested access.
///
/// Handles:
/// - Object property access: `obj.property`
/// - Nested paths: `obj.nested.property`
/// - Array indexing: `arr.0`, `arr.1`
fn get_property(value: &Value, property_path: &str, depth: usize) -> Result<Value> {
    if depth >= config::MAX_PROPERTY_DEPTH {
        return Err(SplitterError::PropertyDepthExceeded(
            config::MAX_PROPERTY_DEPTH,
        ));
    }

    if let Some((first, rest)) = property_path.split_once('.') {
        let intermediate = get_property(value, first, depth + 1)?;
        return get_property(&intermediate, rest, depth + 1);
    }

    match value {
        Value::Object(obj) => obj
            .get(property_path)
            .cloned()
            .ok_or_else(|| SplitterError::FieldNotFound(format!(".{}", property_path))),
        Value::Array(arr) => {
            if let Ok(index) = property_path.parse::<usize>() {
                arr.get(index)
                    .cloned()
                    .ok_or_else(|| SplitterError::FieldNotFound(format!("[{}]", index)))
            } else {
                Err(SplitterError::TypeMismatch {
                    expected: "object".to_string(),
                    actual: "array".to_string(),
                })
            }
        }
        _ => Err(SplitterError::TypeMismatch {
            expected: "object".to_string(),
            actual: value.type_name().to_string(),
        }),
    }
}
