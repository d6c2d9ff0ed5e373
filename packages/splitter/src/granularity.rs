//! Granularities: conjunctions of conditions
//!
//! A granularity refines each dimension group. Its member conditions are
//! always combined with AND; there is no OR. Granularities can be built from
//! conditions directly or from a `{field: expression}` mapping, optionally
//! serialized as JSON or YAML:
//!
//! ```yaml
//! sku: "startswith('C')"
//! quantity: "< 12"
//! ```
//!
//! # Equality
//!
//! Two granularities are equal when they hold the same *set* of conditions;
//! declaration order and duplicates do not matter, and the hash follows the
//! same rule.

use crate::condition::{Condition, Predicate};
use crate::config;
use crate::error::{Result, SplitterError};
use crate::record::Record;
use crate::types::{Accessor, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// An AND of one or more conditions
#[derive(Debug, Clone)]
pub struct Granularity {
    conditions: Vec<Condition>,
    extra: BTreeMap<String, Value>,
}

impl Granularity {
    /// Combine conditions into a granularity.
    ///
    /// # Errors
    ///
    /// - `SplitterError::EmptyGranularity` when no condition is given
    /// - `SplitterError::TooManyConditions` above
    ///   [`config::MAX_CONDITIONS_PER_GRANULARITY`]
    pub fn new(conditions: impl IntoIterator<Item = Condition>) -> Result<Self> {
        let conditions: Vec<Condition> = conditions.into_iter().collect();
        if conditions.is_empty() {
            return Err(SplitterError::EmptyGranularity);
        }
        if conditions.len() > config::MAX_CONDITIONS_PER_GRANULARITY {
            return Err(SplitterError::TooManyConditions {
                count: conditions.len(),
                max: config::MAX_CONDITIONS_PER_GRANULARITY,
            });
        }
        Ok(Self {
            conditions,
            extra: BTreeMap::new(),
        })
    }

    /// Build one condition per `(field, expression)` pair, in iteration order.
    pub fn from_mapping<I, K, V>(mapping: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let conditions = mapping
            .into_iter()
            .map(|(field, expression)| Condition::new(field, expression))
            .collect::<Result<Vec<_>>>()?;
        Self::new(conditions)
    }

    /// Parse a JSON object of `field: expression` pairs.
    ///
    /// # Errors
    ///
    /// - `SplitterError::InvalidDocument` when the text is not JSON
    /// - `SplitterError::InvalidGranularityShape` when it is JSON but not a
    ///   mapping of field names to expression strings
    pub fn from_json(text: &str) -> Result<Self> {
        ensure_document_size(text)?;
        let document: serde_json::Value = serde_json::from_str(text)?;
        Self::from_document(&document, Accessor::default())
    }

    /// Parse a YAML mapping of `field: expression` pairs.
    ///
    /// Same error split as [`Granularity::from_json`], with
    /// `SplitterError::InvalidYaml` for unparsable text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        ensure_document_size(text)?;
        let document: serde_json::Value = serde_yaml_ng::from_str(text)?;
        Self::from_document(&document, Accessor::default())
    }

    /// Build from an already parsed document.
    pub(crate) fn from_document(document: &serde_json::Value, accessor: Accessor) -> Result<Self> {
        let mapping = document.as_object().ok_or_else(|| {
            SplitterError::InvalidGranularityShape(format!(
                "expected a mapping of field to expression, got {}",
                json_type_name(document)
            ))
        })?;

        let mut conditions = Vec::with_capacity(mapping.len());
        for (field, expression) in mapping {
            let expression = expression.as_str().ok_or_else(|| {
                SplitterError::InvalidGranularityShape(format!(
                    "expression for field '{}' must be a string, got {}",
                    field,
                    json_type_name(expression)
                ))
            })?;
            conditions.push(Condition::new(field.as_str(), expression)?.with_accessor(accessor));
        }

        Self::new(conditions)
    }

    /// Switch the field access style of every member condition.
    pub fn with_accessor(mut self, accessor: Accessor) -> Self {
        self.conditions = self
            .conditions
            .into_iter()
            .map(|c| c.with_accessor(accessor))
            .collect();
        self
    }

    /// Attach free-form metadata, e.g. a label for the resulting batches.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    /// `(field, normalized fragment)` per member condition.
    pub fn fragments(&self) -> Vec<(&str, &str)> {
        self.conditions
            .iter()
            .map(|c| (c.field(), c.normalized()))
            .collect()
    }

    fn condition_set(&self) -> BTreeSet<(&str, &str)> {
        self.conditions
            .iter()
            .map(|c| (c.field(), c.expression()))
            .collect()
    }
}

impl Predicate for Granularity {
    fn len(&self) -> usize {
        self.conditions.len()
    }

    fn is_apply<R: Record + ?Sized>(&self, record: &R) -> bool {
        self.conditions.iter().all(|c| c.is_apply(record))
    }

    fn rendered(&self) -> String {
        self.conditions
            .iter()
            .map(Predicate::rendered)
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

impl From<Condition> for Granularity {
    fn from(condition: Condition) -> Self {
        Self {
            conditions: vec![condition],
            extra: BTreeMap::new(),
        }
    }
}

impl PartialEq for Granularity {
    fn eq(&self, other: &Self) -> bool {
        self.condition_set() == other.condition_set()
    }
}

impl Eq for Granularity {}

impl Hash for Granularity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let set = self.condition_set();
        set.len().hash(state);
        for (field, expression) in set {
            field.hash(state);
            expression.hash(state);
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Granularity ")?;
        for (i, c) in self.conditions.iter().enumerate() {
            if i > 0 {
                write!(f, " and ")?;
            }
            write!(f, "{}:{}", c.field(), c.expression())?;
        }
        write!(f, ">")
    }
}

/// Reject oversized serialized documents before parsing.
pub(crate) fn ensure_document_size(text: &str) -> Result<()> {
    if text.len() > config::MAX_DOCUMENT_SIZE {
        tracing::warn!(
            size = text.len(),
            max = config::MAX_DOCUMENT_SIZE,
            "Document exceeds size limit"
        );
        return Err(SplitterError::DocumentTooLarge {
            size: text.len(),
            max: config::MAX_DOCUMENT_SIZE,
        });
    }
    Ok(())
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
