//! Dimensions: exact-match grouping of records
//!
//! A dimension is an ordered list of fields. Grouping sorts the records
//! stably by the composite key formed from those fields (declaration order)
//! and cuts the sorted sequence into runs of equal keys, so:
//!
//! - groups come out in key order
//! - records inside a group keep their input order
//! - every record lands in exactly one group
//!
//! Key values of different kinds are ordered with [`Value::total_cmp`].

use crate::error::{Result, SplitterError};
use crate::record::Record;
use crate::types::{Accessor, Value};
use std::cmp::Ordering;
use std::fmt;

/// Composite grouping key of one dimension group.
///
/// Components keep the dimension's field names, in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionKey {
    components: Vec<(String, Value)>,
}

impl DimensionKey {
    /// Value of one named component.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.components
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.components.iter().map(|(_, value)| value)
    }

    pub fn components(&self) -> &[(String, Value)] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    fn cmp_values(&self, other: &Self) -> Ordering {
        for (a, b) in self.values().zip(other.values()) {
            let ord = a.total_cmp(b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        self.len().cmp(&other.len())
    }
}

impl fmt::Display for DimensionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dimension(")?;
        for (i, (name, value)) in self.components.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ")")
    }
}

/// Key of a split group.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    /// No dimension configured: the whole input is one group
    Ungrouped,
    /// Group produced by a dimension
    Dimension(DimensionKey),
}

impl GroupKey {
    pub fn is_ungrouped(&self) -> bool {
        matches!(self, GroupKey::Ungrouped)
    }

    pub fn dimension(&self) -> Option<&DimensionKey> {
        match self {
            GroupKey::Dimension(key) => Some(key),
            GroupKey::Ungrouped => None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Ungrouped => write!(f, "ungrouped"),
            GroupKey::Dimension(key) => write!(f, "{}", key),
        }
    }
}

/// Multi-field exact-match grouping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    fields: Vec<String>,
    accessor: Accessor,
}

impl Dimension {
    /// Create a dimension over `fields`, read with mapping-style access.
    ///
    /// # Errors
    ///
    /// Returns `SplitterError::EmptyDimension` when no field is given.
    pub fn new<I, S>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(SplitterError::EmptyDimension);
        }
        Ok(Self {
            fields,
            accessor: Accessor::default(),
        })
    }

    /// Switch the field access style.
    pub fn with_accessor(mut self, accessor: Accessor) -> Self {
        self.accessor = accessor;
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn accessor(&self) -> Accessor {
        self.accessor
    }

    /// Append grouping fields after the existing ones.
    pub fn extend<I, S>(&mut self, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
    }

    /// Grouping key of a single record.
    ///
    /// # Errors
    ///
    /// Returns `SplitterError::DimensionFieldNotFound` when the record lacks
    /// one of the grouping fields.
    pub fn key_of<R: Record + ?Sized>(&self, record: &R) -> Result<DimensionKey> {
        let components = self
            .fields
            .iter()
            .map(|field| {
                record
                    .read(field, self.accessor)
                    .map(|value| (field.clone(), value))
                    .map_err(|_| SplitterError::DimensionFieldNotFound(field.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(DimensionKey { components })
    }

    /// Group records by this dimension.
    ///
    /// Keys are computed for every record before any group is built, so a
    /// record missing a grouping field fails the whole call.
    pub fn group<R: Record + Clone>(
        &self,
        records: &[R],
    ) -> Result<Vec<(DimensionKey, Vec<R>)>> {
        let mut keyed = records
            .iter()
            .enumerate()
            .map(|(index, record)| Ok((self.key_of(record)?, index)))
            .collect::<Result<Vec<_>>>()?;

        // sort_by is stable: equal keys keep input order
        keyed.sort_by(|(a, _), (b, _)| a.cmp_values(b));

        let mut groups: Vec<(DimensionKey, Vec<R>)> = Vec::new();
        for (key, index) in keyed {
            let record = records[index].clone();
            match groups.last_mut() {
                Some((current, members)) if current.cmp_values(&key) == Ordering::Equal => {
                    members.push(record);
                }
                _ => groups.push((key, vec![record])),
            }
        }

        tracing::debug!(
            fields = ?self.fields,
            records = records.len(),
            groups = groups.len(),
            "Grouped records by dimension"
        );

        Ok(groups)
    }
}
