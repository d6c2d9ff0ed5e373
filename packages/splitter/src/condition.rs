//! Conditions: single-field predicates over records
//!
//! [`Predicate`] is the protocol shared by everything the splitter can apply
//! to a record set: a single [`Condition`], a [`Granularity`] (an AND of
//! conditions) and the catch-all [`TrueCondition`].
//!
//! [`Granularity`]: crate::granularity::Granularity

use crate::error::Result;
use crate::expression::Expression;
use crate::record::Record;
use crate::types::{Accessor, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Protocol for predicates that can test and partition records.
///
/// Evaluation never fails: a record the predicate cannot be evaluated on
/// (missing field, wrong type) does not match, and the failure is logged at
/// warning level.
pub trait Predicate {
    /// Number of member conditions. Only used to order granularity stages.
    fn len(&self) -> usize;

    /// Always `false` for the predicates in this crate; a granularity cannot
    /// be built without conditions.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Test a single record.
    fn is_apply<R: Record + ?Sized>(&self, record: &R) -> bool;

    /// Expression text equivalent to this predicate, e.g.
    /// `x.get('name').startswith('L') and x.get('age') < 12`.
    fn rendered(&self) -> String;

    /// Whether this is the always-matching catch-all sentinel.
    fn is_true_condition(&self) -> bool {
        false
    }

    /// Split borrowed records into `(matched, unmatched)`.
    ///
    /// Both halves keep input order, are disjoint and together hold every
    /// input record exactly once.
    fn apply<R: Record + Clone>(&self, records: &[R]) -> (Vec<R>, Vec<R>) {
        records.iter().cloned().partition(|record| self.is_apply(record))
    }

    /// Split owned records into `(matched, unmatched)` without cloning.
    fn partition<R: Record>(&self, records: Vec<R>) -> (Vec<R>, Vec<R>) {
        records.into_iter().partition(|record| self.is_apply(record))
    }

    /// Split a single-use iterator of records.
    ///
    /// The iterator is drained into a buffer first so both halves are built
    /// from the same pass over the input.
    fn apply_once<R, I>(&self, records: I) -> (Vec<R>, Vec<R>)
    where
        R: Record,
        I: Iterator<Item = R>,
    {
        let buffered: Vec<R> = records.collect();
        tracing::warn!(
            records = buffered.len(),
            "Single-use record iterator materialized before partitioning"
        );
        self.partition(buffered)
    }

    /// Clone only the matching records, in input order.
    fn matching<R: Record + Clone>(&self, records: &[R]) -> Vec<R> {
        records
            .iter()
            .filter(|record| self.is_apply(*record))
            .cloned()
            .collect()
    }
}

/// A named predicate over one field.
///
/// Built from a field name and an expression fragment such as
/// `startswith('L')`, `not endswith('-X')` or `< 12`; see
/// [`crate::expression`] for the grammar. Two conditions are equal when their
/// field and expression text are equal. Accessor and extra metadata do not
/// take part in equality.
#[derive(Debug, Clone)]
pub struct Condition {
    field: String,
    expression: String,
    accessor: Accessor,
    parsed: Expression,
    extra: BTreeMap<String, Value>,
}

impl Condition {
    /// Build a condition reading `field` with mapping-style access.
    ///
    /// # Errors
    ///
    /// Returns `SplitterError::InvalidExpression` when the fragment is not
    /// part of the expression language.
    pub fn new(field: impl Into<String>, expression: impl Into<String>) -> Result<Self> {
        let field = field.into();
        let expression = expression.into();
        let parsed = Expression::parse(&field, &expression)?;
        Ok(Self {
            field,
            expression,
            accessor: Accessor::default(),
            parsed,
            extra: BTreeMap::new(),
        })
    }

    /// Switch the field access style.
    pub fn with_accessor(mut self, accessor: Accessor) -> Self {
        self.accessor = accessor;
        self
    }

    /// Attach free-form metadata.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Expression fragment as written.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn accessor(&self) -> Accessor {
        self.accessor
    }

    pub fn is_negated(&self) -> bool {
        self.parsed.negated
    }

    /// Normalized fragment without the negation token (`.startswith('L')`, `< 12`).
    pub fn normalized(&self) -> &str {
        self.parsed.normalized()
    }

    pub fn parsed(&self) -> &Expression {
        &self.parsed
    }

    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    /// Evaluate against a record, surfacing failures.
    ///
    /// [`Predicate::is_apply`] is the non-failing variant.
    pub fn evaluate<R: Record + ?Sized>(&self, record: &R) -> Result<bool> {
        let value = record.read(&self.field, self.accessor)?;
        self.parsed.evaluate(&value)
    }
}

impl Predicate for Condition {
    fn len(&self) -> usize {
        1
    }

    fn is_apply<R: Record + ?Sized>(&self, record: &R) -> bool {
        match self.evaluate(record) {
            Ok(matched) => matched,
            Err(err) => {
                tracing::warn!(
                    field = %self.field,
                    expression = %self.expression,
                    error = %err,
                    "Predicate evaluation failed, treating record as unmatched"
                );
                false
            }
        }
    }

    fn rendered(&self) -> String {
        let subject = match self.accessor {
            Accessor::Mapping => format!("x.get('{}')", self.field),
            Accessor::Attribute => format!("x.{}", self.field),
        };
        let body = if self.parsed.is_method_call() {
            format!("{}{}", subject, self.normalized())
        } else {
            format!("{} {}", subject, self.normalized())
        };
        if self.is_negated() {
            format!("not {}", body)
        } else {
            body
        }
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        self.field == other.field && self.expression == other.expression
    }
}

impl Eq for Condition {}

impl Hash for Condition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.field.hash(state);
        self.expression.hash(state);
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Condition {}:{}>", self.field, self.expression)
    }
}

/// Sentinel predicate that matches every record.
///
/// The splitter appends it as the final stage so the `remains` mode always
/// has a bucket for records no granularity claimed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TrueCondition;

impl Predicate for TrueCondition {
    fn len(&self) -> usize {
        1
    }

    fn is_apply<R: Record + ?Sized>(&self, _record: &R) -> bool {
        true
    }

    fn rendered(&self) -> String {
        "True".to_string()
    }

    fn is_true_condition(&self) -> bool {
        true
    }
}

impl fmt::Display for TrueCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Condition True>")
    }
}
