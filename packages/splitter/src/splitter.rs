//! Order splitting
//!
//! [`OrderSplitter`] first groups records by an optional [`Dimension`], then
//! runs every group through an ordered list of granularity stages:
//!
//! 1. the configured granularities, sorted by ascending condition count
//!    (stable, so equally sized granularities keep insertion order)
//! 2. a catch-all [`TrueCondition`] stage, always last
//!
//! # Split Modes
//!
//! - **remains**: each stage receives only what earlier stages left
//!   unmatched. Every record of a group ends up in exactly one stage output.
//! - **full**: each stage receives the whole group. A record can appear in
//!   the output of several stages.
//!
//! ```text
//!            | startswith(L) | age < 12 (rest) | True (rest)  |   remains
//!            | startswith(L) |
//!            |        age < 12         |
//!            |             True                |                full
//! ```
//!
//! # Usage Contract
//!
//! Configure the splitter (`add_dimension`, `add_granularity`) before
//! splitting. Splitting borrows the splitter immutably, so a configured
//! splitter can be shared for reads; mutation needs exclusive access.

use crate::condition::{Predicate, TrueCondition};
use crate::dimension::{Dimension, GroupKey};
use crate::error::Result;
use crate::granularity::{ensure_document_size, Granularity};
use crate::record::Record;
use crate::types::{Accessor, SplitMode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::mem;

/// One granularity stage of a split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage<'a> {
    /// A configured granularity
    Granularity(&'a Granularity),
    /// The trailing always-matching stage
    CatchAll,
}

impl<'a> Stage<'a> {
    /// The granularity behind this stage, `None` for the catch-all.
    pub fn granularity(&self) -> Option<&'a Granularity> {
        match *self {
            Stage::Granularity(g) => Some(g),
            Stage::CatchAll => None,
        }
    }
}

impl Predicate for Stage<'_> {
    fn len(&self) -> usize {
        match self {
            Stage::Granularity(g) => g.len(),
            Stage::CatchAll => TrueCondition.len(),
        }
    }

    fn is_apply<R: Record + ?Sized>(&self, record: &R) -> bool {
        match self {
            Stage::Granularity(g) => g.is_apply(record),
            Stage::CatchAll => TrueCondition.is_apply(record),
        }
    }

    fn rendered(&self) -> String {
        match self {
            Stage::Granularity(g) => g.rendered(),
            Stage::CatchAll => TrueCondition.rendered(),
        }
    }

    fn is_true_condition(&self) -> bool {
        matches!(self, Stage::CatchAll)
    }
}

impl fmt::Display for Stage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Granularity(g) => write!(f, "{}", g),
            Stage::CatchAll => write!(f, "{}", TrueCondition),
        }
    }
}

/// Records one stage selected from one group
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOutput<'a, R> {
    /// Group the records belong to
    pub key: GroupKey,
    /// Stage that selected them
    pub stage: Stage<'a>,
    /// Selected records, in group order
    pub records: Vec<R>,
}

/// Groups order lines by dimension and granularity
#[derive(Debug, Clone, Default)]
pub struct OrderSplitter {
    dimension: Option<Dimension>,
    granularities: Vec<Granularity>,
    split_mode: SplitMode,
}

impl OrderSplitter {
    /// Create a splitter.
    ///
    /// Granularities are sorted by ascending condition count; the catch-all
    /// stage is implicit and always runs last. With no granularities every
    /// group passes through the catch-all stage alone.
    pub fn new(
        dimension: Option<Dimension>,
        granularities: impl IntoIterator<Item = Granularity>,
        split_mode: SplitMode,
    ) -> Self {
        let mut granularities: Vec<Granularity> = granularities.into_iter().collect();
        granularities.sort_by_key(|g| g.len());
        Self {
            dimension,
            granularities,
            split_mode,
        }
    }

    /// Build a splitter from a YAML [`SplitterConfig`] document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        SplitterConfig::from_yaml(text)?.build()
    }

    /// Build a splitter from a JSON [`SplitterConfig`] document.
    pub fn from_json(text: &str) -> Result<Self> {
        SplitterConfig::from_json(text)?.build()
    }

    pub fn dimension(&self) -> Option<&Dimension> {
        self.dimension.as_ref()
    }

    /// Configured granularities in stage order, without the catch-all.
    pub fn granularities(&self) -> &[Granularity] {
        &self.granularities
    }

    pub fn split_mode(&self) -> SplitMode {
        self.split_mode
    }

    /// All stages in order, catch-all last.
    pub fn stages(&self) -> impl Iterator<Item = Stage<'_>> {
        self.granularities
            .iter()
            .map(Stage::Granularity)
            .chain(std::iter::once(Stage::CatchAll))
    }

    fn stage(&self, index: usize) -> Option<Stage<'_>> {
        match index.cmp(&self.granularities.len()) {
            std::cmp::Ordering::Less => Some(Stage::Granularity(&self.granularities[index])),
            std::cmp::Ordering::Equal => Some(Stage::CatchAll),
            std::cmp::Ordering::Greater => None,
        }
    }

    /// Add grouping fields.
    ///
    /// Extends the existing dimension, or creates one when none is set.
    ///
    /// # Errors
    ///
    /// Returns `SplitterError::EmptyDimension` when creating a dimension from
    /// an empty field list.
    pub fn add_dimension<I, S>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match &mut self.dimension {
            Some(dimension) => dimension.extend(fields),
            None => self.dimension = Some(Dimension::new(fields)?),
        }
        Ok(())
    }

    /// Add a granularity and restore ascending condition-count order.
    pub fn add_granularity(&mut self, granularity: impl Into<Granularity>) {
        self.granularities.push(granularity.into());
        self.granularities.sort_by_key(|g| g.len());
    }

    /// Group records by the configured dimension.
    ///
    /// Without a dimension the whole input forms one [`GroupKey::Ungrouped`]
    /// group.
    pub fn apply_dimensions<R: Record + Clone>(
        &self,
        records: &[R],
    ) -> Result<Vec<(GroupKey, Vec<R>)>> {
        match &self.dimension {
            Some(dimension) => Ok(dimension
                .group(records)?
                .into_iter()
                .map(|(key, members)| (GroupKey::Dimension(key), members))
                .collect()),
            None => Ok(vec![(GroupKey::Ungrouped, records.to_vec())]),
        }
    }

    /// Run one group through all stages, lazily.
    pub fn apply_granularity<R: Record + Clone>(&self, group: Vec<R>) -> GranularityIter<'_, R> {
        GranularityIter {
            splitter: self,
            records: group,
            next_stage: 0,
        }
    }

    /// Split records into one list per (group, stage), in key order then
    /// stage order. Group and stage labels are dropped.
    ///
    /// # Errors
    ///
    /// Returns `SplitterError::DimensionFieldNotFound` when a record lacks a
    /// grouping field. Predicate failures never error.
    pub fn split<R: Record + Clone>(&self, records: &[R]) -> Result<Vec<Vec<R>>> {
        Ok(self.iter_split(records)?.map(|out| out.records).collect())
    }

    /// Same traversal as [`OrderSplitter::split`], keeping labels.
    ///
    /// Grouping happens up front (and can fail); stages run lazily as the
    /// iterator is consumed. Empty groups produce no output.
    pub fn iter_split<R: Record + Clone>(&self, records: &[R]) -> Result<SplitIter<'_, R>> {
        let groups = self.apply_dimensions(records)?;
        Ok(SplitIter {
            splitter: self,
            groups: groups.into_iter(),
            current: None,
        })
    }

    /// Every configured granularity matching `record`, in stage order.
    ///
    /// The catch-all stage is never reported.
    pub fn full_apply_to<'a, 'r, R>(
        &'a self,
        record: &'r R,
    ) -> impl Iterator<Item = &'a Granularity> + 'r
    where
        'a: 'r,
        R: Record + ?Sized,
    {
        self.granularities
            .iter()
            .filter(move |g| g.is_apply(record))
    }

    /// First configured granularity matching `record`, if any.
    pub fn apply_to<R: Record + ?Sized>(&self, record: &R) -> Option<&Granularity> {
        self.full_apply_to(record).next()
    }
}

/// Lazy stage outputs for one group
///
/// Yields `(stage, records)` for every stage, including stages that
/// selected nothing.
pub struct GranularityIter<'a, R> {
    splitter: &'a OrderSplitter,
    /// Unclaimed records in `remains` mode, the whole group in `full` mode
    records: Vec<R>,
    next_stage: usize,
}

impl<'a, R: Record + Clone> Iterator for GranularityIter<'a, R> {
    type Item = (Stage<'a>, Vec<R>);

    fn next(&mut self) -> Option<Self::Item> {
        let stage = self.splitter.stage(self.next_stage)?;
        self.next_stage += 1;

        let selected = match self.splitter.split_mode {
            SplitMode::Remains => {
                let (matched, unmatched) = stage.partition(mem::take(&mut self.records));
                self.records = unmatched;
                matched
            }
            SplitMode::Full => stage.matching(&self.records),
        };

        tracing::debug!(
            stage = self.next_stage - 1,
            mode = %self.splitter.split_mode,
            selected = selected.len(),
            remaining = self.records.len(),
            "Applied granularity stage"
        );

        Some((stage, selected))
    }
}

/// Lazy split over all groups, see [`OrderSplitter::iter_split`]
pub struct SplitIter<'a, R> {
    splitter: &'a OrderSplitter,
    groups: std::vec::IntoIter<(GroupKey, Vec<R>)>,
    current: Option<(GroupKey, GranularityIter<'a, R>)>,
}

impl<'a, R: Record + Clone> Iterator for SplitIter<'a, R> {
    type Item = SplitOutput<'a, R>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((key, stages)) = &mut self.current {
                if let Some((stage, records)) = stages.next() {
                    return Some(SplitOutput {
                        key: key.clone(),
                        stage,
                        records,
                    });
                }
                self.current = None;
            }

            let (key, group) = self.groups.next()?;
            if group.is_empty() {
                continue;
            }
            tracing::debug!(group = %key, records = group.len(), "Splitting group");
            self.current = Some((key, self.splitter.apply_granularity(group)));
        }
    }
}

/// Declarative splitter configuration
///
/// ```yaml
/// dimension: [warehouse, carrier]
/// split_mode: remains
/// accessor: mapping
/// granularities:
///   - sku: "startswith('C')"
///     quantity: "< 12"
///   - sku: "startswith('F')"
/// ```
///
/// Each granularity entry is a `{field: expression}` mapping; field order is
/// kept as written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitterConfig {
    /// Grouping fields; empty means no dimension
    #[serde(default)]
    pub dimension: Vec<String>,

    /// Granularity mappings
    #[serde(default)]
    pub granularities: Vec<serde_json::Value>,

    #[serde(default)]
    pub split_mode: SplitMode,

    /// Field access style for dimension and conditions
    #[serde(default)]
    pub accessor: Accessor,
}

impl SplitterConfig {
    /// Parse a YAML configuration document.
    pub fn from_yaml(text: &str) -> Result<Self> {
        ensure_document_size(text)?;
        Ok(serde_yaml_ng::from_str(text)?)
    }

    /// Parse a JSON configuration document.
    pub fn from_json(text: &str) -> Result<Self> {
        ensure_document_size(text)?;
        Ok(serde_json::from_str(text)?)
    }

    /// Build the configured splitter.
    ///
    /// # Errors
    ///
    /// Any granularity shape or expression error, in declaration order.
    pub fn build(&self) -> Result<OrderSplitter> {
        let dimension = if self.dimension.is_empty() {
            None
        } else {
            Some(Dimension::new(self.dimension.iter().cloned())?.with_accessor(self.accessor))
        };

        let granularities = self
            .granularities
            .iter()
            .map(|doc| Granularity::from_document(doc, self.accessor))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            dimension = ?self.dimension,
            granularities = granularities.len(),
            split_mode = %self.split_mode,
            "Built order splitter from configuration"
        );

        Ok(OrderSplitter::new(dimension, granularities, self.split_mode))
    }
}
