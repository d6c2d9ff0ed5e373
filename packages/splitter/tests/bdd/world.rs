//! World struct for Cucumber BDD tests
//!
//! Contains the test state that persists across steps in a scenario.

use cucumber::World;
use order_splitter::{
    Dimension, Granularity, OrderSplitter, Predicate, SplitMode, SplitterError, Value,
};
use std::collections::HashMap;
use std::fmt;

pub type Row = HashMap<String, Value>;

/// One labelled split output, detached from the splitter borrow.
#[derive(Debug, Clone)]
pub struct Output {
    pub key: String,
    pub catch_all: bool,
    pub stage: String,
    pub records: Vec<Row>,
}

/// Test world that holds state across steps in a Cucumber scenario.
#[derive(World)]
#[world(init = Self::new)]
pub struct SplitterWorld {
    /// Order lines to split
    pub records: Vec<Row>,
    /// Granularities in declaration order
    pub granularities: Vec<Granularity>,
    /// Grouping fields, empty for no dimension
    pub dimension: Vec<String>,
    pub split_mode: SplitMode,
    /// YAML configuration, used instead of the fields above when present
    pub config: Option<String>,
    /// Outputs of the last split
    pub outputs: Vec<Output>,
    /// Rendered granularity returned by the last lookup
    pub lookup: Option<Option<String>>,
    /// Last error
    pub error: Option<SplitterError>,
}

impl fmt::Debug for SplitterWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitterWorld")
            .field("records", &self.records.len())
            .field("granularities", &self.granularities.len())
            .field("dimension", &self.dimension)
            .field("split_mode", &self.split_mode)
            .field("outputs", &self.outputs.len())
            .field("lookup", &self.lookup)
            .field("error", &self.error.as_ref().map(|e| e.to_string()))
            .finish()
    }
}

impl Default for SplitterWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl SplitterWorld {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            granularities: Vec::new(),
            dimension: Vec::new(),
            split_mode: SplitMode::Remains,
            config: None,
            outputs: Vec::new(),
            lookup: None,
            error: None,
        }
    }

    /// Build the splitter from the configured state, recording any error.
    pub fn build_splitter(&mut self) -> Option<OrderSplitter> {
        let built = match &self.config {
            Some(yaml) => OrderSplitter::from_yaml(yaml),
            None if self.dimension.is_empty() => Ok(OrderSplitter::new(
                None,
                self.granularities.clone(),
                self.split_mode,
            )),
            None => Dimension::new(self.dimension.clone()).map(|dimension| {
                OrderSplitter::new(Some(dimension), self.granularities.clone(), self.split_mode)
            }),
        };
        match built {
            Ok(splitter) => Some(splitter),
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }

    /// Split the order lines and store the labelled outputs or the error
    pub fn split(&mut self) {
        let Some(splitter) = self.build_splitter() else {
            return;
        };
        match splitter.iter_split(&self.records) {
            Ok(iter) => {
                self.outputs = iter
                    .map(|out| Output {
                        key: out.key.to_string(),
                        catch_all: out.stage.is_true_condition(),
                        stage: out.stage.rendered(),
                        records: out.records,
                    })
                    .collect();
                self.error = None;
            }
            Err(e) => {
                self.outputs.clear();
                self.error = Some(e);
            }
        }
    }

    /// Look up the first granularity matching one order line
    pub fn look_up(&mut self, index: usize) {
        let Some(splitter) = self.build_splitter() else {
            return;
        };
        let record = self
            .records
            .get(index)
            .unwrap_or_else(|| panic!("No order line at position {}", index + 1));
        self.lookup = Some(splitter.apply_to(record).map(|g| g.rendered()));
    }

    /// 1-based access to split outputs
    pub fn output(&self, position: usize) -> &Output {
        assert!(
            self.error.is_none(),
            "Expected successful split, got error: {:?}",
            self.error_message()
        );
        self.outputs.get(position - 1).unwrap_or_else(|| {
            panic!(
                "No output at position {} ({} outputs)",
                position,
                self.outputs.len()
            )
        })
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}
