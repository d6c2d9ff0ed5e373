//! Order Splitter
//!
//! Splits collections of order-line records in two steps:
//! - **Dimensions** group records by exact match on one or more fields
//! - **Granularities** refine each group with ordered AND-combinations of
//!   field predicates, either sequentially (`remains`) or independently
//!   (`full`)
//!
//! # Example
//!
//! ```ignore
//! use order_splitter::{Dimension, Granularity, OrderSplitter, SplitMode};
//!
//! let mut splitter = OrderSplitter::new(
//!     Some(Dimension::new(["warehouse"])?),
//!     vec![Granularity::from_mapping([("sku", "startswith('C')")])?],
//!     SplitMode::Remains,
//! );
//! splitter.add_granularity(Granularity::from_json(r#"{"qty": ">= 100"}"#)?);
//!
//! for batch in splitter.iter_split(&order_lines)? {
//!     println!("{} {} -> {} lines", batch.key, batch.stage, batch.records.len());
//! }
//! ```

pub mod condition;
pub mod config;
pub mod dimension;
pub mod error;
pub mod expression;
pub mod granularity;
pub mod record;
pub mod splitter;
pub mod types;

// Re-export commonly used items
pub use condition::{Condition, Predicate, TrueCondition};
pub use dimension::{Dimension, DimensionKey, GroupKey};
pub use error::{Result, SplitterError};
pub use expression::Expression;
pub use granularity::Granularity;
pub use record::Record;
pub use splitter::{GranularityIter, OrderSplitter, SplitIter, SplitOutput, SplitterConfig, Stage};
pub use types::{Accessor, Operator, SplitMode, Value};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
