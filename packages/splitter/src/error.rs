//! Error types for the order splitter
//!
//! Errors fall into two groups:
//! - **Configuration errors** are fatal to the call that triggered them
//!   (building a granularity, grouping by a dimension) and are returned to
//!   the caller.
//! - **Evaluation errors** happen while a predicate is tested against a single
//!   record. They never leave `apply`/`is_apply`: the record is treated as
//!   unmatched and the failure is logged.

use thiserror::Error;

/// Main error type for splitter operations
#[derive(Error, Debug)]
pub enum SplitterError {
    /// Serialized granularity is not valid JSON
    #[error("Invalid JSON document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    /// Serialized configuration is not valid YAML
    #[error("Invalid YAML document: {0}")]
    InvalidYaml(#[from] serde_yaml_ng::Error),

    /// Serialized document exceeds the accepted size
    #[error("Document exceeds maximum size limit ({max} bytes, got {size})")]
    DocumentTooLarge { size: usize, max: usize },

    /// Document parsed, but is not a `{field: expression}` mapping
    #[error("Invalid granularity shape: {0}")]
    InvalidGranularityShape(String),

    /// Expression fragment could not be parsed into a predicate
    #[error("Invalid expression for field '{field}': '{expression}' ({reason})")]
    InvalidExpression {
        field: String,
        expression: String,
        reason: String,
    },

    /// A granularity needs at least one condition
    #[error("Granularity requires at least one condition")]
    EmptyGranularity,

    /// Granularity has more conditions than allowed
    #[error("Granularity has {count} conditions, maximum is {max}")]
    TooManyConditions { count: usize, max: usize },

    /// A dimension needs at least one grouping field
    #[error("Dimension requires at least one field")]
    EmptyDimension,

    /// A record is missing one of the dimension's grouping fields
    #[error("Grouping field not found: {0}")]
    DimensionFieldNotFound(String),

    /// Split mode name is neither `remains` nor `full`
    #[error("Unknown split mode: {0}")]
    UnknownSplitMode(String),

    /// Accessor name is neither `mapping` nor `attribute`
    #[error("Unknown accessor: {0}")]
    UnknownAccessor(String),

    /// Field could not be resolved on a record
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    /// Type mismatch while evaluating a predicate
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// Dotted attribute path is nested too deeply
    #[error("Property access depth exceeds maximum of {0}")]
    PropertyDepthExceeded(usize),
}

impl SplitterError {
    /// Whether this error belongs to the configuration class.
    ///
    /// Configuration errors propagate to the caller; everything else is a
    /// per-record evaluation failure.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(
            self,
            SplitterError::FieldNotFound(_)
                | SplitterError::TypeMismatch { .. }
                | SplitterError::PropertyDepthExceeded(_)
        )
    }
}

/// Result type alias for splitter operations
pub type Result<T> = std::result::Result<T, SplitterError>;
