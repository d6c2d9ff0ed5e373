//! Configuration constants for the order splitter
//!
//! Centralized limits applied while building splitters from serialized
//! configuration and while resolving record fields:
//! - Document size limits (JSON/YAML granularity and splitter documents)
//! - Nesting limits for dotted attribute paths
//! - Upper bound on conditions per granularity
//!
//! These are compile-time constants.

/// Prefix that negates a condition expression (`"not startswith('L')"`).
pub const NEGATION_TOKEN: &str = "not ";

/// Maximum serialized document size in bytes (256 KB).
///
/// A granularity document is a handful of `field: expression` pairs; a full
/// splitter configuration rarely exceeds a few kilobytes.
pub const MAX_DOCUMENT_SIZE: usize = 256 * 1024;

/// Maximum recursion depth for dotted attribute access (`customer.address.city`).
pub const MAX_PROPERTY_DEPTH: usize = 32;

/// Maximum number of conditions combined into one granularity.
pub const MAX_CONDITIONS_PER_GRANULARITY: usize = 64;
