//! Plan parser module
//!
//! Provides parsing capabilities for PostgreSQL EXPLAIN ANALYZE text output.

pub mod composer;
pub mod core;
pub mod error;
pub mod payload;

// Re-export commonly used items
pub use composer::{AnalyzerLimits, ParsedPlan, PlanComposer, DEFAULT_MAX_DEPTH, DEFAULT_MAX_LINES};
pub use error::{InputError, ParseError};
pub use payload::PlanPayload;
