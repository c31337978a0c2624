//! Core parsing components for plan analysis

pub mod line_extractor;
pub mod metrics_parser;
pub mod operator;
pub mod tree_builder;

pub use line_extractor::{ExtractedLines, LineExtractor};
pub use metrics_parser::{LineMetrics, MetricsParser};
pub use operator::{OperatorKind, OperatorMatch};
pub use tree_builder::{PlanTree, TreeBuilder};
