//! plan-insight: analysis of PostgreSQL `EXPLAIN (ANALYZE, BUFFERS)` output
//!
//! Builds a parent-linked operator tree from plan text, then derives a
//! timing breakdown, whole-plan statistics, diagnostics and remediation
//! advice. See [`services::plan_analyzer`] for the pipeline.

pub mod config;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::plan_analyzer::{PlanAnalyzer, PlanReport};
