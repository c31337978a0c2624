//! Plan analyzer module
//!
//! Timing breakdown, whole-plan statistics, display classifications and
//! rule-based diagnostics over a parsed node list.

pub mod rule_engine;
pub mod rules;
pub mod statistics;
pub mod thresholds;
pub mod timing;

pub use rule_engine::{RuleEngine, RuleOutcome};
pub use statistics::{PlanStatistics, StatisticsSummarizer};
pub use thresholds::classify_nodes;
pub use timing::{TimingAggregator, TimingSummary};
