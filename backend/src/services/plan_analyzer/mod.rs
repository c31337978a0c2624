//! PostgreSQL Plan Analyzer
//!
//! Parses `EXPLAIN (ANALYZE, BUFFERS)` text output into a parent-linked
//! node arena and derives a timing breakdown, whole-plan statistics and
//! rule-based diagnostics from it.
//!
//! # Architecture
//!
//! ```text
//!  payload ──► PlanPayload ──► PlanComposer ──► ParsedPlan
//!                               │  LineExtractor
//!                               │  OperatorMatch / MetricsParser
//!                               │  TreeBuilder
//!                               ▼
//!              TimingAggregator · StatisticsSummarizer · RuleEngine
//!                               │
//!                               ▼
//!                           PlanReport
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use plan_insight::services::plan_analyzer::PlanAnalyzer;
//!
//! let report = PlanAnalyzer::new().analyze_text(plan_text);
//! for issue in &report.issues {
//!     println!("{}: {}", issue.title, issue.description);
//! }
//! ```
//!
//! The analysis is a pure function of its input: no I/O and no shared
//! state, so one analyzer can serve many threads.

pub mod analyzer;
pub mod models;
pub mod parser;

#[cfg(test)]
mod tests;

pub use analyzer::RuleEngine;
pub use models::*;
pub use parser::{AnalyzerLimits, InputError, ParseError, PlanComposer, PlanPayload};

use analyzer::{classify_nodes, StatisticsSummarizer, TimingAggregator};
use parser::ParsedPlan;
use serde_json::Value;

/// Entry point for plan analysis
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanAnalyzer {
    limits: AnalyzerLimits,
}

impl PlanAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: AnalyzerLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> AnalyzerLimits {
        self.limits
    }

    /// Analyze a transport value (fragment map, plan text or JSON plan).
    ///
    /// Only an absent or structurally unexpected value is an error; anything
    /// else degrades to a partial or empty report.
    pub fn analyze(&self, value: Option<&Value>) -> Result<PlanReport, InputError> {
        let payload = PlanPayload::from_value(value)?;
        Ok(self.analyze_payload(&payload))
    }

    /// Analyze plain plan text
    pub fn analyze_text(&self, text: &str) -> PlanReport {
        self.analyze_payload(&PlanPayload::from_text(text))
    }

    /// Analyze a classified payload
    pub fn analyze_payload(&self, payload: &PlanPayload<'_>) -> PlanReport {
        match PlanComposer::with_limits(self.limits).parse(payload) {
            Ok(parsed) => self.build_report(parsed),
            Err(e) => {
                tracing::warn!("Plan rejected, returning empty report: {}", e);
                PlanReport::empty()
            }
        }
    }

    fn build_report(&self, parsed: ParsedPlan) -> PlanReport {
        let ParsedPlan { format, nodes, lines } = parsed;

        if nodes.is_empty() {
            return PlanReport {
                format,
                execution_time_ms: lines.execution_time_ms,
                planning_time_ms: lines.planning_time_ms,
                raw_lines: lines.raw_lines,
                ..PlanReport::empty()
            };
        }

        let timing = TimingAggregator::aggregate(&nodes, lines.execution_time_ms);
        let stats = StatisticsSummarizer::summarize(&nodes);
        let insights = classify_nodes(&nodes, stats.average_cost);
        let outcome = RuleEngine::new().analyze(&nodes, stats.node_time_sum_ms);

        let conclusion = RuleEngine::generate_conclusion(&outcome.issues, timing.total_time_ms);
        let performance_score =
            RuleEngine::calculate_performance_score(&outcome.issues, timing.total_time_ms);

        tracing::info!(
            "Analyzed plan: {} nodes, {} issues, {} recommendations, total {:.3} ms",
            nodes.len(),
            outcome.issues.len(),
            outcome.recommendations.len(),
            timing.total_time_ms
        );

        PlanReport {
            format,
            timing_breakdown: timing.breakdown,
            totals: PlanTotals {
                total_time_ms: timing.total_time_ms,
                node_time_sum_ms: stats.node_time_sum_ms,
                slowest_node_id: stats.slowest_node_id,
                largest_node_id: stats.largest_node_id,
                costliest_node_id: stats.costliest_node_id,
                average_cost: stats.average_cost,
            },
            nodes,
            issues: outcome.issues,
            recommendations: outcome.recommendations,
            insights,
            execution_time_ms: lines.execution_time_ms,
            planning_time_ms: lines.planning_time_ms,
            raw_lines: lines.raw_lines,
            conclusion,
            performance_score,
        }
    }
}
