//! Plan analysis data models
//!
//! These models represent the structured data extracted from PostgreSQL
//! `EXPLAIN (ANALYZE, BUFFERS)` output. They are serializable in the camelCase
//! shape the rendering layer and the summarization prompt consume.

use serde::{Deserialize, Serialize};

use super::parser::core::OperatorKind;

/// Parent id of top-level nodes
pub const ROOT_PARENT_ID: i32 = -1;

// ============================================================================
// Plan Node Structure
// ============================================================================

/// Planner cost estimate (startup..total)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostRange {
    pub start: f64,
    pub end: f64,
}

/// Measured elapsed time range in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

/// Raw row-count captures from the two clauses of an operator line.
///
/// `estimated` comes from `(cost=... rows=N ...)`, `actual` from
/// `(actual ... rows=N ...)`. Both are kept so callers can pick explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCounts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<u64>,
}

/// Block counters from a `Buffers:` detail line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BufferUsage {
    pub shared_hit: u64,
    pub shared_read: u64,
    pub shared_dirtied: u64,
    pub shared_written: u64,
    pub local_hit: u64,
    pub local_read: u64,
    pub temp_read: u64,
    pub temp_written: u64,
}

impl BufferUsage {
    /// Blocks read from outside shared buffers
    pub fn blocks_read(&self) -> u64 {
        self.shared_read + self.local_read + self.temp_read
    }
}

/// One operator of the execution plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanNode {
    pub id: i32,
    pub parent_id: i32,
    pub operation: String,
    pub operator: OperatorKind,
    pub indent: usize,
    pub depth: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<CostRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<TimeRange>,

    /// First `rows=` token on the line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<u64>,
    /// `plan_rows=` token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_rows: Option<u64>,
    pub row_counts: RowCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub loops: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffers: Option<BufferUsage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
    #[serde(default)]
    pub never_executed: bool,
}

impl PlanNode {
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_PARENT_ID
    }

    /// Actual total time in ms, if the operator was timed
    pub fn time_end(&self) -> Option<f64> {
        self.time.map(|t| t.end)
    }

    /// Planner total cost, if present
    pub fn cost_end(&self) -> Option<f64> {
        self.cost.map(|c| c.end)
    }
}

// ============================================================================
// Derived Structures
// ============================================================================

/// One entry of the timing breakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryTiming {
    pub node_id: i32,
    pub name: String,
    pub time: f64,
    pub percentage: f64,
    pub calls: u64,
}

/// Whole-plan aggregates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTotals {
    pub total_time_ms: f64,
    pub node_time_sum_ms: f64,
    pub slowest_node_id: Option<i32>,
    pub largest_node_id: Option<i32>,
    pub costliest_node_id: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_cost: Option<f64>,
}

/// Severity of a detected issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
}

/// A detected performance problem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub rule_id: String,
    pub severity: IssueSeverity,
    pub title: String,
    pub description: String,
    pub impacted_operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_id: Option<i32>,
}

/// Remediation advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub rule_id: String,
    pub category: String,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_sql: Option<String>,
}

/// Divergence between actual and planned row counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowMismatchSeverity {
    None,
    Low,
    Moderate,
    Severe,
}

/// Timing tier used for color and priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingSeverity {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

/// Per-node display classifications
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInsight {
    pub node_id: i32,
    pub high_cost: bool,
    pub row_mismatch: RowMismatchSeverity,
    pub timing_severity: TimingSeverity,
}

// ============================================================================
// Report
// ============================================================================

/// How the payload was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanFormat {
    #[default]
    Text,
    /// JSON-encoded plan, kept as opaque text
    Json,
}

/// Complete analysis result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub format: PlanFormat,
    pub nodes: Vec<PlanNode>,
    pub timing_breakdown: Vec<QueryTiming>,
    pub totals: PlanTotals,
    pub issues: Vec<Issue>,
    pub recommendations: Vec<Recommendation>,
    pub insights: Vec<NodeInsight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planning_time_ms: Option<f64>,
    pub raw_lines: Vec<String>,
    pub conclusion: String,
    pub performance_score: f64,
}

impl PlanReport {
    /// Report for a plan with nothing to analyze
    pub fn empty() -> Self {
        Self {
            conclusion: "No plan operators were recognized.".to_string(),
            performance_score: 100.0,
            ..Default::default()
        }
    }

    /// True when no tree could be built
    pub fn has_visualization(&self) -> bool {
        !self.nodes.is_empty()
    }
}
