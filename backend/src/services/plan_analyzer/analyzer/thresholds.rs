//! Display classifications for plan nodes
//!
//! High-cost flag, row-mismatch severity and timing tier. These drive colors
//! and priority in the rendering layer, so the thresholds are fixed.

use crate::services::plan_analyzer::models::{
    NodeInsight, PlanNode, RowMismatchSeverity, TimingSeverity,
};

/// Absolute planner cost above which a node is flagged
pub const HIGH_COST_ABSOLUTE: f64 = 100.0;
/// Multiple of the plan's average cost above which a node is flagged
pub const HIGH_COST_AVERAGE_FACTOR: f64 = 3.0;

pub const ROW_MISMATCH_SEVERE_RATIO: f64 = 10.0;
pub const ROW_MISMATCH_MODERATE_RATIO: f64 = 3.0;

/// High-cost flag: `cost > 100` or `cost > 3 x average`
pub fn is_high_cost(cost_end: f64, average_cost: Option<f64>) -> bool {
    cost_end > HIGH_COST_ABSOLUTE
        || average_cost.is_some_and(|avg| cost_end > HIGH_COST_AVERAGE_FACTOR * avg)
}

/// Classify the divergence between actual and planned rows
pub fn row_mismatch_severity(rows: Option<u64>, planned_rows: Option<u64>) -> RowMismatchSeverity {
    let (Some(rows), Some(planned)) = (rows, planned_rows) else {
        return RowMismatchSeverity::None;
    };
    if rows == 0 && planned > 0 {
        return RowMismatchSeverity::Severe;
    }

    let ratio = rows as f64 / planned as f64;
    // NaN (0/0) compares false everywhere and lands on Low
    let spread = ratio.max(1.0 / ratio);
    if spread > ROW_MISMATCH_SEVERE_RATIO {
        RowMismatchSeverity::Severe
    } else if spread > ROW_MISMATCH_MODERATE_RATIO {
        RowMismatchSeverity::Moderate
    } else {
        RowMismatchSeverity::Low
    }
}

/// Timing tier for a node time in ms
pub fn timing_severity(time_ms: f64) -> TimingSeverity {
    if time_ms > 1000.0 {
        TimingSeverity::Critical
    } else if time_ms > 500.0 {
        TimingSeverity::High
    } else if time_ms > 100.0 {
        TimingSeverity::Medium
    } else if time_ms > 10.0 {
        TimingSeverity::Low
    } else {
        TimingSeverity::Minimal
    }
}

/// Classify every node against the plan-wide average cost
pub fn classify_nodes(nodes: &[PlanNode], average_cost: Option<f64>) -> Vec<NodeInsight> {
    nodes
        .iter()
        .map(|node| NodeInsight {
            node_id: node.id,
            high_cost: node.cost_end().is_some_and(|cost| is_high_cost(cost, average_cost)),
            row_mismatch: row_mismatch_severity(node.rows, node.planned_rows),
            timing_severity: timing_severity(node.time_end().unwrap_or(0.0)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_high_cost() {
        assert!(is_high_cost(100.5, None));
        assert!(!is_high_cost(100.0, None));
        assert!(is_high_cost(40.0, Some(10.0)));
        assert!(!is_high_cost(30.0, Some(10.0)));
    }

    #[test]
    fn test_row_mismatch() {
        assert_eq!(row_mismatch_severity(None, Some(10)), RowMismatchSeverity::None);
        assert_eq!(row_mismatch_severity(Some(10), None), RowMismatchSeverity::None);
        assert_eq!(row_mismatch_severity(Some(0), Some(5)), RowMismatchSeverity::Severe);
        assert_eq!(row_mismatch_severity(Some(1100), Some(100)), RowMismatchSeverity::Severe);
        assert_eq!(row_mismatch_severity(Some(5), Some(100)), RowMismatchSeverity::Severe);
        assert_eq!(row_mismatch_severity(Some(400), Some(100)), RowMismatchSeverity::Moderate);
        assert_eq!(row_mismatch_severity(Some(20), Some(100)), RowMismatchSeverity::Moderate);
        assert_eq!(row_mismatch_severity(Some(300), Some(100)), RowMismatchSeverity::Low);
        assert_eq!(row_mismatch_severity(Some(0), Some(0)), RowMismatchSeverity::Low);
        assert_eq!(row_mismatch_severity(Some(5), Some(0)), RowMismatchSeverity::Severe);
    }

    #[test]
    fn test_timing_tiers() {
        assert_eq!(timing_severity(1000.1), TimingSeverity::Critical);
        assert_eq!(timing_severity(1000.0), TimingSeverity::High);
        assert_eq!(timing_severity(500.5), TimingSeverity::High);
        assert_eq!(timing_severity(150.0), TimingSeverity::Medium);
        assert_eq!(timing_severity(10.5), TimingSeverity::Low);
        assert_eq!(timing_severity(10.0), TimingSeverity::Minimal);
    }
}
