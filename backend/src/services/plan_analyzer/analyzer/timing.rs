//! Timing breakdown
//!
//! Builds the per-operator timing list shown next to the plan tree. Trivial
//! sub-millisecond operators are filtered out so they do not crowd the list.

use crate::services::plan_analyzer::models::{PlanNode, QueryTiming};

/// Operators at or below this time (ms) are never listed
pub const MIN_ELIGIBLE_TIME_MS: f64 = 0.1;
/// Share of the total (percent) above which an operator is listed
pub const MIN_PERCENTAGE: f64 = 1.0;
/// Absolute time (ms) above which an operator is listed regardless of share
pub const MIN_ABSOLUTE_TIME_MS: f64 = 10.0;

/// Timing breakdown together with the total it was computed against
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingSummary {
    pub total_time_ms: f64,
    pub breakdown: Vec<QueryTiming>,
}

pub struct TimingAggregator;

impl TimingAggregator {
    /// Total plan time: the reported execution time, else the node sum
    pub fn total_time(nodes: &[PlanNode], execution_time_ms: Option<f64>) -> f64 {
        execution_time_ms
            .unwrap_or_else(|| nodes.iter().filter_map(PlanNode::time_end).sum())
    }

    pub fn aggregate(nodes: &[PlanNode], execution_time_ms: Option<f64>) -> TimingSummary {
        let total = Self::total_time(nodes, execution_time_ms);

        let mut breakdown: Vec<QueryTiming> = nodes
            .iter()
            .filter_map(|node| {
                let time = node.time_end()?;
                if time <= MIN_ELIGIBLE_TIME_MS {
                    return None;
                }
                let percentage = if total > 0.0 { time / total * 100.0 } else { 0.0 };
                if percentage > MIN_PERCENTAGE || time > MIN_ABSOLUTE_TIME_MS {
                    Some(QueryTiming {
                        node_id: node.id,
                        name: node.operation.clone(),
                        time,
                        percentage,
                        calls: node.loops.unwrap_or(1),
                    })
                } else {
                    None
                }
            })
            .collect();

        // Stable sort keeps parse order among equal times
        breakdown.sort_by(|a, b| b.time.total_cmp(&a.time));

        TimingSummary { total_time_ms: total, breakdown }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::plan_analyzer::parser::core::TreeBuilder;

    fn nodes(lines: &[&str]) -> Vec<PlanNode> {
        TreeBuilder::new(16).build(lines).unwrap()
    }

    #[test]
    fn test_tiny_operator_is_excluded() {
        let nodes = nodes(&["Result  (cost=0.00..0.01 rows=1 width=4) (actual time=0.01..0.05 rows=1 loops=1)"]);
        let summary = TimingAggregator::aggregate(&nodes, None);
        assert!(summary.breakdown.is_empty());
        assert!((summary.total_time_ms - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_absolute_time_clause() {
        let nodes = nodes(&["Seq Scan on t  (cost=0.00..1.00 rows=1 width=4) (actual time=0.1..15.0 rows=1 loops=4)"]);
        // 15 ms of 3000 ms is 0.5%, kept because it exceeds 10 ms
        let summary = TimingAggregator::aggregate(&nodes, Some(3000.0));
        assert_eq!(summary.breakdown.len(), 1);
        assert!((summary.breakdown[0].percentage - 0.5).abs() < 1e-9);
        assert_eq!(summary.breakdown[0].calls, 4);
    }

    #[test]
    fn test_percentage_clause_and_order() {
        let nodes = nodes(&[
            "Hash Join  (cost=1.00..2.00 rows=1 width=4) (actual time=0.5..8.0 rows=1 loops=1)",
            "  ->  Seq Scan on a  (cost=0.00..1.00 rows=1 width=4) (actual time=0.1..0.2 rows=1 loops=1)",
            "  ->  Hash  (cost=0.00..1.00 rows=1 width=4) (actual time=0.1..9.0 rows=1 loops=1)",
        ]);
        let summary = TimingAggregator::aggregate(&nodes, Some(20.0));
        let ids: Vec<i32> = summary.breakdown.iter().map(|t| t.node_id).collect();
        assert_eq!(ids, vec![2, 0, 1]);
        assert_eq!(summary.breakdown[2].calls, 1);
    }

    #[test]
    fn test_zero_total_yields_zero_percentage() {
        let nodes = nodes(&["Seq Scan on t  (actual time=0.1..12.0 rows=1 loops=1)"]);
        let summary = TimingAggregator::aggregate(&nodes, Some(0.0));
        assert_eq!(summary.breakdown.len(), 1);
        assert_eq!(summary.breakdown[0].percentage, 0.0);
    }
}
