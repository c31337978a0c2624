//! Whole-plan statistics
//!
//! All aggregates come out of a single pass over the node list. Ties keep
//! the first node seen so the output is deterministic.

use crate::services::plan_analyzer::models::PlanNode;

/// Aggregates over the node list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanStatistics {
    /// Sum of `time.end` over all nodes
    pub node_time_sum_ms: f64,
    pub slowest_node_id: Option<i32>,
    pub largest_node_id: Option<i32>,
    pub costliest_node_id: Option<i32>,
    /// Mean `cost.end` over all nodes; a node without an estimate counts as 0.
    /// `None` when no node carries a cost at all.
    pub average_cost: Option<f64>,
}

#[derive(Default)]
struct MaxTracker<T> {
    best: Option<(T, i32)>,
}

impl<T: PartialOrd + Copy> MaxTracker<T> {
    fn offer(&mut self, value: Option<T>, id: i32) {
        let Some(value) = value else { return };
        match self.best {
            Some((best, _)) if value <= best => {}
            _ => self.best = Some((value, id)),
        }
    }

    fn id(&self) -> Option<i32> {
        self.best.map(|(_, id)| id)
    }
}

pub struct StatisticsSummarizer;

impl StatisticsSummarizer {
    pub fn summarize(nodes: &[PlanNode]) -> PlanStatistics {
        let mut time_sum = 0.0;
        let mut cost_sum = 0.0;
        let mut has_cost = false;
        let mut slowest = MaxTracker::<f64>::default();
        let mut largest = MaxTracker::<u64>::default();
        let mut costliest = MaxTracker::<f64>::default();

        for node in nodes {
            time_sum += node.time_end().unwrap_or(0.0);
            if let Some(cost) = node.cost_end() {
                cost_sum += cost;
                has_cost = true;
            }
            slowest.offer(node.time_end(), node.id);
            largest.offer(node.rows, node.id);
            costliest.offer(node.cost_end(), node.id);
        }

        PlanStatistics {
            node_time_sum_ms: time_sum,
            slowest_node_id: slowest.id(),
            largest_node_id: largest.id(),
            costliest_node_id: costliest.id(),
            average_cost: has_cost.then(|| cost_sum / nodes.len() as f64),
        }
    }
}
