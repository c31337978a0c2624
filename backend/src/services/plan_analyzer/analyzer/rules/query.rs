//! Query-level diagnostic rules (Q001)
//!
//! Rules that evaluate the whole plan rather than a single node.

use super::format_duration_ms;
use crate::services::plan_analyzer::models::{PlanNode, Recommendation};

/// Query-level rule trait
pub trait QueryRule: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn evaluate(&self, context: &QueryRuleContext) -> Option<QueryDiagnostic>;
}

/// Plan-wide values available to query rules
pub struct QueryRuleContext<'a> {
    pub nodes: &'a [PlanNode],
    /// Sum of `time.end` over all nodes
    pub node_time_sum_ms: f64,
}

/// Query-level diagnostic result; these carry advice only, never an issue
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDiagnostic {
    pub rule_id: String,
    pub rule_name: String,
    pub message: String,
    pub recommendation: Recommendation,
}

pub const SLOW_QUERY_MS: f64 = 1000.0;

/// Q001: Slow query overall
/// Condition: sum of node times > 1000ms
pub struct Q001SlowQuery;

impl QueryRule for Q001SlowQuery {
    fn id(&self) -> &str { "Q001" }
    fn name(&self) -> &str { "Slow Query" }

    fn evaluate(&self, context: &QueryRuleContext) -> Option<QueryDiagnostic> {
        if context.node_time_sum_ms <= SLOW_QUERY_MS {
            return None;
        }

        let message = format!(
            "Operators spent {} in total across {} nodes",
            format_duration_ms(context.node_time_sum_ms),
            context.nodes.len()
        );
        Some(QueryDiagnostic {
            rule_id: self.id().to_string(),
            rule_name: self.name().to_string(),
            message: message.clone(),
            recommendation: Recommendation {
                rule_id: self.id().to_string(),
                category: "query".to_string(),
                title: "Optimize the query".to_string(),
                description: format!(
                    "{}. Review the slowest operators, narrow the selected rows and columns, and check join conditions.",
                    message
                ),
                suggested_sql: None,
            },
        })
    }
}

/// Get all query rules
pub fn get_rules() -> Vec<Box<dyn QueryRule>> {
    vec![Box::new(Q001SlowQuery)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slow_query_threshold() {
        let ctx = QueryRuleContext { nodes: &[], node_time_sum_ms: 1000.0 };
        assert!(Q001SlowQuery.evaluate(&ctx).is_none());

        let ctx = QueryRuleContext { nodes: &[], node_time_sum_ms: 1500.0 };
        let diag = Q001SlowQuery.evaluate(&ctx).unwrap();
        assert_eq!(diag.recommendation.category, "query");
        assert!(diag.recommendation.suggested_sql.is_none());
    }
}
