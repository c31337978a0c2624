//! Join operator diagnostic rules (P004)

use super::*;

/// Loop count above which a nested loop is reported
pub const NESTED_LOOP_MAX_LOOPS: u64 = 100;

/// P004: Nested loop executed many times
/// Condition: operation contains "Nested Loop" && loops > 100
pub struct P004ExpensiveNestedLoop;

impl DiagnosticRule for P004ExpensiveNestedLoop {
    fn id(&self) -> &str { "P004" }
    fn name(&self) -> &str { "Expensive Nested Loop" }

    fn applicable_to(&self, node: &PlanNode) -> bool {
        node.operation.contains("Nested Loop")
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Diagnostic> {
        let loops = context.node.loops?;
        if loops <= NESTED_LOOP_MAX_LOOPS {
            return None;
        }

        Some(context.diagnostic(
            self,
            IssueSeverity::Error,
            format!("Nested loop executed {} times", loops),
            Some(Recommendation {
                rule_id: self.id().to_string(),
                category: "configuration".to_string(),
                title: "Allow a hash join".to_string(),
                description: "More work_mem lets the planner build an in-memory hash table instead of rescanning the inner side for every outer row."
                    .to_string(),
                suggested_sql: Some("SET work_mem = '64MB';\nSET enable_hashjoin = on;".to_string()),
            }),
        ))
    }
}

/// Get all join rules
pub fn get_rules() -> Vec<Box<dyn DiagnosticRule>> {
    vec![Box::new(P004ExpensiveNestedLoop)]
}
