//! Scan operator diagnostic rules (P001)

use super::*;

/// Row count above which a sequential scan is reported
pub const SEQ_SCAN_ROW_THRESHOLD: u64 = 1000;

/// P001: Sequential scan over a large relation
/// Condition: operation contains "Seq Scan" && rows > 1000
pub struct P001SequentialScan;

impl P001SequentialScan {
    fn index_sql(object_name: &str, filter: Option<&str>) -> String {
        let columns = filter.map(extract_filter_columns).unwrap_or_default();
        if columns.is_empty() {
            return format!(
                "CREATE INDEX idx_{}_<column> ON {} (<column>);",
                bare_relation_name(object_name),
                object_name
            );
        }
        format!(
            "CREATE INDEX idx_{}_{} ON {} ({});",
            bare_relation_name(object_name),
            columns.join("_"),
            object_name,
            columns.join(", ")
        )
    }
}

impl DiagnosticRule for P001SequentialScan {
    fn id(&self) -> &str { "P001" }
    fn name(&self) -> &str { "Sequential Scan Detected" }

    fn applicable_to(&self, node: &PlanNode) -> bool {
        node.operation.contains("Seq Scan")
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Diagnostic> {
        let rows = context.node.rows?;
        if rows <= SEQ_SCAN_ROW_THRESHOLD {
            return None;
        }

        let object_name = context.object_name();
        let message = match &context.node.filter {
            Some(filter) => format!(
                "Sequential scan on {} reads {} rows and filters them with {}",
                object_name, rows, filter
            ),
            None => format!("Sequential scan on {} reads {} rows", object_name, rows),
        };

        Some(context.diagnostic(
            self,
            IssueSeverity::Warning,
            message,
            Some(Recommendation {
                rule_id: self.id().to_string(),
                category: "index".to_string(),
                title: format!("Create an index on {}", object_name),
                description: format!(
                    "An index on the filtered columns of {} lets the planner avoid reading the whole relation.",
                    object_name
                ),
                suggested_sql: Some(Self::index_sql(object_name, context.node.filter.as_deref())),
            }),
        ))
    }
}

/// Get all scan rules
pub fn get_rules() -> Vec<Box<dyn DiagnosticRule>> {
    vec![Box::new(P001SequentialScan)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::plan_analyzer::parser::core::TreeBuilder;

    fn evaluate(lines: &[&str]) -> Option<Diagnostic> {
        let nodes = TreeBuilder::new(8).build(lines).unwrap();
        let rule = P001SequentialScan;
        assert!(rule.applicable_to(&nodes[0]));
        rule.evaluate(&RuleContext { node: &nodes[0] })
    }

    #[test]
    fn test_large_seq_scan_with_filter() {
        let diag = evaluate(&[
            "Seq Scan on orders  (cost=0.00..180.00 rows=5000 width=8)",
            "  Filter: (status = 'open'::text)",
        ])
        .unwrap();
        assert_eq!(diag.severity, IssueSeverity::Warning);
        let rec = diag.recommendation.unwrap();
        assert_eq!(
            rec.suggested_sql.as_deref(),
            Some("CREATE INDEX idx_orders_status ON orders (status);")
        );
    }

    #[test]
    fn test_without_filter_uses_placeholder() {
        let diag = evaluate(&["Parallel Seq Scan on public.orders o  (cost=0.00..180.00 rows=5000 width=8)"])
            .unwrap();
        let sql = diag.recommendation.unwrap().suggested_sql.unwrap();
        assert_eq!(sql, "CREATE INDEX idx_orders_<column> ON public.orders (<column>);");
    }

    #[test]
    fn test_threshold_is_strict() {
        assert!(evaluate(&["Seq Scan on orders  (cost=0.00..18.00 rows=1000 width=8)"]).is_none());
        assert!(evaluate(&["Seq Scan on orders"]).is_none());
    }
}
