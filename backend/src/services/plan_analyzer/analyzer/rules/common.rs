//! Common diagnostic rules (P002, P003, P005)
//!
//! Rules that apply to any operator regardless of type.

use super::*;

/// P002: High planner cost
/// Condition: cost.end > 1000
pub struct P002HighCost;

pub const HIGH_COST_THRESHOLD: f64 = 1000.0;

impl DiagnosticRule for P002HighCost {
    fn id(&self) -> &str { "P002" }
    fn name(&self) -> &str { "High Planner Cost" }

    fn applicable_to(&self, node: &PlanNode) -> bool {
        node.cost.is_some()
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Diagnostic> {
        let cost = context.cost()?;
        if cost > HIGH_COST_THRESHOLD {
            Some(context.diagnostic(
                self,
                IssueSeverity::Error,
                format!(
                    "Estimated total cost {:.2} exceeds {:.0}",
                    cost, HIGH_COST_THRESHOLD
                ),
                None,
            ))
        } else {
            None
        }
    }
}

/// P003: Planner row estimate diverges from the compared row count
/// Condition: rows / max(planned_rows, 1) > 10 or < 0.1
pub struct P003RowEstimateMismatch;

pub const ROW_ESTIMATE_RATIO: f64 = 10.0;

impl DiagnosticRule for P003RowEstimateMismatch {
    fn id(&self) -> &str { "P003" }
    fn name(&self) -> &str { "Row Estimate Mismatch" }

    fn applicable_to(&self, node: &PlanNode) -> bool {
        node.rows.is_some() && node.planned_rows.is_some()
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Diagnostic> {
        let rows = context.node.rows?;
        let planned = context.node.planned_rows?;
        let ratio = rows as f64 / planned.max(1) as f64;

        if ratio > ROW_ESTIMATE_RATIO || ratio < 1.0 / ROW_ESTIMATE_RATIO {
            let object_name = context.object_name();
            Some(context.diagnostic(
                self,
                IssueSeverity::Warning,
                format!(
                    "Row count {} differs from the planned {} beyond a factor of {:.0}",
                    rows, planned, ROW_ESTIMATE_RATIO
                ),
                Some(Recommendation {
                    rule_id: self.id().to_string(),
                    category: "statistics".to_string(),
                    title: format!("Refresh statistics for {}", object_name),
                    description: "Stale statistics lead the planner to pick poor join orders and scan types."
                        .to_string(),
                    suggested_sql: Some(format!("ANALYZE {};", object_name)),
                }),
            ))
        } else {
            None
        }
    }
}

/// P005: Slow operation
/// Condition: time.end > 100ms
pub struct P005SlowOperation;

pub const SLOW_OPERATION_MS: f64 = 100.0;

impl DiagnosticRule for P005SlowOperation {
    fn id(&self) -> &str { "P005" }
    fn name(&self) -> &str { "Slow Operation" }

    fn applicable_to(&self, node: &PlanNode) -> bool {
        node.time.is_some()
    }

    fn evaluate(&self, context: &RuleContext) -> Option<Diagnostic> {
        let time_ms = context.time_ms()?;
        if time_ms > SLOW_OPERATION_MS {
            Some(context.diagnostic(
                self,
                IssueSeverity::Warning,
                format!("Operation took {}", format_duration_ms(time_ms)),
                None,
            ))
        } else {
            None
        }
    }
}

/// P002 and P003, which run before operator-specific join rules
pub fn get_cost_and_estimate_rules() -> Vec<Box<dyn DiagnosticRule>> {
    vec![Box::new(P002HighCost), Box::new(P003RowEstimateMismatch)]
}

/// P005, which runs last
pub fn get_timing_rules() -> Vec<Box<dyn DiagnosticRule>> {
    vec![Box::new(P005SlowOperation)]
}
