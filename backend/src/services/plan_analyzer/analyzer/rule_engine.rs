//! Rule engine for plan diagnostics
//!
//! Orchestrates rule evaluation, conclusion and performance score
//! calculation. Findings are reported in full: one node may trigger several
//! rules and nothing is deduplicated or truncated here.

use super::rules::query::{QueryRule, QueryRuleContext};
use super::rules::{get_all_rules, get_query_rules, DiagnosticRule, RuleContext};
use crate::services::plan_analyzer::models::{Issue, IssueSeverity, PlanNode, Recommendation};

/// Issues and recommendations produced by one evaluation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    pub issues: Vec<Issue>,
    pub recommendations: Vec<Recommendation>,
}

/// Rule engine for plan diagnostics
pub struct RuleEngine {
    rules: Vec<Box<dyn DiagnosticRule>>,
    query_rules: Vec<Box<dyn QueryRule>>,
}

impl RuleEngine {
    pub fn new() -> Self {
        Self {
            rules: get_all_rules(),
            query_rules: get_query_rules(),
        }
    }

    /// Evaluate node rules in plan order, then query rules
    pub fn analyze(&self, nodes: &[PlanNode], node_time_sum_ms: f64) -> RuleOutcome {
        let mut outcome = RuleOutcome::default();

        for node in nodes {
            let context = RuleContext { node };
            for rule in &self.rules {
                if !rule.applicable_to(node) {
                    continue;
                }
                if let Some(diag) = rule.evaluate(&context) {
                    tracing::debug!("Rule {} fired on node {}", diag.rule_id, diag.node_id);
                    outcome.issues.push(diag.to_issue());
                    if let Some(rec) = diag.recommendation {
                        outcome.recommendations.push(rec);
                    }
                }
            }
        }

        let query_ctx = QueryRuleContext { nodes, node_time_sum_ms };
        for rule in &self.query_rules {
            if let Some(diag) = rule.evaluate(&query_ctx) {
                tracing::debug!("Query rule {} fired: {}", diag.rule_id, diag.message);
                outcome.recommendations.push(diag.recommendation);
            }
        }

        outcome
    }
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Conclusion and Score Generation
// ============================================================================

/// Total time above which the score takes an extra penalty
pub const SCORE_SLOW_TOTAL_MS: f64 = 1000.0;

impl RuleEngine {
    /// One-sentence conclusion for the report header
    pub fn generate_conclusion(issues: &[Issue], total_time_ms: f64) -> String {
        if issues.is_empty() {
            return "Plan executed without notable performance issues.".to_string();
        }

        let error_count = issues.iter().filter(|i| i.severity == IssueSeverity::Error).count();
        let warning_count = issues.len() - error_count;

        if error_count > 0 {
            let first_error = issues
                .iter()
                .find(|i| i.severity == IssueSeverity::Error)
                .map(|i| i.title.as_str())
                .unwrap_or("unknown");
            format!(
                "Plan has {} severe issue(s) over {:.2} ms; start with {}.",
                error_count, total_time_ms, first_error
            )
        } else if warning_count > 2 {
            format!(
                "Plan has {} warnings over {:.2} ms and needs tuning.",
                warning_count, total_time_ms
            )
        } else {
            format!("Plan has {} minor issue(s); overall performance is acceptable.", issues.len())
        }
    }

    /// Performance score (0-100) based on issues and total time
    pub fn calculate_performance_score(issues: &[Issue], total_time_ms: f64) -> f64 {
        let mut score: f64 = 100.0;

        for issue in issues {
            score -= match issue.severity {
                IssueSeverity::Error => 20.0,
                IssueSeverity::Warning => 10.0,
            };
        }

        if total_time_ms > SCORE_SLOW_TOTAL_MS {
            score -= 5.0;
        }

        score.max(0.0)
    }
}
