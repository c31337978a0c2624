//! Diagnostic rules module
//!
//! Rules are organized by operator family. Node rules run against every
//! node in a fixed order; query rules run once over the whole plan.

pub mod common;
pub mod join;
pub mod query;
pub mod scan;

use crate::services::plan_analyzer::models::{Issue, IssueSeverity, PlanNode, Recommendation};
use once_cell::sync::Lazy;
use regex::Regex;

// ============================================================================
// Rule Trait and Types
// ============================================================================

/// A diagnostic result from rule evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub rule_id: String,
    pub rule_name: String,
    pub severity: IssueSeverity,
    pub node_id: i32,
    pub impacted_operation: String,
    pub message: String,
    pub recommendation: Option<Recommendation>,
}

impl Diagnostic {
    pub fn to_issue(&self) -> Issue {
        Issue {
            rule_id: self.rule_id.clone(),
            severity: self.severity,
            title: self.rule_name.clone(),
            description: self.message.clone(),
            impacted_operation: self.impacted_operation.clone(),
            node_id: Some(self.node_id),
        }
    }
}

/// Context for rule evaluation
pub struct RuleContext<'a> {
    pub node: &'a PlanNode,
}

impl<'a> RuleContext<'a> {
    /// Actual total time in ms
    pub fn time_ms(&self) -> Option<f64> {
        self.node.time_end()
    }

    /// Planner total cost
    pub fn cost(&self) -> Option<f64> {
        self.node.cost_end()
    }

    /// Relation name for messages and generated SQL
    pub fn object_name(&self) -> &'a str {
        self.node.object_name.as_deref().unwrap_or("<table>")
    }

    /// Build a diagnostic for the node under evaluation
    pub fn diagnostic(
        &self,
        rule: &dyn DiagnosticRule,
        severity: IssueSeverity,
        message: String,
        recommendation: Option<Recommendation>,
    ) -> Diagnostic {
        Diagnostic {
            rule_id: rule.id().to_string(),
            rule_name: rule.name().to_string(),
            severity,
            node_id: self.node.id,
            impacted_operation: self.node.operation.clone(),
            message,
            recommendation,
        }
    }
}

/// Trait for diagnostic rules
pub trait DiagnosticRule: Send + Sync {
    /// Rule ID (e.g., "P001")
    fn id(&self) -> &str;

    /// Rule name, used as the issue title
    fn name(&self) -> &str;

    /// Check if rule applies to this node
    fn applicable_to(&self, node: &PlanNode) -> bool;

    /// Evaluate the rule and return diagnostic if triggered
    fn evaluate(&self, context: &RuleContext) -> Option<Diagnostic>;
}

// ============================================================================
// Utility Functions
// ============================================================================

static STRING_LITERAL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"'(?:[^']|'')*'").unwrap());
static FILTER_COLUMN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\(*([A-Za-z_][A-Za-z0-9_]*)\)?(?:::[A-Za-z_ ]+?)?\)?\s*(?:=|<>|!=|<=|>=|<|>|~~\*?|!~~|\bIS\b|\bIN\b|\bLIKE\b|\bILIKE\b|\bBETWEEN\b)",
    )
    .unwrap()
});

/// Column names compared in a `Filter:` expression, in first-seen order
///
/// Handles `(status = 'open'::text)`, `((name)::text = 'x'::text)` and
/// `((a > 1) AND (b IS NULL))`.
pub fn extract_filter_columns(filter: &str) -> Vec<String> {
    let cleaned = STRING_LITERAL_REGEX.replace_all(filter, "''");
    let mut columns: Vec<String> = Vec::new();
    for cap in FILTER_COLUMN_REGEX.captures_iter(&cleaned) {
        let column = &cap[1];
        let keyword = matches!(
            column.to_ascii_uppercase().as_str(),
            "AND" | "OR" | "NOT" | "NULL" | "TRUE" | "FALSE" | "ANY" | "ALL"
        );
        if !keyword && !columns.iter().any(|c| c == column) {
            columns.push(column.to_string());
        }
    }
    columns
}

/// Unqualified, unquoted relation name usable inside an identifier
pub fn bare_relation_name(object_name: &str) -> String {
    object_name
        .rsplit('.')
        .next()
        .unwrap_or(object_name)
        .trim_matches('"')
        .to_string()
}

/// Format a duration in ms for messages
pub fn format_duration_ms(ms: f64) -> String {
    if ms < 1.0 {
        format!("{:.3} ms", ms)
    } else if ms < 1000.0 {
        format!("{:.2} ms", ms)
    } else {
        format!("{:.2} s", ms / 1000.0)
    }
}

// ============================================================================
// Rule Registry
// ============================================================================

/// Get all node-level rules, in evaluation order
pub fn get_all_rules() -> Vec<Box<dyn DiagnosticRule>> {
    let mut rules: Vec<Box<dyn DiagnosticRule>> = Vec::new();

    // P001
    rules.extend(scan::get_rules());

    // P002, P003
    rules.extend(common::get_cost_and_estimate_rules());

    // P004
    rules.extend(join::get_rules());

    // P005
    rules.extend(common::get_timing_rules());

    rules
}

/// Get query-level rules
pub fn get_query_rules() -> Vec<Box<dyn query::QueryRule>> {
    query::get_rules()
}
