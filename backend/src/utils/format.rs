//! Plain-text report formatting for terminal output

use std::fmt::Write;

use crate::services::plan_analyzer::parser::core::PlanTree;
use crate::services::plan_analyzer::{IssueSeverity, PlanFormat, PlanNode, PlanReport};

/// Render a report as an indented tree followed by findings
pub fn format_report_text(report: &PlanReport) -> String {
    let mut out = String::new();

    if report.format == PlanFormat::Json {
        out.push_str("JSON plan (no tree available)\n");
        for line in &report.raw_lines {
            let _ = writeln!(out, "{}", line);
        }
        return out;
    }

    if !report.has_visualization() {
        let _ = writeln!(out, "{}", report.conclusion);
        return out;
    }

    let _ = write!(
        out,
        "Plan: {} nodes, total {:.3} ms",
        report.nodes.len(),
        report.totals.total_time_ms
    );
    if let Some(planning) = report.planning_time_ms {
        let _ = write!(out, " (planning {:.3} ms)", planning);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "Score: {:.0} - {}", report.performance_score, report.conclusion);
    let _ = writeln!(out);

    let tree = PlanTree::new(&report.nodes);
    for root in tree.roots() {
        write_subtree(&mut out, &tree, root, 0);
    }

    if !report.timing_breakdown.is_empty() {
        let _ = writeln!(out, "\nTiming:");
        for timing in &report.timing_breakdown {
            let _ = writeln!(
                out,
                "  {:>6.2}%  {:>10.3} ms  x{}  {}",
                timing.percentage, timing.time, timing.calls, timing.name
            );
        }
    }

    if !report.issues.is_empty() {
        let _ = writeln!(out, "\nIssues:");
        for issue in &report.issues {
            let severity = match issue.severity {
                IssueSeverity::Error => "error",
                IssueSeverity::Warning => "warning",
            };
            let _ = writeln!(
                out,
                "  [{}] {} {} @ {}: {}",
                severity, issue.rule_id, issue.title, issue.impacted_operation, issue.description
            );
        }
    }

    if !report.recommendations.is_empty() {
        let _ = writeln!(out, "\nRecommendations:");
        for rec in &report.recommendations {
            let _ = writeln!(out, "  [{}] {}", rec.category, rec.title);
            if let Some(sql) = &rec.suggested_sql {
                for line in sql.lines() {
                    let _ = writeln!(out, "      {}", line);
                }
            }
        }
    }

    out
}

fn write_subtree(out: &mut String, tree: &PlanTree<'_>, node: &PlanNode, level: usize) {
    let _ = writeln!(out, "{}{}", "  ".repeat(level), describe_node(node));
    for child in tree.children(node.id) {
        write_subtree(out, tree, child, level + 1);
    }
}

fn describe_node(node: &PlanNode) -> String {
    let mut text = node.operation.clone();
    if let Some(cost) = node.cost {
        let _ = write!(text, "  [cost {:.2}..{:.2}]", cost.start, cost.end);
    }
    if let Some(time) = node.time {
        let _ = write!(text, "  [time {:.3}..{:.3} ms]", time.start, time.end);
    }
    if node.never_executed {
        text.push_str("  (never executed)");
    }
    if let Some(rows) = node.rows {
        let _ = write!(text, "  rows={}", rows);
    }
    if let Some(loops) = node.loops {
        let _ = write!(text, "  loops={}", loops);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::plan_analyzer::PlanAnalyzer;

    #[test]
    fn test_tree_is_indented_by_depth() {
        let report = PlanAnalyzer::new().analyze_text(
            "Limit  (cost=0.00..1.00 rows=1 width=4)\n  ->  Seq Scan on orders  (cost=0.00..85.00 rows=5000 width=8)",
        );
        let text = format_report_text(&report);
        assert!(text.contains("\nLimit  [cost 0.00..1.00]  rows=1\n"));
        assert!(text.contains("\n  Seq Scan on orders  [cost 0.00..85.00]  rows=5000\n"));
        assert!(text.contains("[warning] P001 Sequential Scan Detected @ Seq Scan on orders"));
        assert!(text.contains("      CREATE INDEX idx_orders_<column> ON orders (<column>);"));
    }

    #[test]
    fn test_empty_report() {
        let text = format_report_text(&PlanReport::empty());
        assert_eq!(text, "No plan operators were recognized.\n");
    }
}
