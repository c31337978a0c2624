//! Unit tests for the plan analyzer
//!
//! Fixtures live under `tests/fixtures/plans/`: a psql text plan, a fragment
//! map as delivered by the retrieval service, and a `FORMAT JSON` plan.

#[cfg(test)]
mod tests {
    use crate::services::plan_analyzer::models::*;
    use crate::services::plan_analyzer::parser::core::*;
    use crate::services::plan_analyzer::{AnalyzerLimits, InputError, PlanAnalyzer};
    use serde_json::{json, Value};
    use std::fs;
    use std::path::PathBuf;

    /// Get the path to test fixtures
    fn get_fixture_path(filename: &str) -> PathBuf {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("tests/fixtures/plans");
        path.push(filename);
        path
    }

    /// Load a plan fixture file
    fn load_plan(filename: &str) -> String {
        let path = get_fixture_path(filename);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", path.display(), e))
    }

    fn load_json(filename: &str) -> Value {
        serde_json::from_str(&load_plan(filename)).expect("fixture is valid JSON")
    }

    /// Fragment map with one line per `QUERY_PLAN_<n>` key
    fn fragments(lines: &[&str]) -> Value {
        let map: serde_json::Map<String, Value> = lines
            .iter()
            .enumerate()
            .map(|(i, line)| (format!("QUERY_PLAN_{}", i + 1), Value::String(line.to_string())))
            .collect();
        Value::Object(map)
    }

    fn analyze(value: &Value) -> PlanReport {
        PlanAnalyzer::new().analyze(Some(value)).expect("valid input")
    }

    // ========================================================================
    // Tree Shape Tests
    // ========================================================================

    mod tree_tests {
        use super::*;

        #[test]
        fn test_indentation_chain() {
            let report = analyze(&fragments(&[
                "Limit  (cost=0.00..1.00 rows=1 width=4)",
                "  Sort  (cost=0.00..1.00 rows=1 width=4)",
                "    Seq Scan on t  (cost=0.00..1.00 rows=1 width=4)",
            ]));
            let parents: Vec<i32> = report.nodes.iter().map(|n| n.parent_id).collect();
            assert_eq!(parents, vec![ROOT_PARENT_ID, 0, 1]);
            assert_eq!(report.nodes.iter().map(|n| n.depth).max(), Some(2));

            let tree = PlanTree::new(&report.nodes);
            assert_eq!(tree.roots().count(), 1);
            assert_eq!(tree.leaves(), vec![2]);
        }

        #[test]
        fn test_sibling_reset() {
            let report = analyze(&fragments(&[
                "Hash Join  (cost=1.00..2.00 rows=1 width=4)",
                "  Seq Scan on a  (cost=0.00..1.00 rows=1 width=4)",
                "  Hash  (cost=0.00..1.00 rows=1 width=4)",
                "    Seq Scan on b  (cost=0.00..1.00 rows=1 width=4)",
            ]));
            assert_eq!(report.nodes[3].parent_id, 2);
            assert_eq!(report.nodes[1].parent_id, 0);
            assert_eq!(report.nodes[2].parent_id, 0);
        }

        #[test]
        fn test_parents_precede_children() {
            for report in [
                PlanAnalyzer::new().analyze_text(&load_plan("orders_hash_join.txt")),
                analyze(&load_json("users_nested_loop_fragments.json")),
            ] {
                let tree = PlanTree::new(&report.nodes);
                assert!(tree.validate().is_ok());
                for node in &report.nodes {
                    assert!(node.is_root() || node.parent_id < node.id);
                    assert_eq!(tree.get(node.id), Some(node));
                }
            }
        }

        #[test]
        fn test_unrecognized_lines_never_create_nodes() {
            let report = analyze(&fragments(&[
                "Seq Scan on t  (cost=0.00..1.00 rows=1 width=4)",
                "  Filter: (a > 1)",
                "  JIT:",
                "    Functions: 2",
                "garbage line",
            ]));
            assert_eq!(report.nodes.len(), 1);
            assert_eq!(report.nodes[0].details.len(), 4);
        }
    }

    // ========================================================================
    // Fixture Tests
    // ========================================================================

    mod fixture_tests {
        use super::*;

        #[test]
        fn test_text_plan_fixture() {
            let report = PlanAnalyzer::new().analyze_text(&load_plan("orders_hash_join.txt"));
            assert_eq!(report.format, PlanFormat::Text);
            assert_eq!(report.raw_lines.len(), 17);
            assert_eq!(report.execution_time_ms, Some(153.201));
            assert_eq!(report.planning_time_ms, Some(0.412));

            let ops: Vec<OperatorKind> = report.nodes.iter().map(|n| n.operator).collect();
            assert_eq!(
                ops,
                vec![
                    OperatorKind::HashJoin,
                    OperatorKind::SeqScan,
                    OperatorKind::Hash,
                    OperatorKind::IndexScan
                ]
            );
            let parents: Vec<i32> = report.nodes.iter().map(|n| n.parent_id).collect();
            assert_eq!(parents, vec![ROOT_PARENT_ID, 0, 0, 2]);

            let scan = &report.nodes[1];
            assert_eq!(scan.object_name.as_deref(), Some("orders"));
            assert_eq!(scan.alias.as_deref(), Some("o"));
            assert_eq!(scan.filter.as_deref(), Some("(status = 'shipped'::text)"));
            assert_eq!(scan.row_counts, RowCounts { estimated: Some(50000), actual: Some(48210) });
            assert_eq!(report.nodes[3].index_name.as_deref(), Some("customers_pkey"));
            assert_eq!(report.nodes[0].buffers.map(|b| b.blocks_read()), Some(480));
        }

        #[test]
        fn test_text_plan_analysis() {
            let report = PlanAnalyzer::new().analyze_text(&load_plan("orders_hash_join.txt"));

            assert_eq!(report.totals.total_time_ms, 153.201);
            assert!((report.totals.node_time_sum_ms - 276.645).abs() < 1e-9);
            assert_eq!(report.totals.slowest_node_id, Some(0));
            assert_eq!(report.totals.largest_node_id, Some(1));
            assert_eq!(report.totals.costliest_node_id, Some(0));

            let timed: Vec<i32> = report.timing_breakdown.iter().map(|t| t.node_id).collect();
            assert_eq!(timed, vec![0, 1, 2]);

            let rules: Vec<&str> = report.issues.iter().map(|i| i.rule_id.as_str()).collect();
            assert_eq!(rules, vec!["P002", "P005", "P001", "P002", "P005"]);
            assert_eq!(report.recommendations.len(), 1);
            assert_eq!(
                report.recommendations[0].suggested_sql.as_deref(),
                Some("CREATE INDEX idx_orders_status ON orders (status);")
            );
            assert_eq!(report.performance_score, 30.0);

            let high_cost: Vec<bool> = report.insights.iter().map(|i| i.high_cost).collect();
            assert_eq!(high_cost, vec![true, true, false, false]);
            assert_eq!(report.insights[0].timing_severity, TimingSeverity::Medium);
            assert_eq!(report.insights[3].timing_severity, TimingSeverity::Minimal);
        }

        #[test]
        fn test_fragment_map_fixture() {
            let report = analyze(&load_json("users_nested_loop_fragments.json"));
            assert_eq!(report.nodes.len(), 6);
            assert_eq!(report.nodes[0].operator, OperatorKind::Limit);
            let parents: Vec<i32> = report.nodes.iter().map(|n| n.parent_id).collect();
            assert_eq!(parents, vec![ROOT_PARENT_ID, 0, 1, 1, 3, 3]);
            assert_eq!(report.execution_time_ms, Some(1451.004));

            let rules: Vec<&str> = report.issues.iter().map(|i| i.rule_id.as_str()).collect();
            assert_eq!(
                rules,
                vec!["P002", "P005", "P002", "P005", "P001", "P002", "P005", "P004"]
            );
            assert_eq!(report.issues[7].node_id, Some(3));

            let recs: Vec<&str> = report.recommendations.iter().map(|r| r.rule_id.as_str()).collect();
            assert_eq!(recs, vec!["P001", "P004", "Q001"]);
            assert_eq!(
                report.recommendations[0].suggested_sql.as_deref(),
                Some("CREATE INDEX idx_users_email ON users (email);")
            );
            assert_eq!(report.performance_score, 0.0);
        }

        #[test]
        fn test_json_plan_is_opaque() {
            let report = analyze(&load_json("orders_plan.json"));
            assert_eq!(report.format, PlanFormat::Json);
            assert!(report.nodes.is_empty());
            assert!(!report.has_visualization());
            assert!(report.issues.is_empty());
            assert!(report.raw_lines.iter().any(|l| l.contains("\"Node Type\": \"Seq Scan\"")));

            let as_text = Value::String(load_plan("orders_plan.json"));
            assert_eq!(analyze(&as_text).format, PlanFormat::Json);
        }
    }

    // ========================================================================
    // Analysis Property Tests
    // ========================================================================

    mod analysis_tests {
        use super::*;

        #[test]
        fn test_end_to_end_example() {
            let report = analyze(&fragments(&[
                "Seq Scan on orders  (cost=0.00..123.45 rows=1000 width=8) (actual time=0.012..45.678 rows=950 loops=1)",
                "Execution Time: 45.678 ms",
            ]));

            assert_eq!(report.nodes.len(), 1);
            let node = &report.nodes[0];
            assert_eq!(node.object_name.as_deref(), Some("orders"));
            assert_eq!(node.cost, Some(CostRange { start: 0.0, end: 123.45 }));
            assert_eq!(node.time, Some(TimeRange { start: 0.012, end: 45.678 }));
            assert_eq!(node.rows, Some(1000));
            assert_eq!(node.row_counts.actual, Some(950));
            assert_eq!(report.totals.total_time_ms, 45.678);

            assert_eq!(report.timing_breakdown.len(), 1);
            assert_eq!(report.timing_breakdown[0].percentage, 100.0);

            // rows=1000 does not exceed the strict > 1000 scan threshold
            assert!(report.issues.iter().all(|i| i.rule_id != "P001"));
        }

        #[test]
        fn test_seq_scan_rule_firing() {
            let report = analyze(&fragments(&["Seq Scan on orders  (cost=0.00..85.00 rows=5000 width=8)"]));
            assert_eq!(report.issues.len(), 1);
            let issue = &report.issues[0];
            assert_eq!(issue.title, "Sequential Scan Detected");
            assert_eq!(issue.severity, IssueSeverity::Warning);
            assert_eq!(issue.impacted_operation, "Seq Scan on orders");

            assert_eq!(report.recommendations.len(), 1);
            let sql = report.recommendations[0].suggested_sql.as_deref().unwrap();
            assert!(sql.starts_with("CREATE INDEX"));
            assert!(sql.contains("orders"));
        }

        #[test]
        fn test_timing_filter() {
            let report = analyze(&fragments(&[
                "Gather  (cost=0.00..10.00 rows=1 width=4) (actual time=0.01..3000.0 rows=1 loops=1)",
                "  ->  Seq Scan on a  (cost=0.00..1.00 rows=1 width=4) (actual time=0.01..0.05 rows=1 loops=1)",
                "  ->  Seq Scan on b  (cost=0.00..1.00 rows=1 width=4) (actual time=0.01..15.0 rows=1 loops=1)",
                "Execution Time: 3000.0 ms",
            ]));
            let timed: Vec<i32> = report.timing_breakdown.iter().map(|t| t.node_id).collect();
            assert_eq!(timed, vec![0, 2]);
            assert!((report.timing_breakdown[1].percentage - 0.5).abs() < 1e-9);
        }

        #[test]
        fn test_idempotent() {
            let input = load_json("users_nested_loop_fragments.json");
            let analyzer = PlanAnalyzer::new();
            let first = analyzer.analyze(Some(&input)).unwrap();
            let second = analyzer.analyze(Some(&input)).unwrap();
            assert_eq!(first, second);
        }

        #[test]
        fn test_report_serializes_camel_case() {
            let report = analyze(&fragments(&["Seq Scan on orders  (cost=0.00..85.00 rows=5000 width=8)"]));
            let value = serde_json::to_value(&report).unwrap();
            assert_eq!(value["nodes"][0]["parentId"], json!(-1));
            assert_eq!(value["nodes"][0]["objectName"], json!("orders"));
            assert_eq!(value["issues"][0]["severity"], json!("warning"));
            assert!(value["totals"].get("totalTimeMs").is_some());
            assert!(value.get("timingBreakdown").is_some());
        }
    }

    // ========================================================================
    // Edge Case Tests
    // ========================================================================

    mod edge_case_tests {
        use super::*;

        #[test]
        fn test_empty_fragment_map() {
            let report = analyze(&json!({}));
            assert!(report.nodes.is_empty());
            assert!(report.issues.is_empty());
            assert!(report.timing_breakdown.is_empty());
            assert_eq!(report.totals.total_time_ms, 0.0);
            assert!(!report.has_visualization());
        }

        #[test]
        fn test_planning_buffers_stay_out_of_nodes() {
            let report = analyze(&fragments(&[
                "Seq Scan on orders  (cost=0.00..35.50 rows=2550 width=8) (actual time=0.010..0.412 rows=2550 loops=1)",
                "  Buffers: shared hit=3",
                "Planning:",
                "  Buffers: shared hit=97 read=12",
                "Planning Time: 0.350 ms",
                "JIT:",
                "  Functions: 2",
                "Execution Time: 0.601 ms",
            ]));
            assert_eq!(report.nodes.len(), 1);
            let node = &report.nodes[0];
            let buffers = node.buffers.expect("node buffers");
            assert_eq!(buffers.shared_hit, 3);
            assert_eq!(buffers.shared_read, 0);
            assert_eq!(node.details, vec!["Buffers: shared hit=3".to_string()]);
            assert_eq!(report.planning_time_ms, Some(0.35));
            assert_eq!(report.raw_lines.len(), 8);
        }

        #[test]
        fn test_missing_metrics_stay_absent() {
            let report = analyze(&fragments(&["Seq Scan on t  (cost=abc rows=? width=4)"]));
            assert_eq!(report.nodes.len(), 1);
            assert!(report.nodes[0].cost.is_none());
            assert!(report.nodes[0].time.is_none());
            assert!(report.nodes[0].rows.is_none());
            assert_eq!(report.totals.slowest_node_id, None);
        }

        #[test]
        fn test_invalid_input_is_distinct() {
            let analyzer = PlanAnalyzer::new();
            assert_eq!(analyzer.analyze(None), Err(InputError::Missing));
            assert_eq!(
                analyzer.analyze(Some(&json!(true))),
                Err(InputError::UnexpectedType("boolean"))
            );
        }

        #[test]
        fn test_line_limit_fails_closed() {
            let analyzer = PlanAnalyzer::with_limits(AnalyzerLimits { max_lines: 2, max_depth: 8 });
            let report = analyzer.analyze_text("Limit\n  ->  Sort\n    ->  Seq Scan on t");
            assert_eq!(report, PlanReport::empty());
        }

        #[test]
        fn test_depth_limit_fails_closed() {
            let lines: Vec<String> = (0..10)
                .map(|depth| format!("{}->  Sort  (cost=0.00..1.00 rows=1 width=4)", " ".repeat(depth * 2)))
                .collect();
            let analyzer = PlanAnalyzer::with_limits(AnalyzerLimits { max_lines: 100, max_depth: 4 });
            let report = analyzer.analyze_text(&lines.join("\n"));
            assert!(report.nodes.is_empty());
            assert!(report.issues.is_empty());
        }

        #[test]
        fn test_never_executed_branch() {
            let report = analyze(&fragments(&[
                "Nested Loop  (cost=0.00..10.00 rows=1 width=4) (actual time=0.01..0.02 rows=0 loops=1)",
                "  ->  Seq Scan on a  (cost=0.00..1.00 rows=0 width=4) (actual time=0.01..0.01 rows=0 loops=1)",
                "  ->  Index Scan using b_pkey on b  (cost=0.00..1.00 rows=1 width=4) (never executed)",
            ]));
            assert!(report.nodes[2].never_executed);
            assert!(report.nodes[2].time.is_none());
            assert_eq!(report.nodes[2].parent_id, 0);
        }
    }
}
