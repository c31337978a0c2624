//! Metric matcher for plan lines
//!
//! Each extractor is independent and returns `None` when its pattern is
//! absent, so a partially readable line still yields the fields it has.

use crate::services::plan_analyzer::models::{BufferUsage, CostRange, PlanNode, RowCounts, TimeRange};
use once_cell::sync::Lazy;
use regex::Regex;

static COST_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"cost=([0-9]+(?:\.[0-9]+)?)\.\.([0-9]+(?:\.[0-9]+)?)").unwrap()
});
static ACTUAL_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"actual time=([0-9]+(?:\.[0-9]+)?)\.\.([0-9]+(?:\.[0-9]+)?)").unwrap()
});
static FIRST_ROWS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\brows=([0-9]+)").unwrap());
static PLAN_ROWS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bplan_rows=([0-9]+)").unwrap());
static ESTIMATED_ROWS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"cost=[0-9.]+\.\.[0-9.]+\s+rows=([0-9]+)").unwrap()
});
static ACTUAL_ROWS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"actual(?:\s+time=[0-9.]+\.\.[0-9.]+)?\s+rows=([0-9]+)").unwrap()
});
static WIDTH_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bwidth=([0-9]+)").unwrap());
static LOOPS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bloops=([0-9]+)").unwrap());
static OBJECT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\bon\s+((?:"[^"]+"|[\w$]+)(?:\.(?:"[^"]+"|[\w$]+))*)(?:\s+("[^"]+"|[\w$]+))?"#,
    )
    .unwrap()
});
static INDEX_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\busing\s+("[^"]+"|[\w$.]+)"#).unwrap());
static BUFFER_COUNTER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(hit|read|dirtied|written)=([0-9]+)").unwrap());
static WORKERS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Workers (Planned|Launched):\s*([0-9]+)").unwrap());

/// Everything extracted from one operator line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineMetrics {
    pub indent: usize,
    pub cost: Option<CostRange>,
    pub time: Option<TimeRange>,
    pub rows: Option<u64>,
    pub planned_rows: Option<u64>,
    pub row_counts: RowCounts,
    pub width: Option<u64>,
    pub loops: Option<u64>,
    pub object_name: Option<String>,
    pub alias: Option<String>,
    pub index_name: Option<String>,
    pub never_executed: bool,
}

/// Parser for per-line metrics
pub struct MetricsParser;

impl MetricsParser {
    /// Leading whitespace characters before the first non-space character
    pub fn indentation(line: &str) -> usize {
        line.chars().take_while(|c| c.is_whitespace()).count()
    }

    /// Run all extractors over an operator line; `operation` is its text head
    pub fn parse_line(line: &str, operation: &str) -> LineMetrics {
        LineMetrics {
            indent: Self::indentation(line),
            cost: Self::parse_range(&COST_REGEX, line).map(|(start, end)| CostRange { start, end }),
            time: Self::parse_range(&ACTUAL_TIME_REGEX, line)
                .map(|(start, end)| TimeRange { start, end }),
            rows: Self::parse_count(&FIRST_ROWS_REGEX, line),
            planned_rows: Self::parse_count(&PLAN_ROWS_REGEX, line),
            row_counts: RowCounts {
                estimated: Self::parse_count(&ESTIMATED_ROWS_REGEX, line),
                actual: Self::parse_count(&ACTUAL_ROWS_REGEX, line),
            },
            width: Self::parse_count(&WIDTH_REGEX, line),
            loops: Self::parse_count(&LOOPS_REGEX, line),
            object_name: Self::parse_object(operation).map(|(name, _)| name),
            alias: Self::parse_object(operation).and_then(|(_, alias)| alias),
            index_name: INDEX_REGEX
                .captures(operation)
                .and_then(|cap| cap.get(1))
                .map(|m| unquote(m.as_str())),
            never_executed: line.contains("(never executed)"),
        }
    }

    /// Fold a non-operator line into the node it belongs to
    pub fn apply_detail(node: &mut PlanNode, trimmed: &str) {
        if let Some(filter) = trimmed.strip_prefix("Filter:") {
            node.filter = Some(filter.trim().to_string());
        } else if let Some(buffers) = trimmed.strip_prefix("Buffers:") {
            let usage = node.buffers.get_or_insert_with(BufferUsage::default);
            Self::merge_buffers(usage, buffers);
        } else if let Some(cap) = WORKERS_REGEX.captures(trimmed) {
            let count = cap.get(2).and_then(|m| m.as_str().parse().ok());
            match cap.get(1).map(|m| m.as_str()) {
                Some("Launched") => node.workers = count.or(node.workers),
                _ => {
                    if node.workers.is_none() {
                        node.workers = count;
                    }
                }
            }
        }
        node.details.push(trimmed.to_string());
    }

    /// Parse `shared hit=1 read=2, temp read=3 written=4`
    fn merge_buffers(usage: &mut BufferUsage, text: &str) {
        for segment in text.split(',') {
            let segment = segment.trim();
            let scope = segment.split_whitespace().next().unwrap_or("");
            for cap in BUFFER_COUNTER_REGEX.captures_iter(segment) {
                let value: u64 = cap[2].parse().unwrap_or(0);
                let slot = match (scope, &cap[1]) {
                    ("shared", "hit") => &mut usage.shared_hit,
                    ("shared", "read") => &mut usage.shared_read,
                    ("shared", "dirtied") => &mut usage.shared_dirtied,
                    ("shared", "written") => &mut usage.shared_written,
                    ("local", "hit") => &mut usage.local_hit,
                    ("local", "read") => &mut usage.local_read,
                    ("temp", "read") => &mut usage.temp_read,
                    ("temp", "written") => &mut usage.temp_written,
                    _ => continue,
                };
                *slot += value;
            }
        }
    }

    fn parse_range(regex: &Regex, line: &str) -> Option<(f64, f64)> {
        let cap = regex.captures(line)?;
        let start = cap.get(1)?.as_str().parse().ok()?;
        let end = cap.get(2)?.as_str().parse().ok()?;
        Some((start, end))
    }

    fn parse_count(regex: &Regex, line: &str) -> Option<u64> {
        regex
            .captures(line)
            .and_then(|cap| cap.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    fn parse_object(operation: &str) -> Option<(String, Option<String>)> {
        let cap = OBJECT_REGEX.captures(operation)?;
        let name = unquote(cap.get(1)?.as_str());
        let alias = cap.get(2).map(|m| unquote(m.as_str()));
        Some((name, alias))
    }
}

fn unquote(s: &str) -> String {
    s.trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEQ_SCAN: &str = "Seq Scan on orders  (cost=0.00..123.45 rows=1000 width=8) (actual time=0.012..45.678 rows=950 loops=1)";

    #[test]
    fn test_parse_standard_line() {
        let m = MetricsParser::parse_line(SEQ_SCAN, "Seq Scan on orders");
        assert_eq!(m.indent, 0);
        assert_eq!(m.cost, Some(CostRange { start: 0.0, end: 123.45 }));
        assert_eq!(m.time, Some(TimeRange { start: 0.012, end: 45.678 }));
        assert_eq!(m.object_name.as_deref(), Some("orders"));
        assert_eq!(m.loops, Some(1));
        assert_eq!(m.width, Some(8));
    }

    #[test]
    fn test_row_count_captures_are_kept_apart() {
        // The first `rows=` on a standard line is the planner estimate
        let m = MetricsParser::parse_line(SEQ_SCAN, "Seq Scan on orders");
        assert_eq!(m.rows, Some(1000));
        assert_eq!(m.row_counts.estimated, Some(1000));
        assert_eq!(m.row_counts.actual, Some(950));
        assert_eq!(m.planned_rows, None);
    }

    #[test]
    fn test_plan_rows_token() {
        let line = "Seq Scan on t (plan_rows=10 rows=500)";
        let m = MetricsParser::parse_line(line, "Seq Scan on t");
        assert_eq!(m.planned_rows, Some(10));
        assert_eq!(m.rows, Some(500));
    }

    #[test]
    fn test_missing_metrics_stay_absent() {
        let m = MetricsParser::parse_line("  ->  Hash  (never executed)", "Hash");
        assert_eq!(m.indent, 2);
        assert!(m.cost.is_none());
        assert!(m.time.is_none());
        assert!(m.rows.is_none());
        assert!(m.never_executed);
    }

    #[test]
    fn test_index_and_alias() {
        let op = "Index Scan using orders_pkey on public.orders o";
        let m = MetricsParser::parse_line(op, op);
        assert_eq!(m.index_name.as_deref(), Some("orders_pkey"));
        assert_eq!(m.object_name.as_deref(), Some("public.orders"));
        assert_eq!(m.alias.as_deref(), Some("o"));
    }

    #[test]
    fn test_actual_rows_without_timing() {
        let line = "Seq Scan on t  (cost=0.00..1.00 rows=5 width=4) (actual rows=7 loops=2)";
        let m = MetricsParser::parse_line(line, "Seq Scan on t");
        assert_eq!(m.row_counts.actual, Some(7));
        assert!(m.time.is_none());
        assert_eq!(m.loops, Some(2));
    }
}
