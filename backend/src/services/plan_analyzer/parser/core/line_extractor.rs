//! Line extractor for EXPLAIN output
//!
//! Turns the transport-level fragment map (`QUERY_PLAN_1`, `QUERY_PLAN_2`, ...)
//! into an ordered sequence of plan lines and captures the footer timings.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static EXECUTION_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:Execution Time|Total runtime):\s*([0-9]+(?:\.[0-9]+)?)\s*ms").unwrap()
});
static PLANNING_TIME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Planning Time:\s*([0-9]+(?:\.[0-9]+)?)\s*ms").unwrap());
static ROW_COUNT_FOOTER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\(\d+ rows?\)$").unwrap());

const FOOTER_LABELS: &[&str] = &["Planning Time:", "Execution Time:", "Total runtime:"];

/// Footer blocks whose more-indented lines belong to the block, not a node
const FOOTER_SECTIONS: &[&str] = &["Planning:", "JIT:", "Triggers:"];

/// `Trigger fk_orders: time=1.234 calls=10`
static TRIGGER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Trigger\s.*\bcalls=\d+").unwrap());

/// Lines recovered from a plan payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedLines {
    /// Every non-blank line in order, right-trimmed
    pub raw_lines: Vec<String>,
    /// Lines eligible for node construction, indentation preserved
    pub plan_lines: Vec<String>,
    pub execution_time_ms: Option<f64>,
    pub planning_time_ms: Option<f64>,
}

/// Extractor for plan lines
pub struct LineExtractor;

impl LineExtractor {
    /// Order a fragment map by the numeric suffix of its keys.
    ///
    /// Keys without a numeric suffix and non-string values are skipped.
    pub fn order_fragments(map: &Map<String, Value>) -> Vec<&str> {
        let mut numbered: Vec<(u64, &str)> = Vec::with_capacity(map.len());

        for (key, value) in map {
            let Some(index) = Self::fragment_index(key) else {
                tracing::debug!("Skipping plan fragment with unnumbered key '{}'", key);
                continue;
            };
            let Some(text) = value.as_str() else {
                tracing::debug!("Skipping non-text plan fragment '{}'", key);
                continue;
            };
            numbered.push((index, text));
        }

        numbered.sort_by_key(|(index, _)| *index);
        numbered.into_iter().map(|(_, text)| text).collect()
    }

    /// Numeric suffix of a fragment key (`QUERY_PLAN_12` -> 12)
    pub fn fragment_index(key: &str) -> Option<u64> {
        let digits = key.len() - key.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 {
            return None;
        }
        key[key.len() - digits..].parse().ok()
    }

    /// Extract lines from a fragment map
    pub fn from_fragment_map(map: &Map<String, Value>) -> ExtractedLines {
        Self::extract(Self::order_fragments(map))
    }

    /// Extract lines from plain plan text
    pub fn from_text(text: &str) -> ExtractedLines {
        Self::extract(std::iter::once(text))
    }

    /// Classify every line of the ordered fragments
    pub fn extract<'a, I>(fragments: I) -> ExtractedLines
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut extracted = ExtractedLines::default();
        // Indentation of the open footer section, if any
        let mut section_indent: Option<usize> = None;

        for line in fragments.into_iter().flat_map(str::lines) {
            let line = line.trim_end();
            let trimmed = line.trim_start();
            if trimmed.is_empty() {
                continue;
            }
            extracted.raw_lines.push(line.to_string());

            let indent = line.len() - trimmed.len();
            if section_indent.is_some_and(|level| indent > level) {
                continue;
            }
            section_indent = None;
            if FOOTER_SECTIONS.contains(&trimmed) || TRIGGER_REGEX.is_match(trimmed) {
                section_indent = Some(indent);
                continue;
            }

            if let Some(ms) = Self::capture(&EXECUTION_TIME_REGEX, trimmed) {
                extracted.execution_time_ms = Some(ms);
            }
            if let Some(ms) = Self::capture(&PLANNING_TIME_REGEX, trimmed) {
                extracted.planning_time_ms = Some(ms);
            }

            if Self::is_excluded(trimmed) {
                continue;
            }
            extracted.plan_lines.push(line.to_string());
        }

        extracted
    }

    /// Separators, psql header/footer and timing footers never become nodes
    fn is_excluded(trimmed: &str) -> bool {
        Self::is_separator(trimmed)
            || trimmed == "QUERY PLAN"
            || ROW_COUNT_FOOTER_REGEX.is_match(trimmed)
            || FOOTER_LABELS.iter().any(|label| trimmed.contains(label))
    }

    fn is_separator(trimmed: &str) -> bool {
        trimmed.chars().all(|c| matches!(c, '-' | '=' | '+'))
    }

    fn capture(regex: &Regex, trimmed: &str) -> Option<f64> {
        regex
            .captures(trimmed)
            .and_then(|cap| cap.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}
