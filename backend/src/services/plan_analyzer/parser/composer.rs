//! Plan composer
//!
//! Drives line extraction and tree building for a classified payload.

use crate::services::plan_analyzer::models::{PlanFormat, PlanNode};
use crate::services::plan_analyzer::parser::core::{ExtractedLines, LineExtractor, TreeBuilder};
use crate::services::plan_analyzer::parser::error::{ParseError, ParseResult};
use crate::services::plan_analyzer::parser::payload::PlanPayload;

/// Default cap on plan lines
pub const DEFAULT_MAX_LINES: usize = 10_000;
/// Default cap on nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// Input size bounds; exceeding either fails closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerLimits {
    pub max_lines: usize,
    pub max_depth: usize,
}

impl Default for AnalyzerLimits {
    fn default() -> Self {
        Self { max_lines: DEFAULT_MAX_LINES, max_depth: DEFAULT_MAX_DEPTH }
    }
}

/// Output of the parsing stage
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedPlan {
    pub format: PlanFormat,
    pub nodes: Vec<PlanNode>,
    pub lines: ExtractedLines,
}

/// Composer for parsed plans
pub struct PlanComposer {
    limits: AnalyzerLimits,
}

impl PlanComposer {
    pub fn new() -> Self {
        Self::with_limits(AnalyzerLimits::default())
    }

    pub fn with_limits(limits: AnalyzerLimits) -> Self {
        Self { limits }
    }

    /// Parse a classified payload
    pub fn parse(&self, payload: &PlanPayload<'_>) -> ParseResult<ParsedPlan> {
        let lines = match payload {
            PlanPayload::Fragments(map) => LineExtractor::from_fragment_map(map),
            PlanPayload::Text(text) => LineExtractor::from_text(text),
            PlanPayload::Json(text) => {
                return Ok(ParsedPlan {
                    format: PlanFormat::Json,
                    nodes: Vec::new(),
                    lines: ExtractedLines {
                        raw_lines: text.lines().map(str::to_string).collect(),
                        ..Default::default()
                    },
                });
            }
        };

        if lines.raw_lines.len() > self.limits.max_lines {
            return Err(ParseError::TooManyLines {
                lines: lines.raw_lines.len(),
                limit: self.limits.max_lines,
            });
        }

        let nodes = TreeBuilder::new(self.limits.max_depth).build(&lines.plan_lines)?;
        tracing::debug!(
            "Parsed {} plan nodes from {} lines",
            nodes.len(),
            lines.plan_lines.len()
        );

        Ok(ParsedPlan { format: PlanFormat::Text, nodes, lines })
    }
}

impl Default for PlanComposer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_payload_builds_no_tree() {
        let payload = PlanPayload::Json("[\n  {}\n]".to_string());
        let parsed = PlanComposer::new().parse(&payload).unwrap();
        assert_eq!(parsed.format, PlanFormat::Json);
        assert!(parsed.nodes.is_empty());
        assert_eq!(parsed.lines.raw_lines.len(), 3);
    }

    #[test]
    fn test_line_limit() {
        let text = "Result\nResult\nResult";
        let composer = PlanComposer::with_limits(AnalyzerLimits { max_lines: 2, max_depth: 8 });
        let result = composer.parse(&PlanPayload::Text(text));
        assert_eq!(result, Err(ParseError::TooManyLines { lines: 3, limit: 2 }));
    }
}
