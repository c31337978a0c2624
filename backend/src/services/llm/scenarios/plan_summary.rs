//! Plan Summary Scenario - LLM summary of a PostgreSQL execution plan

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::services::llm::{LLMAnalysisRequestTrait, LLMScenario};
use crate::services::plan_analyzer::PlanReport;

const PROMPT: &str = include_str!("plan_summary_prompt.md");

/// Placeholder for absent metadata in the prompt
const NOT_AVAILABLE: &str = "N/A";

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanSummaryReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<f64>,
    #[serde(default)]
    pub raw_lines: Vec<String>,
}

impl PlanSummaryReq {
    /// Take the plan text and execution time from an analyzed report
    pub fn from_report(
        report: &PlanReport,
        query: Option<String>,
        database: Option<String>,
        status: Option<String>,
    ) -> Self {
        Self {
            query,
            database,
            status,
            execution_time_ms: report.execution_time_ms,
            raw_lines: report.raw_lines.clone(),
        }
    }
}

/// Render the plain-text prompt body.
///
/// The layout is fixed so the same input always renders the same bytes:
/// four metadata lines, a blank line, then the raw plan lines.
pub fn format_plan_prompt(req: &PlanSummaryReq) -> String {
    let execution_time = req
        .execution_time_ms
        .map(|ms| format!("{} ms", ms))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    format!(
        "Query: {}\nDatabase: {}\nStatus: {}\nExecution Time: {}\n\n{}",
        req.query.as_deref().unwrap_or(NOT_AVAILABLE),
        req.database.as_deref().unwrap_or(NOT_AVAILABLE),
        req.status.as_deref().unwrap_or(NOT_AVAILABLE),
        execution_time,
        req.raw_lines.join("\n")
    )
}

impl LLMAnalysisRequestTrait for PlanSummaryReq {
    fn scenario(&self) -> LLMScenario {
        LLMScenario::PlanSummary
    }

    fn system_prompt(&self) -> String {
        PROMPT.into()
    }

    fn user_prompt(&self) -> String {
        format_plan_prompt(self)
    }

    fn cache_key(&self) -> String {
        format!("plansum:{}:{}", self.sql_hash(), self.profile_hash())
    }

    fn sql_hash(&self) -> String {
        let mut h = DefaultHasher::new();
        self.query
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .hash(&mut h);
        format!("{:x}", h.finish())
    }

    fn profile_hash(&self) -> String {
        let mut h = DefaultHasher::new();
        self.raw_lines.hash(&mut h);
        format!("{:x}", h.finish())
    }
}
