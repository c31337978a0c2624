//! LLM Service Module
//!
//! Request contracts for the external summarization service.
//! Only prompt construction lives here; sending the prompt is the caller's
//! concern.
//!
//! # Supported Scenarios
//! - Plan Summary (EXPLAIN ANALYZE output)

pub mod scenarios;

use serde::{Deserialize, Serialize};

pub use scenarios::plan_summary::{PlanSummaryReq, format_plan_prompt};

/// Analysis scenario, used for routing and cache namespacing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LLMScenario {
    PlanSummary,
}

/// A request that can be turned into an LLM call
pub trait LLMAnalysisRequestTrait {
    fn scenario(&self) -> LLMScenario;
    fn system_prompt(&self) -> String;
    fn user_prompt(&self) -> String;
    /// Stable key for caching responses to identical requests
    fn cache_key(&self) -> String;
    fn sql_hash(&self) -> String;
    fn profile_hash(&self) -> String;
}

/// Everything a provider client needs to send one request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LLMPromptEnvelope {
    pub scenario: LLMScenario,
    pub cache_key: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

impl LLMPromptEnvelope {
    pub fn from_request(req: &dyn LLMAnalysisRequestTrait) -> Self {
        Self {
            scenario: req.scenario(),
            cache_key: req.cache_key(),
            system_prompt: req.system_prompt(),
            user_prompt: req.user_prompt(),
        }
    }
}
