//! LLM Analysis Scenarios
//!
//! Each scenario implements LLMAnalysisRequestTrait.

pub mod plan_summary;
