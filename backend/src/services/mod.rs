pub mod llm;
pub mod plan_analyzer;
pub mod plan_source;

pub use plan_analyzer::{PlanAnalyzer, PlanReport};
pub use plan_source::{FilePlanSource, PlanRequest, PlanSource, SourceError, analyze_from_source};
