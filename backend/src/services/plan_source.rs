//! Plan retrieval
//!
//! The plan text comes from a log/plan store addressed by a
//! (node, database, query) triple. Retrieval failures never reach the
//! analyzer as errors: they are logged and produce an empty report.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::services::plan_analyzer::{PlanAnalyzer, PlanReport};

/// Address of one captured plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub node: String,
    pub database: String,
    pub query_id: String,
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Invalid plan request: {0}")]
    InvalidRequest(String),

    #[error("Failed to read plan: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode plan: {0}")]
    Json(#[from] serde_json::Error),
}

/// Supplier of raw plan payloads
pub trait PlanSource: Send + Sync {
    /// Fetch the payload for a request; `Ok(None)` when nothing was captured
    fn fetch(&self, request: &PlanRequest) -> Result<Option<Value>, SourceError>;
}

/// Directory-backed plan store: `<root>/<query_id>`
///
/// Files ending in `.json` are decoded as JSON (a fragment map or a JSON
/// plan); anything else is taken as plan text.
pub struct FilePlanSource {
    root: PathBuf,
}

impl FilePlanSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Source and request for a single plan file
    pub fn for_file(path: &Path) -> Result<(Self, PlanRequest), SourceError> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| SourceError::InvalidRequest(format!("not a file: {}", path.display())))?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let request = PlanRequest {
            node: "local".to_string(),
            database: String::new(),
            query_id: file_name.to_string(),
        };
        Ok((Self::new(root), request))
    }

    fn resolve(&self, request: &PlanRequest) -> Result<PathBuf, SourceError> {
        let id = request.query_id.as_str();
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(SourceError::InvalidRequest(format!("bad query id '{}'", id)));
        }
        Ok(self.root.join(id))
    }
}

impl PlanSource for FilePlanSource {
    fn fetch(&self, request: &PlanRequest) -> Result<Option<Value>, SourceError> {
        let path = self.resolve(request)?;
        if !path.is_file() {
            return Ok(None);
        }

        let text = fs::read_to_string(&path)?;
        tracing::debug!("Read plan {} ({} bytes)", path.display(), text.len());

        let is_json = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(Some(serde_json::from_str(&text)?))
        } else {
            Ok(Some(Value::String(text)))
        }
    }
}

/// Fetch a plan and analyze it; every retrieval problem yields an empty report
pub fn analyze_from_source(
    source: &dyn PlanSource,
    request: &PlanRequest,
    analyzer: &PlanAnalyzer,
) -> PlanReport {
    let payload = match source.fetch(request) {
        Ok(Some(payload)) => payload,
        Ok(None) => {
            tracing::info!(
                "No plan captured for query {} on {}/{}",
                request.query_id,
                request.node,
                request.database
            );
            return PlanReport::empty();
        }
        Err(e) => {
            tracing::warn!("Plan retrieval failed for query {}: {}", request.query_id, e);
            return PlanReport::empty();
        }
    };

    match analyzer.analyze(Some(&payload)) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!("Unusable plan payload for query {}: {}", request.query_id, e);
            PlanReport::empty()
        }
    }
}
