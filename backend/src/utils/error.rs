use thiserror::Error;

use crate::services::plan_analyzer::InputError;
use crate::services::plan_source::SourceError;

/// Application error for the command-line surface
///
/// Library layers return their own error types; this enum gathers them
/// at the boundary where they are reported to the user.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Plan not found: {0}")]
    PlanNotFound(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid log level '{level}': {message}")]
    InvalidLogLevel { level: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic wrapper for other errors - auto-convert from anyhow::Error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Helper to create plan not found error
    pub fn plan_not_found(location: impl Into<String>) -> Self {
        Self::PlanNotFound(location.into())
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::PlanNotFound(_) | Self::Input(_) => 2,
            Self::InvalidLogLevel { .. } => 3,
            _ => 1,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
