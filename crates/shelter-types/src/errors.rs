//! Error types and conversions

use thiserror::Error;

use crate::model::PipelineResult;

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    #[error("Threshold {0} out of range [0.0, 1.0]")]
    Threshold(f64),

    #[error("Invalid schema: {0}")]
    Schema(String),

    #[error("Validator '{name}' failed: {reason}")]
    Validator { name: String, reason: String },

    #[error("Blocked by guardrails: {}", .0.categories().join(", "))]
    Blocked(PipelineResult),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GuardResult<T> = Result<T, GuardError>;

impl From<GuardError> for String {
    fn from(err: GuardError) -> String {
        err.to_string()
    }
}
