//! Shared types and error types for Shelter guardrails

pub mod errors;
pub mod model;

pub use errors::{GuardError, GuardResult};
pub use model::{Action, Finding, PipelineResult, ValidationResult};
