//! Web integration for the guardrail pipeline
//!
//! Provides an axum middleware that screens request bodies through a shared
//! [`GuardrailPipeline`](shelter_guardrails::GuardrailPipeline) before they
//! reach the handler, plus the HTTP error types it responds with.

pub mod error;
pub mod middleware;

pub use error::{FindingSummary, GuardrailErrorBody, GuardrailErrorResponse};
pub use middleware::{guardrail_middleware, GuardrailState};
