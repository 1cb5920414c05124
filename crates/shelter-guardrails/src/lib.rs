//! Shelter guardrails: deterministic content inspection for LLM traffic
//!
//! Screens free text flowing into and out of an LLM call for sensitive
//! content (PII), adversarial content (prompt injection), and policy
//! violations (toxicity, length, malformed structured output). All detection
//! is deterministic pattern/heuristic matching compiled once at validator
//! construction; there are no models and no network calls.
//!
//! # Architecture
//!
//! - **Validators**: each implements [`Validator`] and returns a
//!   [`ValidationResult`](shelter_types::ValidationResult) per call
//! - **Pipeline**: ordered (validator, action) stages; a stage's configured
//!   action decides how an invalid result affects the run
//! - **Guards**: higher-order wrappers applying a pipeline to a function's
//!   input or output
//!
//! # Usage
//!
//! ```rust
//! use shelter_guardrails::{GuardrailPipeline, PiiConfig, PiiValidator};
//! use shelter_guardrails::{InjectionConfig, InjectionValidator};
//! use shelter_types::Action;
//!
//! # fn main() -> shelter_types::GuardResult<()> {
//! let pipeline = GuardrailPipeline::new()
//!     .add(
//!         PiiValidator::new(PiiConfig { redact: true, ..Default::default() })?,
//!         Action::Redact,
//!     )
//!     .add(InjectionValidator::new(InjectionConfig::default())?, Action::Block);
//!
//! let result = pipeline.run("my email is test@example.com")?;
//! assert!(!result.blocked);
//! assert!(result.text.contains("[EMAIL_REDACTED]"));
//! # Ok(())
//! # }
//! ```

pub mod guard;
pub mod pipeline;
pub mod validators;

pub use guard::{guard_input, guard_output};
pub use pipeline::{GuardrailPipeline, PipelineStage, Validator};
pub use validators::injection::{InjectionConfig, InjectionValidator};
pub use validators::length::{LengthConfig, LengthValidator};
pub use validators::pii::{PiiCategory, PiiConfig, PiiValidator};
pub use validators::schema::{Schema, SchemaKind, SchemaValidator};
pub use validators::toxicity::{ToxicityConfig, ToxicityValidator};
