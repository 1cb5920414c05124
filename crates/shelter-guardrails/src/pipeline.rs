//! Guardrail pipeline: ordered (validator, action) stages over a text buffer
//!
//! Stages execute in insertion order. The action configured on a stage
//! overrides the validator's own recommendation when the result is invalid:
//! Block short-circuits the run, Redact adopts the stage's mutated text,
//! Warn and Passthrough record findings only.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use shelter_types::{Action, GuardResult, PipelineResult, ValidationResult};

/// Capability interface for pipeline stages
///
/// Any component with a stable name and a `validate` operation can be
/// registered as a stage; the pipeline depends only on this trait.
/// Implementations must hold no per-call mutable state: a validator is
/// constructed once (compiling its pattern catalog) and may then be invoked
/// concurrently from any number of threads.
///
/// Built-in validators never return `Err`; the `Result` exists so custom
/// validators can signal execution faults, which abort the pipeline run.
pub trait Validator: Send + Sync {
    /// Stable identifier, used as `Finding::validator`
    fn name(&self) -> &str;

    /// Scan a complete text buffer and report the outcome
    fn validate(&self, text: &str) -> GuardResult<ValidationResult>;
}

/// A single (validator, action) binding
#[derive(Clone)]
pub struct PipelineStage {
    pub validator: Arc<dyn Validator>,
    pub action: Action,
}

/// Chain of validators executed in insertion order
///
/// The pipeline holds only immutable stage state behind `Arc`s, so a single
/// instance can serve concurrent callers without synchronization.
#[derive(Clone, Default)]
pub struct GuardrailPipeline {
    stages: Vec<PipelineStage>,
}

impl GuardrailPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a validator stage. Returns self for chaining.
    pub fn add(mut self, validator: impl Validator + 'static, action: Action) -> Self {
        self.stages.push(PipelineStage {
            validator: Arc::new(validator),
            action,
        });
        self
    }

    /// Append an already-shared validator stage.
    pub fn add_shared(mut self, validator: Arc<dyn Validator>, action: Action) -> Self {
        self.stages.push(PipelineStage { validator, action });
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run text through all stages in order.
    ///
    /// A validator error aborts the run immediately and propagates; no
    /// partial result is returned for a faulted run.
    pub fn run(&self, text: &str) -> GuardResult<PipelineResult> {
        let start = Instant::now();
        let original = text.to_string();
        let mut current = text.to_string();
        let mut findings = Vec::new();
        let mut action_taken = Action::Passthrough;

        for stage in &self.stages {
            let result = stage.validator.validate(&current)?;

            if result.is_valid {
                // A validator may attach informational findings even when
                // valid; record them and move on.
                findings.extend(result.findings);
                continue;
            }

            match stage.action {
                Action::Block => {
                    findings.extend(result.findings);
                    debug!(
                        validator = stage.validator.name(),
                        findings = findings.len(),
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "pipeline blocked"
                    );
                    // Redactions from completed stages persist; this stage's
                    // own mutation is discarded.
                    return Ok(PipelineResult {
                        text: current,
                        original_text: original,
                        blocked: true,
                        findings,
                        action_taken: Action::Block,
                    });
                }
                Action::Redact => {
                    current = result.text;
                    findings.extend(result.findings);
                    action_taken = action_taken.stronger(Action::Redact);
                }
                Action::Warn => {
                    findings.extend(result.findings);
                    action_taken = action_taken.stronger(Action::Warn);
                }
                Action::Passthrough => {
                    findings.extend(result.findings);
                }
            }
        }

        debug!(
            stages = self.stages.len(),
            findings = findings.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "pipeline completed"
        );

        Ok(PipelineResult {
            text: current,
            original_text: original,
            blocked: false,
            findings,
            action_taken,
        })
    }
}
