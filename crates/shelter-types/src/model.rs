//! Data model for validator and pipeline outcomes
//!
//! All of these are value objects: created fresh per call, never mutated
//! after construction, never shared across calls. Only validators hold
//! long-lived state, and that state is immutable after construction.

use serde::{Deserialize, Serialize};

/// Action applied when a validator reports an invalid result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Block,
    Redact,
    Warn,
    Passthrough,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Block => write!(f, "block"),
            Self::Redact => write!(f, "redact"),
            Self::Warn => write!(f, "warn"),
            Self::Passthrough => write!(f, "passthrough"),
        }
    }
}

impl Action {
    /// Strength ordering used to pick the dominant action of a pipeline run
    /// (Block > Redact > Warn > Passthrough).
    fn strength(self) -> u8 {
        match self {
            Self::Block => 3,
            Self::Redact => 2,
            Self::Warn => 1,
            Self::Passthrough => 0,
        }
    }

    /// The stronger of two actions.
    pub fn stronger(self, other: Action) -> Action {
        if other.strength() > self.strength() {
            other
        } else {
            self
        }
    }
}

/// A single detected issue
///
/// `category` strings are stable identifiers ("email", "instruction_override",
/// "profanity", ...) consumed by tests and downstream policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Finding {
    /// Identifier of the producing validator
    pub validator: String,
    /// Stable category tag
    pub category: String,
    /// Human-readable explanation (never contains full matched PII)
    pub description: String,
    /// Confidence/importance in [0.0, 1.0]
    pub severity: f64,
    /// Byte span of the match in the scanned text, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<(usize, usize)>,
    /// Placeholder the match was (or would be) replaced with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redacted_value: Option<String>,
}

impl Finding {
    pub fn new(
        validator: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        severity: f64,
    ) -> Self {
        debug_assert!((0.0..=1.0).contains(&severity));
        Self {
            validator: validator.into(),
            category: category.into(),
            description: description.into(),
            severity,
            span: None,
            redacted_value: None,
        }
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some((start, end));
        self
    }

    pub fn with_redacted_value(mut self, placeholder: impl Into<String>) -> Self {
        self.redacted_value = Some(placeholder.into());
        self
    }
}

/// Outcome of a single validator invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff no blocking-severity findings were produced per the
    /// validator's own policy
    pub is_valid: bool,
    /// Possibly mutated text (redaction applied by this validator only)
    pub text: String,
    /// Text as received by this validator
    pub original_text: String,
    /// Findings in detection order, validator-local
    pub findings: Vec<Finding>,
    /// Action recommended by the validator itself. Inside a pipeline the
    /// stage's configured action takes precedence over this.
    pub action_taken: Action,
}

impl ValidationResult {
    /// A passing result with no findings and unchanged text.
    pub fn valid(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            is_valid: true,
            original_text: text.clone(),
            text,
            findings: Vec::new(),
            action_taken: Action::Passthrough,
        }
    }

    pub fn blocked(&self) -> bool {
        self.action_taken == Action::Block
    }

    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }
}

/// Outcome of a full pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Final text after all applied redactions
    pub text: String,
    /// Text as given to the pipeline, never mutated
    pub original_text: String,
    /// True iff a stage's effective action was Block
    pub blocked: bool,
    /// Findings from every executed stage, in execution order
    pub findings: Vec<Finding>,
    /// Strongest effective action of the run
    pub action_taken: Action,
}

impl PipelineResult {
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }

    /// Categories of all findings, in execution order (may repeat).
    pub fn categories(&self) -> Vec<String> {
        self.findings.iter().map(|f| f.category.clone()).collect()
    }

    /// Highest severity among findings.
    pub fn max_severity(&self) -> Option<f64> {
        self.findings
            .iter()
            .map(|f| f.severity)
            .fold(None, |acc, s| Some(acc.map_or(s, |a: f64| a.max(s))))
    }
}
