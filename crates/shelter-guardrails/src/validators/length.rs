//! Character and estimated-token length bounds
//!
//! Token count is estimated as `ceil(chars / 4)`, a fixed heuristic for
//! English text. Exceeding either bound produces a single finding with the
//! stable category `length_exceeded`.

use shelter_types::{Action, Finding, GuardResult, ValidationResult};

use crate::pipeline::Validator;

/// Immutable configuration for [`LengthValidator`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthConfig {
    /// Maximum character count (None = no limit)
    pub max_chars: Option<usize>,
    /// Maximum estimated token count (None = no limit)
    pub max_tokens: Option<usize>,
}

/// Enforce character and estimated-token length limits
#[derive(Debug)]
pub struct LengthValidator {
    max_chars: Option<usize>,
    max_tokens: Option<usize>,
}

impl LengthValidator {
    pub const NAME: &'static str = "length";

    pub fn new(config: LengthConfig) -> Self {
        Self {
            max_chars: config.max_chars,
            max_tokens: config.max_tokens,
        }
    }

    /// Rough token estimate: ~4 characters per token, rounded up.
    pub fn estimate_tokens(text: &str) -> usize {
        text.chars().count().div_ceil(4)
    }
}

impl Validator for LengthValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, text: &str) -> GuardResult<ValidationResult> {
        let chars = text.chars().count();
        let mut violations = Vec::new();

        if let Some(max_chars) = self.max_chars {
            if chars > max_chars {
                violations.push(format!("{chars} chars exceeds limit of {max_chars}"));
            }
        }
        if let Some(max_tokens) = self.max_tokens {
            let estimated = Self::estimate_tokens(text);
            if estimated > max_tokens {
                violations.push(format!(
                    "estimated {estimated} tokens exceeds limit of {max_tokens}"
                ));
            }
        }

        let findings = if violations.is_empty() {
            Vec::new()
        } else {
            vec![Finding::new(
                Self::NAME,
                "length_exceeded",
                format!("Text too long: {}", violations.join("; ")),
                0.8,
            )]
        };

        let is_valid = findings.is_empty();

        Ok(ValidationResult {
            is_valid,
            text: text.to_string(),
            original_text: text.to_string(),
            findings,
            action_taken: if is_valid {
                Action::Passthrough
            } else {
                Action::Block
            },
        })
    }
}
