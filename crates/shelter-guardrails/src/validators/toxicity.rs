//! Keyword and pattern-based toxicity scoring
//!
//! Four weighted categories: profanity, slurs, threats, harassment. Each
//! category contributes `min(match_count x weight, 1.0)`; the total score is
//! the sum capped at 1.0. Text is invalid only when the score exceeds the
//! threshold; exact equality is still valid.

use std::collections::HashMap;

use regex::Regex;

use shelter_types::{Action, Finding, GuardError, GuardResult, ValidationResult};

use crate::pipeline::Validator;

/// Immutable configuration for [`ToxicityValidator`]
#[derive(Debug, Clone, Default)]
pub struct ToxicityConfig {
    /// Score at or above which text is considered toxic, in [0.0, 1.0]
    pub threshold: Option<f64>,
    /// Per-category weight overrides, keyed by category name
    pub weights: HashMap<String, f64>,
}

const DEFAULT_THRESHOLD: f64 = 0.5;

#[derive(Debug)]
struct ToxicityCategory {
    name: &'static str,
    patterns: Vec<Regex>,
    weight: f64,
}

/// (name, default weight, pattern list) for the built-in categories.
const CATEGORIES: &[(&str, f64, &[&str])] = &[
    (
        "profanity",
        0.6,
        &[r"(?i)\b(?:fuck|shit|damn|ass|bitch|crap|dick|piss)\w*\b"],
    ),
    ("slurs", 0.8, &[r"(?i)\b(?:retard(?:ed)?|spaz|cripple)\b"]),
    (
        "threats",
        1.0,
        &[
            r"(?i)\b(?:i(?:'ll| will))\b.{0,20}\b(?:kill|hurt|destroy|attack|murder)\b",
            r"(?i)\b(?:bomb|weapon|explosive)\b.{0,20}\b(?:make|build|create|how to)\b",
            r"(?i)\b(?:how to)\b.{0,20}\b(?:bomb|weapon|explosive|poison|kill)\b",
        ],
    ),
    (
        "harassment",
        0.9,
        &[
            r"(?i)\b(?:kys|kill\s*yourself|go\s*die)\b",
            r"(?i)\byou(?:'re| are)\b.{0,15}\b(?:worthless|pathetic|disgusting|ugly)\b",
        ],
    ),
];

/// Score and filter text for toxic content
#[derive(Debug)]
pub struct ToxicityValidator {
    categories: Vec<ToxicityCategory>,
    threshold: f64,
}

impl ToxicityValidator {
    pub const NAME: &'static str = "toxicity";

    pub fn new(config: ToxicityConfig) -> GuardResult<Self> {
        let threshold = config.threshold.unwrap_or(DEFAULT_THRESHOLD);
        if !(0.0..=1.0).contains(&threshold) {
            return Err(GuardError::Threshold(threshold));
        }
        for (name, weight) in &config.weights {
            if !(0.0..=1.0).contains(weight) {
                return Err(GuardError::Threshold(*weight));
            }
            if !CATEGORIES.iter().any(|(n, _, _)| n == name) {
                return Err(GuardError::Config(format!(
                    "Unknown toxicity category: {name}"
                )));
            }
        }

        let mut categories = Vec::with_capacity(CATEGORIES.len());
        for &(name, default_weight, patterns) in CATEGORIES {
            let mut compiled = Vec::with_capacity(patterns.len());
            for pattern in patterns {
                let regex = Regex::new(pattern).map_err(|e| GuardError::Pattern {
                    pattern: (*pattern).to_string(),
                    reason: e.to_string(),
                })?;
                compiled.push(regex);
            }
            categories.push(ToxicityCategory {
                name,
                patterns: compiled,
                weight: config.weights.get(name).copied().unwrap_or(default_weight),
            });
        }

        Ok(Self {
            categories,
            threshold,
        })
    }
}

impl Validator for ToxicityValidator {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, text: &str) -> GuardResult<ValidationResult> {
        let mut findings: Vec<Finding> = Vec::new();
        let mut total: f64 = 0.0;

        for category in &self.categories {
            let mut count = 0usize;
            let mut first_span = None;
            for regex in &category.patterns {
                for m in regex.find_iter(text) {
                    count += 1;
                    if first_span.is_none() {
                        first_span = Some((m.start(), m.end()));
                    }
                }
            }

            if count > 0 {
                let contribution = (count as f64 * category.weight).min(1.0);
                total += contribution;

                let mut finding = Finding::new(
                    Self::NAME,
                    category.name,
                    format!("Toxic content ({}): {} match(es)", category.name, count),
                    contribution,
                );
                if let Some((start, end)) = first_span {
                    finding = finding.with_span(start, end);
                }
                findings.push(finding);
            }
        }

        let score = total.min(1.0);
        // Exact equality with the threshold is still valid.
        let is_valid = score <= self.threshold;

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
