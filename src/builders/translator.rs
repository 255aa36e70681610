use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use crate::builders::patterns::{RuleCategory, classify};
use crate::builders::synthesizer::synthesize;
use crate::core::config::HookDescriptor;
use crate::core::error::Rule2HookError;

/// A rule that made it through classification and synthesis.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedRule {
    pub rule: String,
    pub category: RuleCategory,
    pub descriptors: Vec<HookDescriptor>,
}

/// A rule that did not, with the reason.
#[derive(Debug)]
pub struct RuleFailure {
    pub rule: String,
    pub error: Rule2HookError,
}

/// Overall outcome of a batch, mirroring what a caller reports upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStatus {
    /// Every rule converted.
    Success,
    /// Some rules converted, some failed.
    Partial,
    /// Nothing converted.
    Error,
}

impl fmt::Display for TranslationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationStatus::Success => write!(f, "success"),
            TranslationStatus::Partial => write!(f, "partial"),
            TranslationStatus::Error => write!(f, "error"),
        }
    }
}

/// Result of translating a batch. Both lists keep input order.
#[derive(Debug, Default)]
pub struct Translation {
    pub converted: Vec<ConvertedRule>,
    pub failures: Vec<RuleFailure>,
}

impl Translation {
    /// All synthesized descriptors, in rule order.
    pub fn descriptors(&self) -> Vec<HookDescriptor> {
        self.converted
            .iter()
            .flat_map(|converted| converted.descriptors.iter().cloned())
            .collect()
    }

    pub fn status(&self) -> TranslationStatus {
        match (self.converted.is_empty(), self.failures.is_empty()) {
            (true, _) => TranslationStatus::Error,
            (false, true) => TranslationStatus::Success,
            (false, false) => TranslationStatus::Partial,
        }
    }
}

/// Classifies and synthesizes one rule.
pub fn translate_rule(rule: &str) -> Result<ConvertedRule, Rule2HookError> {
    let (category, fields) = classify(rule)?;
    let descriptors = synthesize(category, &fields)?;
    Ok(ConvertedRule {
        rule: fields.rule,
        category,
        descriptors,
    })
}

/// Translates a batch of rules.
///
/// Never fails as a whole: a rule that cannot be classified or synthesized
/// goes to `failures` with its error, and the remaining rules still convert.
pub fn translate<S: AsRef<str>>(rules: &[S]) -> Translation {
    let mut translation = Translation::default();

    for rule in rules {
        let rule = rule.as_ref();
        match translate_rule(rule) {
            Ok(converted) => translation.converted.push(converted),
            Err(error) => {
                warn!("Could not convert rule '{rule}': {error}");
                translation.failures.push(RuleFailure {
                    rule: rule.to_string(),
                    error,
                });
            }
        }
    }

    info!(
        "Rule conversion {}: {} converted, {} failed",
        translation.status(),
        translation.converted.len(),
        translation.failures.len()
    );
    translation
}
