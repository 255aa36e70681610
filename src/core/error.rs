//! Error taxonomy for the rule translation and merge core.

use thiserror::Error;

use crate::core::merge::Conflict;

/// Errors raised by the classifier, synthesizer, merge detector and the
/// configuration boundary.
#[derive(Error, Debug)]
pub enum Rule2HookError {
    /// Malformed or empty input handed to a core function.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A rule matched no category, or its fields could not be turned into a command.
    #[error("Failed to parse rule '{rule}': {reason}")]
    RuleParsing { rule: String, reason: String },

    /// Merging would introduce a different command under an existing (event, matcher) pair.
    #[error("Detected {} hook conflict{}", .0.len(), plural(.0))]
    Conflict(Vec<Conflict>),

    /// A configuration document failed the structural checks.
    #[error("Configuration document is malformed: {}", .0.join("; "))]
    Structural(Vec<String>),
}

impl Rule2HookError {
    pub fn parsing(rule: &str, reason: impl Into<String>) -> Self {
        Self::RuleParsing {
            rule: rule.to_string(),
            reason: reason.into(),
        }
    }

    /// Conflicts carried by a `Conflict` error, empty for every other variant.
    pub fn conflicts(&self) -> &[Conflict] {
        match self {
            Self::Conflict(conflicts) => conflicts,
            _ => &[],
        }
    }
}

fn plural(conflicts: &[Conflict]) -> &'static str {
    if conflicts.len() == 1 { "" } else { "s" }
}

/// Result type alias for the core
pub type Result<T> = std::result::Result<T, Rule2HookError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::HookEvent;

    #[test]
    fn test_conflict_message_pluralises() {
        let conflict = Conflict {
            event: HookEvent::PostToolUse,
            matcher: "Edit".to_string(),
            existing_command: "black {file_path}".to_string(),
            new_command: "autopep8 {file_path}".to_string(),
        };
        let one = Rule2HookError::Conflict(vec![conflict.clone()]);
        assert_eq!(one.to_string(), "Detected 1 hook conflict");

        let two = Rule2HookError::Conflict(vec![conflict.clone(), conflict]);
        assert_eq!(two.to_string(), "Detected 2 hook conflicts");
        assert_eq!(two.conflicts().len(), 2);
    }

    #[test]
    fn test_parsing_error_keeps_rule_text() {
        let err = Rule2HookError::parsing("asdkjasd random text", "no matching category");
        assert_eq!(
            err.to_string(),
            "Failed to parse rule 'asdkjasd random text': no matching category"
        );
        assert!(err.conflicts().is_empty());
    }
}
