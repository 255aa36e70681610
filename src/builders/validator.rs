use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::core::config::HookEvent;

/// Outcome of a structural check. Every problem is listed, not just the first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    /// Problems that make the document unusable.
    pub errors: Vec<String>,
    /// Things that are legal but probably unintended.
    pub warnings: Vec<String>,
    /// Number of well-formed command entries.
    pub hook_count: usize,
    /// One line per well-formed entry, in document order.
    pub summary: Vec<HookSummary>,
}

/// Where a well-formed command entry sits in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookSummary {
    pub event: String,
    /// Empty when the group has no usable matcher.
    pub matcher: String,
    pub command: String,
}

impl ValidationResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The `ConfigValidator` trait defines the public interface for checking a
/// hooks document.
///
/// This trait allows for different validation strategies, such as a strict
/// validator or a more permissive one, behind a common method.
pub trait ConfigValidator {
    /// Checks the structure of a raw document without mutating it.
    ///
    /// # Arguments
    /// * `doc`: The parsed JSON document.
    ///
    /// # Returns
    /// A `ValidationResult` listing every error and warning found.
    fn validate_document(&self, doc: &Value) -> ValidationResult;
}

/// The `StandardValidator` is a concrete implementation of `ConfigValidator`.
///
/// It checks the nesting `hooks -> event -> [group] -> hooks -> [entry]`,
/// the required keys at each level, and the shape of each command entry.
/// The command text itself is opaque shell and is never inspected.
pub struct StandardValidator;

impl Default for StandardValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardValidator {
    /// Creates a new instance of `StandardValidator`.
    pub fn new() -> Self {
        Self
    }

    /// Checks one group: `matcher` must be a non-empty string and `hooks` a
    /// non-empty array of well-formed entries.
    fn check_group(&self, event: &str, location: &str, group: &Value, result: &mut ValidationResult) {
        let Some(group) = group.as_object() else {
            result.errors.push(format!("{location} must be an object"));
            return;
        };

        match group.get("matcher") {
            None => result.errors.push(format!("{location} missing 'matcher'")),
            Some(Value::String(matcher)) if !matcher.is_empty() => {}
            Some(_) => result
                .errors
                .push(format!("{location}.matcher must be a non-empty string")),
        }

        let entries = match group.get("hooks") {
            None => {
                result.errors.push(format!("{location} missing 'hooks' array"));
                return;
            }
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                result.errors.push(format!("{location}.hooks must be an array"));
                return;
            }
        };
        if entries.is_empty() {
            result.errors.push(format!("{location}.hooks must not be empty"));
        }

        let matcher = group.get("matcher").and_then(Value::as_str).unwrap_or_default();
        for (j, entry) in entries.iter().enumerate() {
            if let Some(command) = self.check_entry(&format!("{location}.hooks[{j}]"), entry, result) {
                result.summary.push(HookSummary {
                    event: event.to_string(),
                    matcher: matcher.to_string(),
                    command: command.to_string(),
                });
            }
        }
    }

    /// Checks one `{"type": "command", "command": ...}` entry and returns
    /// its command when the entry is well-formed.
    fn check_entry<'a>(
        &self,
        location: &str,
        entry: &'a Value,
        result: &mut ValidationResult,
    ) -> Option<&'a str> {
        let Some(entry) = entry.as_object() else {
            result.errors.push(format!("{location} must be an object"));
            return None;
        };
        let before = result.errors.len();

        match entry.get("type") {
            Some(Value::String(kind)) if kind == "command" => {}
            Some(other) => result
                .errors
                .push(format!("{location} has type {other} (expected \"command\")")),
            None => result.errors.push(format!("{location} missing 'type'")),
        }

        match entry.get("command") {
            Some(Value::String(command)) if !command.trim().is_empty() => {}
            Some(Value::String(_)) => result.errors.push(format!("{location} has an empty command")),
            Some(_) => result.errors.push(format!("{location}.command must be a string")),
            None => result.errors.push(format!("{location} missing command")),
        }

        if let Some(timeout) = entry.get("timeout")
            && timeout.as_u64().is_none()
        {
            result
                .errors
                .push(format!("{location}.timeout must be a non-negative integer"));
        }

        if result.errors.len() != before {
            return None;
        }
        result.hook_count += 1;
        entry.get("command").and_then(Value::as_str)
    }

    /// Warns about groups that repeat an `(event, matcher)` pair.
    ///
    /// Legal in the raw structure, but the merge treats the pair as one
    /// identity, so a repeat usually means an earlier merge was bypassed.
    fn check_duplicate_matchers(&self, event: &str, groups: &[Value]) -> Vec<String> {
        let mut warnings = Vec::new();
        let mut seen = HashSet::new();

        for matcher in groups
            .iter()
            .filter_map(|group| group.get("matcher").and_then(Value::as_str))
        {
            if !seen.insert(matcher) {
                warnings.push(format!("Duplicate matcher '{matcher}' under {event}"));
            }
        }
        warnings
    }

    fn check_events(&self, hooks: &Map<String, Value>, result: &mut ValidationResult) {
        for (event, groups) in hooks {
            if !HookEvent::from(event.clone()).is_known() {
                result.warnings.push(format!("Unknown event type: {event}"));
            }

            let Some(groups) = groups.as_array() else {
                result.errors.push(format!("Value of {event} must be an array"));
                continue;
            };

            for (i, group) in groups.iter().enumerate() {
                self.check_group(event, &format!("{event}[{i}]"), group, result);
            }
            let duplicates = self.check_duplicate_matchers(event, groups);
            result.warnings.extend(duplicates);
        }
    }
}

impl ConfigValidator for StandardValidator {
    fn validate_document(&self, doc: &Value) -> ValidationResult {
        let mut result = ValidationResult::default();

        let Some(root) = doc.as_object() else {
            result.errors.push("Root element must be an object".to_string());
            return result;
        };

        match root.get("hooks") {
            None => result.errors.push("Missing 'hooks' key".to_string()),
            Some(Value::Object(hooks)) => self.check_events(hooks, &mut result),
            Some(_) => result.errors.push("'hooks' must be an object".to_string()),
        }

        result
    }
}

/// Validates a document with the [`StandardValidator`].
pub fn validate(doc: &Value) -> ValidationResult {
    StandardValidator::new().validate_document(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_document_is_valid() {
        let result = validate(&json!({"hooks": {}}));
        assert!(result.is_ok());
        assert!(result.warnings.is_empty());
        assert_eq!(result.hook_count, 0);
    }

    #[test]
    fn test_missing_hooks_key() {
        let result = validate(&json!({"permissions": {}}));
        assert_eq!(result.errors, vec!["Missing 'hooks' key"]);
    }

    #[test]
    fn test_non_object_root_and_hooks() {
        assert!(!validate(&json!([])).is_ok());
        assert_eq!(validate(&json!({"hooks": []})).errors, vec!["'hooks' must be an object"]);
    }

    #[test]
    fn test_group_missing_matcher() {
        let result = validate(&json!({"hooks": {"Stop": [
            {"hooks": [{"type": "command", "command": "git status"}]}
        ]}}));
        assert_eq!(result.errors, vec!["Stop[0] missing 'matcher'"]);
        assert_eq!(result.hook_count, 1);
    }

    #[test]
    fn test_every_problem_is_reported() {
        let result = validate(&json!({"hooks": {
            "PostToolUse": [
                {"matcher": "", "hooks": []},
                {"matcher": "Edit", "hooks": [
                    {"type": "prompt", "command": "black {file_path}"},
                    {"type": "command", "command": "  "},
                    {"type": "command", "command": "isort {file_path}", "timeout": -1},
                    "not an entry"
                ]}
            ],
            "PreToolUse": {"matcher": "Bash"}
        }}));

        assert_eq!(
            result.errors,
            vec![
                "PostToolUse[0].matcher must be a non-empty string",
                "PostToolUse[0].hooks must not be empty",
                "PostToolUse[1].hooks[0] has type \"prompt\" (expected \"command\")",
                "PostToolUse[1].hooks[1] has an empty command",
                "PostToolUse[1].hooks[2].timeout must be a non-negative integer",
                "PostToolUse[1].hooks[3] must be an object",
                "Value of PreToolUse must be an array",
            ]
        );
        assert_eq!(result.hook_count, 0);
    }

    #[test]
    fn test_warnings_do_not_fail_validation() {
        let result = validate(&json!({"hooks": {
            "SessionStart": [{"matcher": "*", "hooks": [{"type": "command", "command": "echo hi"}]}],
            "Stop": [
                {"matcher": "Bash", "hooks": [{"type": "command", "command": "git status"}]},
                {"matcher": "Bash", "hooks": [{"type": "command", "command": "git diff"}]}
            ]
        }}));
        assert!(result.is_ok());
        assert_eq!(
            result.warnings,
            vec![
                "Unknown event type: SessionStart",
                "Duplicate matcher 'Bash' under Stop"
            ]
        );
        assert_eq!(result.hook_count, 3);
        assert_eq!(
            result.summary[2],
            HookSummary {
                event: "Stop".to_string(),
                matcher: "Bash".to_string(),
                command: "git diff".to_string(),
            }
        );
    }

    #[test]
    fn test_validation_does_not_mutate() {
        let doc = json!({"hooks": {"Stop": [{"matcher": "Bash", "hooks": [{"type": "command", "command": "git status"}]}]}});
        let copy = doc.clone();
        let _ = validate(&doc);
        assert_eq!(doc, copy);
    }
}
