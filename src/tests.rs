use serde_json::json;

use crate::builders::patterns::{RuleCategory, classify};
use crate::builders::synthesizer::synthesize;
use crate::builders::translator::{TranslationStatus, translate};
use crate::builders::validator::validate;
use crate::core::config::{Configuration, FILE_PATH_PLACEHOLDER, HookDescriptor, HookEvent};
use crate::core::error::Rule2HookError;
use crate::core::merge::merge;

fn black_on_edit() -> Configuration {
    Configuration::from_value(json!({"hooks": {"PostToolUse": [
        {"matcher": "Edit", "hooks": [{"type": "command", "command": "black {file_path}"}]}
    ]}}))
    .unwrap()
}

#[test]
fn test_formatting_rule_end_to_end() {
    let (category, fields) = classify("Format Python files with black after editing").unwrap();
    assert_eq!(category, RuleCategory::Formatting);

    let hooks = synthesize(category, &fields).unwrap();
    assert_eq!(hooks[0].event, HookEvent::PostToolUse);
    assert_eq!(hooks[0].matcher, "Edit");
    assert!(hooks[0].entry.command.contains("black"));
    assert!(hooks[0].entry.command.contains(FILE_PATH_PLACEHOLDER));
}

#[test]
fn test_git_rule_end_to_end() {
    let (category, fields) = classify("Run git status when finishing a task").unwrap();
    assert_eq!(category, RuleCategory::GitWorkflow);

    let hooks = synthesize(category, &fields).unwrap();
    assert_eq!(hooks[0].event, HookEvent::Stop);
    assert_eq!(hooks[0].matcher, "Bash");
    assert_eq!(hooks[0].entry.command, "git status");
}

#[test]
fn test_different_command_under_same_key_conflicts() {
    let existing = black_on_edit();
    let incoming = [HookDescriptor::new(
        HookEvent::PostToolUse,
        "Edit",
        "autopep8 {file_path}",
    )];

    let conflicts = merge(&existing, &incoming).unwrap_err();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].existing_command, "black {file_path}");
    assert_eq!(conflicts[0].new_command, "autopep8 {file_path}");
    assert_eq!(existing, black_on_edit());
}

#[test]
fn test_identical_command_is_absorbed() {
    let existing = black_on_edit();
    let incoming = [HookDescriptor::new(HookEvent::PostToolUse, "Edit", "black {file_path}")];
    assert_eq!(merge(&existing, &incoming).unwrap(), existing);
}

#[test]
fn test_gibberish_is_isolated_in_a_batch() {
    let (category, fields) = classify("asdkjasd random text").unwrap();
    assert_eq!(category, RuleCategory::Unrecognized);
    assert!(matches!(
        synthesize(category, &fields),
        Err(Rule2HookError::RuleParsing { .. })
    ));

    let translation = translate(&["asdkjasd random text", "Run git status when finishing a task"]);
    assert_eq!(translation.status(), TranslationStatus::Partial);
    assert_eq!(translation.failures[0].rule, "asdkjasd random text");
    assert_eq!(translation.descriptors().len(), 1);
}

#[test]
fn test_classification_is_deterministic() {
    for rule in [
        "Format Python files with black after editing",
        "Run git status when finishing a task",
        "Check for TODO comments before committing",
        "Send a Slack message when the build is done",
        "Run `make lint` before committing",
    ] {
        assert_eq!(classify(rule).unwrap().0, classify(rule).unwrap().0);
    }
}

#[test]
fn test_translated_rules_merge_into_a_valid_document() {
    let translation = translate(&[
        "Format Python files with black after editing",
        "Check for TODO comments before committing",
        "Run git status when finishing a task",
    ]);
    assert_eq!(translation.status(), TranslationStatus::Success);

    let merged = merge(&black_on_edit(), &translation.descriptors()).unwrap();
    let report = validate(&merged.to_value());
    assert!(report.is_ok(), "{:?}", report.errors);
    assert_eq!(report.hook_count, 3);

    let again = merge(&merged, &translation.descriptors()).unwrap();
    assert_eq!(again, merged);
}

#[test]
fn test_validator_completeness() {
    assert!(!validate(&json!({})).is_ok());
    assert!(!validate(&json!({"hooks": {"Stop": [{"hooks": [{"type": "command", "command": "git status"}]}]}})).is_ok());
    assert!(validate(&json!({"hooks": {}})).errors.is_empty());
}
