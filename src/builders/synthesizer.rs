use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::builders::patterns::{ExtractedFields, RuleCategory};
use crate::core::config::{FILE_PATH_PLACEHOLDER, HookDescriptor, HookEvent};
use crate::core::error::{Result, Rule2HookError};

/// Longest command a rule may synthesize.
pub const MAX_COMMAND_LENGTH: usize = 1000;

/// Matcher for file-editing tools.
pub const EDIT_MATCHER: &str = "Edit";
/// Matcher for file-creation tools, used when the rule talks about saving.
pub const WRITE_MATCHER: &str = "Write";
/// Matcher for shell commands.
pub const BASH_MATCHER: &str = "Bash";
/// Matches every tool.
pub const ANY_MATCHER: &str = "*";

/// Formatter templates, keyed by the tool name a rule may mention.
const FORMATTERS: &[(&str, &str)] = &[
    ("black", "black {file_path}"),
    ("autopep8", "autopep8 --in-place {file_path}"),
    ("yapf", "yapf -i {file_path}"),
    ("isort", "isort {file_path}"),
    ("ruff", "ruff format {file_path}"),
    ("prettier", "prettier --write {file_path}"),
    ("rustfmt", "rustfmt {file_path}"),
    ("gofmt", "gofmt -w {file_path}"),
    ("clang-format", "clang-format -i {file_path}"),
];

/// Default formatter per language.
const LANGUAGE_FORMATTERS: &[(&str, &str)] = &[
    ("python", "black"),
    ("javascript", "prettier"),
    ("typescript", "prettier"),
    ("css", "prettier"),
    ("html", "prettier"),
    ("markdown", "prettier"),
    ("json", "prettier"),
    ("yaml", "prettier"),
    ("rust", "rustfmt"),
    ("go", "gofmt"),
];

const TEST_RUNNERS: &[(&str, &str)] = &[
    ("pytest", "pytest"),
    ("jest", "npx jest"),
    ("vitest", "npx vitest run"),
];

const LANGUAGE_TEST_RUNNERS: &[(&str, &str)] = &[
    ("python", "pytest"),
    ("javascript", "npm test"),
    ("typescript", "npm test"),
    ("rust", "cargo test"),
    ("go", "go test ./..."),
    ("ruby", "bundle exec rake test"),
];

/// Test commands spelled out in a rule, in the words used to mention them.
const TEST_PHRASES: &[(&str, &str)] = &[
    ("npm test", "npm test"),
    ("npm run test", "npm run test"),
    ("cargo test", "cargo test"),
    ("go test", "go test ./..."),
    ("make test", "make test"),
];

const DEFAULT_TEST_COMMAND: &str = "npm test";

const LINTERS: &[(&str, &str)] = &[
    ("eslint", "eslint {file_path}"),
    ("mypy", "mypy {file_path}"),
    ("flake8", "flake8 {file_path}"),
    ("ruff", "ruff check {file_path}"),
    ("clippy", "cargo clippy"),
    ("shellcheck", "shellcheck {file_path}"),
];

const LANGUAGE_LINTERS: &[(&str, &str)] = &[
    ("python", "ruff check {file_path}"),
    ("javascript", "eslint {file_path}"),
    ("typescript", "eslint {file_path}"),
    ("rust", "cargo clippy"),
    ("go", "go vet ./..."),
    ("shell", "shellcheck {file_path}"),
    ("json", "python3 -m json.tool {file_path} > /dev/null"),
];

const TODO_SCAN: &str = "grep -r 'TODO' . 2>/dev/null || echo 'No TODOs found'";
const SECRET_SCAN: &str = "git secrets --scan 2>/dev/null || echo 'No secrets found'";

const GIT_SUBCOMMANDS: &[&str] = &["status", "diff", "log", "push", "pull", "fetch", "stash"];
const DEFAULT_GIT_COMMAND: &str = "git status";

const SLACK_NOTIFICATION: &str = r#"curl -s -X POST -H 'Content-type: application/json' --data '{"text":"{message}"}' "$SLACK_WEBHOOK_URL""#;
const DESKTOP_NOTIFICATION: &str = "notify-send 'Claude Code' '{message}'";

static GIT_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bgit\s+([a-z][a-z-]*)").expect("built-in pattern is a valid regex")
});
static FILE_EXISTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:the\s+)?(?:file\s+)?([\w./-]+)\s+(?:file\s+)?exists$")
        .expect("built-in pattern is a valid regex")
});

/// Turns a classified rule into hook descriptors.
///
/// The event comes from the trigger phrase, the matcher from the tools the
/// rule talks about, and the command from the category's template (or
/// verbatim for an explicit command). Every rule currently yields a single
/// descriptor; a compound command joined by `&&` stays one entry.
///
/// # Returns
/// The descriptors, or a `RuleParsing` error carrying the rule text when the
/// category is `Unrecognized` or no command can be built from the fields.
pub fn synthesize(category: RuleCategory, fields: &ExtractedFields) -> Result<Vec<HookDescriptor>> {
    let rule = fields.rule.as_str();
    let command = build_command(category, fields)?;

    if command.chars().count() > MAX_COMMAND_LENGTH {
        return Err(Rule2HookError::Validation(format!(
            "command synthesized from '{rule}' exceeds {MAX_COMMAND_LENGTH} characters"
        )));
    }

    let event = infer_event(category, fields);
    let matcher = infer_matcher(category, fields);
    debug!("Synthesized {event} [{matcher}] `{command}` from '{rule}'");

    Ok(vec![HookDescriptor::new(event, matcher, command)])
}

fn build_command(category: RuleCategory, fields: &ExtractedFields) -> Result<String> {
    let rule = fields.rule.as_str();
    match category {
        RuleCategory::ExplicitCommand => fields
            .command
            .clone()
            .ok_or_else(|| Rule2HookError::parsing(rule, "no quoted command found")),
        RuleCategory::Formatting => formatting_command(fields),
        RuleCategory::Testing => Ok(testing_command(fields)),
        RuleCategory::GitWorkflow => Ok(git_command(fields)),
        RuleCategory::Validation => validation_command(fields),
        RuleCategory::Notification => Ok(notification_command(fields)),
        RuleCategory::Conditional => conditional_command(fields),
        RuleCategory::Unrecognized => Err(Rule2HookError::parsing(
            rule,
            "rule does not match any known pattern",
        )),
    }
}

fn lookup<'a>(table: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    table.iter().find(|(name, _)| *name == key).map(|(_, value)| *value)
}

fn formatting_command(fields: &ExtractedFields) -> Result<String> {
    let mentioned: Vec<&str> = fields
        .tools
        .iter()
        .filter_map(|tool| lookup(FORMATTERS, tool))
        .collect();
    if !mentioned.is_empty() {
        return Ok(mentioned.join(" && "));
    }

    fields
        .language
        .as_deref()
        .and_then(|language| lookup(LANGUAGE_FORMATTERS, language))
        .and_then(|tool| lookup(FORMATTERS, tool))
        .map(str::to_string)
        .ok_or_else(|| Rule2HookError::parsing(&fields.rule, "could not determine a formatter"))
}

fn testing_command(fields: &ExtractedFields) -> String {
    let lower = fields.rule.to_lowercase();
    TEST_PHRASES
        .iter()
        .find(|(phrase, _)| lower.contains(phrase))
        .map(|(_, command)| *command)
        .or_else(|| fields.tools.iter().find_map(|tool| lookup(TEST_RUNNERS, tool)))
        .or_else(|| {
            fields
                .language
                .as_deref()
                .and_then(|language| lookup(LANGUAGE_TEST_RUNNERS, language))
        })
        .unwrap_or(DEFAULT_TEST_COMMAND)
        .to_string()
}

fn git_command(fields: &ExtractedFields) -> String {
    // "git" may be followed by plain English ("commit to git when done").
    let named = GIT_COMMAND
        .captures_iter(&fields.rule)
        .map(|caps| caps[1].to_lowercase())
        .find(|sub| GIT_SUBCOMMANDS.contains(&sub.as_str()));
    if let Some(sub) = named {
        return format!("git {sub}");
    }
    let lower = fields.rule.to_lowercase();
    lower
        .split(|c: char| !c.is_ascii_alphabetic())
        .find(|word| GIT_SUBCOMMANDS.contains(word))
        .map(|sub| format!("git {sub}"))
        .unwrap_or_else(|| DEFAULT_GIT_COMMAND.to_string())
}

fn validation_command(fields: &ExtractedFields) -> Result<String> {
    let lower = fields.rule.to_lowercase();
    if let Some(command) = fields.tools.iter().find_map(|tool| lookup(LINTERS, tool)) {
        return Ok(command.to_string());
    }
    if lower.contains("todo") {
        return Ok(TODO_SCAN.to_string());
    }
    if lower.contains("secret") || lower.contains("credential") {
        return Ok(SECRET_SCAN.to_string());
    }
    if lower.contains("npm run lint") {
        return Ok("npm run lint".to_string());
    }
    fields
        .language
        .as_deref()
        .and_then(|language| lookup(LANGUAGE_LINTERS, language))
        .map(str::to_string)
        .ok_or_else(|| {
            Rule2HookError::parsing(&fields.rule, "could not determine what to validate")
        })
}

fn notification_command(fields: &ExtractedFields) -> String {
    // Quotes would break out of the shell and JSON quoting of the templates.
    let message: String = fields
        .rule
        .chars()
        .filter(|c| !matches!(c, '\'' | '"' | '`' | '\\' | '$'))
        .collect();
    let template = if fields.rule.to_lowercase().contains("slack") {
        SLACK_NOTIFICATION
    } else {
        DESKTOP_NOTIFICATION
    };
    template.replace("{message}", &message)
}

/// Builds the guarded action's command and wraps it in a shell guard.
///
/// Two condition shapes can be expressed: a file type ("the file is a Python
/// file") and a file's existence ("package.json exists").
fn conditional_command(fields: &ExtractedFields) -> Result<String> {
    let rule = fields.rule.as_str();
    let (Some(action), Some(action_fields), Some(condition)) = (
        fields.action,
        fields.action_fields.as_deref(),
        fields.condition.as_deref(),
    ) else {
        return Err(Rule2HookError::parsing(rule, "conditional rule has no action"));
    };
    if matches!(action, RuleCategory::Conditional | RuleCategory::Unrecognized) {
        return Err(Rule2HookError::parsing(
            rule,
            "the guarded action does not match any known pattern",
        ));
    }

    let inner = build_command(action, action_fields)
        .map_err(|e| match e {
            Rule2HookError::RuleParsing { reason, .. } => Rule2HookError::parsing(rule, reason),
            other => other,
        })?;

    if let Some(caps) = FILE_EXISTS.captures(condition) {
        return Ok(format!("[ -e {} ] && {inner}", &caps[1]));
    }

    // The file-type guard matches on the path the host substitutes.
    let (_, condition_fields) = crate::builders::patterns::classify(condition)?;
    if let Some(extension) = condition_fields.extension {
        return Ok(format!(
            "case \"{FILE_PATH_PLACEHOLDER}\" in *.{extension}) {inner} ;; esac"
        ));
    }

    Err(Rule2HookError::parsing(
        rule,
        format!("condition '{condition}' cannot be expressed as a shell guard"),
    ))
}

/// Picks the event from the trigger phrase, falling back on the category.
fn infer_event(category: RuleCategory, fields: &ExtractedFields) -> HookEvent {
    let category = match (category, fields.action) {
        (RuleCategory::Conditional, Some(action)) => action,
        _ => category,
    };
    if let Some(trigger) = fields.trigger.as_deref() {
        let words: Vec<&str> = trigger.split_whitespace().collect();
        let any_word = |stems: &[&str]| {
            words.iter().any(|word| stems.iter().any(|stem| word.starts_with(stem)))
        };
        if words.first() == Some(&"before") {
            return HookEvent::PreToolUse;
        }
        if words.contains(&"done") || words.contains(&"end") || any_word(&["finish", "complet", "wrap"]) {
            return HookEvent::Stop;
        }
        if any_word(&["edit", "sav", "writ", "modif", "chang"]) {
            return HookEvent::PostToolUse;
        }
    }
    match category {
        RuleCategory::Notification => HookEvent::Notification,
        RuleCategory::GitWorkflow if fields.trigger.is_none() => HookEvent::Stop,
        RuleCategory::Validation if fields.trigger.is_none() => HookEvent::PreToolUse,
        _ => HookEvent::PostToolUse,
    }
}

/// Picks the tool matcher from what the rule talks about.
///
/// Words are matched by stem so "credits" is not an edit. A git or shell
/// context wins over incidental editing words ("push changes to git").
fn infer_matcher(category: RuleCategory, fields: &ExtractedFields) -> &'static str {
    let lower = fields.rule.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();
    let any_word = |stems: &[&str]| {
        words.iter().any(|word| stems.iter().any(|stem| word.starts_with(stem)))
    };

    if words.contains(&"git") || any_word(&["commit", "push", "bash", "shell"]) {
        return BASH_MATCHER;
    }
    if any_word(&["sav"]) {
        return WRITE_MATCHER;
    }
    if any_word(&["edit", "modif", "writ", "chang"]) {
        return EDIT_MATCHER;
    }
    if any_word(&["command"]) || words.first() == Some(&"run") {
        return BASH_MATCHER;
    }
    match category {
        RuleCategory::Formatting | RuleCategory::Testing => EDIT_MATCHER,
        RuleCategory::Notification => ANY_MATCHER,
        _ => BASH_MATCHER,
    }
}
