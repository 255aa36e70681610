use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

use crate::core::error::{Result, Rule2HookError};

/// Longest rule text accepted by [`classify`].
pub const MAX_RULE_LENGTH: usize = 500;

/// The category a rule is sorted into. Exactly one per rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RuleCategory {
    /// Run a formatter over the touched file.
    Formatting,
    /// Run a test suite.
    Testing,
    /// Run a git command.
    GitWorkflow,
    /// Lint, scan or otherwise check the code.
    Validation,
    /// Tell someone something happened.
    Notification,
    /// An action guarded by a condition ("only if", "when ... is less than").
    Conditional,
    /// The rule spells out the command in backticks or quotes.
    ExplicitCommand,
    /// Nothing matched.
    Unrecognized,
}

impl fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCategory::Formatting => write!(f, "formatting"),
            RuleCategory::Testing => write!(f, "testing"),
            RuleCategory::GitWorkflow => write!(f, "git-workflow"),
            RuleCategory::Validation => write!(f, "validation"),
            RuleCategory::Notification => write!(f, "notification"),
            RuleCategory::Conditional => write!(f, "conditional"),
            RuleCategory::ExplicitCommand => write!(f, "explicit-command"),
            RuleCategory::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Everything the classifier pulled out of a rule.
///
/// Only the fields relevant to the detected category are guaranteed to be
/// meaningful, but the trigger phrase, language and explicit command are
/// looked for in every rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedFields {
    /// The rule text, trimmed.
    pub rule: String,
    /// Trigger phrase such as "after editing" or "when finishing a task".
    pub trigger: Option<String>,
    /// Canonical language name ("python", "rust", ...), first one mentioned.
    pub language: Option<String>,
    /// File extension without the dot.
    pub extension: Option<String>,
    /// Glob-like file pattern such as `test_*.py`.
    pub file_pattern: Option<String>,
    /// Known tools mentioned in the rule, in order of appearance.
    pub tools: Vec<String>,
    /// Command found inside backticks or quotes.
    pub command: Option<String>,
    /// Condition text of a conditional rule.
    pub condition: Option<String>,
    /// Category of the guarded action of a conditional rule.
    pub action: Option<RuleCategory>,
    /// Fields extracted from the guarded action alone.
    pub action_fields: Option<Box<ExtractedFields>>,
}

/// Languages we know a formatter, test runner or linter for:
/// (canonical name, words naming it, extension).
const LANGUAGES: &[(&str, &[&str], &str)] = &[
    ("python", &["python", "py"], "py"),
    ("javascript", &["javascript", "js", "jsx", "node"], "js"),
    ("typescript", &["typescript", "ts", "tsx"], "ts"),
    ("rust", &["rust", "rs"], "rs"),
    ("go", &["go", "golang"], "go"),
    ("ruby", &["ruby", "rb"], "rb"),
    ("java", &["java"], "java"),
    ("css", &["css", "scss"], "css"),
    ("html", &["html"], "html"),
    ("markdown", &["markdown", "md"], "md"),
    ("json", &["json"], "json"),
    ("yaml", &["yaml", "yml"], "yaml"),
    ("shell", &["shell", "sh", "bash"], "sh"),
];

/// Tool names the classifier records when it sees them.
const KNOWN_TOOLS: &[&str] = &[
    "black",
    "autopep8",
    "yapf",
    "isort",
    "ruff",
    "prettier",
    "rustfmt",
    "gofmt",
    "clang-format",
    "pytest",
    "jest",
    "vitest",
    "eslint",
    "mypy",
    "flake8",
    "clippy",
    "shellcheck",
];

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern is a valid regex")
}

static BACKTICK: LazyLock<Regex> = LazyLock::new(|| compile(r"`([^`]+)`"));
static DOUBLE_QUOTED: LazyLock<Regex> = LazyLock::new(|| compile(r#""([^"]+)""#));
static TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(?:before|after|whenever|when|once|upon|following)\s+[a-z][a-z'-]*(?:\s+[a-z][a-z'-]*){0,4}")
});
static CONDITION_ONLY: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\s*,?\s*\b(?:only\s+(?:if|when)|unless)\s+(.+)$"));
static CONDITION_COMPARISON: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\s*,?\s*\b(?:if|when)\s+(.+?\b(?:is|are)\s+(?:less|greater|more|fewer|lower|higher)\s+than\b.*)$")
});
static FILE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile(r"[A-Za-z0-9_-]*\*[A-Za-z0-9_*-]*\.([A-Za-z0-9]{1,6})\b"));
static BARE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?:^|\s)\.([A-Za-z0-9]{1,6})\b"));
static WORD: LazyLock<Regex> = LazyLock::new(|| compile(r"[a-z0-9+#-]+"));

static FORMATTING: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(?:format|formats|formatted|formatting|reformat|beautify|black|prettier|rustfmt|gofmt|autopep8|yapf|isort|clang-format)\b|\bruff\s+format\b")
});
static TESTING: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\btests?\b|\btest\s+suite\b|\bpytest\b|\bjest\b|\bvitest\b|\bspecs?\b|\btest_\*|\*_test\.")
});
static GIT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\bgit\b|\bcommit\b|\bpush\b|\bpull\s+request\b|\bstash\b"));
static VALIDATION: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(?:validate|validates|validation|check|checks|checking|scan|scans|scanning|verify|verifies|lint|linting|audit)\b|\b(?:eslint|mypy|flake8|clippy|shellcheck)\b|\bruff\s+check\b")
});
static NOTIFICATION: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?i)\b(?:alert|alerts|notify|notifies|notification|notifications|slack|ping|email|message)\b")
});

/// One entry of the ordered priority list: the first rule whose predicate
/// holds decides the category.
struct PatternRule {
    category: RuleCategory,
    matches: fn(&str) -> bool,
}

const PRIORITY: &[PatternRule] = &[
    PatternRule {
        category: RuleCategory::ExplicitCommand,
        matches: |rule| explicit_command(rule).is_some(),
    },
    PatternRule {
        category: RuleCategory::Conditional,
        matches: |rule| split_condition(rule).is_some(),
    },
    PatternRule {
        category: RuleCategory::Formatting,
        matches: |rule| FORMATTING.is_match(rule),
    },
    PatternRule {
        category: RuleCategory::Testing,
        matches: |rule| TESTING.is_match(rule),
    },
    PatternRule {
        category: RuleCategory::GitWorkflow,
        matches: |rule| GIT.is_match(rule),
    },
    PatternRule {
        category: RuleCategory::Validation,
        matches: |rule| VALIDATION.is_match(rule),
    },
    PatternRule {
        category: RuleCategory::Notification,
        matches: |rule| NOTIFICATION.is_match(rule),
    },
];

/// Classifies a rule and extracts its category-specific fields.
///
/// Categories are tried in a fixed order: explicit command, conditional,
/// formatting, testing, git, validation, notification. The first match wins,
/// so the same text always lands in the same category.
///
/// # Arguments
/// * `rule`: Free-text rule, e.g. "Format Python files with black after editing".
///
/// # Returns
/// The category and the extracted fields. `Unrecognized` is a normal result
/// here; it is the synthesizer that refuses it. Empty, whitespace-only or
/// over-long input is a `Validation` error.
pub fn classify(rule: &str) -> Result<(RuleCategory, ExtractedFields)> {
    let rule = rule.trim();
    if rule.is_empty() {
        return Err(Rule2HookError::Validation("rule text cannot be empty".to_string()));
    }
    if rule.chars().count() > MAX_RULE_LENGTH {
        return Err(Rule2HookError::Validation(format!(
            "rule exceeds {MAX_RULE_LENGTH} characters"
        )));
    }

    let mut fields = extract_fields(rule);
    let category = first_match(rule, PRIORITY.iter());

    if category == RuleCategory::Conditional
        && let Some((action_text, condition)) = split_condition(rule)
    {
        // The guarded action is classified on its own, without the condition.
        let actions = PRIORITY
            .iter()
            .filter(|pattern| pattern.category != RuleCategory::Conditional);
        fields.action = Some(first_match(&action_text, actions));
        fields.action_fields = Some(Box::new(extract_fields(&action_text)));
        fields.condition = Some(condition);
    }

    debug!("Classified rule '{rule}' as {category}");
    Ok((category, fields))
}

fn first_match<'a>(text: &str, mut patterns: impl Iterator<Item = &'a PatternRule>) -> RuleCategory {
    patterns
        .find(|pattern| (pattern.matches)(text))
        .map(|pattern| pattern.category)
        .unwrap_or(RuleCategory::Unrecognized)
}

fn extract_fields(rule: &str) -> ExtractedFields {
    let lower = rule.to_lowercase();
    let file_pattern = FILE_PATTERN.find(rule).map(|m| m.as_str().to_string());
    let extension = FILE_PATTERN
        .captures(rule)
        .or_else(|| BARE_EXTENSION.captures(rule))
        .map(|caps| caps[1].to_lowercase());
    let language = language_from_words(&lower)
        .or_else(|| extension.as_deref().and_then(language_from_extension));
    let extension = extension.or_else(|| {
        language
            .as_deref()
            .and_then(|name| LANGUAGES.iter().find(|(lang, _, _)| *lang == name))
            .map(|(_, _, ext)| ext.to_string())
    });

    ExtractedFields {
        rule: rule.to_string(),
        trigger: TRIGGER.find(rule).map(|m| m.as_str().to_lowercase()),
        language,
        extension,
        file_pattern,
        tools: tools_in(&lower),
        command: explicit_command(rule),
        ..ExtractedFields::default()
    }
}

/// Command quoted in the rule: anything in backticks, or double-quoted text
/// that looks like a command (contains a space, slash or dash).
fn explicit_command(rule: &str) -> Option<String> {
    if let Some(caps) = BACKTICK.captures(rule) {
        let command = caps[1].trim();
        if !command.is_empty() {
            return Some(command.to_string());
        }
    }
    DOUBLE_QUOTED
        .captures(rule)
        .map(|caps| caps[1].trim().to_string())
        .filter(|quoted| quoted.contains([' ', '/', '-']))
}

/// Splits "ACTION only if CONDITION" into its two halves.
fn split_condition(rule: &str) -> Option<(String, String)> {
    let caps = CONDITION_ONLY
        .captures(rule)
        .or_else(|| CONDITION_COMPARISON.captures(rule))?;
    let start = caps.get(0)?.start();
    let action = rule[..start].trim().to_string();
    let condition = caps[1].trim().trim_end_matches('.').trim().to_string();
    if action.is_empty() || condition.is_empty() {
        return None;
    }
    Some((action, condition))
}

fn language_from_words(lower: &str) -> Option<String> {
    WORD.find_iter(lower).find_map(|word| {
        LANGUAGES
            .iter()
            .find(|(_, words, _)| words.contains(&word.as_str()))
            .map(|(name, _, _)| name.to_string())
    })
}

fn language_from_extension(extension: &str) -> Option<String> {
    LANGUAGES
        .iter()
        .find(|(_, words, ext)| *ext == extension || words.contains(&extension))
        .map(|(name, _, _)| name.to_string())
}

fn tools_in(lower: &str) -> Vec<String> {
    let mut tools = Vec::new();
    for word in WORD.find_iter(lower) {
        let word = word.as_str();
        if KNOWN_TOOLS.contains(&word) && !tools.iter().any(|t| t == word) {
            tools.push(word.to_string());
        }
    }
    tools
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(rule: &str) -> RuleCategory {
        classify(rule).unwrap().0
    }

    #[test]
    fn test_formatting_rule_fields() {
        let (category, fields) = classify("Format Python files with black after editing").unwrap();
        assert_eq!(category, RuleCategory::Formatting);
        assert_eq!(fields.trigger.as_deref(), Some("after editing"));
        assert_eq!(fields.language.as_deref(), Some("python"));
        assert_eq!(fields.extension.as_deref(), Some("py"));
        assert_eq!(fields.tools, vec!["black"]);
        assert_eq!(fields.command, None);
    }

    #[test]
    fn test_git_rule_fields() {
        let (category, fields) = classify("Run git status when finishing a task").unwrap();
        assert_eq!(category, RuleCategory::GitWorkflow);
        assert_eq!(fields.trigger.as_deref(), Some("when finishing a task"));
    }

    #[test]
    fn test_priority_order() {
        // Explicit command beats the formatting verb.
        assert_eq!(
            category("Format code with `cargo fmt --all` after editing"),
            RuleCategory::ExplicitCommand
        );
        // A condition beats the formatting verb.
        assert_eq!(
            category("Run black only if the file is a Python file"),
            RuleCategory::Conditional
        );
        // Testing beats git when both appear.
        assert_eq!(category("Run tests before every push"), RuleCategory::Testing);
        // "committing" is a trigger, not a git verb.
        assert_eq!(
            category("Check for TODO comments before committing"),
            RuleCategory::Validation
        );
        assert_eq!(
            category("Send a Slack alert when the build is finished"),
            RuleCategory::Notification
        );
    }

    #[test]
    fn test_linter_names_are_validation() {
        for rule in [
            "Run eslint on JavaScript files after editing",
            "Run mypy after editing Python files",
            "Run flake8 after saving",
            "Run clippy before committing",
            "Run shellcheck on scripts after editing",
            "Run ruff check after editing",
        ] {
            assert_eq!(category(rule), RuleCategory::Validation, "{rule}");
        }
        // `ruff format` stays a formatter.
        assert_eq!(category("Run ruff format after editing"), RuleCategory::Formatting);
    }

    #[test]
    fn test_testing_file_patterns() {
        let (category, fields) = classify("Run pytest on test_*.py after saving").unwrap();
        assert_eq!(category, RuleCategory::Testing);
        assert_eq!(fields.file_pattern.as_deref(), Some("test_*.py"));
        assert_eq!(fields.extension.as_deref(), Some("py"));
        assert_eq!(fields.language.as_deref(), Some("python"));
    }

    #[test]
    fn test_quoted_command_needs_command_shape() {
        let (category, fields) = classify(r#"Run "npm run build" after editing"#).unwrap();
        assert_eq!(category, RuleCategory::ExplicitCommand);
        assert_eq!(fields.command.as_deref(), Some("npm run build"));

        // A single quoted word is not treated as a command.
        let (_, fields) = classify(r#"Format "python" files after editing"#).unwrap();
        assert_eq!(fields.command, None);
    }

    #[test]
    fn test_conditional_fields() {
        let (category, fields) =
            classify("Run npm test only if package.json exists").unwrap();
        assert_eq!(category, RuleCategory::Conditional);
        assert_eq!(fields.condition.as_deref(), Some("package.json exists"));
        assert_eq!(fields.action, Some(RuleCategory::Testing));

        let (category, fields) =
            classify("Warn the team when coverage is less than 80%").unwrap();
        assert_eq!(category, RuleCategory::Conditional);
        assert_eq!(fields.condition.as_deref(), Some("coverage is less than 80%"));
    }

    #[test]
    fn test_unrecognized_is_not_an_error() {
        assert_eq!(category("asdkjasd random text"), RuleCategory::Unrecognized);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let rule = "Validate JSON files before saving";
        assert_eq!(classify(rule).unwrap(), classify(rule).unwrap());
    }

    #[test]
    fn test_empty_and_oversized_rules_are_rejected() {
        assert!(matches!(classify(""), Err(Rule2HookError::Validation(_))));
        assert!(matches!(classify("   \t"), Err(Rule2HookError::Validation(_))));
        let long = "format ".repeat(100);
        assert!(matches!(classify(&long), Err(Rule2HookError::Validation(_))));
    }
}
