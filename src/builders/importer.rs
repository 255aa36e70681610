use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::core::error::{self, Rule2HookError};
use crate::core::settings::Settings;

/// Longest rule string accepted in one batch.
pub const MAX_TOTAL_LENGTH: usize = 5000;

/// A rule found in a notes file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedRule {
    pub source: PathBuf,
    pub rule: String,
}

/// A trait that defines the behavior for importing rules from a source.
///
/// This trait allows for different importers (markdown notes, plain lists) to
/// be used interchangeably by the scanner.
pub trait RuleImporter {
    /// Reads rules out of a file.
    ///
    /// # Arguments
    /// * `path`: The file to read.
    ///
    /// # Returns
    /// The rules in file order, markers stripped.
    fn import_from_file(&self, path: &Path) -> Result<Vec<String>>;
}

/// Reads rules from markdown notes files.
///
/// A heading whose text mentions "rules" opens a rules section and any other
/// heading closes it. Inside a section every bullet (`-`, `*`) or numbered
/// item (`1.`, `2)`) is one rule.
pub struct NotesImporter;

impl Default for NotesImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleImporter for NotesImporter {
    fn import_from_file(&self, path: &Path) -> Result<Vec<String>> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read notes file {}", path.display()))?;
        Ok(self.parse_rules_section(&content))
    }
}

impl NotesImporter {
    pub fn new() -> Self {
        Self
    }

    /// Extracts the rules from markdown content.
    pub fn parse_rules_section(&self, content: &str) -> Vec<String> {
        let mut rules = Vec::new();
        let mut in_rules_section = false;

        for line in content.lines() {
            let line = line.trim();

            if line.starts_with('#') {
                in_rules_section = line.to_lowercase().contains("rules");
                continue;
            }
            if !in_rules_section {
                continue;
            }

            if let Some(rule) = list_item(line)
                && !rule.is_empty()
            {
                rules.push(rule.to_string());
            }
        }

        rules
    }
}

/// Returns the text of a markdown list item, without its marker.
fn list_item(line: &str) -> Option<&str> {
    // A marker only counts when followed by whitespace, so `---` and `**bold**` are not items.
    let rest = match line.strip_prefix('-').or_else(|| line.strip_prefix('*')) {
        Some(rest) => rest,
        None => {
            let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits == 0 {
                return None;
            }
            line[digits..]
                .strip_prefix('.')
                .or_else(|| line[digits..].strip_prefix(')'))?
        }
    };

    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(rest.trim())
}

/// Collects the rules from every configured notes file that exists.
///
/// Missing files are skipped; an unreadable file is an error.
pub fn scan_project(project_root: &Path, settings: &Settings) -> Result<Vec<ScannedRule>> {
    let importer = NotesImporter::new();
    let mut scanned = Vec::new();

    for path in settings.notes_paths(project_root) {
        if !path.is_file() {
            debug!("Notes file {} not found", path.display());
            continue;
        }

        let rules = importer.import_from_file(&path)?;
        info!("Found {} rules in {}", rules.len(), path.display());
        scanned.extend(rules.into_iter().map(|rule| ScannedRule {
            source: path.clone(),
            rule,
        }));
    }

    Ok(scanned)
}

/// Splits a rule string into individual rules on `,` and `;`.
///
/// Separators inside backticks or double quotes do not split, so an explicit
/// command such as `` `cargo fmt; cargo clippy` `` stays in one rule. Pieces
/// are trimmed and empty ones dropped.
pub fn split_rules(text: &str) -> error::Result<Vec<String>> {
    let text = text.trim();
    if text.chars().count() > MAX_TOTAL_LENGTH {
        return Err(Rule2HookError::Validation(format!(
            "rules exceed maximum length of {MAX_TOTAL_LENGTH} characters"
        )));
    }

    let mut rules = Vec::new();
    let mut current = String::new();
    let mut in_backticks = false;
    let mut in_quotes = false;

    for c in text.chars() {
        match c {
            '`' if !in_quotes => in_backticks = !in_backticks,
            '"' if !in_backticks => in_quotes = !in_quotes,
            ',' | ';' if !in_backticks && !in_quotes => {
                push_rule(&mut rules, &current);
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    push_rule(&mut rules, &current);

    if rules.is_empty() {
        return Err(Rule2HookError::Validation(
            "no rules found in input".to_string(),
        ));
    }
    Ok(rules)
}

fn push_rule(rules: &mut Vec<String>, piece: &str) {
    let piece = piece.trim();
    if !piece.is_empty() {
        rules.push(piece.to_string());
    }
}
