use anyhow::{Context, Result};
use serde_json::Value;

use crate::builders::importer::ScannedRule;
use crate::builders::translator::{Translation, TranslationStatus};
use crate::builders::validator::{HookSummary, ValidationResult};
use crate::core::merge::Conflict;

/// Commands longer than this are shortened in summaries.
const SUMMARY_COMMAND_WIDTH: usize = 50;

/// Presents results to the user.
///
/// Every method only formats and prints; none of them decide exit codes or
/// touch any file.
pub trait Reporter {
    fn report_translation(&self, translation: &Translation);
    fn report_conflicts(&self, conflicts: &[Conflict]);
    fn report_validation(&self, location: &str, result: &ValidationResult);
    fn report_scan(&self, rules: &[ScannedRule]);
    fn report_document(&self, doc: &Value) -> Result<()>;
}

/// A concrete implementation of `Reporter` that prints to the console.
pub struct ConsoleReporter;

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleReporter {
    /// Constructs a new `ConsoleReporter` instance.
    pub fn new() -> Self {
        Self
    }

    /// Formats one line of the hooks summary.
    ///
    /// An empty matcher is shown as "All tools" and long commands are cut to
    /// 50 characters followed by "...".
    fn format_summary_line(&self, summary: &HookSummary) -> String {
        let matcher = if summary.matcher.is_empty() {
            "All tools"
        } else {
            summary.matcher.as_str()
        };
        format!(
            "{} [{}]: {}",
            summary.event,
            matcher,
            truncate(&summary.command, SUMMARY_COMMAND_WIDTH)
        )
    }
}

impl Reporter for ConsoleReporter {
    fn report_translation(&self, translation: &Translation) {
        let icon = match translation.status() {
            TranslationStatus::Success => "✅",
            TranslationStatus::Partial => "⚠️ ",
            TranslationStatus::Error => "❌",
        };
        println!(
            "{icon} Converted {} of {} rules ({})",
            translation.converted.len(),
            translation.converted.len() + translation.failures.len(),
            translation.status()
        );

        for converted in &translation.converted {
            println!("  📝 {} ({})", converted.rule, converted.category);
            for descriptor in &converted.descriptors {
                println!(
                    "     → {} [{}]: {}",
                    descriptor.event, descriptor.matcher, descriptor.entry.command
                );
            }
        }
        for failure in &translation.failures {
            println!("  ❌ {}: {}", failure.rule, failure.error);
        }
    }

    fn report_conflicts(&self, conflicts: &[Conflict]) {
        if conflicts.is_empty() {
            println!("✅ No conflicts detected.");
            return;
        }

        println!("⚠️  Found {} conflict(s); nothing was written:", conflicts.len());
        for conflict in conflicts {
            println!("  - {} [{}]", conflict.event, conflict.matcher);
            println!("      existing: {}", conflict.existing_command);
            println!("      new:      {}", conflict.new_command);
        }
    }

    fn report_validation(&self, location: &str, result: &ValidationResult) {
        if result.is_ok() {
            println!("✓ {location} is valid ({} hooks).", result.hook_count);
        } else {
            println!("❌ {location} has {} error(s):", result.errors.len());
            for error in &result.errors {
                println!("  - {error}");
            }
        }

        for warning in &result.warnings {
            println!("  ⚠️  {warning}");
        }

        if !result.summary.is_empty() {
            println!("\n📋 Hooks:");
            for summary in &result.summary {
                println!("  {}", self.format_summary_line(summary));
            }
        }
    }

    fn report_scan(&self, rules: &[ScannedRule]) {
        if rules.is_empty() {
            println!("No rules found in notes files.");
            return;
        }

        let mut current = None;
        for scanned in rules {
            if current != Some(&scanned.source) {
                println!("\n📁 {}", scanned.source.display());
                current = Some(&scanned.source);
            }
            println!("  - {}", scanned.rule);
        }
        println!("\nFound {} rule(s).", rules.len());
    }

    fn report_document(&self, doc: &Value) -> Result<()> {
        let rendered = serde_json::to_string_pretty(doc).context("Failed to render hooks JSON")?;
        println!("{rendered}");
        Ok(())
    }
}

/// Cuts `text` to `width` characters, appending "..." when anything was cut.
fn truncate(text: &str, width: usize) -> String {
    match text.char_indices().nth(width) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}
