use anyhow::{Context, Result, bail};
use std::path::Path;
use tracing::debug;

use crate::builders::importer::{scan_project, split_rules};
use crate::builders::reporter::{ConsoleReporter, Reporter};
use crate::builders::storage::{ConfigStore, JsonFileStore};
use crate::builders::translator::TranslationStatus;
use crate::builders::validator::validate;
use crate::core::engine::{ConvertOptions, HookEngine, check_fragment};
use crate::core::error::Rule2HookError;
use crate::core::settings::{SettingsManager, SettingsProvider};

pub mod logging;

/// Flags of the `convert` command.
#[derive(Debug, Clone, Default)]
pub struct ConvertRequest {
    /// Comma/semicolon separated rules given on the command line.
    pub rules: Option<String>,
    pub from_notes: bool,
    pub no_merge: bool,
    pub dry_run: bool,
}

pub fn initialize_project(project: &Path) -> Result<()> {
    let manager = SettingsManager::new(project);
    if manager.initialize()? {
        println!("✓ Created {}", manager.settings_path().display());
    } else {
        println!("✓ {} already exists", manager.settings_path().display());
    }
    println!("Run 'rule2hook convert \"<rules>\"' to generate hooks");
    Ok(())
}

/// Converts rules from the command line and/or the project's notes files.
///
/// Fails when no rule could be converted or when the merge hit a conflict;
/// in both cases the hooks file is left as it was.
pub fn convert_rules(project: &Path, request: &ConvertRequest) -> Result<()> {
    let manager = SettingsManager::new(project);
    let settings = manager.load_settings()?;
    let reporter = ConsoleReporter::new();

    let mut rules = match request.rules.as_deref() {
        Some(text) => split_rules(text)?,
        None => Vec::new(),
    };
    if request.from_notes {
        rules.extend(scan_project(project, &settings)?.into_iter().map(|scanned| scanned.rule));
    }
    if rules.is_empty() {
        bail!("No rules given. Pass a rule string or use --from-notes.");
    }
    debug!("Converting {} rules", rules.len());

    let options = ConvertOptions {
        merge: settings.merge && !request.no_merge,
        dry_run: request.dry_run,
    };
    let mut engine = HookEngine::new(project, &settings);

    let report = match engine.convert(&rules, options) {
        Ok(report) => report,
        Err(err) => {
            if let Some(error @ Rule2HookError::Conflict(conflicts)) = err.downcast_ref::<Rule2HookError>() {
                reporter.report_conflicts(conflicts);
                bail!("{error}. Resolve them in {} and retry.", engine.location());
            }
            return Err(err);
        }
    };

    reporter.report_translation(&report.translation);
    if report.translation.status() == TranslationStatus::Error {
        bail!("No rules could be converted");
    }

    if report.written {
        println!("✓ Updated {}", engine.location());
    } else {
        if options.merge {
            println!("No changes written to {}", engine.location());
        }
        reporter.report_document(&report.config.to_value())?;
    }
    Ok(())
}

/// Validates a hooks document, or checks a fragment against it.
pub fn validate_files(config: &Path, fragment: Option<&Path>) -> Result<()> {
    let reporter = ConsoleReporter::new();
    let existing = JsonFileStore::new(config).load()?;

    let Some(fragment) = fragment else {
        let doc = existing.with_context(|| format!("{} does not exist", config.display()))?;
        let result = validate(&doc);
        reporter.report_validation(&config.display().to_string(), &result);
        if !result.is_ok() {
            bail!("Validation failed for {}", config.display());
        }
        return Ok(());
    };

    let fragment_doc = JsonFileStore::new(fragment)
        .load()?
        .with_context(|| format!("{} does not exist", fragment.display()))?;

    let conflicts = check_fragment(existing.as_ref(), &fragment_doc)?;
    reporter.report_conflicts(&conflicts);
    if !conflicts.is_empty() {
        bail!("{}", Rule2HookError::Conflict(conflicts));
    }
    Ok(())
}

pub fn scan_rules(project: &Path) -> Result<()> {
    let settings = SettingsManager::new(project).load_settings()?;
    let rules = scan_project(project, &settings)?;
    ConsoleReporter::new().report_scan(&rules);
    Ok(())
}
