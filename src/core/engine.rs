use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info};

use crate::builders::storage::{ConfigStore, JsonFileStore};
use crate::builders::translator::{Translation, translate};
use crate::core::config::{Configuration, HookDescriptor};
use crate::core::error::{self, Rule2HookError};
use crate::core::merge::{Conflict, merge};
use crate::core::settings::Settings;

/// How `convert` treats the existing hooks document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Merge into the stored document. When false a standalone fragment is
    /// built and nothing is read or written.
    pub merge: bool,
    /// Compute the merged document without writing it.
    pub dry_run: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            merge: true,
            dry_run: false,
        }
    }
}

/// What `convert` did.
#[derive(Debug)]
pub struct ConvertReport {
    pub translation: Translation,
    /// The merged document, or the standalone fragment without merge.
    pub config: Configuration,
    /// Whether the store was written.
    pub written: bool,
}

/// Ties the translator, the merge and a document store together.
///
/// The engine holds no configuration of its own: every call loads what it
/// needs from the store and hands back a fresh value.
pub struct HookEngine<S: ConfigStore = JsonFileStore> {
    store: S,
}

impl HookEngine<JsonFileStore> {
    /// Creates an engine over the project's hooks file.
    pub fn new(project_root: &Path, settings: &Settings) -> Self {
        Self::with_store(JsonFileStore::new(settings.hooks_path(project_root)))
    }
}

impl<S: ConfigStore> HookEngine<S> {
    pub fn with_store(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn location(&self) -> String {
        self.store.location()
    }

    /// Loads the stored document. A missing document is an empty configuration.
    pub fn load_existing(&self) -> Result<Configuration> {
        match self.store.load()? {
            Some(doc) => Configuration::from_value(doc)
                .with_context(|| format!("Existing hooks in {} are invalid", self.location())),
            None => Ok(Configuration::new()),
        }
    }

    /// Translates `rules` and, with merge enabled, merges them into the stored
    /// document.
    ///
    /// Rules that fail to translate are listed in the report and do not stop
    /// the others. Any conflict aborts the merge with
    /// [`Rule2HookError::Conflict`] and leaves the store untouched. The store
    /// is written only when merging, not a dry run, and something changed.
    pub fn convert<R: AsRef<str>>(
        &mut self,
        rules: &[R],
        options: ConvertOptions,
    ) -> Result<ConvertReport> {
        let translation = translate(rules);
        let descriptors = translation.descriptors();

        if !options.merge {
            let config = build_fragment(&descriptors)?;
            return Ok(ConvertReport {
                translation,
                config,
                written: false,
            });
        }

        let existing = self.load_existing()?;
        let merged = merge(&existing, &descriptors).map_err(Rule2HookError::Conflict)?;

        let changed = merged != existing;
        let written = changed && !options.dry_run;
        if written {
            self.store.save(&merged.to_value())?;
            info!(
                "Wrote {} hooks to {}",
                merged.hook_count() - existing.hook_count(),
                self.location()
            );
        } else {
            debug!("Not writing {} (changed: {changed}, dry run: {})", self.location(), options.dry_run);
        }

        Ok(ConvertReport {
            translation,
            config: merged,
            written,
        })
    }
}

/// Builds a standalone document holding only `descriptors`.
pub fn build_fragment(descriptors: &[HookDescriptor]) -> error::Result<Configuration> {
    merge(&Configuration::new(), descriptors).map_err(Rule2HookError::Conflict)
}

/// Checks whether `fragment` could be merged into `existing` without writing
/// anything.
///
/// Both documents are validated first; a malformed one is a `Structural`
/// error. An absent existing document cannot conflict.
///
/// # Returns
/// The conflicts a merge would report, empty when the merge would succeed.
pub fn check_fragment(existing: Option<&Value>, fragment: &Value) -> error::Result<Vec<Conflict>> {
    let incoming = Configuration::from_value(fragment.clone())?.descriptors();

    let Some(existing) = existing else {
        return Ok(Vec::new());
    };
    let existing = Configuration::from_value(existing.clone())?;

    match merge(&existing, &incoming) {
        Ok(_) => Ok(Vec::new()),
        Err(conflicts) => Ok(conflicts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::storage::MemoryStore;
    use crate::core::config::HookEvent;
    use serde_json::json;

    fn existing_black() -> Value {
        json!({
            "permissions": {"allow": ["Bash(ls)"]},
            "hooks": {"PostToolUse": [
                {"matcher": "Edit", "hooks": [{"type": "command", "command": "black {file_path}"}]}
            ]}
        })
    }

    #[test]
    fn test_convert_into_empty_store_writes_once() {
        let mut engine = HookEngine::with_store(MemoryStore::new());
        let report = engine
            .convert(
                &["Format Python files with black after editing", "Run git status when finishing a task"],
                ConvertOptions::default(),
            )
            .unwrap();

        assert!(report.written);
        assert_eq!(engine.store().saves(), 1);
        assert_eq!(report.config.hook_count(), 2);
        let stored = engine.store().document().unwrap();
        assert_eq!(stored["hooks"]["Stop"][0]["hooks"][0]["command"], "git status");
    }

    #[test]
    fn test_convert_keeps_unrelated_keys() {
        let mut engine = HookEngine::with_store(MemoryStore::with_document(existing_black()));
        engine
            .convert(&["Run git status when finishing a task"], ConvertOptions::default())
            .unwrap();

        let stored = engine.store().document().unwrap();
        assert_eq!(stored["permissions"], json!({"allow": ["Bash(ls)"]}));
        assert_eq!(stored["hooks"]["PostToolUse"][0]["matcher"], "Edit");
    }

    #[test]
    fn test_duplicate_rule_writes_nothing() {
        let mut engine = HookEngine::with_store(MemoryStore::with_document(existing_black()));
        let report = engine
            .convert(&["Format Python files with black after editing"], ConvertOptions::default())
            .unwrap();
        assert!(!report.written);
        assert_eq!(engine.store().saves(), 0);
    }

    #[test]
    fn test_conflict_aborts_and_keeps_store() {
        let mut engine = HookEngine::with_store(MemoryStore::with_document(existing_black()));
        let err = engine
            .convert(
                &["Run `autopep8 {file_path}` after editing", "Run git status when finishing a task"],
                ConvertOptions::default(),
            )
            .unwrap_err();

        let conflicts = err.downcast_ref::<Rule2HookError>().unwrap().conflicts();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].existing_command, "black {file_path}");
        assert_eq!(conflicts[0].new_command, "autopep8 {file_path}");
        assert_eq!(engine.store().saves(), 0);
        assert_eq!(engine.store().document(), Some(&existing_black()));
    }

    #[test]
    fn test_dry_run_does_not_write() {
        let mut engine = HookEngine::with_store(MemoryStore::new());
        let report = engine
            .convert(
                &["Run git status when finishing a task"],
                ConvertOptions { merge: true, dry_run: true },
            )
            .unwrap();
        assert!(!report.written);
        assert_eq!(report.config.groups(&HookEvent::Stop).len(), 1);
        assert!(engine.store().document().is_none());
    }

    #[test]
    fn test_without_merge_builds_a_fragment() {
        let mut engine = HookEngine::with_store(MemoryStore::with_document(existing_black()));
        let report = engine
            .convert(
                &["Run `autopep8 {file_path}` after editing"],
                ConvertOptions { merge: false, dry_run: false },
            )
            .unwrap();

        assert!(!report.written);
        assert!(report.config.extra.is_empty());
        assert_eq!(report.config.hook_count(), 1);
        assert_eq!(engine.store().saves(), 0);
    }

    #[test]
    fn test_malformed_store_is_reported() {
        let mut engine = HookEngine::with_store(MemoryStore::with_document(json!({"hooks": []})));
        let err = engine
            .convert(&["Run git status when finishing a task"], ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Rule2HookError>(),
            Some(Rule2HookError::Structural(_))
        ));
    }

    #[test]
    fn test_check_fragment() {
        let fragment = json!({"hooks": {"PostToolUse": [
            {"matcher": "Edit", "hooks": [{"type": "command", "command": "autopep8 {file_path}"}]}
        ]}});

        let conflicts = check_fragment(Some(&existing_black()), &fragment).unwrap();
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].matcher, "Edit");

        assert!(check_fragment(None, &fragment).unwrap().is_empty());
        assert!(check_fragment(Some(&existing_black()), &existing_black()).unwrap().is_empty());
        assert!(matches!(
            check_fragment(None, &json!({"nope": 1})),
            Err(Rule2HookError::Structural(_))
        ));
    }
}
