// This file is the module declaration file for the `core` module.
// It declares the submodules in `src/core/` and makes them public so the
// binary, the `utils` handlers and the integration tests can reach them.

// `config` module:
// The typed hooks document: events, matchers, command entries and groups,
// plus the `Configuration` value that keeps unrelated top-level keys intact.
// Raw JSON is validated at this boundary before it becomes typed.
pub mod config;

// `engine` module:
// Orchestration. `HookEngine` runs a rule batch through the translator,
// merges the result into the stored document and decides whether to write.
// `check_fragment` is the dry-run merge used by `validate`.
pub mod engine;

// `error` module:
// The typed error taxonomy shared by the classifier, the synthesizer, the
// merge and the validator boundary.
pub mod error;

// `merge` module:
// All-or-nothing merge of proposed hooks into an existing configuration,
// with full conflict detail when a key already carries another command.
pub mod merge;

// `settings` module:
// The tool's own settings file (`.claude/rule2hook.toml`) and the
// `SettingsProvider` trait with its file-backed `SettingsManager`.
pub mod settings;
