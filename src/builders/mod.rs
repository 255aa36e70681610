// This file is the module declaration file for the `builders` module.
// It declares and makes public the sub-modules that turn text into hooks and
// move hook documents in and out of files.

// `importer` module:
// Reads rules out of markdown notes files (`CLAUDE.md` and friends) and
// splits a comma/semicolon separated rule string into single rules.
pub mod importer;

// `patterns` module:
// The rule classifier. An ordered list of pattern rules decides the category
// of a rule, and a set of regular expressions extracts the trigger phrase,
// language, tools and any quoted command.
pub mod patterns;

// `reporter` module:
// Human-readable output for conversions, conflicts, validation results and
// scanned rules.
pub mod reporter;

// `storage` module:
// The `ConfigStore` trait with a JSON file implementation that writes
// atomically and an in-memory one for tests.
pub mod storage;

// `synthesizer` module:
// Turns a classified rule into hook descriptors: event from the trigger,
// matcher from the tools involved, command from a template.
pub mod synthesizer;

// `translator` module:
// Batch translation that isolates failing rules instead of aborting.
pub mod translator;

// `validator` module:
// Structural checks of a raw hooks document, reporting every problem found.
pub mod validator;
