use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::builders::validator::{ConfigValidator, StandardValidator};
use crate::core::error::{Result, Rule2HookError};

/// Literal token the consuming host replaces with the path of the touched file.
/// The core never substitutes it.
pub const FILE_PATH_PLACEHOLDER: &str = "{file_path}";

/// Trigger point in the host's execution lifecycle.
///
/// Names are compared case-sensitively against the host vocabulary. Anything
/// outside the known set is kept verbatim as `Custom` so documents written by
/// newer hosts survive a load/save cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HookEvent {
    /// Runs before a tool is executed
    PreToolUse,
    /// Runs after a tool completes successfully
    PostToolUse,
    /// Runs when the host sends a notification
    Notification,
    /// Runs when the host finishes responding
    Stop,
    /// Event name outside the known vocabulary
    Custom(String),
}

impl HookEvent {
    /// The events the host is known to emit.
    pub const KNOWN: [HookEvent; 4] = [
        HookEvent::PreToolUse,
        HookEvent::PostToolUse,
        HookEvent::Notification,
        HookEvent::Stop,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            HookEvent::PreToolUse => "PreToolUse",
            HookEvent::PostToolUse => "PostToolUse",
            HookEvent::Notification => "Notification",
            HookEvent::Stop => "Stop",
            HookEvent::Custom(name) => name,
        }
    }

    pub fn is_known(&self) -> bool {
        Self::KNOWN.contains(self)
    }
}

impl From<String> for HookEvent {
    fn from(name: String) -> Self {
        match name.as_str() {
            "PreToolUse" => HookEvent::PreToolUse,
            "PostToolUse" => HookEvent::PostToolUse,
            "Notification" => HookEvent::Notification,
            "Stop" => HookEvent::Stop,
            _ => HookEvent::Custom(name),
        }
    }
}

impl From<HookEvent> for String {
    fn from(event: HookEvent) -> Self {
        event.as_str().to_string()
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The only entry kind the host runs: a shell command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookKind {
    #[default]
    Command,
}

/// One `{"type": "command", "command": ...}` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookCommandEntry {
    #[serde(rename = "type")]
    pub kind: HookKind,
    /// Opaque shell text, possibly containing [`FILE_PATH_PLACEHOLDER`].
    pub command: String,
    /// Optional host timeout in seconds, preserved as found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl HookCommandEntry {
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            kind: HookKind::Command,
            command: command.into(),
            timeout: None,
        }
    }
}

/// A matcher plus the commands run, in order, when it matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookGroup {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub matcher: String,
    pub hooks: Vec<HookCommandEntry>,
}

/// A single proposed hook: the unit the translator produces and the merge consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookDescriptor {
    pub event: HookEvent,
    pub matcher: String,
    pub entry: HookCommandEntry,
}

impl HookDescriptor {
    pub fn new(event: HookEvent, matcher: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            event,
            matcher: matcher.into(),
            entry: HookCommandEntry::command(command),
        }
    }
}

/// In-memory form of a hooks document.
///
/// Top-level keys other than `hooks` are carried in `extra` so that a host
/// settings file keeps its unrelated sections when written back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub hooks: IndexMap<HookEvent, Vec<HookGroup>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from a raw document, running the structural
    /// checks first. Any reported error becomes a `Structural` error.
    pub fn from_value(doc: Value) -> Result<Self> {
        let report = StandardValidator::new().validate_document(&doc);
        if !report.is_ok() {
            return Err(Rule2HookError::Structural(report.errors));
        }
        serde_json::from_value(doc).map_err(|e| Rule2HookError::Structural(vec![e.to_string()]))
    }

    pub fn to_value(&self) -> Value {
        // A struct of maps, strings and integers always serializes.
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    pub fn groups(&self, event: &HookEvent) -> &[HookGroup] {
        self.hooks.get(event).map(Vec::as_slice).unwrap_or_default()
    }

    /// Flattens the document into descriptors, one per command entry, in
    /// document order. Used to treat a fragment document as incoming hooks.
    pub fn descriptors(&self) -> Vec<HookDescriptor> {
        self.hooks
            .iter()
            .flat_map(|(event, groups)| {
                groups.iter().flat_map(move |group| {
                    group.hooks.iter().map(move |entry| HookDescriptor {
                        event: event.clone(),
                        matcher: group.matcher.clone(),
                        entry: entry.clone(),
                    })
                })
            })
            .collect()
    }

    pub fn hook_count(&self) -> usize {
        self.hooks
            .values()
            .flat_map(|groups| groups.iter())
            .map(|group| group.hooks.len())
            .sum()
    }
}
