//! All-or-nothing merge of proposed hooks into an existing configuration.
//!
//! `(event, matcher)` is the identity key. Matchers are compared exactly:
//! case-sensitive, no trimming, no pattern semantics. Callers normalize
//! matcher text before calling [`merge`].

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use crate::core::config::{Configuration, HookDescriptor, HookEvent, HookGroup};

/// A proposed command that would sit beside a different command under an
/// `(event, matcher)` pair the existing configuration already uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conflict {
    pub event: HookEvent,
    pub matcher: String,
    /// First command already configured under the pair.
    pub existing_command: String,
    pub new_command: String,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]: existing \"{}\", incoming \"{}\"",
            self.event, self.matcher, self.existing_command, self.new_command
        )
    }
}

/// Commands already present per `(event, matcher)`, in document order.
struct CommandIndex<'a> {
    commands: HashMap<&'a HookEvent, HashMap<&'a str, Vec<&'a str>>>,
}

impl<'a> CommandIndex<'a> {
    fn build(config: &'a Configuration) -> Self {
        let mut commands: HashMap<&HookEvent, HashMap<&str, Vec<&str>>> = HashMap::new();
        for (event, groups) in &config.hooks {
            let by_matcher = commands.entry(event).or_default();
            for group in groups {
                by_matcher
                    .entry(group.matcher.as_str())
                    .or_default()
                    .extend(group.hooks.iter().map(|entry| entry.command.as_str()));
            }
        }
        Self { commands }
    }

    /// Commands under the pair, or `None` when the pair carries no command.
    fn lookup(&self, event: &HookEvent, matcher: &str) -> Option<&[&'a str]> {
        self.commands
            .get(event)
            .and_then(|by_matcher| by_matcher.get(matcher))
            .filter(|commands| !commands.is_empty())
            .map(Vec::as_slice)
    }
}

/// Merges `incoming` into a copy of `existing`.
///
/// Returns every conflict found and leaves `existing` untouched if there is
/// at least one. Otherwise the returned configuration keeps all existing
/// groups as they were, drops incoming commands that exactly duplicate an
/// existing one, and appends the rest to new groups placed after the existing
/// groups of the same event. Incoming descriptors are never checked against
/// each other: two that share a key land in the same new group in input order.
pub fn merge(
    existing: &Configuration,
    incoming: &[HookDescriptor],
) -> Result<Configuration, Vec<Conflict>> {
    let index = CommandIndex::build(existing);
    let mut conflicts = Vec::new();
    let mut insertions = Vec::new();

    for descriptor in incoming {
        match index.lookup(&descriptor.event, &descriptor.matcher) {
            None => insertions.push(descriptor),
            Some(commands) if commands.contains(&descriptor.entry.command.as_str()) => {
                debug!(
                    "Skipping duplicate hook {} [{}]: {}",
                    descriptor.event, descriptor.matcher, descriptor.entry.command
                );
            }
            Some(commands) => {
                let conflict = Conflict {
                    event: descriptor.event.clone(),
                    matcher: descriptor.matcher.clone(),
                    existing_command: commands.first().copied().unwrap_or_default().to_string(),
                    new_command: descriptor.entry.command.clone(),
                };
                warn!("Hook conflict: {conflict}");
                conflicts.push(conflict);
            }
        }
    }

    if !conflicts.is_empty() {
        return Err(conflicts);
    }

    let mut merged = existing.clone();
    // Position of each group created by this merge, keyed like the index.
    let mut created: HashMap<(HookEvent, String), usize> = HashMap::new();

    for descriptor in insertions {
        let groups = merged.hooks.entry(descriptor.event.clone()).or_default();
        let key = (descriptor.event.clone(), descriptor.matcher.clone());

        match created.get(&key) {
            Some(&position) => {
                let group = &mut groups[position];
                if group.hooks.iter().any(|e| e.command == descriptor.entry.command) {
                    continue;
                }
                group.hooks.push(descriptor.entry.clone());
            }
            None => {
                // An existing group without commands is filled in place.
                let empty = groups
                    .iter()
                    .position(|group| group.matcher == descriptor.matcher && group.hooks.is_empty());
                let position = match empty {
                    Some(position) => {
                        groups[position].hooks.push(descriptor.entry.clone());
                        position
                    }
                    None => {
                        groups.push(HookGroup {
                            matcher: descriptor.matcher.clone(),
                            hooks: vec![descriptor.entry.clone()],
                        });
                        groups.len() - 1
                    }
                };
                created.insert(key, position);
            }
        }
        debug!(
            "Added hook {} [{}]: {}",
            descriptor.event, descriptor.matcher, descriptor.entry.command
        );
    }

    Ok(merged)
}
