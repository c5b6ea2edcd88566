// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Command registration and dispatch

use super::builtins;
use super::workspace::Workspace;
use crate::error::ScriptError;
use crate::lang::Value;
use serde::Serialize;
use std::collections::BTreeMap;

/// Handler signature shared by every command.
pub type CommandFn = fn(&mut Workspace, &[Value]) -> Result<Value, ScriptError>;

/// A registered command: dispatch entry plus its help record.
pub struct Command {
    pub name: &'static str,
    pub help: CommandHelp,
    pub run: CommandFn,
}

/// Help record for one command, stable enough for tooling to render.
#[derive(Debug, Clone, Serialize)]
pub struct CommandHelp {
    pub description: &'static str,
    pub syntax: &'static str,
    pub parameters: &'static [ParameterHelp],
    pub example: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterHelp {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub description: &'static str,
    pub optional: bool,
}

/// Name-keyed command table with deterministic iteration order.
pub struct CommandRegistry {
    commands: BTreeMap<&'static str, Command>,
}

impl CommandRegistry {
    pub fn empty() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    /// The full built-in command set.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        builtins::install(&mut registry);
        registry
    }

    pub fn register(&mut self, command: Command) {
        self.commands.insert(command.name, command);
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Canonical command names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_has_full_catalog() {
        let registry = CommandRegistry::standard();
        for name in [
            "cube",
            "sphere",
            "cylinder",
            "rectangle",
            "circle",
            "polygon",
            "arc",
            "line",
            "linear_extrude",
            "rotate_extrude",
            "offset",
            "fillet",
            "chamfer",
            "union",
            "difference",
            "intersection",
            "translate",
            "rotate",
            "scale",
            "set_color",
            "clone_object",
            "log",
            "export",
        ] {
            assert!(registry.contains(name), "missing command {name}");
        }
    }

    #[test]
    fn test_names_are_sorted() {
        let registry = CommandRegistry::standard();
        let names: Vec<_> = registry.names().collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_every_command_documents_itself() {
        let registry = CommandRegistry::standard();
        for name in registry.names() {
            let help = &registry.get(name).unwrap().help;
            assert!(!help.description.is_empty(), "{name} has no description");
            assert!(!help.syntax.is_empty(), "{name} has no syntax");
            assert!(!help.example.is_empty(), "{name} has no example");
        }
    }
}
