// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Shared evaluation core
//!
//! Both engines funnel into the same path: reset the workspace, parse
//! the native dialect, interpret, materialize and flatten. Engines
//! differ only in their alias table and in what they do to the source
//! text before it reaches [`NativeCore::execute`].

use super::engine::{ExecutionResult, ValidationReport};
use super::evaluator::Evaluator;
use super::parser;
use crate::commands::{CommandHelp, CommandRegistry, Workspace};
use crate::config::EngineConfig;
use crate::object;
use std::collections::HashMap;

/// Synonym map resolved before command dispatch.
///
/// Immutable after construction. Lookups that miss fall through to the
/// name itself, so canonical names always resolve.
pub(crate) struct AliasTable {
    map: HashMap<&'static str, &'static str>,
}

impl AliasTable {
    pub fn new(pairs: &[(&'static str, &'static str)]) -> Self {
        Self {
            map: pairs.iter().copied().collect(),
        }
    }

    pub fn resolve<'a>(&self, name: &'a str) -> &'a str {
        self.map.get(name).copied().unwrap_or(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.map.keys().copied()
    }
}

/// The evaluation pipeline an engine owns.
///
/// The registry, alias table and config never change after
/// construction; the workspace is fully reset at the start of every
/// `execute` so no geometry leaks between runs.
pub(crate) struct NativeCore {
    registry: CommandRegistry,
    aliases: AliasTable,
    config: EngineConfig,
    workspace: Workspace,
}

impl NativeCore {
    pub fn new(config: EngineConfig, aliases: AliasTable) -> Self {
        let workspace = Workspace::new(&config);
        Self {
            registry: CommandRegistry::standard(),
            aliases,
            config,
            workspace,
        }
    }

    /// Run native-dialect source to completion.
    ///
    /// Never panics and never propagates an error: every fault becomes
    /// a failure envelope. A failed run discards accumulated geometry
    /// and export requests but keeps the log lines written before the
    /// fault.
    pub fn execute(&mut self, source: &str) -> ExecutionResult {
        self.workspace.reset();
        let script = match parser::parse(source) {
            Ok(script) => script,
            Err(error) => {
                tracing::debug!(%error, "parse failed");
                return ExecutionResult::failed(error, Vec::new());
            }
        };

        let evaluator = Evaluator::new(
            &self.registry,
            &self.aliases,
            &mut self.workspace,
            &self.config,
        );
        if let Err(error) = evaluator.run(&script) {
            tracing::debug!(%error, "evaluation failed");
            return ExecutionResult::failed(error, self.workspace.take_logs());
        }

        let objects = object::flatten(&self.workspace.materialize_roots());
        tracing::debug!(objects = objects.len(), "script completed");
        ExecutionResult::completed(
            objects,
            self.workspace.take_logs(),
            self.workspace.take_exports(),
        )
    }

    /// Syntax check without building any geometry.
    pub fn validate(&self, source: &str) -> ValidationReport {
        match parser::parse(source) {
            Ok(_) => ValidationReport::ok(),
            Err(error) => ValidationReport::invalid(&error),
        }
    }

    /// Canonical command names plus this core's aliases, sorted.
    pub fn available_commands(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.names().map(str::to_string).collect();
        names.extend(self.aliases.names().map(str::to_string));
        names.sort_unstable();
        names
    }

    pub fn command_help(&self, name: &str) -> Option<&CommandHelp> {
        let canonical = self.aliases.resolve(name);
        self.registry.get(canonical).map(|command| &command.help)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> NativeCore {
        NativeCore::new(
            EngineConfig::default(),
            AliasTable::new(&[("box", "cube"), ("move", "translate")]),
        )
    }

    #[test]
    fn test_alias_resolution_falls_through() {
        let aliases = AliasTable::new(&[("box", "cube")]);
        assert_eq!(aliases.resolve("box"), "cube");
        assert_eq!(aliases.resolve("cube"), "cube");
        assert_eq!(aliases.resolve("unknown"), "unknown");
    }

    #[test]
    fn test_execute_success_flattens_accumulator() {
        let mut core = core();
        let result = core.execute("union(cube(), sphere());");
        assert!(result.success);
        let kinds: Vec<_> = result.objects.iter().map(|o| o.kind_name()).collect();
        assert_eq!(kinds, vec!["cube", "sphere"]);
    }

    #[test]
    fn test_execute_failure_keeps_logs_and_drops_geometry() {
        let mut core = core();
        let result = core.execute("cube(); log(\"checkpoint\"); nonsense();");
        assert!(!result.success);
        assert!(result.objects.is_empty());
        assert_eq!(result.logs, vec!["checkpoint".to_string()]);
        assert!(result.error_message().unwrap().contains("nonsense"));
    }

    #[test]
    fn test_sequential_runs_do_not_leak_state() {
        let mut core = core();
        let first = core.execute("cube(); cube();");
        assert_eq!(first.objects.len(), 2);
        let second = core.execute("sphere();");
        assert_eq!(second.objects.len(), 1);
        assert_eq!(second.objects[0].kind_name(), "sphere");
    }

    #[test]
    fn test_aliases_dispatch_to_canonical_commands() {
        let mut core = core();
        let result = core.execute("move(box(2), [1, 0, 0]);");
        assert!(result.success);
        assert_eq!(result.objects[0].kind_name(), "cube");
    }

    #[test]
    fn test_available_commands_include_aliases() {
        let core = core();
        let commands = core.available_commands();
        assert!(commands.contains(&"box".to_string()));
        assert!(commands.contains(&"cube".to_string()));
        let mut sorted = commands.clone();
        sorted.sort_unstable();
        assert_eq!(commands, sorted);
    }

    #[test]
    fn test_command_help_resolves_aliases() {
        let core = core();
        let direct = core.command_help("cube").unwrap();
        let via_alias = core.command_help("box").unwrap();
        assert_eq!(direct.syntax, via_alias.syntax);
        assert!(core.command_help("nope").is_none());
    }
}
