// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Native-expression engine
//!
//! Front end for the JavaScript-flavored dialect the grammar in
//! `cadscript.pest` defines. Source goes straight to the shared core;
//! the engine contributes its identity and an ergonomic alias set.

use super::core::{AliasTable, NativeCore};
use super::engine::{EngineInfo, ExecutionResult, LanguageEngine, ValidationReport};
use crate::commands::CommandHelp;
use crate::config::EngineConfig;

const INFO: EngineInfo = EngineInfo {
    id: "cadscript",
    name: "Cadscript",
    description: "Native imperative scripting dialect with variables, loops and math",
    extensions: &["cad"],
};

const ALIASES: &[(&str, &str)] = &[
    ("move", "translate"),
    ("box", "cube"),
    ("rect", "rectangle"),
    ("poly", "polygon"),
    ("circ", "circle"),
    ("linearExtrude", "linear_extrude"),
    ("rotateExtrude", "rotate_extrude"),
    ("subtract", "difference"),
    ("intersect", "intersection"),
    ("color", "set_color"),
    ("copy", "clone_object"),
    ("clone", "clone_object"),
    ("echo", "log"),
    ("print", "log"),
];

pub struct NativeEngine {
    core: NativeCore,
}

impl NativeEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            core: NativeCore::new(config, AliasTable::new(ALIASES)),
        }
    }
}

impl Default for NativeEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl LanguageEngine for NativeEngine {
    fn info(&self) -> &EngineInfo {
        &INFO
    }

    fn execute(&mut self, source: &str) -> ExecutionResult {
        tracing::debug!(engine = INFO.id, bytes = source.len(), "execute");
        self.core.execute(source)
    }

    fn validate(&self, source: &str) -> ValidationReport {
        self.core.validate(source)
    }

    fn available_commands(&self) -> Vec<String> {
        self.core.available_commands()
    }

    fn command_help(&self, name: &str) -> Option<&CommandHelp> {
        self.core.command_help(name)
    }
}
