// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Engine contract shared by every language front end
//!
//! `execute` and `validate` never panic and never return a Rust `Err`
//! for malformed source: all failure is data in the result envelope.

use crate::commands::{CommandHelp, ExportRequest};
use crate::error::ScriptError;
use crate::object::CadObject;
use serde::Serialize;

/// Static identity of a language front end.
#[derive(Debug, Clone, Serialize)]
pub struct EngineInfo {
    /// Stable id used to select the engine (`cadscript`, `openscad`).
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    /// File extensions (without the dot) this engine claims.
    pub extensions: &'static [&'static str],
}

/// Outcome of one `execute` call.
///
/// On success `objects` holds the flattened scene. On failure the
/// accumulated geometry is discarded but `logs` written before the fault
/// are kept.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub objects: Vec<CadObject>,
    pub error: Option<ScriptError>,
    pub logs: Vec<String>,
    pub exports: Vec<ExportRequest>,
}

impl ExecutionResult {
    pub(crate) fn completed(
        objects: Vec<CadObject>,
        logs: Vec<String>,
        exports: Vec<ExportRequest>,
    ) -> Self {
        Self {
            success: true,
            objects,
            error: None,
            logs,
            exports,
        }
    }

    pub(crate) fn failed(error: ScriptError, logs: Vec<String>) -> Self {
        Self {
            success: false,
            objects: Vec::new(),
            error: Some(error),
            logs,
            exports: Vec::new(),
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

/// One problem found by `validate`, with a best-effort 1-based position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub message: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl ValidationIssue {
    pub(crate) fn from_error(error: &ScriptError) -> Self {
        Self {
            message: error.to_string(),
            line: error.line(),
            column: error.column(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub(crate) fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
        }
    }

    pub(crate) fn invalid(error: &ScriptError) -> Self {
        Self {
            valid: false,
            errors: vec![ValidationIssue::from_error(error)],
        }
    }
}

/// A language front end over the shared command layer.
pub trait LanguageEngine {
    fn info(&self) -> &EngineInfo;

    /// Run a script and return the full result envelope.
    fn execute(&mut self, source: &str) -> ExecutionResult;

    /// Check a script without building any geometry.
    fn validate(&self, source: &str) -> ValidationReport;

    /// Canonical command names plus this engine's aliases, sorted.
    fn available_commands(&self) -> Vec<String>;

    /// Help for a command; alias names resolve to their canonical entry.
    fn command_help(&self, name: &str) -> Option<&CommandHelp>;
}
