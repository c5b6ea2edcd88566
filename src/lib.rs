// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Cadscript
//!
//! A multi-language CAD scripting engine. Scripts in a native
//! JavaScript-flavored dialect or in OpenSCAD syntax evaluate against a
//! shared command library into a parametric scene graph that viewers
//! and exporters consume as flat, self-contained object records.
//!
//! Engines are hard fault boundaries: `execute` and `validate` return
//! every failure as data and never panic across the host boundary.

pub mod commands;
pub mod config;
pub mod error;
pub mod lang;
pub mod manager;
pub mod object;

pub use config::EngineConfig;
pub use error::ScriptError;
pub use lang::{
    EngineInfo, ExecutionResult, LanguageEngine, NativeEngine, OpenscadEngine, ValidationIssue,
    ValidationReport,
};
pub use manager::EngineManager;
pub use object::{flatten, CadObject, ObjectKind};

/// Run a native-dialect script with default limits.
///
/// Convenience for embedders that do not need language switching; the
/// full surface lives on [`EngineManager`].
pub fn execute(source: &str) -> ExecutionResult {
    NativeEngine::default().execute(source)
}
