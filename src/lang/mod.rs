// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Language engines
//!
//! Each engine turns one scripting dialect into an [`ExecutionResult`]
//! over the shared command layer. The native dialect is parsed with a
//! pest grammar and interpreted directly; the OpenSCAD front end
//! rewrites its source into native call syntax first.

mod ast;
mod core;
mod engine;
mod evaluator;
mod native;
mod openscad;
mod parser;
mod value;

pub use engine::{EngineInfo, ExecutionResult, LanguageEngine, ValidationIssue, ValidationReport};
pub use native::NativeEngine;
pub use openscad::OpenscadEngine;
pub use value::Value;
