// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Command layer shared by every language engine
//!
//! A command is a named native function over the workspace. The registry
//! maps command names to handlers plus a serializable help catalog, the
//! workspace tracks the arena, the root accumulator, script logs, and
//! export requests for one execution.

mod args;
mod builtins;
mod registry;
mod workspace;

pub mod library;

pub use registry::{Command, CommandFn, CommandHelp, CommandRegistry, ParameterHelp};
pub use workspace::{ExportFormat, ExportRequest, Workspace};
