// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Script error taxonomy
//!
//! Every fault a script can produce is a value of [`ScriptError`]. Engines
//! never panic across the host boundary: `execute` folds errors into the
//! result envelope and `validate` folds them into a report.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while parsing or executing a script.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptError {
    /// The source text does not conform to the engine grammar.
    #[error("syntax error{}: {}", position_suffix(.line, .column), .message)]
    Parse {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    /// An identifier was read before any assignment bound it.
    #[error("unknown identifier `{name}`")]
    UnknownIdentifier { name: String },

    /// A call named neither a registered command nor one of its aliases.
    #[error("unknown command `{name}`")]
    UnknownCommand { name: String },

    /// A command received arguments it cannot coerce.
    #[error("invalid argument to `{command}`: {message}")]
    Argument { command: String, message: String },

    /// The script performed an operation that is invalid at runtime.
    #[error("runtime error: {message}")]
    Runtime { message: String },

    /// The script ran longer than the configured step budget allows.
    #[error("script exceeded the step budget of {limit} (possible infinite loop)")]
    StepBudget { limit: usize },

    /// The script created more objects than the configured limit.
    #[error("script exceeded the object budget of {limit}")]
    ObjectBudget { limit: usize },

    /// The script nested composite objects deeper than the configured limit.
    #[error("script exceeded the nesting depth budget of {limit}")]
    DepthBudget { limit: usize },
}

impl ScriptError {
    /// Parse error without a source position.
    pub fn parse(message: impl Into<String>) -> Self {
        ScriptError::Parse {
            message: message.into(),
            line: None,
            column: None,
        }
    }

    /// Parse error anchored at a source line.
    pub fn parse_at(message: impl Into<String>, line: usize, column: Option<usize>) -> Self {
        ScriptError::Parse {
            message: message.into(),
            line: Some(line),
            column,
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        ScriptError::Runtime {
            message: message.into(),
        }
    }

    pub fn argument(command: impl Into<String>, message: impl Into<String>) -> Self {
        ScriptError::Argument {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Source line the error points at, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            ScriptError::Parse { line, .. } => *line,
            _ => None,
        }
    }

    /// Source column the error points at, when known.
    pub fn column(&self) -> Option<usize> {
        match self {
            ScriptError::Parse { column, .. } => *column,
            _ => None,
        }
    }
}

fn position_suffix(line: &Option<usize>, column: &Option<usize>) -> String {
    match (line, column) {
        (Some(l), Some(c)) => format!(" at line {l}, column {c}"),
        (Some(l), None) => format!(" at line {l}"),
        _ => String::new(),
    }
}
