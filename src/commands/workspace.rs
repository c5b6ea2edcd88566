// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Per-run execution workspace

use crate::config::EngineConfig;
use crate::error::ScriptError;
use crate::object::{CadObject, ObjectArena, ObjectId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Export formats the host understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Stl,
    Step,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "stl" => Some(ExportFormat::Stl),
            "step" | "stp" => Some(ExportFormat::Step),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Stl => write!(f, "stl"),
            ExportFormat::Step => write!(f, "step"),
        }
    }
}

/// A deferred file export recorded during a run.
///
/// The engine performs no I/O; the host decides whether and where the
/// file is actually written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRequest {
    pub filename: String,
    pub format: ExportFormat,
    pub overwrite: bool,
}

/// Mutable state threaded through one script run.
///
/// Owns the object graph, the accumulator of top-level objects, script
/// log lines, and recorded export requests. The engine drains it into
/// the result envelope when the run completes.
#[derive(Debug)]
pub struct Workspace {
    arena: ObjectArena,
    roots: Vec<ObjectId>,
    logs: Vec<String>,
    exports: Vec<ExportRequest>,
    max_objects: usize,
    max_depth: usize,
    max_log_entries: usize,
}

impl Workspace {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            arena: ObjectArena::new(),
            roots: Vec::new(),
            logs: Vec::new(),
            exports: Vec::new(),
            max_objects: config.max_objects,
            max_depth: config.max_depth,
            max_log_entries: config.max_log_entries,
        }
    }

    /// Drop all state from the previous run.
    pub fn reset(&mut self) {
        self.arena.clear();
        self.roots.clear();
        self.logs.clear();
        self.exports.clear();
    }

    pub fn arena(&self) -> &ObjectArena {
        &self.arena
    }

    pub fn arena_mut(&mut self) -> &mut ObjectArena {
        &mut self.arena
    }

    /// Fails once the arena holds the configured maximum of objects.
    pub fn check_object_budget(&self) -> Result<(), ScriptError> {
        if self.arena.len() >= self.max_objects {
            Err(ScriptError::ObjectBudget {
                limit: self.max_objects,
            })
        } else {
            Ok(())
        }
    }

    /// Fails when the object nests deeper than the configured limit.
    ///
    /// Checked where composites are built, so materialization, cloning
    /// and serialization never walk a tree deeper than `max_depth`.
    pub fn check_depth_budget(&self, id: ObjectId) -> Result<(), ScriptError> {
        if self.arena.depth(id) > self.max_depth {
            Err(ScriptError::DepthBudget {
                limit: self.max_depth,
            })
        } else {
            Ok(())
        }
    }

    /// Record an object as top-level output.
    pub fn accumulate(&mut self, id: ObjectId) {
        self.roots.push(id);
    }

    /// Remove objects from the top-level output, typically because a
    /// boolean now owns them. Ids not present are ignored.
    pub fn disown(&mut self, consumed: &[ObjectId]) {
        self.roots.retain(|root| !consumed.contains(root));
    }

    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    /// Append a script log line, dropping lines beyond the cap.
    pub fn push_log(&mut self, line: String) {
        if self.logs.len() < self.max_log_entries {
            tracing::debug!(target: "cadscript::script", "{line}");
            self.logs.push(line);
        }
    }

    pub fn push_export(&mut self, request: ExportRequest) {
        tracing::debug!(
            filename = %request.filename,
            format = %request.format,
            "export requested"
        );
        self.exports.push(request);
    }

    /// Materialize every accumulated root, in accumulation order.
    pub fn materialize_roots(&self) -> Vec<CadObject> {
        self.roots
            .iter()
            .filter_map(|id| {
                let materialized = self.arena.materialize(*id);
                if materialized.is_none() {
                    tracing::warn!(%id, "accumulated object missing from graph, skipping");
                }
                materialized
            })
            .collect()
    }

    pub fn take_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.logs)
    }

    pub fn take_exports(&mut self) -> Vec<ExportRequest> {
        std::mem::take(&mut self.exports)
    }
}
