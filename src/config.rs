// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Engine configuration system

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Execution limits for script engines.
///
/// Scripts run cooperatively on the caller's thread, so the step and
/// object budgets are what keep a runaway script from wedging the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Statement executions allowed per run
    pub max_steps: usize,
    /// Objects a single run may allocate
    pub max_objects: usize,
    /// How deeply composite objects may nest
    pub max_depth: usize,
    /// Log lines retained per run
    pub max_log_entries: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: 1_000_000,
            max_objects: 100_000,
            // Materialization and serialization walk the tree by depth,
            // so this cap is what keeps them stack-safe.
            max_depth: 256,
            max_log_entries: 10_000,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: EngineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load() -> Result<Self> {
        let mut config = if Path::new("cadscript.toml").exists() {
            Self::from_file("cadscript.toml")?
        } else {
            Self::default()
        };

        if let Ok(steps) = std::env::var("CADSCRIPT_MAX_STEPS") {
            config.max_steps = steps.parse().unwrap_or(config.max_steps);
        }

        if let Ok(objects) = std::env::var("CADSCRIPT_MAX_OBJECTS") {
            config.max_objects = objects.parse().unwrap_or(config.max_objects);
        }

        if let Ok(depth) = std::env::var("CADSCRIPT_MAX_DEPTH") {
            config.max_depth = depth.parse().unwrap_or(config.max_depth);
        }

        if let Ok(entries) = std::env::var("CADSCRIPT_MAX_LOG_ENTRIES") {
            config.max_log_entries = entries.parse().unwrap_or(config.max_log_entries);
        }

        Ok(config)
    }
}
