// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 The Cadscript Authors

//! Engine manager
//!
//! Owns the set of registered language engines and presents a single
//! active one to the host. Asking for an unknown language is a
//! recoverable configuration mistake: it is logged and the active
//! engine stays unchanged.

use crate::commands::CommandHelp;
use crate::config::EngineConfig;
use crate::error::ScriptError;
use crate::lang::{
    EngineInfo, ExecutionResult, LanguageEngine, NativeEngine, OpenscadEngine, ValidationReport,
};
use std::collections::HashMap;

pub struct EngineManager {
    engines: HashMap<String, Box<dyn LanguageEngine>>,
    current: String,
}

impl EngineManager {
    /// Manager with both stock engines registered; the native dialect
    /// starts active.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let native = NativeEngine::new(config.clone());
        let mut manager = Self {
            engines: HashMap::new(),
            current: native.info().id.to_string(),
        };
        manager.register(Box::new(native));
        manager.register(Box::new(OpenscadEngine::new(config)));
        manager
    }

    pub fn register(&mut self, engine: Box<dyn LanguageEngine>) {
        self.engines.insert(engine.info().id.to_string(), engine);
    }

    /// Switch the active engine. Returns whether `id` is now active;
    /// an unknown id leaves the current engine in place.
    pub fn set_language(&mut self, id: &str) -> bool {
        if self.current == id {
            return true;
        }
        if self.engines.contains_key(id) {
            tracing::debug!(from = %self.current, to = %id, "switching language");
            self.current = id.to_string();
            true
        } else {
            tracing::warn!(%id, "unknown language id, keeping current engine");
            false
        }
    }

    /// Run source through the active engine.
    ///
    /// A missing active engine (a misconfigured registry) surfaces as a
    /// failure envelope like any script fault would.
    pub fn execute(&mut self, source: &str) -> ExecutionResult {
        match self.engines.get_mut(&self.current) {
            Some(engine) => engine.execute(source),
            None => {
                tracing::warn!(id = %self.current, "no engine registered for current language");
                ExecutionResult::failed(
                    ScriptError::runtime(format!(
                        "no engine registered for language `{}`",
                        self.current
                    )),
                    Vec::new(),
                )
            }
        }
    }

    pub fn validate(&self, source: &str) -> ValidationReport {
        match self.engines.get(&self.current) {
            Some(engine) => engine.validate(source),
            None => ValidationReport::invalid(&ScriptError::runtime(format!(
                "no engine registered for language `{}`",
                self.current
            ))),
        }
    }

    /// Registered language ids, sorted.
    pub fn supported_languages(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.engines.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn current_language(&self) -> &str {
        &self.current
    }

    pub fn engine_info(&self, id: &str) -> Option<&EngineInfo> {
        self.engines.get(id).map(|engine| engine.info())
    }

    /// Command names the active engine understands.
    pub fn available_commands(&self) -> Vec<String> {
        self.engines
            .get(&self.current)
            .map(|engine| engine.available_commands())
            .unwrap_or_default()
    }

    pub fn command_help(&self, name: &str) -> Option<&CommandHelp> {
        self.engines
            .get(&self.current)
            .and_then(|engine| engine.command_help(name))
    }
}

impl Default for EngineManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_engine_starts_active() {
        let manager = EngineManager::new();
        assert_eq!(manager.current_language(), "cadscript");
        assert_eq!(manager.supported_languages(), vec!["cadscript", "openscad"]);
    }

    #[test]
    fn test_unknown_language_keeps_current_engine() {
        let mut manager = EngineManager::new();
        assert!(!manager.set_language("nonexistent"));
        assert_eq!(manager.current_language(), "cadscript");

        let result = manager.execute("cube();");
        assert!(result.success);
    }

    #[test]
    fn test_switching_changes_dialect() {
        let mut manager = EngineManager::new();
        assert!(manager.set_language("openscad"));
        let result = manager.execute("cube([10, 10, 10], center=true);");
        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.objects.len(), 1);

        // Native syntax is not valid OpenSCAD input.
        assert!(!manager.execute("let b = cube();").success);
    }

    #[test]
    fn test_set_language_is_idempotent() {
        let mut manager = EngineManager::new();
        assert!(manager.set_language("cadscript"));
        assert_eq!(manager.current_language(), "cadscript");
    }

    #[test]
    fn test_engine_info_lookup() {
        let manager = EngineManager::new();
        assert_eq!(manager.engine_info("openscad").unwrap().id, "openscad");
        assert!(manager.engine_info("brep").is_none());
    }

    #[test]
    fn test_available_commands_follow_active_engine() {
        let mut manager = EngineManager::new();
        assert!(manager
            .available_commands()
            .contains(&"linearExtrude".to_string()));
        manager.set_language("openscad");
        assert!(manager.available_commands().contains(&"square".to_string()));
    }
}
