// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hook registry and loader.
//!
//! The registry file is the authoritative list of hooks an installation
//! runs, in order. Entry points name compile-time-registered hook types;
//! the loader resolves them, loads each hook's config, and instantiates
//! the hook with the shared collaborators.

use crate::config::{load_config_file, parse_hook_config};
use crate::hook::{Hook, HookContext};
use crate::{DocsHook, GateHook, LintHook};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from registry loading or hook instantiation, naming the
/// offending entry.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to read registry {path}: {source}")]
    ReadRegistry {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed registry {path}: {source}")]
    ParseRegistry {
        path: String,
        source: serde_json::Error,
    },
    #[error("hook '{name}' not found in registry")]
    UnknownHook { name: String },
    #[error("hook '{name}': unknown entry point '{entry_point}'")]
    UnknownEntryPoint { name: String, entry_point: String },
    #[error("hook '{name}': invalid config: {source}")]
    InvalidConfig {
        name: String,
        source: serde_json::Error,
    },
    #[error("failed to read config {path}: {source}")]
    ReadConfig {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed config {path}: {source}")]
    ParseConfig {
        path: String,
        source: serde_json::Error,
    },
}

/// One registry entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryEntry {
    /// Name of a compile-time-registered hook type.
    pub entry_point: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// The registry file: `{version, hooks, categories}`. Hook order in the
/// file is invocation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registry {
    pub version: String,
    #[serde(default)]
    pub hooks: IndexMap<String, RegistryEntry>,
    #[serde(default)]
    pub categories: BTreeMap<String, Value>,
}

impl Default for Registry {
    fn default() -> Self {
        let mut hooks = IndexMap::new();
        hooks.insert(
            "tdd_guard".to_string(),
            RegistryEntry {
                entry_point: "gate".to_string(),
                config_file: Some("tdd_guard.json".to_string()),
                category: Some("validation".to_string()),
                description: Some("Blocks edits that fail external TDD validation".to_string()),
                enabled: true,
            },
        );
        hooks.insert(
            "context7_docs".to_string(),
            RegistryEntry {
                entry_point: "docs".to_string(),
                config_file: Some("context7_docs.json".to_string()),
                category: Some("enhancement".to_string()),
                description: Some("Attaches current library documentation before edits".to_string()),
                enabled: true,
            },
        );
        hooks.insert(
            "post_tool_linter".to_string(),
            RegistryEntry {
                entry_point: "lint".to_string(),
                config_file: Some("post_tool_linter.json".to_string()),
                category: Some("quality".to_string()),
                description: Some("Lints edited files and auto-fixes issues".to_string()),
                enabled: true,
            },
        );
        let mut categories = BTreeMap::new();
        categories.insert(
            "validation".to_string(),
            Value::String("Pre-edit gates".to_string()),
        );
        categories.insert(
            "enhancement".to_string(),
            Value::String("Context enrichment".to_string()),
        );
        categories.insert(
            "quality".to_string(),
            Value::String("Post-edit cleanup".to_string()),
        );
        Self {
            version: "1.0.0".to_string(),
            hooks,
            categories,
        }
    }
}

impl Registry {
    /// Load from a JSON file; a missing file yields the built-in registry.
    pub fn load(path: &Path) -> Result<Self, LoaderError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no registry file, using built-in registry");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(LoaderError::ReadRegistry {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|e| LoaderError::ParseRegistry {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn entry(&self, name: &str) -> Option<&RegistryEntry> {
        self.hooks.get(name)
    }
}

/// Instantiates hooks from registry entries.
pub struct HookLoader {
    registry: Registry,
    config_dir: PathBuf,
    ctx: HookContext,
}

impl HookLoader {
    pub fn new(registry: Registry, config_dir: PathBuf, ctx: HookContext) -> Self {
        Self {
            registry,
            config_dir,
            ctx,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Instantiate one hook by registry name. The config resolution order
    /// is: caller-supplied config, then the entry's declared config file,
    /// then empty.
    pub fn instantiate(
        &self,
        name: &str,
        config: Option<Value>,
    ) -> Result<Box<dyn Hook>, LoaderError> {
        let entry = self
            .registry
            .entry(name)
            .ok_or_else(|| LoaderError::UnknownHook {
                name: name.to_string(),
            })?;

        let config = match config {
            Some(config) => crate::config::unwrap_settings(config),
            None => match &entry.config_file {
                Some(file) => load_config_file(&self.config_dir.join(file))?,
                None => Value::Object(serde_json::Map::new()),
            },
        };

        let hook: Box<dyn Hook> = match entry.entry_point.as_str() {
            "lint" | "post_tool_linter" => Box::new(LintHook::from_config(
                parse_hook_config(name, config)?,
                self.ctx.clone(),
            )),
            "docs" | "context7_docs" => Box::new(DocsHook::from_config(
                parse_hook_config(name, config)?,
                self.ctx.clone(),
            )),
            "gate" | "tdd_guard" => Box::new(GateHook::from_config(
                parse_hook_config(name, config)?,
                self.ctx.clone(),
            )),
            other => {
                return Err(LoaderError::UnknownEntryPoint {
                    name: name.to_string(),
                    entry_point: other.to_string(),
                })
            }
        };
        info!(hook = hook.name(), entry = name, "instantiated hook");
        Ok(hook)
    }

    /// Instantiate every enabled hook, in registry order.
    pub fn load_enabled(&self) -> Result<Vec<Box<dyn Hook>>, LoaderError> {
        let names: Vec<String> = self
            .registry
            .hooks
            .iter()
            .filter(|(_, entry)| entry.enabled)
            .map(|(name, _)| name.clone())
            .collect();
        names
            .iter()
            .map(|name| self.instantiate(name, None))
            .collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
