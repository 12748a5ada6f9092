// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pool descriptors and lock-directory settings.

use crate::PoolError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One named capacity group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Maximum concurrent permits across all processes.
    pub max: usize,
    /// Default acquire deadline in seconds when the caller passes none.
    #[serde(default = "default_pool_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub description: String,
}

fn default_pool_timeout() -> u64 {
    180
}

/// Settings shared by every pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSettings {
    /// Directory holding pool subdirectories and global lock files.
    #[serde(default = "default_lock_dir")]
    pub lock_dir: PathBuf,
    /// Seconds after which an unreleased lock is considered stale.
    #[serde(default = "default_stale_timeout")]
    pub stale_lock_timeout: u64,
    #[serde(default)]
    pub debug: bool,
}

fn default_lock_dir() -> PathBuf {
    std::env::temp_dir().join("warden_locks")
}

fn default_stale_timeout() -> u64 {
    300
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            lock_dir: default_lock_dir(),
            stale_lock_timeout: default_stale_timeout(),
            debug: false,
        }
    }
}

/// Full pool configuration: named pools plus shared settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolsConfig {
    #[serde(default)]
    pub resource_pools: BTreeMap<String, PoolConfig>,
    #[serde(default)]
    pub settings: PoolSettings,
}

impl Default for PoolsConfig {
    fn default() -> Self {
        let mut resource_pools = BTreeMap::new();
        resource_pools.insert(
            "agents".to_string(),
            PoolConfig {
                max: 3,
                timeout: 300,
                description: "Headless fix-agent runs".to_string(),
            },
        );
        resource_pools.insert(
            "linting".to_string(),
            PoolConfig {
                max: 2,
                timeout: 120,
                description: "Linter subprocesses".to_string(),
            },
        );
        resource_pools.insert(
            "testing".to_string(),
            PoolConfig {
                max: 1,
                timeout: 600,
                description: "Test execution".to_string(),
            },
        );
        resource_pools.insert(
            "documentation".to_string(),
            PoolConfig {
                max: 2,
                timeout: 20,
                description: "Documentation MCP calls".to_string(),
            },
        );
        resource_pools.insert(
            "validation".to_string(),
            PoolConfig {
                max: 2,
                timeout: 60,
                description: "Validation CLI calls".to_string(),
            },
        );
        Self {
            resource_pools,
            settings: PoolSettings::default(),
        }
    }
}

impl PoolsConfig {
    /// Load from a JSON file; a missing file yields the defaults, a
    /// malformed one is a startup error.
    pub fn load(path: &Path) -> Result<Self, PoolError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(PoolError::ReadConfig {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };
        serde_json::from_str(&raw).map_err(|e| PoolError::ParseConfig {
            path: path.display().to_string(),
            source: e,
        })
    }

    pub fn pool(&self, name: &str) -> Option<&PoolConfig> {
        self.resource_pools.get(name)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
