// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration directory layout.
//!
//! Everything Warden reads at startup lives in one directory:
//! `registry.json`, `pools.json`, `tools.json`, and per-hook config files
//! referenced from the registry.

use std::path::PathBuf;

pub struct WardenPaths {
    pub config_dir: PathBuf,
    pub registry_file: PathBuf,
    pub pools_file: PathBuf,
    pub tools_file: PathBuf,
}

impl WardenPaths {
    /// Resolution order: `--config-dir` flag, `WARDEN_CONFIG_DIR`, then
    /// `~/.config/warden`.
    pub fn resolve(flag: Option<PathBuf>) -> Self {
        let config_dir = flag
            .or_else(|| std::env::var_os("WARDEN_CONFIG_DIR").map(PathBuf::from))
            .unwrap_or_else(|| {
                dirs::config_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join("warden")
            });
        Self {
            registry_file: config_dir.join("registry.json"),
            pools_file: config_dir.join("pools.json"),
            tools_file: config_dir.join("tools.json"),
            config_dir,
        }
    }
}
