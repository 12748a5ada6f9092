// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring: pools + probed tools + registry → dispatcher.

use crate::paths::WardenPaths;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use warden_core::{ProcessTimeouts, SystemClock};
use warden_hooks::{Dispatcher, HookContext, HookLoader, Registry};
use warden_pool::{PoolManager, PoolsConfig};
use warden_tools::{ToolCatalog, ToolSpec};

/// Probe the known tools once, for this process lifetime.
pub async fn probe_tools(paths: &WardenPaths) -> ToolCatalog {
    let timeouts = ProcessTimeouts::from_env();
    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let remote_url = context7_remote_url().or_else(|| tools_file_remote_url(paths));
    let specs = vec![
        ToolSpec::tdd_guard(&project_root),
        ToolSpec::context7(&project_root, remote_url),
        ToolSpec::fix_agent(),
    ];
    ToolCatalog::probe(specs, timeouts.external_check).await
}

/// Remote documentation endpoint, when configured.
fn context7_remote_url() -> Option<String> {
    std::env::var("WARDEN_CONTEXT7_URL")
        .ok()
        .filter(|url| !url.trim().is_empty())
}

pub async fn build(paths: &WardenPaths, pools: PoolsConfig) -> Result<Dispatcher> {
    let timeouts = ProcessTimeouts::from_env();
    let pool = Arc::new(PoolManager::new(pools));
    let catalog = Arc::new(probe_tools(paths).await);

    let registry = Registry::load(&paths.registry_file).context("loading hook registry")?;
    let ctx = HookContext {
        pool,
        tools: catalog,
        timeouts,
        clock: Arc::new(SystemClock),
    };
    let loader = HookLoader::new(registry, paths.config_dir.clone(), ctx);
    let hooks = loader.load_enabled().context("instantiating hooks")?;

    Ok(Dispatcher::new(hooks))
}

/// `tools.json` may pin a remote recipe: `{"context7_url": "https://..."}`.
fn tools_file_remote_url(paths: &WardenPaths) -> Option<String> {
    let raw = std::fs::read_to_string(&paths.tools_file).ok()?;
    let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
    value
        .get("context7_url")
        .and_then(|url| url.as_str())
        .map(str::to_string)
}
