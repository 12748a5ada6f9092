// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! warden-pool: cross-process resource pools.
//!
//! Bounds the number of concurrent heavyweight operations (fix agents,
//! linters, MCP calls) across every Warden process on the host. Each held
//! permit is one JSON lock file under `<lockdir>/<pool>/`; acquisition is
//! serialized per pool by an advisory file lock, and permits whose owner
//! died or aged out are reclaimed by the next acquire attempt.

pub mod config;
pub mod manager;
pub mod record;

pub use config::{PoolConfig, PoolSettings, PoolsConfig};
pub use manager::{Permit, PoolEntry, PoolManager, PoolStatus};
pub use record::LockRecord;

use thiserror::Error;

/// Errors from pool configuration loading.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to read pool config {path}: {source}")]
    ReadConfig {
        path: String,
        source: std::io::Error,
    },
    #[error("malformed pool config {path}: {source}")]
    ParseConfig {
        path: String,
        source: serde_json::Error,
    },
}
