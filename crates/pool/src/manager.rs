// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permit acquisition and release.
//!
//! Invariant: at most `max` non-stale lock files exist per pool directory.
//! All acquire attempts for a pool serialize on an exclusive advisory lock
//! on `<lockdir>/.<pool>_global.lock`; under that lock the manager sweeps
//! stale locks, counts survivors, and creates the new lock file only when
//! the count is below the pool maximum.

use crate::config::{PoolConfig, PoolsConfig};
use crate::record::LockRecord;
use fs2::FileExt;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use warden_core::{short_id, Clock, SystemClock};

/// Poll interval for blocking acquires. Coarse on purpose: the guarded
/// workloads are subprocess calls taking seconds to minutes.
pub const ACQUIRE_RETRY_INTERVAL: Duration = Duration::from_millis(500);

/// Arbitrary metadata recorded in the lock file for diagnostics.
pub type PermitMetadata = HashMap<String, serde_json::Value>;

/// A held (or denied) unit of pool capacity.
///
/// Dropping an acquired permit deletes its lock file; a failed delete is
/// logged and left for the stale sweep.
#[derive(Debug)]
pub struct Permit {
    pool: String,
    lock_file: Option<PathBuf>,
}

impl Permit {
    fn granted(pool: &str, lock_file: PathBuf) -> Self {
        Self {
            pool: pool.to_string(),
            lock_file: Some(lock_file),
        }
    }

    fn denied(pool: &str) -> Self {
        Self {
            pool: pool.to_string(),
            lock_file: None,
        }
    }

    /// Whether capacity was actually granted.
    pub fn acquired(&self) -> bool {
        self.lock_file.is_some()
    }

    pub fn pool(&self) -> &str {
        &self.pool
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if let Some(path) = self.lock_file.take() {
            match fs::remove_file(&path) {
                Ok(()) => debug!(pool = %self.pool, lock = %path.display(), "released permit"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    // The stale sweep will reclaim it.
                    warn!(pool = %self.pool, lock = %path.display(), error = %e,
                        "failed to remove lock file on release");
                }
            }
        }
    }
}

/// Per-pool occupancy snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct PoolEntry {
    pub current: usize,
    pub max: usize,
    pub available: usize,
    pub timeout: u64,
    pub description: String,
}

/// Snapshot of every configured pool.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub pools: BTreeMap<String, PoolEntry>,
    pub total_current: usize,
    pub total_max: usize,
}

/// Cross-process capacity manager backed by the lock directory.
pub struct PoolManager {
    config: PoolsConfig,
    clock: Arc<dyn Clock>,
}

impl PoolManager {
    pub fn new(config: PoolsConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: PoolsConfig, clock: Arc<dyn Clock>) -> Self {
        Self { config, clock }
    }

    pub fn lock_dir(&self) -> &Path {
        &self.config.settings.lock_dir
    }

    /// Advisory check; grants nothing and takes no lock.
    pub fn can_acquire(&self, pool_name: &str) -> bool {
        match self.config.pool(pool_name) {
            Some(pool) => self.count_active(pool_name) < pool.max,
            None => false,
        }
    }

    /// Acquire one permit, waiting up to `timeout` (pool default when
    /// `None`, single attempt when zero). Always returns a permit; check
    /// [`Permit::acquired`] and degrade gracefully when capacity was not
    /// granted.
    pub async fn acquire(
        &self,
        pool_name: &str,
        metadata: PermitMetadata,
        timeout: Option<Duration>,
    ) -> Permit {
        let Some(pool) = self.config.pool(pool_name) else {
            debug!(pool = pool_name, "unknown pool");
            return Permit::denied(pool_name);
        };

        let timeout = timeout.unwrap_or(Duration::from_secs(pool.timeout));
        if timeout.is_zero() {
            return match self.try_acquire(pool_name, pool, &metadata) {
                Some(lock_file) => Permit::granted(pool_name, lock_file),
                None => Permit::denied(pool_name),
            };
        }

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(lock_file) = self.try_acquire(pool_name, pool, &metadata) {
                return Permit::granted(pool_name, lock_file);
            }
            if Instant::now() >= deadline {
                debug!(pool = pool_name, timeout_secs = timeout.as_secs(),
                    "timed out acquiring permit");
                return Permit::denied(pool_name);
            }
            tokio::time::sleep(ACQUIRE_RETRY_INTERVAL).await;
        }
    }

    /// Current occupancy of every configured pool.
    pub fn status(&self) -> PoolStatus {
        let mut pools = BTreeMap::new();
        let mut total_current = 0;
        let mut total_max = 0;
        for (name, pool) in &self.config.resource_pools {
            let current = self.count_active(name);
            total_current += current;
            total_max += pool.max;
            pools.insert(
                name.clone(),
                PoolEntry {
                    current,
                    max: pool.max,
                    available: pool.max.saturating_sub(current),
                    timeout: pool.timeout,
                    description: pool.description.clone(),
                },
            );
        }
        PoolStatus {
            pools,
            total_current,
            total_max,
        }
    }

    /// One atomic attempt under the pool-wide lock. `None` means the pool
    /// is at capacity or the filesystem failed us; either way the caller
    /// gets no permit (fail closed).
    fn try_acquire(
        &self,
        pool_name: &str,
        pool: &PoolConfig,
        metadata: &PermitMetadata,
    ) -> Option<PathBuf> {
        let lock_dir = self.lock_dir();
        if let Err(e) = fs::create_dir_all(lock_dir) {
            warn!(dir = %lock_dir.display(), error = %e, "failed to create lock directory");
            return None;
        }

        let global_path = lock_dir.join(format!(".{pool_name}_global.lock"));
        let global = match OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&global_path)
        {
            Ok(file) => file,
            Err(e) => {
                warn!(lock = %global_path.display(), error = %e, "failed to open global lock");
                return None;
            }
        };
        if let Err(e) = global.lock_exclusive() {
            warn!(lock = %global_path.display(), error = %e, "failed to take global lock");
            return None;
        }

        // Critical section: sweep, count, create. The advisory lock is
        // released when `global` drops.
        self.create_lock_file(pool_name, pool, metadata)
    }

    fn create_lock_file(
        &self,
        pool_name: &str,
        pool: &PoolConfig,
        metadata: &PermitMetadata,
    ) -> Option<PathBuf> {
        let pool_dir = self.lock_dir().join(pool_name);
        if let Err(e) = fs::create_dir_all(&pool_dir) {
            warn!(dir = %pool_dir.display(), error = %e, "failed to create pool directory");
            return None;
        }
        self.sweep_stale(&pool_dir);

        let current = count_lock_files(&pool_dir);
        if current >= pool.max {
            debug!(pool = pool_name, current, max = pool.max, "pool at capacity");
            return None;
        }

        let id = short_id();
        let path = pool_dir.join(format!("{id}.json"));
        let record = LockRecord {
            pool: pool_name.to_string(),
            id,
            pid: std::process::id(),
            timestamp: self.clock.now_epoch_secs(),
            metadata: metadata.clone(),
        };
        let bytes = match serde_json::to_vec(&record) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(pool = pool_name, error = %e, "failed to encode lock record");
                return None;
            }
        };
        if let Err(e) = fs::write(&path, bytes) {
            warn!(lock = %path.display(), error = %e, "failed to write lock file");
            return None;
        }
        debug!(pool = pool_name, lock = %path.display(),
            held = current + 1, max = pool.max, "acquired permit");
        Some(path)
    }

    /// Remove every stale lock in a pool directory.
    fn sweep_stale(&self, pool_dir: &Path) {
        let entries = match fs::read_dir(pool_dir) {
            Ok(entries) => entries,
            Err(_) => return,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") && self.is_stale(&path) {
                match fs::remove_file(&path) {
                    Ok(()) => debug!(lock = %path.display(), "removed stale lock"),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => warn!(lock = %path.display(), error = %e,
                        "failed to remove stale lock"),
                }
            }
        }
    }

    /// A lock is stale when its record is unreadable, older than the stale
    /// timeout, or owned by a pid that no longer exists.
    fn is_stale(&self, path: &Path) -> bool {
        let record: LockRecord = match fs::read_to_string(path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
        {
            Some(record) => record,
            None => return true,
        };
        let age = self
            .clock
            .now_epoch_secs()
            .saturating_sub(record.timestamp);
        if age > self.config.settings.stale_lock_timeout {
            return true;
        }
        process_is_dead(record.pid)
    }

    fn count_active(&self, pool_name: &str) -> usize {
        let pool_dir = self.lock_dir().join(pool_name);
        self.sweep_stale(&pool_dir);
        count_lock_files(&pool_dir)
    }
}

fn count_lock_files(pool_dir: &Path) -> usize {
    match fs::read_dir(pool_dir) {
        Ok(entries) => entries
            .flatten()
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
            .count(),
        Err(_) => 0,
    }
}

/// Signal-0 liveness probe. Only a definitive no-such-process marks the
/// owner dead; permission errors mean the process exists under another
/// user and the lock stays live.
fn process_is_dead(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(pid) = i32::try_from(pid) else {
        return true;
    };
    match kill(Pid::from_raw(pid), None) {
        Ok(()) => false,
        Err(Errno::ESRCH) => true,
        Err(_) => false,
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
