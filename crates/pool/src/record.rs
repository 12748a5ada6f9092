// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk lock records, one per held permit.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Contents of `<lockdir>/<pool>/<id>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockRecord {
    pub pool: String,
    /// 8-hex-digit id, doubles as the file stem.
    pub id: String,
    /// Pid of the acquiring process, used for liveness-based reclamation.
    pub pid: u32,
    /// Acquisition time, seconds since epoch.
    pub timestamp: u64,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}
