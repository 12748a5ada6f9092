// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-hook configuration loading.

use crate::registry::LoaderError;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;

/// Read a hook config file. A missing file is an empty config; config
/// files may nest everything under a `settings` key, which is unwrapped.
pub fn load_config_file(path: &Path) -> Result<Value, LoaderError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Value::Object(serde_json::Map::new()))
        }
        Err(e) => {
            return Err(LoaderError::ReadConfig {
                path: path.display().to_string(),
                source: e,
            })
        }
    };
    let value: Value = serde_json::from_str(&raw).map_err(|e| LoaderError::ParseConfig {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(unwrap_settings(value))
}

/// `{"settings": {...}}` and `{...}` are both accepted config shapes.
pub fn unwrap_settings(value: Value) -> Value {
    match value {
        Value::Object(ref map) if map.contains_key("settings") => {
            map.get("settings").cloned().unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Deserialize a hook's typed config, naming the hook on key/type errors.
pub fn parse_hook_config<T: DeserializeOwned>(name: &str, value: Value) -> Result<T, LoaderError> {
    let value = if value.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        value
    };
    serde_json::from_value(value).map_err(|source| LoaderError::InvalidConfig {
        name: name.to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
