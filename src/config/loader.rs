// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::config::{Config, Value};
use crate::errors::{EtlError, Result};

/// Read a JSON or YAML document into a [`Value`].
///
/// Files ending in `.yaml`/`.yml` are parsed as YAML, anything else as JSON. Both
/// go through `serde_json::Value` so nested maps come out as [`Config`] either way.
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| EtlError::file(path, e))?;

    let json: serde_json::Value = if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|e| {
            EtlError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?
    } else {
        serde_json::from_str(&content).map_err(|e| {
            EtlError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?
    };

    Ok(Value::from(json))
}

/// Read a document whose top level must be an object.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    match load_document(path)? {
        Value::Config(config) => Ok(config),
        other => Err(EtlError::config(format!(
            "Configuration file {} must contain an object, not {}.",
            path.display(),
            other.type_name()
        ))),
    }
}

/// Read a JSON or YAML document straight into a `serde` type.
pub fn load_typed<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| EtlError::file(path, e))?;
    let parsed = if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|e| EtlError::config(format!("Failed to parse {}: {}", path.display(), e)))
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}
