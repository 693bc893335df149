// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in handlers and the registry that creates them.
//!
//! Text handlers read their input from the scope parameter named by `input_param`
//! (default `data`) and publish their result under `output_param` (default `data`).
//! Line-oriented output is newline-terminated.

pub mod db_uploader;
pub mod dir_lister;
pub mod file_reader;
pub mod file_writer;
pub mod http_loader;
pub mod line_filter;
pub mod line_iterator;
pub mod line_merger;
pub mod line_sorter;
pub mod regex_matcher;
pub mod sql_query;
pub mod sql_statement;
pub mod str_replacer;

mod registry;

pub use registry::{HandlerFactory, HandlerRegistry};

use regex::Regex;

use crate::config::{template, Config, Value};
use crate::db::SqlValue;
use crate::errors::{EtlError, Result};

pub(crate) const DEFAULT_PARAM: &str = "data";

pub(crate) fn input_param(config: &Config) -> Result<&str> {
    config.str_or("input_param", DEFAULT_PARAM)
}

pub(crate) fn output_param(config: &Config) -> Result<&str> {
    config.str_or("output_param", DEFAULT_PARAM)
}

/// A single-entry output map.
pub(crate) fn output(name: &str, value: impl Into<Value>) -> Config {
    let mut out = Config::new();
    out.set(name, value);
    out
}

/// Lines joined with `\n`, newline-terminated.
pub(crate) fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let mut text = String::new();
    for line in lines {
        text.push_str(line.as_ref());
        text.push('\n');
    }
    if lines.is_empty() {
        text.push('\n');
    }
    text
}

pub(crate) fn compile_regex(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| EtlError::config(format!("Invalid regular expression \"{}\": {}", pattern, e)))
}

/// Values of the parameters listed in `passthrough_params`, for handing to child handlers.
pub(crate) fn passthrough_params(config: &Config) -> Result<Config> {
    let mut params = Config::new();
    if config.get_opt("passthrough_params").is_some() {
        for name in config.list("passthrough_params")? {
            let name = name.to_string();
            let value = config.get(&name)?.clone();
            params.set(name, value);
        }
    }
    Ok(params)
}

/// Named SQL parameters from the `params` list; each `value` may reference scope
/// parameters as `{name}`.
pub(crate) fn sql_params(config: &Config) -> Result<Vec<(String, SqlValue)>> {
    let mut params = Vec::new();
    if config.get_opt("params").is_none() {
        return Ok(params);
    }
    for param in config.list("params")? {
        let param = param.as_config().ok_or_else(|| {
            EtlError::config(format!(
                "SQL parameter definition must be an object, not \"{}\"",
                param.type_name()
            ))
        })?;
        let value = match param.get("value")? {
            Value::String(s) => template::expand(s, config)?,
            other => other.to_string(),
        };
        params.push((param.str("name")?.to_string(), SqlValue::Text(value)));
    }
    Ok(params)
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_lines_terminates_output() {
        assert_eq!(join_lines(&["a", "b"]), "a\nb\n");
        assert_eq!(join_lines::<&str>(&[]), "\n");
    }

    #[test]
    fn test_sql_params_are_templated_text() {
        let config = Config::try_from(json!({
            "day": "2024-01-31",
            "params": [{"name": "d", "value": "{day}"}, {"name": "n", "value": 3}]
        }))
        .unwrap();
        let params = sql_params(&config).unwrap();
        assert_eq!(params[0], ("d".to_string(), SqlValue::Text("2024-01-31".into())));
        assert_eq!(params[1], ("n".to_string(), SqlValue::Text("3".into())));
        assert!(sql_params(&Config::new()).unwrap().is_empty());
    }

    #[test]
    fn test_passthrough_params() {
        let config = Config::try_from(json!({"a": 1, "b": "x", "passthrough_params": ["a"]})).unwrap();
        let params = passthrough_params(&config).unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params.int("a").unwrap(), 1);

        let config = Config::try_from(json!({"passthrough_params": ["missing"]})).unwrap();
        assert!(passthrough_params(&config).is_err());
    }
}
