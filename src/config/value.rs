// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The configuration container.
//!
//! A [`Config`] is an ordered mapping of string keys to [`Value`]s. Nested maps are
//! always stored as `Config`, so every level of a configuration tree answers the same
//! lookup contract: [`Config::get`] fails with [`EtlError::NotFound`] naming the key,
//! [`Config::get_or`] never fails.

use indexmap::IndexMap;
use std::fmt;

use crate::errors::{EtlError, Result};

/// Split text on `\n` and strip every trailing `\r` or `\n` from each line.
///
/// A bare `\r` is not a line break, but it is dropped at the end of a line, so
/// `"a\r\r\n"` and `"a\r"` both yield `"a"`.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> + Clone + '_ {
    text.split_inclusive('\n')
        .map(|line| line.trim_end_matches(&['\r', '\n'][..]))
}

/// A single configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Config(Config),
    List(Vec<Value>),
}

impl Value {
    /// Human-readable name of the value's shape, used in configuration errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Config(_) => "object",
            Value::List(_) => "array",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_config(&self) -> Option<&Config> {
        match self {
            Value::Config(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Loose truthiness: booleans, non-zero numbers, non-empty strings and collections.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Config(c) => !c.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    /// Integer coercion: integers, whole floats and numeric strings.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => f.write_str(s),
            Value::Config(c) => write!(f, "{}", serde_json::Value::from(c)),
            Value::List(items) => {
                let json: Vec<serde_json::Value> = items.iter().map(serde_json::Value::from).collect();
                write!(f, "{}", serde_json::Value::Array(json))
            }
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Integer(i as i64)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Config> for Value {
    fn from(c: Config) -> Self {
        Value::Config(c)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

// Nested JSON objects become `Config` here, at construction time.
impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Config(Config::from(map)),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(x) => serde_json::Value::from(*x),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Config(c) => serde_json::Value::from(c),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
        }
    }
}

/// Ordered, nested key/value configuration store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    entries: IndexMap<String, Value>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a key, failing with [`EtlError::NotFound`] if it is absent.
    pub fn get(&self, key: &str) -> Result<&Value> {
        self.entries
            .get(key)
            .ok_or_else(|| EtlError::NotFound(key.to_string()))
    }

    /// Look up a key, returning `default` if it is absent. Never fails.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        match self.entries.get(key) {
            Some(value) => value.clone(),
            None => default.into(),
        }
    }

    pub fn get_opt(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or overwrite a key. Existing keys keep their position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    /// Shallow overlay: every key of `source` is set on `self`, last writer wins.
    pub fn merge(&mut self, source: &Config) {
        for (key, value) in &source.entries {
            self.set(key.clone(), value.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.entries.iter()
    }

    /// Lines of a string value, see [`split_lines`].
    ///
    /// The returned iterator is `Clone`, so callers can restart it without
    /// re-reading the configuration.
    pub fn text_lines(&self, key: &str) -> Result<impl Iterator<Item = &str> + Clone + '_> {
        Ok(split_lines(self.str(key)?))
    }

    pub fn str(&self, key: &str) -> Result<&str> {
        let value = self.get(key)?;
        value.as_str().ok_or_else(|| type_mismatch(key, "a string", value))
    }

    pub fn str_or<'a>(&'a self, key: &str, default: &'a str) -> Result<&'a str> {
        match self.entries.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(_) => self.str(key),
        }
    }

    /// Optional string: absent and `null` both read as `None`.
    pub fn opt_str(&self, key: &str) -> Result<Option<&str>> {
        match self.entries.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.str(key).map(Some),
        }
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.entries.get(key).map(Value::truthy).unwrap_or(default)
    }

    pub fn int(&self, key: &str) -> Result<i64> {
        let value = self.get(key)?;
        value
            .to_i64()
            .ok_or_else(|| type_mismatch(key, "an integer", value))
    }

    pub fn int_or(&self, key: &str, default: i64) -> Result<i64> {
        match self.entries.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(_) => self.int(key),
        }
    }

    pub fn config(&self, key: &str) -> Result<&Config> {
        let value = self.get(key)?;
        value
            .as_config()
            .ok_or_else(|| type_mismatch(key, "an object", value))
    }

    pub fn list(&self, key: &str) -> Result<&[Value]> {
        let value = self.get(key)?;
        value
            .as_list()
            .ok_or_else(|| type_mismatch(key, "an array", value))
    }

    /// A list-valued key where a single item is also accepted and treated as a one-item list.
    pub fn one_or_many(&self, key: &str) -> Result<Vec<Value>> {
        match self.get(key)? {
            Value::List(items) => Ok(items.clone()),
            single => Ok(vec![single.clone()]),
        }
    }
}

fn type_mismatch(key: &str, expected: &str, actual: &Value) -> EtlError {
    EtlError::config(format!(
        "The key \"{}\" must be {}, not {}.",
        key,
        expected,
        actual.type_name()
    ))
}

impl From<serde_json::Map<String, serde_json::Value>> for Config {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let entries = map
            .into_iter()
            .map(|(key, value)| (key, Value::from(value)))
            .collect();
        Self { entries }
    }
}

impl From<&Config> for serde_json::Value {
    fn from(config: &Config) -> Self {
        let map = config
            .entries
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::from(value)))
            .collect();
        serde_json::Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Config {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut config = Config::new();
        for (key, value) in iter {
            config.set(key, value);
        }
        config
    }
}

impl TryFrom<serde_json::Value> for Config {
    type Error = EtlError;

    fn try_from(json: serde_json::Value) -> Result<Self> {
        match Value::from(json) {
            Value::Config(config) => Ok(config),
            other => Err(EtlError::config(format!(
                "Configuration must be an object, not {}.",
                other.type_name()
            ))),
        }
    }
}
