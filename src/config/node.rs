// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Handler node grammar.
//!
//! A handler configuration is one of:
//! * a string: path to a file holding another node, relative to the including file;
//! * an object with a `module` key: a handler step;
//! * an object without `module`: a parameter block published on the running pipeline;
//! * an array of nodes: a pipeline.
//!
//! The shape is decided once, when the value is parsed into a [`HandlerNode`].

use crate::config::{Config, Value};
use crate::errors::{EtlError, Result};

/// Namespace bare module names resolve in.
pub const BUILTIN_NAMESPACE: &str = "rattle.handlers";
/// Class used when a step doesn't name one.
pub const DEFAULT_CLASS: &str = "Handler";

#[derive(Debug, Clone, PartialEq)]
pub enum HandlerNode {
    Include(String),
    Step(HandlerSpec),
    ParamBlock(Config),
    Pipeline(Vec<HandlerNode>),
}

/// A single handler reference together with its literal configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerSpec {
    pub module: String,
    pub class: Option<String>,
    pub comment: Option<String>,
    /// The whole object as written, `module`/`class`/`comment` included.
    pub own: Config,
}

impl HandlerSpec {
    /// Module name with bare names placed in [`BUILTIN_NAMESPACE`].
    pub fn qualified_module(&self) -> String {
        if self.module.contains('.') {
            self.module.clone()
        } else {
            format!("{}.{}", BUILTIN_NAMESPACE, self.module)
        }
    }

    pub fn class_name(&self) -> &str {
        self.class.as_deref().unwrap_or(DEFAULT_CLASS)
    }

    /// Registry key, `<qualified module>.<class>`.
    pub fn handler_id(&self) -> String {
        format!("{}.{}", self.qualified_module(), self.class_name())
    }

    fn from_config(own: &Config) -> Result<Self> {
        Ok(Self {
            module: own.str("module")?.to_string(),
            class: own.opt_str("class")?.map(str::to_string),
            comment: own.opt_str("comment")?.map(str::to_string),
            own: own.clone(),
        })
    }
}

impl HandlerNode {
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(path) => Ok(HandlerNode::Include(path.clone())),
            Value::Config(config) if config.contains_key("module") => {
                Ok(HandlerNode::Step(HandlerSpec::from_config(config)?))
            }
            Value::Config(config) => Ok(HandlerNode::ParamBlock(config.clone())),
            Value::List(items) => items
                .iter()
                .map(HandlerNode::from_value)
                .collect::<Result<Vec<_>>>()
                .map(HandlerNode::Pipeline),
            other => Err(EtlError::config(format!(
                "Handler configuration must be a string, an object or an array, not \"{}\"",
                other.type_name()
            ))),
        }
    }
}
