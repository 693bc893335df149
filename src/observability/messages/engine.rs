// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for orchestration context events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::path::Path;
use tracing::Span;

/// A configuration document was read, either the root file or an include.
///
/// # Log Level
/// `debug!` for includes, `info!` for the root file
pub struct ConfigFileLoaded<'a> {
    pub path: &'a Path,
    pub depth: usize,
}

impl Display for ConfigFileLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Loaded configuration file {}", self.path.display())
    }
}

impl StructuredLog for ConfigFileLoaded<'_> {
    fn log(&self) {
        if self.depth == 0 {
            tracing::info!(path = %self.path.display(), "{}", self);
        } else {
            tracing::debug!(path = %self.path.display(), depth = self.depth, "{}", self);
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "config_file",
            span_name = name,
            path = %self.path.display(),
            depth = self.depth,
        )
    }
}

/// A handler step is about to run.
///
/// # Log Level
/// `info!` - Important operational event
pub struct HandlerInvoked<'a> {
    pub handler_id: &'a str,
    /// Template-expanded step comment, empty when the step has none.
    pub comment: &'a str,
}

impl Display for HandlerInvoked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.comment.is_empty() {
            write!(f, "Invoking handler {}", self.handler_id)
        } else {
            write!(f, "Invoking handler {} ({})", self.handler_id, self.comment)
        }
    }
}

impl StructuredLog for HandlerInvoked<'_> {
    fn log(&self) {
        tracing::info!(handler = self.handler_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "handler",
            span_name = name,
            handler = self.handler_id,
        )
    }
}

/// A handler returned output parameters onto the running pipeline.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct PipelineUpdated<'a> {
    pub handler_id: &'a str,
    pub keys: Vec<&'a str>,
}

impl Display for PipelineUpdated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Handler {} published {} on the pipeline",
            self.handler_id,
            self.keys.join(", ")
        )
    }
}

impl StructuredLog for PipelineUpdated<'_> {
    fn log(&self) {
        tracing::debug!(handler = self.handler_id, keys = ?self.keys, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "pipeline_updated",
            span_name = name,
            handler = self.handler_id,
        )
    }
}

/// A parameter block appeared outside any pipeline and has no effect.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct ParamBlockIgnored {
    pub key_count: usize,
}

impl Display for ParamBlockIgnored {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Ignoring parameter block with {} key(s) outside of a pipeline",
            self.key_count
        )
    }
}

impl StructuredLog for ParamBlockIgnored {
    fn log(&self) {
        tracing::debug!(key_count = self.key_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("param_block", span_name = name, key_count = self.key_count)
    }
}

/// A pooled database connection was opened.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ConnectionEstablished<'a> {
    pub name: &'a str,
    pub username: &'a str,
    pub connection: &'a str,
}

impl Display for ConnectionEstablished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Established DB connection to {}@{} as \"{}\"",
            self.username, self.connection, self.name
        )
    }
}

impl StructuredLog for ConnectionEstablished<'_> {
    fn log(&self) {
        tracing::info!(
            name = self.name,
            username = self.username,
            connection = self.connection,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "connection",
            span_name = name,
            db = self.name,
            connection = self.connection,
        )
    }
}

/// The context is running in dry-run mode.
///
/// # Log Level
/// `info!` - Important operational event
pub struct DryRunEnabled;

impl Display for DryRunEnabled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.write_str("Running in the dry-run mode.")
    }
}

impl StructuredLog for DryRunEnabled {
    fn log(&self) {
        tracing::info!(dry_run = true, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("dry_run", span_name = name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_invoked_formats_comment() {
        let plain = HandlerInvoked {
            handler_id: "rattle.handlers.file_reader.Handler",
            comment: "",
        };
        assert_eq!(plain.to_string(), "Invoking handler rattle.handlers.file_reader.Handler");

        let commented = HandlerInvoked {
            handler_id: "rattle.handlers.file_reader.Handler",
            comment: "read rates.txt",
        };
        assert_eq!(
            commented.to_string(),
            "Invoking handler rattle.handlers.file_reader.Handler (read rates.txt)"
        );
    }

    #[test]
    fn test_connection_established_message() {
        let msg = ConnectionEstablished {
            name: "warehouse",
            username: "etl",
            connection: "sqlite::memory:",
        };
        assert_eq!(
            msg.to_string(),
            "Established DB connection to etl@sqlite::memory: as \"warehouse\""
        );
    }
}
