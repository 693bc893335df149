// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for process loader events.

use crate::errors::EtlError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A process is starting.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ProcessStarted<'a> {
    pub name: &'a str,
    pub comment: &'a str,
}

impl Display for ProcessStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        if self.comment.is_empty() {
            write!(f, "Running process \"{}\"", self.name)
        } else {
            write!(f, "Running process \"{}\" ({})", self.name, self.comment)
        }
    }
}

impl StructuredLog for ProcessStarted<'_> {
    fn log(&self) {
        tracing::info!(process = self.name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("process", span_name = name, process = self.name)
    }
}

/// A process finished without error.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct ProcessSucceeded<'a> {
    pub name: &'a str,
}

impl Display for ProcessSucceeded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Process \"{}\" finished successfully", self.name)
    }
}

impl StructuredLog for ProcessSucceeded<'_> {
    fn log(&self) {
        tracing::debug!(process = self.name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("process_succeeded", span_name = name, process = self.name)
    }
}

/// A process failed. The error category is logged next to the message.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ProcessFailed<'a> {
    pub name: &'a str,
    pub error: &'a EtlError,
}

impl Display for ProcessFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Process \"{}\" failed with a {} error: {}",
            self.name,
            self.error.category(),
            self.error
        )
    }
}

impl StructuredLog for ProcessFailed<'_> {
    fn log(&self) {
        tracing::error!(
            process = self.name,
            category = %self.error.category(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "process_failed",
            span_name = name,
            process = self.name,
            category = %self.error.category(),
        )
    }
}

/// A failed process had `stop_on_error` set; no further processes run.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct RunAborted<'a> {
    pub process: &'a str,
    pub skipped: usize,
}

impl Display for RunAborted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Error occurred in process \"{}\", exiting ({} process(es) skipped)",
            self.process, self.skipped
        )
    }
}

impl StructuredLog for RunAborted<'_> {
    fn log(&self) {
        tracing::error!(process = self.process, skipped = self.skipped, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("run_aborted", span_name = name, process = self.process)
    }
}

/// End-of-run counters.
///
/// # Log Level
/// `info!`, followed by a `warn!` listing failed processes when there are any
pub struct RunFinished<'a> {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_processes: &'a [String],
}

impl Display for RunFinished<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Load finished, ran {} processes, {} succeeded, {} failed.",
            self.total, self.succeeded, self.failed
        )
    }
}

impl StructuredLog for RunFinished<'_> {
    fn log(&self) {
        tracing::info!(
            total = self.total,
            succeeded = self.succeeded,
            failed = self.failed,
            "{}", self
        );
        if !self.failed_processes.is_empty() {
            tracing::warn!(
                failed = self.failed,
                "Failed processes: {}",
                self.failed_processes.join(", ")
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "run_finished",
            span_name = name,
            total = self.total,
            failed = self.failed,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_failed_names_category() {
        let error = EtlError::data("bad row").at_line(3);
        let msg = ProcessFailed {
            name: "load",
            error: &error,
        };
        assert_eq!(
            msg.to_string(),
            "Process \"load\" failed with a data error: Input data error at line 3: bad row"
        );
    }

    #[test]
    fn test_run_finished_counts() {
        let failed = vec!["b".to_string()];
        let msg = RunFinished {
            total: 2,
            succeeded: 1,
            failed: 1,
            failed_processes: &failed,
        };
        assert_eq!(msg.to_string(), "Load finished, ran 2 processes, 1 succeeded, 1 failed.");
    }
}
