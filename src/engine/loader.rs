// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;

use crate::config::{HandlerNode, Value};
use crate::engine::Context;
use crate::errors::{EtlError, Result};
use crate::observability::messages::loader::{
    ProcessFailed, ProcessStarted, ProcessSucceeded, RunAborted, RunFinished,
};
use crate::observability::messages::StructuredLog;

/// One entry of the root `processes` array.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessRecord {
    pub name: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default = "default_stop_on_error")]
    pub stop_on_error: bool,
    pub handler: serde_json::Value,
}

fn default_stop_on_error() -> bool {
    true
}

/// Outcome of a loader run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_processes: Vec<String>,
    /// A failing process had `stop_on_error` set and the run stopped there.
    pub aborted: bool,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && !self.aborted
    }
}

/// Runs the processes of the root configuration, in order.
///
/// Each process is a failure boundary: its error is logged with its category and
/// recorded in the [`RunSummary`]. Whether the run continues is decided here
/// alone, from the process's `stop_on_error` flag.
pub struct Loader {
    context: Context,
}

impl Loader {
    pub fn new(context: Context) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn run(&mut self) -> Result<RunSummary> {
        let records = self.process_records()?;
        tracing::info!(processes = records.len(), "Starting the load.");

        let mut summary = RunSummary::default();
        for (index, record) in records.iter().enumerate() {
            summary.total += 1;
            match self.run_process(record) {
                Ok(()) => {
                    summary.succeeded += 1;
                    ProcessSucceeded { name: &record.name }.log();
                }
                Err(error) => {
                    summary.failed += 1;
                    summary.failed_processes.push(record.name.clone());
                    ProcessFailed {
                        name: &record.name,
                        error: &error,
                    }
                    .log();
                    if record.stop_on_error {
                        summary.aborted = true;
                        RunAborted {
                            process: &record.name,
                            skipped: records.len() - index - 1,
                        }
                        .log();
                        break;
                    }
                }
            }
        }

        RunFinished {
            total: summary.total,
            succeeded: summary.succeeded,
            failed: summary.failed,
            failed_processes: &summary.failed_processes,
        }
        .log();
        Ok(summary)
    }

    fn process_records(&self) -> Result<Vec<ProcessRecord>> {
        self.context
            .root()
            .list("processes")?
            .iter()
            .enumerate()
            .map(|(index, item)| {
                serde_json::from_value(serde_json::Value::from(item)).map_err(|e| {
                    EtlError::config(format!("Invalid process definition #{}: {}", index + 1, e))
                })
            })
            .collect()
    }

    fn run_process(&mut self, record: &ProcessRecord) -> Result<()> {
        let started = ProcessStarted {
            name: &record.name,
            comment: &record.comment,
        };
        let span = started.span("process_execution");
        let _guard = span.enter();
        started.log();
        let node = HandlerNode::from_value(&Value::from(record.handler.clone()))?;
        self.context.invoke(&node, None)
    }
}
