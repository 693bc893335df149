// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test doubles shared by unit and integration tests.
//!
//! * handlers registered under the `rattle.testing` module: `Record` keeps every
//!   scope it receives, `Multiply` publishes `x * factor`, `Fail` always fails,
//!   `Spans` records the names of the tracing spans it runs in;
//! * [`RecordingDriver`], a database driver that records every call as a string.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::Span;
use tracing_subscriber::registry::{LookupSpan, Registry};

use crate::config::Config;
use crate::db::{ColumnHint, Cursor, DbConnection, Driver, DriverRegistry, NamedParams, RowSet, SqlValue};
use crate::engine::Context;
use crate::errors::{EtlError, Result};
use crate::handlers::HandlerRegistry;
use crate::traits::Handler;

pub const TEST_MODULE: &str = "rattle.testing";

pub type Recorded = Rc<RefCell<Vec<Config>>>;
pub type EventLog = Rc<RefCell<Vec<String>>>;

struct RecordHandler {
    seen: Recorded,
}

impl Handler for RecordHandler {
    fn run(&self, _ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        self.seen.borrow_mut().push(config.clone());
        Ok(config.get_opt("emit").and_then(|v| v.as_config()).cloned())
    }

    fn name(&self) -> &'static str {
        "record"
    }
}

struct MultiplyHandler;

impl Handler for MultiplyHandler {
    fn run(&self, _ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        let x = config.int("x")?;
        let factor = config.int_or("factor", 5)?;
        let mut out = Config::new();
        out.set("x", x * factor);
        Ok(Some(out))
    }

    fn name(&self) -> &'static str {
        "multiply"
    }
}

/// Records `spans`, the enclosing span names innermost first joined by `/`.
///
/// Span names are only visible while a [`Registry`] is the default subscriber.
struct SpansHandler {
    seen: Recorded,
}

fn current_span_names() -> Vec<&'static str> {
    let Some(id) = Span::current().id() else {
        return Vec::new();
    };
    tracing::dispatcher::get_default(|dispatch| {
        dispatch
            .downcast_ref::<Registry>()
            .and_then(|registry| registry.span(&id))
            .map(|span| span.scope().map(|s| s.name()).collect())
            .unwrap_or_default()
    })
}

impl Handler for SpansHandler {
    fn run(&self, _ctx: &mut Context, _config: &Config) -> Result<Option<Config>> {
        let mut entry = Config::new();
        entry.set("spans", current_span_names().join("/"));
        self.seen.borrow_mut().push(entry);
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "spans"
    }
}

struct FailHandler;

impl Handler for FailHandler {
    fn run(&self, _ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        Err(EtlError::data(config.str_or("message", "deliberate failure")?))
    }

    fn name(&self) -> &'static str {
        "fail"
    }
}

/// Register the test handlers and return the store `Record` writes to.
pub fn register_test_handlers(registry: &mut HandlerRegistry) -> Recorded {
    let seen: Recorded = Rc::new(RefCell::new(Vec::new()));
    let store = Rc::clone(&seen);
    registry.register(
        format!("{}.Record", TEST_MODULE),
        Box::new(move || {
            Box::new(RecordHandler {
                seen: Rc::clone(&store),
            })
        }),
    );
    registry.register(
        format!("{}.Multiply", TEST_MODULE),
        Box::new(|| Box::new(MultiplyHandler)),
    );
    registry.register(format!("{}.Fail", TEST_MODULE), Box::new(|| Box::new(FailHandler)));
    let store = Rc::clone(&seen);
    registry.register(
        format!("{}.Spans", TEST_MODULE),
        Box::new(move || {
            Box::new(SpansHandler {
                seen: Rc::clone(&store),
            })
        }),
    );
    seen
}

/// Driver that records calls instead of talking to a database.
///
/// Clones share the same log, so a test can keep one handle while the
/// connection owns another.
#[derive(Clone)]
pub struct RecordingDriver {
    events: EventLog,
    batches: Rc<RefCell<Vec<usize>>>,
    rows: Rc<RefCell<Vec<Vec<SqlValue>>>>,
    fail_batches: Rc<Cell<bool>>,
}

impl RecordingDriver {
    pub fn new() -> (Self, EventLog) {
        let events: EventLog = Rc::new(RefCell::new(Vec::new()));
        let driver = Self {
            events: Rc::clone(&events),
            batches: Rc::new(RefCell::new(Vec::new())),
            rows: Rc::new(RefCell::new(Vec::new())),
            fail_batches: Rc::new(Cell::new(false)),
        };
        (driver, events)
    }

    pub fn record(&self, event: impl Into<String>) {
        self.events.borrow_mut().push(event.into());
    }

    /// Row counts of every batched execution, in order.
    pub fn batches(&self) -> Vec<usize> {
        self.batches.borrow().clone()
    }

    /// Every row received by batched executions.
    pub fn rows(&self) -> Vec<Vec<SqlValue>> {
        self.rows.borrow().clone()
    }

    /// Make batched executions fail until reset.
    pub fn fail_batches(&self, fail: bool) {
        self.fail_batches.set(fail);
    }
}

impl Driver for RecordingDriver {
    fn begin(&self) -> Result<()> {
        self.record("begin");
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        self.record("commit");
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        self.record("rollback");
        Ok(())
    }

    fn execute(&self, sql: &str, params: &NamedParams) -> Result<usize> {
        let rendered: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        if rendered.is_empty() {
            self.record(format!("execute {}", sql));
        } else {
            self.record(format!("execute {} [{}]", sql, rendered.join(", ")));
        }
        Ok(0)
    }

    fn query(&self, sql: &str, _params: &NamedParams) -> Result<RowSet> {
        self.record(format!("query {}", sql));
        Ok(RowSet::default())
    }

    fn cursor<'a>(
        &'a self,
        array_size: Option<usize>,
        hints: &[ColumnHint],
    ) -> Result<Box<dyn Cursor + 'a>> {
        self.record(format!("cursor open {} {}", array_size.unwrap_or(0), hints.len()));
        Ok(Box::new(RecordingCursor {
            driver: self.clone(),
        }))
    }

    fn param_placeholder(&self, id: usize) -> String {
        format!(":{}", id)
    }

    fn datetime_expression(&self, value: &str, fmt: &str) -> String {
        format!("to_date({}, {})", value, fmt)
    }

    fn truncate_statement(&self, table: &str) -> String {
        format!("truncate table {}", table)
    }

    fn version(&self) -> String {
        "recording".to_string()
    }
}

struct RecordingCursor {
    driver: RecordingDriver,
}

impl Cursor for RecordingCursor {
    fn execute_many(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> Result<()> {
        if self.driver.fail_batches.get() {
            return Err(EtlError::database("batch rejected"));
        }
        self.driver.record(format!("execute_many {} {}", sql, rows.len()));
        self.driver.batches.borrow_mut().push(rows.len());
        self.driver.rows.borrow_mut().extend(rows.iter().cloned());
        Ok(())
    }
}

impl Drop for RecordingCursor {
    fn drop(&mut self) {
        self.driver.record("cursor close");
    }
}

/// Open a connection backed by `driver`.
pub fn recording_connection(driver: &RecordingDriver) -> DbConnection {
    let mut registry = DriverRegistry::empty();
    let template = driver.clone();
    registry.register(
        "rec",
        Box::new(move |_, _, _| Ok(Box::new(template.clone()) as Box<dyn Driver>)),
    );
    DbConnection::open(&registry, "rec:test", "", "").expect("recording connection")
}
