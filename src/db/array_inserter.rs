// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use tracing::debug;

use crate::db::{ColumnHint, Cursor, DbConnection, SqlValue};
use crate::errors::Result;

/// Number of rows sent to the database per batch.
pub const INSERT_BIND_ARRAY_SIZE: usize = 100;

/// Buffers rows for a single INSERT statement and sends them in batches.
///
/// The buffer is flushed automatically when it reaches [`INSERT_BIND_ARRAY_SIZE`]
/// rows; the caller flushes the remainder at the end of the stream. A failed flush
/// keeps the buffered rows and leaves the transaction to the caller.
pub struct ArrayInserter<'c> {
    connection: &'c DbConnection,
    cursor: Box<dyn Cursor + 'c>,
    statement: String,
    commit_on_flush: bool,
    rows: Vec<Vec<SqlValue>>,
}

impl<'c> ArrayInserter<'c> {
    pub fn new(
        connection: &'c DbConnection,
        statement: impl Into<String>,
        hints: &[ColumnHint],
        commit_on_flush: bool,
    ) -> Result<Self> {
        let cursor = connection.cursor(Some(INSERT_BIND_ARRAY_SIZE), hints)?;
        Ok(Self {
            connection,
            cursor,
            statement: statement.into(),
            commit_on_flush,
            rows: Vec::with_capacity(INSERT_BIND_ARRAY_SIZE),
        })
    }

    pub fn push_row(&mut self, row: Vec<SqlValue>) -> Result<()> {
        self.rows.push(row);
        if self.rows.len() >= INSERT_BIND_ARRAY_SIZE {
            self.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if self.rows.is_empty() {
            return Ok(());
        }
        self.cursor.execute_many(&self.statement, &self.rows)?;
        if self.commit_on_flush {
            self.connection.commit()?;
        }
        debug!(rows = self.rows.len(), "Flushed insert batch");
        self.rows.clear();
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.rows.len()
    }

    pub fn statement(&self) -> &str {
        &self.statement
    }
}
