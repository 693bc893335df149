// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `SQLite` driver.
//!
//! Connection strings are `sqlite:<path>` or `sqlite::memory:`. Credentials are
//! ignored. A transaction is kept open at all times so `commit` and `rollback`
//! behave as they do against a server database: work is invisible to other
//! connections until committed and discarded on rollback or disconnect.

use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, Statement};
use tracing::debug;

use crate::db::{ColumnHint, Cursor, Driver, NamedParams, RowSet, SqlValue};
use crate::errors::Result;

const MEMORY_SPEC: &str = ":memory:";

pub struct SqliteDriver {
    conn: Connection,
}

impl SqliteDriver {
    pub fn connect(spec: &str, _username: &str, _password: &str) -> Result<Self> {
        let conn = if spec == MEMORY_SPEC {
            Connection::open_in_memory()?
        } else {
            Connection::open(spec)?
        };
        conn.execute_batch("BEGIN")?;
        debug!(spec, "Opened SQLite database");
        Ok(Self { conn })
    }

    fn prepare_named(&self, sql: &str, params: &NamedParams) -> Result<Statement<'_>> {
        let mut stmt = self.conn.prepare(sql)?;
        // Parameters the statement doesn't mention are skipped.
        for (name, value) in params {
            if let Some(index) = stmt.parameter_index(&format!(":{}", name))? {
                stmt.raw_bind_parameter(index, value)?;
            }
        }
        Ok(stmt)
    }
}

impl Driver for SqliteDriver {
    fn begin(&self) -> Result<()> {
        if self.conn.is_autocommit() {
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("COMMIT")?;
        }
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn rollback(&self) -> Result<()> {
        if !self.conn.is_autocommit() {
            self.conn.execute_batch("ROLLBACK")?;
        }
        self.conn.execute_batch("BEGIN")?;
        Ok(())
    }

    fn execute(&self, sql: &str, params: &NamedParams) -> Result<usize> {
        let mut stmt = self.prepare_named(sql, params)?;
        Ok(stmt.raw_execute()?)
    }

    fn query(&self, sql: &str, params: &NamedParams) -> Result<RowSet> {
        let mut stmt = self.prepare_named(sql, params)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        let mut result = RowSet {
            columns,
            rows: Vec::new(),
        };
        let mut rows = stmt.raw_query();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(result.columns.len());
            for i in 0..result.columns.len() {
                values.push(from_value_ref(row.get_ref(i)?));
            }
            result.rows.push(values);
        }
        Ok(result)
    }

    fn cursor<'a>(
        &'a self,
        array_size: Option<usize>,
        hints: &[ColumnHint],
    ) -> Result<Box<dyn Cursor + 'a>> {
        debug!(?array_size, columns = hints.len(), "Opening SQLite cursor");
        Ok(Box::new(SqliteCursor { conn: &self.conn }))
    }

    fn param_placeholder(&self, id: usize) -> String {
        format!("?{}", id)
    }

    // SQLite stores datetimes as text; the value is inserted as given.
    fn datetime_expression(&self, value: &str, _fmt: &str) -> String {
        value.to_string()
    }

    fn truncate_statement(&self, table: &str) -> String {
        format!("delete from {}", table)
    }

    fn version(&self) -> String {
        rusqlite::version().to_string()
    }
}

struct SqliteCursor<'a> {
    conn: &'a Connection,
}

impl Cursor for SqliteCursor<'_> {
    fn execute_many(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> Result<()> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        for row in rows {
            stmt.execute(rusqlite::params_from_iter(row.iter()))?;
        }
        Ok(())
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            SqlValue::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            SqlValue::Real(x) => ToSqlOutput::Borrowed(ValueRef::Real(*x)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

fn from_value_ref(value: ValueRef<'_>) -> SqlValue {
    match value {
        ValueRef::Null => SqlValue::Null,
        ValueRef::Integer(i) => SqlValue::Integer(i),
        ValueRef::Real(x) => SqlValue::Real(x),
        ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
    }
}
