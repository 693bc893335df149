// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Uniform database connection over pluggable drivers.
//!
//! A connection string has the form `<driver>:<driver-specific>`. The driver part
//! selects a factory in the [`DriverRegistry`]; the rest is handed to that factory
//! untouched together with the credentials.

use std::fmt;

use crate::db::DriverRegistry;
use crate::errors::{EtlError, Result};

/// The five abstract column types every driver maps onto its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Binary,
    DateTime,
    Number,
    RowId,
    String,
}

/// Per-column binding hint handed to a cursor ahead of a batched insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnHint {
    /// Maximum length of a bound string.
    Sized(usize),
    Type(DataType),
}

/// A value bound to, or read back from, a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => Ok(()),
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Real(x) => write!(f, "{}", x),
            SqlValue::Text(s) => f.write_str(s),
            SqlValue::Blob(b) => f.write_str(&String::from_utf8_lossy(b)),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        SqlValue::Integer(i)
    }
}

impl From<f64> for SqlValue {
    fn from(x: f64) -> Self {
        SqlValue::Real(x)
    }
}

/// Named statement parameters, in binding order. Names carry no `:` prefix.
pub type NamedParams = [(String, SqlValue)];

/// Result of a query: column names and rows of values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

/// A prepared-statement handle used for batched execution.
///
/// Dropping the cursor releases it.
pub trait Cursor {
    /// Execute `sql` once per row, binding the row's values positionally.
    fn execute_many(&mut self, sql: &str, rows: &[Vec<SqlValue>]) -> Result<()>;
}

/// Behaviour a concrete database driver provides.
///
/// Construction (through the registry factory) performs the connect. Dropping the
/// driver disconnects.
pub trait Driver {
    fn begin(&self) -> Result<()>;
    fn commit(&self) -> Result<()>;
    fn rollback(&self) -> Result<()>;

    /// Execute a statement with `:name` parameters, returning the affected row count.
    fn execute(&self, sql: &str, params: &NamedParams) -> Result<usize>;

    fn query(&self, sql: &str, params: &NamedParams) -> Result<RowSet>;

    fn cursor<'a>(
        &'a self,
        array_size: Option<usize>,
        hints: &[ColumnHint],
    ) -> Result<Box<dyn Cursor + 'a>>;

    /// Placeholder text for positional parameter `id` (1-based).
    fn param_placeholder(&self, id: usize) -> String;

    /// SQL expression converting `value` (itself an expression) from format `fmt` into a datetime.
    fn datetime_expression(&self, value: &str, fmt: &str) -> String;

    /// Statement emptying `table`.
    fn truncate_statement(&self, table: &str) -> String;

    fn version(&self) -> String;
}

/// A parsed `<driver>:<driver-specific>` connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    pub driver: String,
    pub spec: String,
}

impl ConnectionString {
    pub fn parse(connection: &str) -> Result<Self> {
        let (driver, spec) = match connection.split_once(':') {
            Some((driver, _)) if driver.is_empty() => {
                return Err(EtlError::database(
                    "Invalid connection string: driver name not found.",
                ))
            }
            Some(parts) => parts,
            None if connection.is_empty() => {
                return Err(EtlError::database(
                    "Invalid connection string: driver name not found.",
                ))
            }
            None => {
                return Err(EtlError::database(
                    "Invalid connection string: separator (:) not found.",
                ))
            }
        };
        if spec.is_empty() {
            return Err(EtlError::database(
                "Invalid connection string: driver configuration not found.",
            ));
        }
        Ok(Self {
            driver: driver.to_string(),
            spec: spec.to_string(),
        })
    }
}

/// An open connection: a driver plus the name it was opened under.
pub struct DbConnection {
    driver_name: String,
    driver: Box<dyn Driver>,
}

impl DbConnection {
    /// Parse `connection`, look up its driver in `registry` and connect.
    pub fn open(
        registry: &DriverRegistry,
        connection: &str,
        username: &str,
        password: &str,
    ) -> Result<Self> {
        let parsed = ConnectionString::parse(connection)?;
        let driver = registry.create(&parsed.driver, &parsed.spec, username, password)?;
        Ok(Self {
            driver_name: parsed.driver,
            driver,
        })
    }

    pub fn driver_name(&self) -> &str {
        &self.driver_name
    }

    pub fn begin(&self) -> Result<()> {
        self.driver.begin()
    }

    pub fn commit(&self) -> Result<()> {
        self.driver.commit()
    }

    pub fn rollback(&self) -> Result<()> {
        self.driver.rollback()
    }

    pub fn execute(&self, sql: &str, params: &NamedParams) -> Result<usize> {
        self.driver.execute(sql, params)
    }

    pub fn query(&self, sql: &str, params: &NamedParams) -> Result<RowSet> {
        self.driver.query(sql, params)
    }

    /// First column of the first row.
    pub fn query_scalar(&self, sql: &str, params: &NamedParams) -> Result<SqlValue> {
        let rows = self.driver.query(sql, params)?;
        rows.rows
            .into_iter()
            .next()
            .and_then(|row| row.into_iter().next())
            .ok_or_else(|| EtlError::database(format!("Query returned no rows: {}", sql)))
    }

    pub fn cursor(
        &self,
        array_size: Option<usize>,
        hints: &[ColumnHint],
    ) -> Result<Box<dyn Cursor + '_>> {
        self.driver.cursor(array_size, hints)
    }

    pub fn param_placeholder(&self, id: usize) -> String {
        self.driver.param_placeholder(id)
    }

    pub fn datetime_expression(&self, value: &str, fmt: &str) -> String {
        self.driver.datetime_expression(value, fmt)
    }

    pub fn truncate_statement(&self, table: &str) -> String {
        self.driver.truncate_statement(table)
    }

    pub fn version(&self) -> String {
        self.driver.version()
    }
}

impl fmt::Debug for DbConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConnection")
            .field("driver", &self.driver_name)
            .finish()
    }
}
