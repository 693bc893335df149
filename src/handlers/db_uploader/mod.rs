// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Tabular upload of fixed-width or delimited text into a database table.
//!
//! Every column mapping is validated before the first record is read. Each input
//! record becomes one row of an `insert into <table>(...) values(...)` statement
//! executed in batches through an [`ArrayInserter`]. Values bound from the input
//! pass through trimming, NULL detection for empty values, string length checks
//! and numeric parsing; a failure there is a data error naming the source line.

mod mapping;

pub use mapping::{ColumnKind, ColumnMapping, ColumnType, InputFormat, Source, Trim, MAX_STRING_LENGTH};

use std::ops::Range;

use csv::{ReaderBuilder, StringRecord};

use crate::config::{split_lines, template, Config};
use crate::db::{ArrayInserter, SqlValue};
use crate::engine::Context;
use crate::errors::{EtlError, Result};
use crate::traits::Handler;

use super::input_param;
use mapping::slice_chars;

pub struct DbUploader;

/// One input record, as the chosen format sees it.
enum Record<'a> {
    Line(&'a str),
    Fields(&'a StringRecord),
}

impl Record<'_> {
    fn extract(&self, source: Source) -> Result<String> {
        match (self, source) {
            (Record::Line(line), Source::Span { start, end }) => Ok(slice_chars(line, start, end)),
            (Record::Fields(fields), Source::Field(index)) => fields
                .get(index)
                .map(str::to_string)
                .ok_or_else(|| {
                    EtlError::data(format!(
                        "field index {} is out of range ({} fields)",
                        index,
                        fields.len()
                    ))
                }),
            _ => Err(EtlError::logic("Column source does not match the input format")),
        }
    }
}

fn build_row(mappings: &[ColumnMapping], record: &Record<'_>, rownum: usize) -> Result<Vec<SqlValue>> {
    let mut row = Vec::with_capacity(mappings.len());
    for mapping in mappings {
        match &mapping.kind {
            ColumnKind::Sourced {
                source,
                datatype,
                trim,
            } => {
                let raw = record.extract(*source)?;
                row.push(datatype.convert(&mapping.name, trim.apply(&raw))?);
            }
            ColumnKind::Expression { uses_rownum: true } => row.push(SqlValue::Integer(rownum as i64)),
            ColumnKind::Expression { uses_rownum: false } => {}
        }
    }
    Ok(row)
}

/// Converts records into rows and hands them to the inserter, if there is one.
struct RowSink<'c> {
    mappings: &'c [ColumnMapping],
    inserter: Option<ArrayInserter<'c>>,
    rows: usize,
}

impl RowSink<'_> {
    fn push(&mut self, record: &Record<'_>, line: usize) -> Result<()> {
        let row = build_row(self.mappings, record, self.rows + 1).map_err(|e| e.at_line(line))?;
        if let Some(inserter) = self.inserter.as_mut() {
            inserter.push_row(row)?;
        }
        self.rows += 1;
        Ok(())
    }

    /// Flush the remaining rows and release the cursor. Returns the row count.
    fn finish(self) -> Result<usize> {
        if let Some(mut inserter) = self.inserter {
            inserter.flush()?;
        }
        Ok(self.rows)
    }
}

/// Maps csv records back to physical source lines.
///
/// The csv reader drops blank lines and lets quoted fields run over several lines,
/// so record counts and line numbers drift apart. Blank lines are reported here so
/// they can be loaded as empty records.
struct LineTracker<'a> {
    data: &'a [u8],
    /// Offset just past the content of the last record.
    offset: usize,
    /// Line holding `offset`, starting at 1.
    line: usize,
    started: bool,
}

fn is_terminator(byte: &u8) -> bool {
    *byte == b'\r' || *byte == b'\n'
}

impl<'a> LineTracker<'a> {
    fn new(data: &'a str) -> Self {
        Self {
            data: data.as_bytes(),
            offset: 0,
            line: 1,
            started: false,
        }
    }

    /// Step over the line terminators before `end`, returning the blank lines among them.
    fn skip_blank(&mut self, end: usize) -> Range<usize> {
        let end = end.clamp(self.offset, self.data.len());
        let run = self.data[self.offset..end]
            .iter()
            .take_while(|b| is_terminator(b))
            .count();
        let breaks = self.data[self.offset..self.offset + run]
            .iter()
            .filter(|b| **b == b'\n')
            .count();
        // After a record the first break only closes that record's line.
        let (first, blank) = if self.started {
            (self.line + 1, breaks.saturating_sub(1))
        } else {
            (self.line, breaks)
        };
        self.offset += run;
        self.line += breaks;
        first..first + blank
    }

    /// Consume one record ending before `end` and return the line it starts on.
    fn record(&mut self, end: usize) -> usize {
        let end = end.clamp(self.offset, self.data.len());
        let raw = &self.data[self.offset..end];
        let len = raw.len() - raw.iter().rev().take_while(|b| is_terminator(b)).count();
        let start = self.line;
        self.line += raw[..len].iter().filter(|b| **b == b'\n').count();
        self.offset += len;
        self.started = true;
        start
    }
}

fn single_byte(key: &str, value: &str) -> Result<u8> {
    match value.as_bytes() {
        [byte] => Ok(*byte),
        _ => Err(EtlError::config(format!(
            "{} must be a single ASCII character, not \"{}\"",
            key, value
        ))),
    }
}

fn insert_statement(table: &str, mappings: &[ColumnMapping]) -> String {
    let columns: Vec<&str> = mappings.iter().map(|m| m.target_column.as_str()).collect();
    let values: Vec<&str> = mappings.iter().map(|m| m.value_sql.as_str()).collect();
    format!(
        "insert into {}({}) values({})",
        table,
        columns.join(", "),
        values.join(", ")
    )
}

impl Handler for DbUploader {
    fn run(&self, ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        let data = config.str(input_param(config)?)?;
        let format: InputFormat = config.str("format")?.parse()?;
        let start_line = config.int_or("start_line", 1)?;
        let target_database = template::expand(config.str("target_database")?, config)?;
        let target_table = config.str("target_table")?;
        let truncate_target = config.bool_or("truncate_target", false);
        let dry_run = ctx.is_dry_run();
        let prefix = ctx.dry_run_prefix();

        tracing::info!("{}Loading data to {}@{}", prefix, target_table, target_database);
        let conn = ctx.connection(&target_database)?;

        let mut next_bind = 1;
        let mappings = config
            .list("column_mappings")?
            .iter()
            .map(|value| ColumnMapping::parse(value, format, config, &conn, &mut next_bind))
            .collect::<Result<Vec<_>>>()?;
        if mappings.is_empty() {
            return Err(EtlError::config("column_mappings must not be empty"));
        }

        if truncate_target {
            if !dry_run {
                conn.execute(&conn.truncate_statement(target_table), &[])?;
            }
            tracing::info!("{}Table {}@{} is truncated", prefix, target_table, target_database);
        }

        let statement = insert_statement(target_table, &mappings);
        tracing::debug!(%statement, "Prepared insert statement");
        let hints: Vec<_> = mappings.iter().filter_map(ColumnMapping::hint).collect();
        let inserter = if dry_run {
            None
        } else {
            Some(ArrayInserter::new(&conn, statement, &hints, false)?)
        };
        let mut sink = RowSink {
            mappings: &mappings,
            inserter,
            rows: 0,
        };

        let mut count_src_lines: usize = 0;
        match format {
            InputFormat::Fixed => {
                for line in split_lines(data) {
                    count_src_lines += 1;
                    if (count_src_lines as i64) < start_line {
                        continue;
                    }
                    sink.push(&Record::Line(line), count_src_lines)?;
                }
            }
            InputFormat::Delimited => {
                let mut builder = ReaderBuilder::new();
                builder
                    .has_headers(false)
                    .flexible(true)
                    .delimiter(single_byte("delimiter", config.str("delimiter")?)?);
                if let Some(quotechar) = config.opt_str("quotechar")? {
                    builder.quote(single_byte("quotechar", quotechar)?);
                }
                let mut reader = builder.from_reader(data.as_bytes());
                let mut tracker = LineTracker::new(data);
                let mut fields = StringRecord::new();
                let empty = StringRecord::new();
                loop {
                    let more = reader
                        .read_record(&mut fields)
                        .map_err(|e| EtlError::data(e.to_string()).at_line(tracker.line))?;
                    let end = if more {
                        reader.position().byte() as usize
                    } else {
                        data.len()
                    };
                    for line in tracker.skip_blank(end) {
                        count_src_lines += 1;
                        if (line as i64) >= start_line {
                            sink.push(&Record::Fields(&empty), line)?;
                        }
                    }
                    if !more {
                        break;
                    }
                    let line = tracker.record(end);
                    count_src_lines += 1;
                    if (line as i64) >= start_line {
                        sink.push(&Record::Fields(&fields), line)?;
                    }
                }
            }
        }

        let count_tgt_rows = sink.finish()?;
        if !dry_run {
            conn.commit()?;
        }

        tracing::info!(
            "{}Loading {}@{} finished, read {} rows, inserted {} rows.",
            prefix,
            target_table,
            target_database,
            count_src_lines,
            count_tgt_rows
        );
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "db_uploader"
    }
}
