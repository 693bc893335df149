// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Column mappings of the tabular uploader, validated before any data is read.

use std::str::FromStr;

use crate::config::{template, Config, Value};
use crate::db::{ColumnHint, DataType, DbConnection, SqlValue};
use crate::errors::{EtlError, Result};

pub const MAX_STRING_LENGTH: usize = 4000;
const DATETIME_BIND_LENGTH: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Fixed,
    Delimited,
}

impl FromStr for InputFormat {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fixed" => Ok(InputFormat::Fixed),
            "delimited" => Ok(InputFormat::Delimited),
            other => Err(EtlError::config(format!("Invalid format value: \"{}\".", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trim {
    None,
    Left,
    Right,
    Both,
}

impl Trim {
    fn parse(column: &str, s: &str) -> Result<Self> {
        match s {
            "none" => Ok(Trim::None),
            "left" => Ok(Trim::Left),
            "right" => Ok(Trim::Right),
            "both" => Ok(Trim::Both),
            other => Err(EtlError::config(format!(
                "Invalid trim value for column \"{}\": \"{}\"",
                column, other
            ))),
        }
    }

    pub fn apply<'a>(&self, value: &'a str) -> &'a str {
        match self {
            Trim::None => value,
            Trim::Left => value.trim_start(),
            Trim::Right => value.trim_end(),
            Trim::Both => value.trim(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String { length: usize, truncate: bool },
    Integer,
    Number,
    DateTime,
}

impl ColumnType {
    /// Convert a raw source value into the bound value.
    pub fn convert(&self, column: &str, raw: &str) -> Result<SqlValue> {
        if raw.is_empty() {
            return Ok(SqlValue::Null);
        }
        match *self {
            ColumnType::String { length, truncate } => {
                let len = raw.chars().count();
                if len <= length {
                    Ok(SqlValue::Text(raw.to_string()))
                } else if truncate {
                    Ok(SqlValue::Text(raw.chars().take(length).collect()))
                } else {
                    Err(EtlError::data(format!(
                        "String column \"{}\": value length ({}) exceeds allowed maximum ({})",
                        column, len, length
                    )))
                }
            }
            ColumnType::Integer => raw.trim().parse::<i64>().map(SqlValue::Integer).map_err(|e| {
                EtlError::data(format!("Integer column \"{}\": {}: {:?}", column, e, raw))
            }),
            ColumnType::Number => raw.trim().parse::<f64>().map(SqlValue::Real).map_err(|e| {
                EtlError::data(format!("Float value error for column \"{}\": {}: {:?}", column, e, raw))
            }),
            ColumnType::DateTime => Ok(SqlValue::Text(raw.to_string())),
        }
    }

    fn hint(&self) -> ColumnHint {
        match self {
            ColumnType::String { length, .. } => ColumnHint::Sized(*length),
            ColumnType::Integer | ColumnType::Number => ColumnHint::Type(DataType::Number),
            ColumnType::DateTime => ColumnHint::Sized(DATETIME_BIND_LENGTH),
        }
    }
}

/// Where a column's value comes from in an input record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Character range `[start, end)` of a fixed-width line.
    Span { start: usize, end: usize },
    /// Field index of a delimited record.
    Field(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnKind {
    /// Bound from the input record.
    Sourced {
        source: Source,
        datatype: ColumnType,
        trim: Trim,
    },
    /// A constant expression; `uses_rownum` binds the 1-based target row number.
    Expression { uses_rownum: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    pub name: String,
    pub target_column: String,
    /// SQL text placed in the VALUES list.
    pub value_sql: String,
    pub kind: ColumnKind,
}

impl ColumnMapping {
    /// Parse one mapping. `next_bind` is the number of the next placeholder and
    /// advances for every bound column.
    pub fn parse(
        value: &Value,
        format: InputFormat,
        params: &Config,
        conn: &DbConnection,
        next_bind: &mut usize,
    ) -> Result<Self> {
        let cm = value.as_config().ok_or_else(|| {
            EtlError::config(format!(
                "Column mapping must be an object, not \"{}\"",
                value.type_name()
            ))
        })?;
        let name = cm.str("name")?.to_string();
        let target_column = cm.str("target_column")?.to_string();
        let target_expr = cm.opt_str("target_expr")?;

        let source = match format {
            InputFormat::Fixed => cm
                .opt_str("source_pos")?
                .map(|pos| parse_span(&name, pos))
                .transpose()?,
            InputFormat::Delimited => match cm.get_opt("source_index") {
                None | Some(Value::Null) => None,
                Some(_) => {
                    let index = cm.int("source_index")?;
                    let index = usize::try_from(index).map_err(|_| {
                        EtlError::config(format!(
                            "source_index must not be negative (column \"{}\")",
                            name
                        ))
                    })?;
                    Some(Source::Field(index))
                }
            },
        };

        match source {
            Some(source) => {
                let datatype = parse_type(&name, cm)?;
                let trim = Trim::parse(&name, cm.str_or("source_trim", "none")?)?;
                let mut placeholder = conn.param_placeholder(*next_bind);
                *next_bind += 1;
                if datatype == ColumnType::DateTime {
                    if let Some(fmt) = cm.opt_str("source_format")? {
                        placeholder = conn.datetime_expression(&placeholder, &format!("'{}'", fmt));
                    }
                }
                let value_sql = match target_expr {
                    Some(expr) => {
                        let mut scope = params.clone();
                        scope.set("value", placeholder);
                        template::expand(expr, &scope)?
                    }
                    None => placeholder,
                };
                Ok(Self {
                    name,
                    target_column,
                    value_sql,
                    kind: ColumnKind::Sourced {
                        source,
                        datatype,
                        trim,
                    },
                })
            }
            None => {
                let expr = target_expr.ok_or_else(|| {
                    EtlError::config(format!(
                        "Column \"{}\": target_expr must be specified unless {} is given",
                        name,
                        match format {
                            InputFormat::Fixed => "source_pos",
                            InputFormat::Delimited => "source_index",
                        }
                    ))
                })?;
                let uses_rownum = template::references(expr, "rownum");
                let mut scope = params.clone();
                if uses_rownum {
                    scope.set("rownum", conn.param_placeholder(*next_bind));
                    *next_bind += 1;
                }
                Ok(Self {
                    name,
                    target_column,
                    value_sql: template::expand(expr, &scope)?,
                    kind: ColumnKind::Expression { uses_rownum },
                })
            }
        }
    }

    /// Binding hint, for columns that bind a value.
    pub fn hint(&self) -> Option<ColumnHint> {
        match &self.kind {
            ColumnKind::Sourced { datatype, .. } => Some(datatype.hint()),
            ColumnKind::Expression { uses_rownum: true } => Some(ColumnHint::Type(DataType::Number)),
            ColumnKind::Expression { uses_rownum: false } => None,
        }
    }
}

fn parse_type(column: &str, cm: &Config) -> Result<ColumnType> {
    match cm.str("datatype")? {
        "string" => {
            let length = cm.int("length")?;
            let length = usize::try_from(length)
                .ok()
                .filter(|l| (1..=MAX_STRING_LENGTH).contains(l))
                .ok_or_else(|| {
                    EtlError::config(format!(
                        "Invalid length for the column \"{}\": {} (must be between 1 and {})",
                        column, length, MAX_STRING_LENGTH
                    ))
                })?;
            Ok(ColumnType::String {
                length,
                truncate: cm.bool_or("truncate", false),
            })
        }
        "integer" => Ok(ColumnType::Integer),
        "number" => Ok(ColumnType::Number),
        "datetime" => Ok(ColumnType::DateTime),
        other => Err(EtlError::config(format!(
            "Invalid datatype for the column \"{}\": \"{}\"",
            column, other
        ))),
    }
}

/// Parse a 1-based inclusive `<left>:<right>` specifier into a character range.
fn parse_span(column: &str, spec: &str) -> Result<Source> {
    let invalid = || {
        EtlError::config(format!(
            "Invalid position specifier \"{}\" for column \"{}\"",
            spec, column
        ))
    };
    let (left, right) = spec.split_once(':').ok_or_else(invalid)?;
    if left.is_empty() || right.is_empty() {
        return Err(invalid());
    }
    let left: i64 = left.trim().parse().map_err(|e| {
        EtlError::config(format!(
            "Left boundary specification for column \"{}\": {}",
            column, e
        ))
    })?;
    let right: i64 = right.trim().parse().map_err(|e| {
        EtlError::config(format!(
            "Right boundary specification for column \"{}\": {}",
            column, e
        ))
    })?;
    if left < 1 {
        return Err(EtlError::config(format!(
            "Left boundary must be positive (column \"{}\")",
            column
        )));
    }
    if right < left {
        return Err(EtlError::config(format!(
            "Right boundary must be greater than or equal to the left one (column \"{}\")",
            column
        )));
    }
    Ok(Source::Span {
        start: (left - 1) as usize,
        end: right as usize,
    })
}

/// Characters `[start, end)` of `line`; shorter lines yield what is there.
pub fn slice_chars(line: &str, start: usize, end: usize) -> String {
    line.chars().skip(start).take(end - start).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCategory;
    use crate::testing::{recording_connection, RecordingDriver};
    use serde_json::json;

    fn parse(mapping: serde_json::Value, format: InputFormat, next: &mut usize) -> Result<ColumnMapping> {
        let (driver, _) = RecordingDriver::new();
        let conn = recording_connection(&driver);
        let params = Config::try_from(json!({"batch": 12})).unwrap();
        ColumnMapping::parse(&Value::from(mapping), format, &params, &conn, next)
    }

    #[test]
    fn test_string_length_bounds() {
        let mut next = 1;
        let ok = parse(
            json!({"name": "c", "target_column": "c", "datatype": "string", "length": 4000, "source_pos": "1:5"}),
            InputFormat::Fixed,
            &mut next,
        )
        .unwrap();
        assert_eq!(ok.hint(), Some(ColumnHint::Sized(4000)));

        for length in [0, 5000] {
            let err = parse(
                json!({"name": "c", "target_column": "c", "datatype": "string", "length": length, "source_pos": "1:5"}),
                InputFormat::Fixed,
                &mut next,
            )
            .unwrap_err();
            assert_eq!(err.category(), ErrorCategory::Configuration);
            assert!(err.to_string().contains("must be between 1 and 4000"));
        }
    }

    #[test]
    fn test_placeholders_count_bound_columns_only() {
        let mut next = 1;
        let a = parse(
            json!({"name": "a", "target_column": "a", "datatype": "integer", "source_index": 0}),
            InputFormat::Delimited,
            &mut next,
        )
        .unwrap();
        let constant = parse(
            json!({"name": "b", "target_column": "b", "target_expr": "'{batch}'"}),
            InputFormat::Delimited,
            &mut next,
        )
        .unwrap();
        let rownum = parse(
            json!({"name": "r", "target_column": "r", "target_expr": "{rownum} + 1000"}),
            InputFormat::Delimited,
            &mut next,
        )
        .unwrap();
        assert_eq!(a.value_sql, ":1");
        assert_eq!(constant.value_sql, "'12'");
        assert_eq!(constant.hint(), None);
        assert_eq!(rownum.value_sql, ":2 + 1000");
        assert_eq!(next, 3);
    }

    #[test]
    fn test_datetime_source_format_and_value_expression() {
        let mut next = 1;
        let m = parse(
            json!({
                "name": "d", "target_column": "d", "datatype": "datetime",
                "source_pos": "1:10", "source_format": "YYYY-MM-DD", "target_expr": "trunc({value})"
            }),
            InputFormat::Fixed,
            &mut next,
        )
        .unwrap();
        assert_eq!(m.value_sql, "trunc(to_date(:1, 'YYYY-MM-DD'))");
        assert_eq!(m.hint(), Some(ColumnHint::Sized(30)));
    }

    #[test]
    fn test_missing_source_requires_expression() {
        let mut next = 1;
        let err = parse(
            json!({"name": "x", "target_column": "x", "datatype": "string", "length": 3, "source_index": 1}),
            InputFormat::Fixed,
            &mut next,
        )
        .unwrap_err();
        assert!(err.to_string().contains("source_pos"));
    }

    #[test]
    fn test_bad_position_specifiers() {
        for spec in ["5", ":3", "a:3", "0:3", "5:3"] {
            assert!(parse_span("c", spec).is_err(), "{} should be rejected", spec);
        }
        assert_eq!(parse_span("c", "3:3").unwrap(), Source::Span { start: 2, end: 3 });
    }

    #[test]
    fn test_convert_values() {
        let short = ColumnType::String { length: 3, truncate: false };
        let cut = ColumnType::String { length: 3, truncate: true };
        assert_eq!(short.convert("s", "").unwrap(), SqlValue::Null);
        assert_eq!(short.convert("s", "abc").unwrap(), SqlValue::Text("abc".into()));
        assert_eq!(cut.convert("s", "abcdef").unwrap(), SqlValue::Text("abc".into()));
        assert_eq!(short.convert("s", "abcd").unwrap_err().category(), ErrorCategory::Data);
        assert_eq!(ColumnType::Integer.convert("i", " 42 ").unwrap(), SqlValue::Integer(42));
        assert_eq!(ColumnType::Number.convert("n", "2.5").unwrap(), SqlValue::Real(2.5));
        assert!(ColumnType::Integer.convert("i", "4x").is_err());
    }

    #[test]
    fn test_trim_and_slice() {
        assert_eq!(Trim::Left.apply("  a  "), "a  ");
        assert_eq!(Trim::Right.apply("  a  "), "  a");
        assert_eq!(Trim::Both.apply("  a  "), "a");
        assert_eq!(slice_chars("héllo world", 1, 5), "éllo");
        assert_eq!(slice_chars("ab", 1, 10), "b");
    }
}
