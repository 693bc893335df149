// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types shared by the engine, the database layer and the handlers.
//!
//! Every failure belongs to one [`ErrorCategory`]. The process loader logs the
//! category next to the message, so "bad setup" and "bad input row" remain
//! distinguishable in the run log.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EtlError>;

/// Coarse classification of an [`EtlError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Data,
    Database,
    Logic,
    Http,
    File,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Data => "data",
            ErrorCategory::Database => "database",
            ErrorCategory::Logic => "logic",
            ErrorCategory::Http => "http",
            ErrorCategory::File => "file",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug)]
pub enum EtlError {
    /// A mandatory configuration key is absent.
    #[error("The key named \"{0}\" is not found in the configuration.")]
    NotFound(String),

    /// Malformed configuration, bad wiring or an invalid enumeration value.
    #[error("{0}")]
    Config(String),

    /// Malformed or out-of-range input data.
    #[error("{}", data_message(.message, .line))]
    Data { message: String, line: Option<usize> },

    /// Bad connection string, unknown driver or a driver failure.
    #[error("{0}")]
    Database(String),

    /// Programming-contract violation.
    #[error("{0}")]
    Logic(String),

    #[error("{0}")]
    Http(String),

    #[error("{path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn data_message(message: &str, line: &Option<usize>) -> String {
    match line {
        Some(line) => format!("Input data error at line {}: {}", line, message),
        None => message.to_string(),
    }
}

impl EtlError {
    pub fn config(message: impl Into<String>) -> Self {
        EtlError::Config(message.into())
    }

    pub fn data(message: impl Into<String>) -> Self {
        EtlError::Data {
            message: message.into(),
            line: None,
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        EtlError::Database(message.into())
    }

    pub fn logic(message: impl Into<String>) -> Self {
        EtlError::Logic(message.into())
    }

    pub fn http(message: impl Into<String>) -> Self {
        EtlError::Http(message.into())
    }

    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        EtlError::File {
            path: path.into(),
            source,
        }
    }

    /// Attach a source line number to a data error. Other categories pass through untouched.
    pub fn at_line(self, line_number: usize) -> Self {
        match self {
            EtlError::Data { message, line: None } => EtlError::Data {
                message,
                line: Some(line_number),
            },
            other => other,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::NotFound(_) | EtlError::Config(_) => ErrorCategory::Configuration,
            EtlError::Data { .. } => ErrorCategory::Data,
            EtlError::Database(_) => ErrorCategory::Database,
            EtlError::Logic(_) => ErrorCategory::Logic,
            EtlError::Http(_) => ErrorCategory::Http,
            EtlError::File { .. } => ErrorCategory::File,
        }
    }
}

impl From<rusqlite::Error> for EtlError {
    fn from(e: rusqlite::Error) -> Self {
        EtlError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_error_carries_line_number() {
        let err = EtlError::data("Integer column \"c\": invalid digit").at_line(7);
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(
            err.to_string(),
            "Input data error at line 7: Integer column \"c\": invalid digit"
        );
    }

    #[test]
    fn test_at_line_keeps_first_line_and_other_categories() {
        let err = EtlError::data("bad").at_line(3).at_line(9);
        assert!(matches!(err, EtlError::Data { line: Some(3), .. }));

        let err = EtlError::config("bad setup").at_line(3);
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.to_string(), "bad setup");
    }

    #[test]
    fn test_not_found_names_the_key() {
        let err = EtlError::NotFound("processes".to_string());
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("\"processes\""));
    }
}
