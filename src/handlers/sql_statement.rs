// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::str::FromStr;

use crate::config::{template, Config};
use crate::engine::Context;
use crate::errors::{EtlError, Result};
use crate::traits::Handler;

use super::sql_params;

/// When `sql_statement` commits its work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitPolicy {
    /// Never commit; the caller owns the transaction.
    None,
    /// Commit after every statement.
    Each,
    /// Open a transaction up front and commit once after the last statement.
    All,
}

impl FromStr for CommitPolicy {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "none" => Ok(CommitPolicy::None),
            "each" => Ok(CommitPolicy::Each),
            "all" => Ok(CommitPolicy::All),
            other => Err(EtlError::config(format!(
                "Invalid value for commit_stmt: \"{}\"",
                other
            ))),
        }
    }
}

/// Executes one SQL statement, or a list of them, against a named database.
///
/// Statements may reference the `params` as `:name`. In dry-run mode the
/// connection is still opened but nothing is executed.
pub struct SqlStatement;

impl Handler for SqlStatement {
    fn run(&self, ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        let policy: CommitPolicy = config.str_or("commit_stmt", "each")?.parse()?;
        let db_name = template::expand(config.str("database")?, config)?;
        let statements = config
            .one_or_many("sql")?
            .iter()
            .map(|v| {
                v.as_str().map(str::to_string).ok_or_else(|| {
                    EtlError::config(format!("SQL statement must be a string, not {}", v.type_name()))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let params = sql_params(config)?;

        let conn = ctx.connection(&db_name)?;
        if !ctx.is_dry_run() {
            if policy == CommitPolicy::All {
                conn.begin()?;
            }
            for stmt in &statements {
                conn.execute(stmt, &params)?;
                if policy == CommitPolicy::Each {
                    conn.commit()?;
                }
            }
            if policy == CommitPolicy::All {
                conn.commit()?;
            }
        }

        tracing::info!(
            "{}Done. {} statement(s) executed on {}",
            ctx.dry_run_prefix(),
            statements.len(),
            db_name
        );
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "sql_statement"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqlValue;
    use crate::errors::ErrorCategory;
    use crate::handlers::test_support::{context, recording_context, sqlite_context};
    use serde_json::json;

    fn config(value: serde_json::Value) -> Config {
        Config::try_from(value).unwrap()
    }

    #[test]
    fn test_commit_each_statement() {
        let (mut ctx, _, events) = recording_context(false);
        let cfg = config(json!({
            "database": "main",
            "sql": ["delete from t", "insert into t values(:v)"],
            "params": [{"name": "v", "value": "{value}"}],
            "value": "42"
        }));
        SqlStatement.run(&mut ctx, &cfg).unwrap();
        assert_eq!(
            *events.borrow(),
            vec![
                "execute delete from t [v=42]",
                "commit",
                "execute insert into t values(:v) [v=42]",
                "commit"
            ]
        );
    }

    #[test]
    fn test_commit_all_wraps_statements() {
        let (mut ctx, _, events) = recording_context(false);
        let cfg = config(json!({"database": "main", "sql": ["a", "b"], "commit_stmt": "all"}));
        SqlStatement.run(&mut ctx, &cfg).unwrap();
        assert_eq!(*events.borrow(), vec!["begin", "execute a", "execute b", "commit"]);
    }

    #[test]
    fn test_commit_none_and_dry_run() {
        let (mut ctx, _, events) = recording_context(false);
        let cfg = config(json!({"database": "main", "sql": "a", "commit_stmt": "none"}));
        SqlStatement.run(&mut ctx, &cfg).unwrap();
        assert_eq!(*events.borrow(), vec!["execute a"]);

        let (mut ctx, _, events) = recording_context(true);
        let cfg = config(json!({"database": "main", "sql": "a"}));
        SqlStatement.run(&mut ctx, &cfg).unwrap();
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_invalid_commit_policy() {
        let mut ctx = context();
        let cfg = config(json!({"database": "main", "sql": "a", "commit_stmt": "sometimes"}));
        let err = SqlStatement.run(&mut ctx, &cfg).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_statements_reach_sqlite() {
        let mut ctx = sqlite_context(false);
        let cfg = config(json!({
            "database": "db",
            "sql": ["create table t(v text)", "insert into t values(:v)"],
            "params": [{"name": "v", "value": "x"}]
        }));
        SqlStatement.run(&mut ctx, &cfg).unwrap();
        let conn = ctx.connection("db").unwrap();
        assert_eq!(
            conn.query_scalar("select v from t", &[]).unwrap(),
            SqlValue::Text("x".into())
        );
    }
}
