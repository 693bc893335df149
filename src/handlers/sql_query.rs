// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{template, Config};
use crate::engine::Context;
use crate::errors::Result;
use crate::traits::Handler;

use super::{output, output_param, sql_params};

/// Runs a query and publishes the result set as delimited text.
///
/// Fields are joined with `field_delimiter` (default empty) and records with
/// `record_delimiter` (default `\n`), which also terminates the output. A
/// `quotechar` of `(`, `[`, `{` or `<` closes with its counterpart; any other
/// quote closes with itself.
pub struct SqlQuery;

fn quote_pair(quotechar: Option<&str>) -> (String, String) {
    match quotechar {
        None => (String::new(), String::new()),
        Some(open) => {
            let close = match open {
                "(" => ")",
                "[" => "]",
                "{" => "}",
                "<" => ">",
                other => other,
            };
            (open.to_string(), close.to_string())
        }
    }
}

impl Handler for SqlQuery {
    fn run(&self, ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        let db_name = template::expand(config.str("database")?, config)?;
        let field_delimiter = config.str_or("field_delimiter", "")?;
        let record_delimiter = config.str_or("record_delimiter", "\n")?;
        let col_headers = config.bool_or("col_headers", false);
        let (qopen, qclose) = quote_pair(config.opt_str("quotechar")?);
        let sql = config.str("sql")?;
        let params = sql_params(config)?;

        let conn = ctx.connection(&db_name)?;
        let rows = conn.query(sql, &params)?;

        let mut records = Vec::with_capacity(rows.rows.len() + 1);
        if col_headers {
            let header: Vec<String> = rows
                .columns
                .iter()
                .map(|c| format!("{}{}{}", qopen, c, qclose))
                .collect();
            records.push(header.join(field_delimiter));
        }
        for row in &rows.rows {
            let fields: Vec<String> = row
                .iter()
                .map(|v| format!("{}{}{}", qopen, v, qclose))
                .collect();
            records.push(fields.join(field_delimiter));
        }

        tracing::info!("Done. Read {} rows from {}", records.len(), db_name);
        let mut text = records.join(record_delimiter);
        text.push_str(record_delimiter);
        Ok(Some(output(output_param(config)?, text)))
    }

    fn name(&self) -> &'static str {
        "sql_query"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::sqlite_context;
    use serde_json::json;

    fn seeded_context() -> Context {
        let mut ctx = sqlite_context(false);
        let conn = ctx.connection("db").unwrap();
        conn.execute("create table t(id integer, name text)", &[]).unwrap();
        conn.execute("insert into t values(1, 'one'), (2, null)", &[]).unwrap();
        ctx
    }

    fn query(ctx: &mut Context, cfg: serde_json::Value) -> String {
        let cfg = Config::try_from(cfg).unwrap();
        let out = SqlQuery.run(ctx, &cfg).unwrap().unwrap();
        out.str("data").unwrap().to_string()
    }

    #[test]
    fn test_default_delimiters() {
        let mut ctx = seeded_context();
        let text = query(&mut ctx, json!({"database": "db", "sql": "select id, name from t order by id"}));
        assert_eq!(text, "1one\n2\n");
    }

    #[test]
    fn test_headers_quotes_and_params() {
        let mut ctx = seeded_context();
        let text = query(
            &mut ctx,
            json!({
                "database": "db",
                "sql": "select id, name from t where id = :id",
                "params": [{"name": "id", "value": "{wanted}"}],
                "wanted": 1,
                "field_delimiter": ";",
                "record_delimiter": "|",
                "col_headers": true,
                "quotechar": "["
            }),
        );
        assert_eq!(text, "[id];[name]|[1];[one]|");
    }

    #[test]
    fn test_quote_pairs() {
        assert_eq!(quote_pair(Some("<")), (String::from("<"), String::from(">")));
        assert_eq!(quote_pair(Some("\"")), (String::from("\""), String::from("\"")));
        assert_eq!(quote_pair(None), (String::new(), String::new()));
    }
}
