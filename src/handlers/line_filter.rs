// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use regex::Regex;

use crate::config::{template, Config, Value};
use crate::engine::Context;
use crate::errors::{EtlError, Result};
use crate::traits::Handler;

use super::{compile_regex, input_param, join_lines, output, output_param};

/// Keeps the input lines that satisfy every criterion.
///
/// Lines before `start_line` (1-based, blank lines included) are dropped. A
/// criterion matches a substring, or a regular expression when `is_regex` is set;
/// `negate` turns it into an exclusion. Rejected lines are published under
/// `rejected_param` when one is given.
pub struct LineFilter;

enum Matcher {
    Substring(String),
    Pattern(Regex),
}

struct Criterion {
    matcher: Matcher,
    negate: bool,
}

impl Criterion {
    fn from_value(value: &Value, params: &Config) -> Result<Self> {
        let entry = value.as_config().ok_or_else(|| {
            EtlError::config(format!(
                "Filter criterion must be an object, not \"{}\"",
                value.type_name()
            ))
        })?;
        let mut search = entry.str("search")?.to_string();
        if entry.bool_or("substitute_params", false) {
            search = template::expand(&search, params)?;
        }
        let matcher = if entry.bool_or("is_regex", false) {
            Matcher::Pattern(compile_regex(&search)?)
        } else {
            Matcher::Substring(search)
        };
        Ok(Self {
            matcher,
            negate: entry.bool_or("negate", false),
        })
    }

    fn accepts(&self, line: &str) -> bool {
        let matched = match &self.matcher {
            Matcher::Substring(s) => line.contains(s.as_str()),
            Matcher::Pattern(re) => re.is_match(line),
        };
        matched != self.negate
    }
}

impl Handler for LineFilter {
    fn run(&self, _ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        let rejected_param = config.opt_str("rejected_param")?;
        let start_line = config.int_or("start_line", 1)?;
        let skip_blank_lines = config.bool_or("skip_blank_lines", false);
        let criteria = match config.get_opt("criteria") {
            None | Some(Value::Null) => Vec::new(),
            Some(_) => config
                .one_or_many("criteria")?
                .iter()
                .map(|value| Criterion::from_value(value, config))
                .collect::<Result<Vec<_>>>()?,
        };

        let mut count_src_lines: i64 = 0;
        let mut kept = Vec::new();
        let mut rejected = Vec::new();
        for line in config.text_lines(input_param(config)?)? {
            count_src_lines += 1;
            if count_src_lines < start_line || (skip_blank_lines && line.is_empty()) {
                continue;
            }
            if criteria.iter().all(|c| c.accepts(line)) {
                kept.push(line);
            } else if rejected_param.is_some() {
                rejected.push(line);
            }
        }

        let mut result = output(output_param(config)?, join_lines(&kept));
        match rejected_param {
            Some(name) => {
                tracing::info!(
                    "Read {} input lines, kept {}, rejected {} lines",
                    count_src_lines,
                    kept.len(),
                    rejected.len()
                );
                result.set(name, join_lines(&rejected));
            }
            None => tracing::info!("Read {} input lines, kept {} lines", count_src_lines, kept.len()),
        }
        Ok(Some(result))
    }

    fn name(&self) -> &'static str {
        "line_filter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCategory;
    use crate::handlers::test_support::context;
    use serde_json::json;

    fn filter(config: serde_json::Value) -> Result<Config> {
        let mut ctx = context();
        let config = Config::try_from(config).unwrap();
        LineFilter.run(&mut ctx, &config).map(|out| out.unwrap_or_default())
    }

    #[test]
    fn test_no_criteria_keeps_everything_after_start_line() {
        let out = filter(json!({"data": "header\na\n\nb\n", "start_line": 2})).unwrap();
        assert_eq!(out.str("data").unwrap(), "a\n\nb\n");

        let out = filter(json!({"data": "a\n\nb\n", "skip_blank_lines": true})).unwrap();
        assert_eq!(out.str("data").unwrap(), "a\nb\n");
    }

    #[test]
    fn test_all_criteria_must_match() {
        let out = filter(json!({
            "data": "apple pie\napple juice\ncherry pie\n",
            "criteria": [
                {"search": "apple"},
                {"search": "juice$", "is_regex": true, "negate": true}
            ],
            "rejected_param": "rest"
        }))
        .unwrap();
        assert_eq!(out.str("data").unwrap(), "apple pie\n");
        assert_eq!(out.str("rest").unwrap(), "apple juice\ncherry pie\n");
    }

    #[test]
    fn test_single_criterion_with_substitution() {
        let out = filter(json!({
            "data": "id=1\nid=2\nid=3\n",
            "wanted": 2,
            "criteria": {"search": "id={wanted}", "substitute_params": true}
        }))
        .unwrap();
        assert_eq!(out.str("data").unwrap(), "id=2\n");
    }

    #[test]
    fn test_nothing_kept_yields_single_newline() {
        let out = filter(json!({"data": "a\nb\n", "criteria": {"search": "zzz"}})).unwrap();
        assert_eq!(out.str("data").unwrap(), "\n");
    }

    #[test]
    fn test_bad_regex_is_config_error() {
        let err = filter(json!({"data": "a\n", "criteria": {"search": "(", "is_regex": true}}))
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
