// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::Config;
use crate::engine::Context;
use crate::errors::{EtlError, Result};
use crate::traits::Handler;

use super::{compile_regex, input_param, join_lines, output, output_param};

/// Publishes capture group `group_num` of every match of `regex`, one per line.
///
/// `unique` drops repeated matches, keeping the first occurrence order.
pub struct RegexMatcher;

impl Handler for RegexMatcher {
    fn run(&self, _ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        let data = config.str(input_param(config)?)?;
        let regex = compile_regex(config.str("regex")?)?;
        let group = usize::try_from(config.int("group_num")?)
            .ok()
            .filter(|g| *g < regex.captures_len())
            .ok_or_else(|| {
                EtlError::config(format!(
                    "group_num is out of range for the regular expression \"{}\"",
                    regex.as_str()
                ))
            })?;
        let unique = config.bool_or("unique", false);

        let mut matches: Vec<&str> = Vec::new();
        for captures in regex.captures_iter(data) {
            let found = captures.get(group).map_or("", |m| m.as_str());
            if !unique || !matches.contains(&found) {
                matches.push(found);
            }
        }

        tracing::info!(
            "Found {}{} match(es)",
            matches.len(),
            if unique { " unique" } else { "" }
        );
        Ok(Some(output(output_param(config)?, join_lines(&matches))))
    }

    fn name(&self) -> &'static str {
        "regex_matcher"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCategory;
    use crate::handlers::test_support::context;
    use serde_json::json;

    fn matches(config: serde_json::Value) -> Result<String> {
        let mut ctx = context();
        let config = Config::try_from(config).unwrap();
        let out = RegexMatcher.run(&mut ctx, &config)?.unwrap();
        Ok(out.str("data").unwrap().to_string())
    }

    #[test]
    fn test_captures_group() {
        let out = matches(json!({
            "data": "<a href=\"x.csv\"> <a href=\"y.csv\"> <a href=\"x.csv\">",
            "regex": "href=\"([^\"]+)\"",
            "group_num": 1
        }))
        .unwrap();
        assert_eq!(out, "x.csv\ny.csv\nx.csv\n");
    }

    #[test]
    fn test_unique_keeps_first_occurrence_order() {
        let out = matches(json!({
            "data": "b1 a2 b3 c4 a5",
            "regex": "[a-z]",
            "group_num": 0,
            "unique": true
        }))
        .unwrap();
        assert_eq!(out, "b\na\nc\n");
    }

    #[test]
    fn test_group_out_of_range() {
        let err = matches(json!({"data": "x", "regex": "(x)", "group_num": 2})).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
