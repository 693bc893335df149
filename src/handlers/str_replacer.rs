// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::Config;
use crate::engine::Context;
use crate::errors::{EtlError, Result};
use crate::traits::Handler;

use super::{compile_regex, input_param, output, output_param};

/// Applies the `rules` replacements to the input, in order.
///
/// Each rule replaces `search` with `replace`, at most `count` times (0 means
/// every occurrence). With `is_regex`, `search` is a regular expression and
/// `replace` may refer to capture groups as `$1` or `${name}`.
pub struct StrReplacer;

impl Handler for StrReplacer {
    fn run(&self, _ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        let mut data = config.str(input_param(config)?)?.to_string();
        let size_in = data.len();

        for rule in config.list("rules")? {
            let rule = rule.as_config().ok_or_else(|| {
                EtlError::config(format!(
                    "Replacement rule must be an object, not \"{}\"",
                    rule.type_name()
                ))
            })?;
            let search = rule.str("search")?;
            let replace = rule.str("replace")?;
            let count = usize::try_from(rule.int_or("count", 0)?).map_err(|_| {
                EtlError::config("Replacement count must not be negative")
            })?;

            data = if rule.bool_or("is_regex", false) {
                compile_regex(search)?.replacen(&data, count, replace).into_owned()
            } else if count == 0 {
                data.replace(search, replace)
            } else {
                data.replacen(search, replace, count)
            };
        }

        tracing::info!("Done. Input: {} bytes, output: {} bytes.", size_in, data.len());
        Ok(Some(output(output_param(config)?, data)))
    }

    fn name(&self) -> &'static str {
        "str_replacer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::context;
    use serde_json::json;

    fn replace(data: &str, rules: serde_json::Value) -> Result<String> {
        let mut ctx = context();
        let config = Config::try_from(json!({"data": data, "rules": rules})).unwrap();
        let out = StrReplacer.run(&mut ctx, &config)?.unwrap();
        Ok(out.str("data").unwrap().to_string())
    }

    #[test]
    fn test_rules_apply_in_order() {
        let out = replace(
            "a-b-c-d",
            json!([
                {"search": "-", "replace": "+", "count": 2},
                {"search": "+", "replace": "*"}
            ]),
        )
        .unwrap();
        assert_eq!(out, "a*b*c-d");
    }

    #[test]
    fn test_regex_rule_with_group_reference() {
        let out = replace(
            "2024-01-31 and 2023-12-01",
            json!([{"search": r"(\d{4})-(\d{2})-(\d{2})", "replace": "$3.$2.$1", "is_regex": true, "count": 1}]),
        )
        .unwrap();
        assert_eq!(out, "31.01.2024 and 2023-12-01");
    }

    #[test]
    fn test_rules_are_required() {
        let mut ctx = context();
        let config = Config::try_from(json!({"data": "x"})).unwrap();
        let err = StrReplacer.run(&mut ctx, &config).unwrap_err();
        assert!(matches!(err, EtlError::NotFound(ref key) if key == "rules"));
    }
}
