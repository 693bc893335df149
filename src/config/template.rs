// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `{name}` parameter references in configuration strings.
//!
//! File names, connection names, comments and SQL target expressions may refer to
//! other parameters of the current scope. `{{` and `}}` produce literal braces.

use crate::config::Config;
use crate::errors::{EtlError, Result};

/// Replace every `{name}` in `template` with the value of `name` in `params`.
pub fn expand(template: &str, params: &Config) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => name.push(ch),
                        None => {
                            return Err(EtlError::config(format!(
                                "Unterminated parameter reference in \"{}\"",
                                template
                            )))
                        }
                    }
                }
                let value = params.get(&name).map_err(|_| {
                    EtlError::config(format!(
                        "Parameter \"{}\" referenced in \"{}\" is not defined",
                        name, template
                    ))
                })?;
                out.push_str(&value.to_string());
            }
            '}' => {
                return Err(EtlError::config(format!(
                    "Single '}}' encountered in \"{}\"",
                    template
                )))
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

/// Whether `template` references the parameter `name`.
pub fn references(template: &str, name: &str) -> bool {
    template.contains(&format!("{{{}}}", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Value;

    fn params() -> Config {
        [
            ("env", Value::from("prod")),
            ("count", Value::from(3)),
            ("ratio", Value::from(1.5)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_expand_substitutes_references() {
        let out = expand("db_{env}_{count}/{ratio}", &params()).unwrap();
        assert_eq!(out, "db_prod_3/1.5");
    }

    #[test]
    fn test_expand_escaped_braces() {
        let out = expand("{{literal}} {env}", &params()).unwrap();
        assert_eq!(out, "{literal} prod");
    }

    #[test]
    fn test_expand_missing_parameter_is_config_error() {
        let err = expand("{nope}", &params()).unwrap_err();
        assert!(err.to_string().contains("\"nope\""));
    }

    #[test]
    fn test_expand_unbalanced_braces() {
        assert!(expand("{env", &params()).is_err());
        assert!(expand("env}", &params()).is_err());
    }

    #[test]
    fn test_references() {
        assert!(references("seq_{rownum}.nextval", "rownum"));
        assert!(!references("sysdate", "rownum"));
    }
}
