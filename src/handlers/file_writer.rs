// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fs::OpenOptions;
use std::io::Write;

use crate::config::{template, Config};
use crate::engine::Context;
use crate::errors::{EtlError, Result};
use crate::traits::Handler;

use super::input_param;

/// Writes the input parameter to `output_file`, truncating it unless `append` is set.
///
/// Nothing is written in dry-run mode.
pub struct FileWriter;

impl Handler for FileWriter {
    fn run(&self, ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        let data = config.str(input_param(config)?)?;
        let append = config.bool_or("append", false);
        let file_name = template::expand(config.str("output_file")?, config)?;
        let path = ctx.absolute_path(&file_name)?;
        let action = if append { "appended" } else { "written" };

        if ctx.is_dry_run() {
            tracing::info!(
                "{}File {} would be {} ({} bytes)",
                ctx.dry_run_prefix(),
                path.display(),
                action,
                data.len()
            );
            return Ok(None);
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .append(append)
            .truncate(!append)
            .open(&path)
            .map_err(|e| EtlError::file(&path, e))?;
        file.write_all(data.as_bytes())
            .map_err(|e| EtlError::file(&path, e))?;

        tracing::info!("File {} is {} ({} bytes)", path.display(), action, data.len());
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "file_writer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{context, dry_run_context};
    use serde_json::json;
    use std::fs;

    fn writer_config(path: &std::path::Path, append: bool) -> Config {
        Config::try_from(json!({
            "output_file": path.to_str().unwrap(),
            "text": "hello\n",
            "input_param": "text",
            "append": append
        }))
        .unwrap()
    }

    #[test]
    fn test_overwrites_then_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "stale content\n").unwrap();

        let mut ctx = context();
        FileWriter.run(&mut ctx, &writer_config(&path, false)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");

        FileWriter.run(&mut ctx, &writer_config(&path, true)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\nhello\n");
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let mut ctx = dry_run_context();
        FileWriter.run(&mut ctx, &writer_config(&path, false)).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_input_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = context();
        let config = Config::try_from(json!({
            "output_file": dir.path().join("x.txt").to_str().unwrap()
        }))
        .unwrap();
        let err = FileWriter.run(&mut ctx, &config).unwrap_err();
        assert!(matches!(err, EtlError::NotFound(ref key) if key == "data"));
    }
}
