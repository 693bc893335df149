// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fs;

use crate::config::{template, Config};
use crate::engine::Context;
use crate::errors::{EtlError, Result};
use crate::traits::Handler;

use super::{output, output_param};

/// Reads a text file and publishes its contents.
///
/// `file_name` may reference scope parameters as `{name}`; relative names are
/// resolved against the directory of the configuration file being run.
pub struct FileReader;

impl Handler for FileReader {
    fn run(&self, ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        let file_name = template::expand(config.str("file_name")?, config)?;
        let path = ctx.absolute_path(&file_name)?;

        let data = fs::read_to_string(&path).map_err(|e| EtlError::file(&path, e))?;
        tracing::info!(
            characters = data.chars().count(),
            file = %path.display(),
            "Loaded file"
        );
        Ok(Some(output(output_param(config)?, data)))
    }

    fn name(&self) -> &'static str {
        "file_reader"
    }
}
