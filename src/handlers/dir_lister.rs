// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::BTreeSet;

use crate::config::{template, Config};
use crate::engine::Context;
use crate::errors::{EtlError, Result};
use crate::traits::Handler;

use super::{join_lines, output, output_param};

/// Lists files and directories matching one or more glob masks.
///
/// `file_masks` is a single mask or a list of masks, each of which may reference
/// scope parameters as `{name}`. Relative masks are resolved against the directory
/// of the configuration file being run. Matches from all masks are de-duplicated
/// and published sorted, one path per line.
pub struct DirLister;

impl Handler for DirLister {
    fn run(&self, ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        let include_files = config.bool_or("include_files", true);
        let include_dirs = config.bool_or("include_dirs", true);
        if !include_files && !include_dirs {
            tracing::warn!("Both \"include_files\" and \"include_dirs\" are false, the output will be empty.");
        }

        let mut found = BTreeSet::new();
        for mask in config.one_or_many("file_masks")? {
            let mask = mask.as_str().ok_or_else(|| {
                EtlError::config(format!("File mask must be a string, not {}", mask.type_name()))
            })?;
            let mask = ctx.absolute_path(template::expand(mask, config)?)?;
            let pattern = mask.to_str().ok_or_else(|| {
                EtlError::config(format!("File mask \"{}\" is not valid UTF-8", mask.display()))
            })?;

            let paths = glob::glob(pattern)
                .map_err(|e| EtlError::config(format!("Invalid file mask \"{}\": {}", pattern, e)))?;
            for entry in paths {
                let path = entry.map_err(|e| {
                    let path = e.path().to_path_buf();
                    EtlError::file(path, e.into_error())
                })?;
                if (include_files && path.is_file()) || (include_dirs && path.is_dir()) {
                    found.insert(path.to_string_lossy().into_owned());
                }
            }
        }

        tracing::info!("Done. {} files/dirs are found.", found.len());
        let found: Vec<String> = found.into_iter().collect();
        Ok(Some(output(output_param(config)?, join_lines(&found))))
    }

    fn name(&self) -> &'static str {
        "dir_lister"
    }
}
