// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::Config;
use crate::engine::Context;
use crate::errors::Result;
use crate::traits::Handler;

use super::{input_param, join_lines, output, output_param};

/// Sorts the input lines, descending when `reverse` is set.
pub struct LineSorter;

impl Handler for LineSorter {
    fn run(&self, _ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        let mut lines: Vec<&str> = config.text_lines(input_param(config)?)?.collect();
        lines.sort_unstable();
        if config.bool_or("reverse", false) {
            lines.reverse();
        }
        tracing::info!("Sorted {} lines", lines.len());
        Ok(Some(output(output_param(config)?, join_lines(&lines))))
    }

    fn name(&self) -> &'static str {
        "line_sorter"
    }
}
