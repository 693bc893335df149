// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::Config;
use crate::engine::Context;
use crate::errors::{EtlError, Result};
use crate::traits::Handler;

use super::{input_param, output, output_param};

/// Concatenates every `num_lines_to_merge` input lines into one, separated by
/// `delimiter`. A trailing partial group is emitted as its own line.
///
/// With `skip_blank_lines`, blank lines do not count towards a group; blankness is
/// judged after `trim_lines` is applied.
pub struct LineMerger;

impl Handler for LineMerger {
    fn run(&self, _ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        let start_line = config.int_or("start_line", 1)?;
        let merge_count = config.int("num_lines_to_merge")?;
        if merge_count < 1 {
            return Err(EtlError::config(format!(
                "num_lines_to_merge must be positive, not {}",
                merge_count
            )));
        }
        let trim_lines = config.bool_or("trim_lines", false);
        let skip_blank_lines = config.bool_or("skip_blank_lines", false);
        let delimiter = config.str_or("delimiter", "")?;

        let mut merged = String::new();
        let mut count_src_lines: i64 = 0;
        let mut count_tgt_lines = 0usize;
        let mut in_group: i64 = 0;
        let mut current = String::new();

        for raw in config.text_lines(input_param(config)?)? {
            count_src_lines += 1;
            if count_src_lines < start_line {
                continue;
            }
            let line = if trim_lines { raw.trim() } else { raw };
            if skip_blank_lines && line.is_empty() {
                continue;
            }
            in_group += 1;
            if in_group > 1 {
                current.push_str(delimiter);
            }
            current.push_str(line);
            if in_group == merge_count {
                merged.push_str(&current);
                merged.push('\n');
                count_tgt_lines += 1;
                in_group = 0;
                current.clear();
            }
        }
        if in_group > 0 {
            merged.push_str(&current);
            merged.push('\n');
            count_tgt_lines += 1;
        }

        tracing::info!(
            "Done. Input: {} lines, output: {} lines.",
            count_src_lines,
            count_tgt_lines
        );
        Ok(Some(output(output_param(config)?, merged)))
    }

    fn name(&self) -> &'static str {
        "line_merger"
    }
}
