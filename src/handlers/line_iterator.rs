// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{Config, HandlerNode};
use crate::engine::Context;
use crate::errors::Result;
use crate::traits::Handler;

use super::{input_param, output_param, passthrough_params};

/// Invokes the `handler` node once per input line.
///
/// The child receives the line under `output_param` plus every parameter named in
/// `passthrough_params` as external parameters.
pub struct LineIterator;

impl Handler for LineIterator {
    fn run(&self, ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        let data = config.str(input_param(config)?)?;
        let output_param = output_param(config)?;
        let chomp = config.bool_or("chomp", true);
        let skip_blank_lines = config.bool_or("skip_blank_lines", true);
        let node = HandlerNode::from_value(config.get("handler")?)?;
        let mut sub_params = passthrough_params(config)?;

        let mut line_num = 0usize;
        for raw in data.split_inclusive('\n') {
            let line = if chomp {
                raw.trim_end_matches(['\r', '\n'])
            } else {
                raw
            };
            if skip_blank_lines && line.is_empty() {
                continue;
            }
            line_num += 1;
            tracing::info!("Processing line #{}", line_num);
            sub_params.set(output_param, line);
            ctx.invoke(&node, Some(&sub_params))?;
        }
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "line_iterator"
    }
}
