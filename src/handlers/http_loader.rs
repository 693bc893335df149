// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::io::Read;

use flate2::read::GzDecoder;

use crate::config::{template, Config, HandlerNode};
use crate::engine::Context;
use crate::errors::{EtlError, Result};
use crate::traits::Handler;
use crate::utils::http;

use super::{output, output_param, passthrough_params};

/// Downloads files over HTTP.
///
/// Without `file_defs` the page at `base_url` is fetched and published under
/// `output_param`. With `file_defs`, each definition's `name` is appended to
/// `base_url`, fetched, and handed to the definition's `handler` together with
/// `file_name` and the `passthrough_params`. Files marked `required: false` are
/// skipped when the server answers 404. With `detect_compressed`, bodies that
/// carry a gzip header are decompressed before decoding.
pub struct HttpLoader;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Gunzip `body` if it is longer than a bare gzip header and starts with the gzip magic.
fn decompress(url: &str, body: Vec<u8>) -> Result<Vec<u8>> {
    if body.len() <= 10 || !body.starts_with(&GZIP_MAGIC) {
        return Ok(body);
    }
    let mut raw = Vec::new();
    GzDecoder::new(body.as_slice())
        .read_to_end(&mut raw)
        .map_err(|e| EtlError::data(format!("Failed to decompress {}: {}", url, e)))?;
    tracing::info!("Decompressed the file, raw size is {} bytes", raw.len());
    Ok(raw)
}

struct FetchSettings {
    verify_cert: bool,
    detect_compressed: bool,
    username: Option<String>,
    password: String,
}

impl FetchSettings {
    fn fetch(&self, url: &str, required: bool) -> Result<Option<String>> {
        let body = http::fetch(
            url,
            required,
            self.verify_cert,
            self.username.as_deref(),
            &self.password,
        )?;
        match body {
            None => {
                tracing::info!("File {} doesn't exist", url);
                Ok(None)
            }
            Some(bytes) => {
                tracing::info!("Downloaded {} ({} bytes)", url, bytes.len());
                let bytes = if self.detect_compressed {
                    decompress(url, bytes)?
                } else {
                    bytes
                };
                String::from_utf8(bytes)
                    .map(Some)
                    .map_err(|e| EtlError::data(format!("{} is not valid UTF-8: {}", url, e)))
            }
        }
    }
}

impl Handler for HttpLoader {
    fn run(&self, ctx: &mut Context, config: &Config) -> Result<Option<Config>> {
        let base_url = template::expand(config.str("base_url")?, config)?;
        let output_param = output_param(config)?;

        let encoding = config.str_or("encoding", "utf-8")?;
        if !encoding.eq_ignore_ascii_case("utf-8") && !encoding.eq_ignore_ascii_case("utf8") {
            return Err(EtlError::config(format!("Unsupported encoding: \"{}\"", encoding)));
        }

        let settings = FetchSettings {
            verify_cert: config.bool_or("verify_cert", true),
            detect_compressed: config.bool_or("detect_compressed", false),
            username: config
                .opt_str("username")?
                .map(|u| template::expand(u, config))
                .transpose()?,
            password: template::expand(config.str_or("password", "")?, config)?,
        };

        if config.get_opt("file_defs").is_none() {
            let content = settings.fetch(&base_url, true)?.unwrap_or_default();
            return Ok(Some(output(output_param, content)));
        }

        let mut sub_params = passthrough_params(config)?;
        for file_def in config.list("file_defs")? {
            let file_def = file_def.as_config().ok_or_else(|| {
                EtlError::config(format!(
                    "File definition must be an object, not \"{}\"",
                    file_def.type_name()
                ))
            })?;
            let file_name = template::expand(file_def.str("name")?, config)?;
            let required = file_def.bool_or("required", true);
            let node = HandlerNode::from_value(file_def.get("handler")?)?;

            let url = format!("{}{}", base_url, file_name);
            if let Some(content) = settings.fetch(&url, required)? {
                sub_params.set("file_name", file_name);
                sub_params.set(output_param, content);
                ctx.invoke(&node, Some(&sub_params))?;
            }
        }
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "http_loader"
    }
}
