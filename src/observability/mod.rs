// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Logging set-up and structured log messages.
//!
//! All diagnostic output goes through `tracing`. Engine and loader events are
//! struct-based messages (see [`messages`]) so their wording lives in one place
//! and their fields are attached consistently.
//!
//! [`init_logging`] installs the process-wide subscriber. Without a log file,
//! warnings and errors go to stderr and everything else to stdout; with a log
//! file every event goes to that file.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::errors::{EtlError, Result};

pub mod messages;

/// Where and how verbosely to log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogSettings {
    pub file: Option<PathBuf>,
    pub verbose: bool,
}

impl LogSettings {
    /// Settings from the root `log` object. An explicit `verbose_override` wins over
    /// the configured `verbose` flag.
    pub fn from_config(root: &Config, verbose_override: Option<bool>) -> Result<Self> {
        let log = match root.get_opt("log") {
            Some(_) => Some(root.config("log")?),
            None => None,
        };
        let configured_verbose = log.map(|l| l.bool_or("verbose", false)).unwrap_or(false);
        let file = match log {
            Some(l) => l.opt_str("file")?.map(PathBuf::from),
            None => None,
        };
        Ok(Self {
            file,
            verbose: verbose_override.unwrap_or(configured_verbose),
        })
    }

    fn default_directive(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, replaces the level derived
/// from `verbose`. Does nothing if a subscriber is already installed.
pub fn init_logging(settings: &LogSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.default_directive()));
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match &settings.file {
        Some(path) => {
            let file = File::create(path).map_err(|e| EtlError::file(path, e))?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .try_init()
        }
        None => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr.with_max_level(Level::WARN).or_else(std::io::stdout)),
            )
            .try_init(),
    };

    if installed.is_err() {
        tracing::debug!("Global subscriber already installed, keeping it");
    }
    Ok(())
}
