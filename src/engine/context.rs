// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The orchestration context.
//!
//! A [`Context`] owns everything a run shares: the root configuration, the global
//! parameters, the database connection pool, the stack of open configuration files
//! and the handler/driver registries. It is passed by `&mut` into every handler.
//!
//! # Scope
//!
//! A handler step sees a single merged [`Config`], built fresh for every invocation
//! from four layers, lowest precedence first:
//!
//! 1. globals (root `globals` overlaid by start-up overrides)
//! 2. external parameters supplied by the caller (e.g. `line_iterator`)
//! 3. the step's own literal configuration, `module`/`class`/`comment` included
//! 4. the running pipeline's parameters
//!
//! # Pipelines
//!
//! A pipeline invoked with no pipeline already running starts with empty
//! parameters. A pipeline nested inside a running one shares its parent's
//! parameters, so values published inside the inner pipeline stay visible to
//! siblings that run after it.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;

use crate::config::{load_config, load_document, load_typed, template, Config, HandlerNode, HandlerSpec};
use crate::db::{DbConnection, DriverRegistry};
use crate::errors::{EtlError, Result};
use crate::handlers::HandlerRegistry;
use crate::observability::messages::engine::{
    ConfigFileLoaded, ConnectionEstablished, DryRunEnabled, HandlerInvoked, ParamBlockIgnored,
    PipelineUpdated,
};
use crate::observability::messages::StructuredLog;
use crate::observability::LogSettings;

const BASE64_PREFIX: &str = "BASE64:";
const DRY_RUN_PREFIX: &str = "[DRY-RUN] ";

/// Start-up options, typically from the command line.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    /// Overrides the root `log.verbose` flag when set.
    pub verbose: Option<bool>,
    pub dry_run: bool,
    /// Take precedence over the root `globals`.
    pub global_overrides: Config,
}

/// Credentials kept in a separate connection file referenced by `file_name`.
#[derive(Debug, Deserialize)]
struct ConnectionFile {
    connection: String,
    username: String,
    password: String,
}

pub struct Context {
    root: Config,
    globals: Config,
    connections: HashMap<String, Rc<DbConnection>>,
    config_files: Vec<PathBuf>,
    handlers: HandlerRegistry,
    drivers: DriverRegistry,
    log_settings: LogSettings,
    dry_run: bool,
}

impl Context {
    /// Load the root configuration file and build a context around it.
    pub fn initialise<P: AsRef<Path>>(config_file: P, options: ContextOptions) -> Result<Self> {
        let config_file = config_file.as_ref();
        let canonical =
            fs::canonicalize(config_file).map_err(|e| EtlError::file(config_file, e))?;
        let root = load_config(&canonical)?;

        let mut globals = match root.get_opt("globals") {
            Some(_) => root.config("globals")?.clone(),
            None => Config::new(),
        };
        globals.merge(&options.global_overrides);

        let log_settings = LogSettings::from_config(&root, options.verbose)?;

        ConfigFileLoaded {
            path: &canonical,
            depth: 0,
        }
        .log();
        if options.dry_run {
            DryRunEnabled.log();
        }

        Ok(Self {
            root,
            globals,
            connections: HashMap::new(),
            config_files: vec![canonical],
            handlers: HandlerRegistry::builtin(),
            drivers: DriverRegistry::builtin(),
            log_settings,
            dry_run: options.dry_run,
        })
    }

    /// A context with an empty root configuration and no open file.
    ///
    /// Relative paths cannot be resolved until a file is pushed by an include with
    /// an absolute path.
    pub fn detached(options: ContextOptions) -> Self {
        Self {
            root: Config::new(),
            globals: options.global_overrides,
            connections: HashMap::new(),
            config_files: Vec::new(),
            handlers: HandlerRegistry::builtin(),
            drivers: DriverRegistry::builtin(),
            log_settings: LogSettings {
                file: None,
                verbose: options.verbose.unwrap_or(false),
            },
            dry_run: options.dry_run,
        }
    }

    /// Replace the root configuration, e.g. to provide `databases` to a detached context.
    pub fn with_root(mut self, root: Config) -> Self {
        self.root = root;
        self
    }

    pub fn root(&self) -> &Config {
        &self.root
    }

    pub fn globals(&self) -> &Config {
        &self.globals
    }

    pub fn log_settings(&self) -> &LogSettings {
        &self.log_settings
    }

    pub fn handlers_mut(&mut self) -> &mut HandlerRegistry {
        &mut self.handlers
    }

    pub fn drivers_mut(&mut self) -> &mut DriverRegistry {
        &mut self.drivers
    }

    pub fn is_verbose(&self) -> bool {
        self.log_settings.verbose
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Prefix for log lines describing work skipped in dry-run mode.
    pub fn dry_run_prefix(&self) -> &'static str {
        if self.dry_run {
            DRY_RUN_PREFIX
        } else {
            ""
        }
    }

    /// Open configuration files, root first.
    pub fn config_files(&self) -> &[PathBuf] {
        &self.config_files
    }

    /// Resolve `name` against the directory of the most recently opened
    /// configuration file. Absolute paths are returned as given.
    pub fn absolute_path<P: AsRef<Path>>(&self, name: P) -> Result<PathBuf> {
        let name = name.as_ref();
        if name.is_absolute() {
            return Ok(name.to_path_buf());
        }
        let current = self.config_files.last().ok_or_else(|| {
            EtlError::logic(format!(
                "Cannot translate relative file path \"{}\" out-of-context",
                name.display()
            ))
        })?;
        let joined = current.parent().unwrap_or_else(|| Path::new("")).join(name);
        Ok(fs::canonicalize(&joined).unwrap_or(joined))
    }

    /// The merged scope a step sees. See the module documentation for precedence.
    pub fn scope(
        &self,
        own: &Config,
        external: Option<&Config>,
        pipeline: Option<&Config>,
    ) -> Config {
        let mut scope = Config::new();
        scope.merge(&self.globals);
        if let Some(external) = external {
            scope.merge(external);
        }
        scope.merge(own);
        if let Some(pipeline) = pipeline {
            scope.merge(pipeline);
        }
        scope
    }

    /// Run a handler node with optional external parameters.
    pub fn invoke(&mut self, node: &HandlerNode, external: Option<&Config>) -> Result<()> {
        self.run_node(node, external, None)
    }

    fn run_node(
        &mut self,
        node: &HandlerNode,
        external: Option<&Config>,
        pipeline: Option<&mut Config>,
    ) -> Result<()> {
        match node {
            HandlerNode::Include(path) => self.run_include(path, external, pipeline),
            HandlerNode::Step(spec) => self.run_step(spec, external, pipeline),
            HandlerNode::ParamBlock(params) => {
                match pipeline {
                    Some(pipeline) => pipeline.merge(params),
                    None => ParamBlockIgnored {
                        key_count: params.len(),
                    }
                    .log(),
                }
                Ok(())
            }
            HandlerNode::Pipeline(nodes) => match pipeline {
                Some(shared) => self.run_pipeline(nodes, external, shared),
                None => {
                    let mut fresh = Config::new();
                    self.run_pipeline(nodes, external, &mut fresh)
                }
            },
        }
    }

    fn run_pipeline(
        &mut self,
        nodes: &[HandlerNode],
        external: Option<&Config>,
        pipeline: &mut Config,
    ) -> Result<()> {
        for node in nodes {
            self.run_node(node, external, Some(&mut *pipeline))?;
        }
        Ok(())
    }

    fn run_include(
        &mut self,
        path: &str,
        external: Option<&Config>,
        pipeline: Option<&mut Config>,
    ) -> Result<()> {
        let absolute = self.absolute_path(path)?;
        let document = load_document(&absolute)?;

        let loaded = ConfigFileLoaded {
            path: &absolute,
            depth: self.config_files.len(),
        };
        let span = loaded.span("include");
        let _guard = span.enter();
        loaded.log();
        self.config_files.push(absolute);

        let result = HandlerNode::from_value(&document)
            .and_then(|node| self.run_node(&node, external, pipeline));
        self.config_files.pop();
        result
    }

    fn run_step(
        &mut self,
        spec: &HandlerSpec,
        external: Option<&Config>,
        pipeline: Option<&mut Config>,
    ) -> Result<()> {
        let scope = self.scope(&spec.own, external, pipeline.as_deref());
        let comment = match &spec.comment {
            Some(comment) => template::expand(comment, &scope)?,
            None => String::new(),
        };
        let handler_id = spec.handler_id();
        let invoked = HandlerInvoked {
            handler_id: &handler_id,
            comment: &comment,
        };
        let span = invoked.span("handler_execution");
        let _guard = span.enter();
        invoked.log();

        let handler = self.handlers.create(spec)?;
        let outputs = handler.run(self, &scope)?;

        if let (Some(pipeline), Some(outputs)) = (pipeline, outputs) {
            PipelineUpdated {
                handler_id: &handler_id,
                keys: outputs.keys().map(String::as_str).collect(),
            }
            .log();
            pipeline.merge(&outputs);
        }
        Ok(())
    }

    /// The pooled connection named `name`, opened on first use.
    pub fn connection(&mut self, name: &str) -> Result<Rc<DbConnection>> {
        if let Some(conn) = self.connections.get(name) {
            return Ok(Rc::clone(conn));
        }

        let entry = self.database_entry(name)?;
        let (connection, username, password) = match entry.opt_str("file_name")? {
            Some(file_name) => {
                let expanded = template::expand(file_name, &self.globals)?;
                let path = self.absolute_path(expanded)?;
                let file: ConnectionFile = load_typed(&path)?;
                (file.connection, file.username, file.password)
            }
            None => (
                entry.str("connection")?.to_string(),
                entry.str("username")?.to_string(),
                entry.str("password")?.to_string(),
            ),
        };
        let password = decode_password(&password)?;

        let conn = DbConnection::open(&self.drivers, &connection, &username, &password)?;
        ConnectionEstablished {
            name,
            username: &username,
            connection: &connection,
        }
        .log();

        let conn = Rc::new(conn);
        self.connections.insert(name.to_string(), Rc::clone(&conn));
        Ok(conn)
    }

    fn database_entry(&self, name: &str) -> Result<Config> {
        for item in self.root.list("databases")? {
            let entry = item.as_config().ok_or_else(|| {
                EtlError::config(format!(
                    "DB connection configuration must be an object, not \"{}\"",
                    item.type_name()
                ))
            })?;
            if entry.str("name")? == name {
                return Ok(entry.clone());
            }
        }
        Err(EtlError::config(format!(
            "Database connection named \"{}\" is not found.",
            name
        )))
    }

    /// Close every pooled connection and forget the open configuration files.
    pub fn teardown(&mut self) {
        if !self.connections.is_empty() {
            tracing::debug!(count = self.connections.len(), "Closing database connections");
        }
        self.connections.clear();
        self.config_files.clear();
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn decode_password(password: &str) -> Result<String> {
    match password.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => {
            let bytes = STANDARD.decode(encoded).map_err(|e| {
                EtlError::config(format!("Invalid BASE64-encoded password: {}", e))
            })?;
            String::from_utf8(bytes).map_err(|e| {
                EtlError::config(format!("BASE64-encoded password is not valid UTF-8: {}", e))
            })
        }
        None => Ok(password.to_string()),
    }
}
