// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::config::{HandlerSpec, BUILTIN_NAMESPACE, DEFAULT_CLASS};
use crate::errors::{EtlError, Result};
use crate::traits::Handler;

use super::{
    db_uploader, dir_lister, file_reader, file_writer, http_loader, line_filter, line_iterator,
    line_merger, line_sorter, regex_matcher, sql_query, sql_statement, str_replacer,
};

pub type HandlerFactory = Box<dyn Fn() -> Box<dyn Handler>>;

/// Maps `<module>.<class>` identifiers to handler factories.
///
/// Built-in handlers live under `rattle.handlers.<name>.Handler`, which is what a
/// step with a bare `module` name and no `class` resolves to.
pub struct HandlerRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry holding every handler shipped with the crate.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register_builtin("db_uploader", || Box::new(db_uploader::DbUploader));
        registry.register_builtin("dir_lister", || Box::new(dir_lister::DirLister));
        registry.register_builtin("file_reader", || Box::new(file_reader::FileReader));
        registry.register_builtin("file_writer", || Box::new(file_writer::FileWriter));
        registry.register_builtin("http_loader", || Box::new(http_loader::HttpLoader));
        registry.register_builtin("line_filter", || Box::new(line_filter::LineFilter));
        registry.register_builtin("line_iterator", || Box::new(line_iterator::LineIterator));
        registry.register_builtin("line_merger", || Box::new(line_merger::LineMerger));
        registry.register_builtin("line_sorter", || Box::new(line_sorter::LineSorter));
        registry.register_builtin("regex_matcher", || Box::new(regex_matcher::RegexMatcher));
        registry.register_builtin("sql_query", || Box::new(sql_query::SqlQuery));
        registry.register_builtin("sql_statement", || Box::new(sql_statement::SqlStatement));
        registry.register_builtin("str_replacer", || Box::new(str_replacer::StrReplacer));
        registry
    }

    fn register_builtin<F>(&mut self, module: &str, factory: F)
    where
        F: Fn() -> Box<dyn Handler> + 'static,
    {
        let id = format!("{}.{}.{}", BUILTIN_NAMESPACE, module, DEFAULT_CLASS);
        self.factories.insert(id, Box::new(factory));
    }

    /// Add or replace a handler under its full `<module>.<class>` identifier.
    pub fn register(&mut self, id: impl Into<String>, factory: HandlerFactory) {
        self.factories.insert(id.into(), factory);
    }

    /// Create a new handler instance for a step.
    pub fn create(&self, spec: &HandlerSpec) -> Result<Box<dyn Handler>> {
        let id = spec.handler_id();
        let factory = self.factories.get(&id).ok_or_else(|| {
            EtlError::config(format!("Handler \"{}\" is not registered", id))
        })?;
        Ok(factory())
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Every registered identifier, sorted.
    pub fn list_available(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
