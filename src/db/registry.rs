// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

use crate::db::drivers::SqliteDriver;
use crate::db::Driver;
use crate::errors::{EtlError, Result};

/// Connects a driver given `(spec, username, password)`.
pub type DriverFactory = Box<dyn Fn(&str, &str, &str) -> Result<Box<dyn Driver>>>;

/// Maps driver names, the part of a connection string before the first `:`, to factories.
pub struct DriverRegistry {
    factories: HashMap<String, DriverFactory>,
}

impl DriverRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registry with every driver compiled into the crate.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(
            "sqlite",
            Box::new(|spec, username, password| {
                let driver = SqliteDriver::connect(spec, username, password)?;
                Ok(Box::new(driver) as Box<dyn Driver>)
            }),
        );
        registry
    }

    /// Add or replace a driver.
    pub fn register(&mut self, name: impl Into<String>, factory: DriverFactory) {
        self.factories.insert(name.into(), factory);
    }

    pub fn create(
        &self,
        name: &str,
        spec: &str,
        username: &str,
        password: &str,
    ) -> Result<Box<dyn Driver>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            EtlError::database(format!("No known driver available for \"{}\"", name))
        })?;
        factory(spec, username, password)
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn list_available(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingDriver;

    #[test]
    fn test_builtin_has_sqlite() {
        let registry = DriverRegistry::builtin();
        assert!(registry.is_registered("sqlite"));
        assert_eq!(registry.list_available(), vec!["sqlite"]);
    }

    #[test]
    fn test_factory_receives_spec_and_credentials() {
        let (driver, log) = RecordingDriver::new();
        let mut registry = DriverRegistry::empty();
        let template = driver.clone();
        registry.register(
            "rec",
            Box::new(move |spec, username, password| {
                template.record(format!("connect {} {} {}", spec, username, password));
                Ok(Box::new(template.clone()) as Box<dyn Driver>)
            }),
        );

        registry.create("rec", "host:1", "scott", "tiger").unwrap();
        assert_eq!(log.borrow().as_slice(), ["connect host:1 scott tiger"]);
    }

    #[test]
    fn test_unknown_driver_is_database_error() {
        let err = match DriverRegistry::empty().create("nope", "x", "", "") {
            Err(err) => err,
            Ok(_) => panic!("expected an error"),
        };
        assert!(err.to_string().contains("\"nope\""));
    }
}
