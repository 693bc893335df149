// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // config container, node grammar, loading
pub mod db;         // connections, drivers, batched inserts
pub mod engine;     // context + process loader
pub mod errors;     // error handling
pub mod handlers;   // built-in handlers + registry
pub mod observability;
pub mod traits;     // unified abstractions
pub mod utils;

#[cfg(test)]
pub mod testing;
