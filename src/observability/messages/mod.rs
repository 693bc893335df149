// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for structured logging.
//!
//! Each message is a small struct implementing `Display` for the human-readable
//! line and [`StructuredLog`] for emitting it with its fields attached.
//!
//! * `engine` - context events: configuration files, handler invocation, connections
//! * `loader` - process lifecycle and run summary
//!
//! ```rust
//! use rattle::observability::messages::loader::ProcessStarted;
//!
//! let msg = ProcessStarted {
//!     name: "load_rates",
//!     comment: "daily exchange rates",
//! };
//!
//! tracing::info!("{}", msg);
//! ```

use tracing::Span;

pub mod engine;
pub mod loader;

/// A log message that knows its level and structured fields.
pub trait StructuredLog {
    /// Emit the message at its level with its fields attached.
    fn log(&self);

    /// A span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
