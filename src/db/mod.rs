// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod array_inserter;
mod connection;
pub mod drivers;
mod registry;

pub use array_inserter::{ArrayInserter, INSERT_BIND_ARRAY_SIZE};
pub use connection::{
    ColumnHint, ConnectionString, Cursor, DataType, DbConnection, Driver, NamedParams, RowSet,
    SqlValue,
};
pub use registry::{DriverFactory, DriverRegistry};
