// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod etl;

pub use etl::{ErrorCategory, EtlError, Result};
