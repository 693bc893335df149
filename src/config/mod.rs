// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod loader;
mod node;
pub mod template;
mod value;

pub use loader::{load_config, load_document, load_typed};
pub use node::{HandlerNode, HandlerSpec, BUILTIN_NAMESPACE, DEFAULT_CLASS};
pub use value::{split_lines, Config, Value};
