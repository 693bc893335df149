pub mod context;
pub mod loader;

pub use context::{Context, ContextOptions};
pub use loader::{Loader, ProcessRecord, RunSummary};
