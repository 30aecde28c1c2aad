//! CLI command handlers. Each command is in its own file.

mod digest;
mod probe;
mod run;

pub use digest::run_digest;
pub use probe::run_probe;
pub use run::{run_pipeline, RunOverrides};
