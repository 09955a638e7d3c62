//! CLI command implementations.

pub mod check;
pub mod run;

pub use check::check_definition;
pub use run::{run_definition, RunOptions};
