//! Command-line interface for reviewacquire.

mod commands;
mod progress;

pub use commands::{is_verbose, run};
