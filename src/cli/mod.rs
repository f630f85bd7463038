//! CLI layer: argument parsing and command dispatch

pub mod args;
pub mod commands;
pub mod error;
pub mod output;

pub use args::{parse, program_name, Action, Invocation};
pub use commands::execute;
pub use error::{CliError, CliResult};
