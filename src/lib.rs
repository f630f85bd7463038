//! `pm`: git-style command dispatcher
//!
//! `pm <command> [args...]` runs the executable `pm-<command>`, found next to `pm`
//! itself or on `PATH`, with the remaining arguments forwarded untouched. The
//! dispatcher exits with the subcommand's exit code.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
