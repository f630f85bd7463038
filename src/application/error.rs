//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add dispatch-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("unknown command '{name}' (available commands: {})", .available.join(", "))]
    UnknownCommand {
        name: String,
        available: Vec<String>,
    },

    #[error("{executable}(1) does not exist, try --help")]
    SubcommandNotFound { executable: String },

    #[error("{}(1) is not executable, try chmod or run with root", .path.display())]
    NotExecutable { path: PathBuf },

    #[error("failed to run {}: {source}", .executable.display())]
    DelegationFailed {
        executable: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {message}")]
    Config { message: String },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
