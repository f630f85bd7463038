//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the command registry rules.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("duplicate command name: {0}")]
    DuplicateCommand(String),

    #[error("invalid command name: '{0}'")]
    InvalidCommandName(String),
}
