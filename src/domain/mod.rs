//! Domain layer: command registry and naming rules
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod entities;
pub mod error;

pub use entities::{executable_name, CommandRegistry, CommandSpec};
pub use error::DomainError;
