//! Application layer: dispatch use case
//!
//! This layer applies the registry rules and depends on the process boundary traits.

pub mod dispatcher;
pub mod error;

pub use dispatcher::Dispatcher;
pub use error::{ApplicationError, ApplicationResult};
