//! Infrastructure layer: process I/O implementations
//!
//! This layer implements the locator and delegation traits against the real OS.

pub mod signals;
pub mod traits;

pub use traits::{
    install_dir, Delegate, ExecDelegate, ExecutableLocator, SearchPathLocator, SpawnDelegate,
};
