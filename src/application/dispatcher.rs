//! Dispatcher service: route a command name to its executable

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{executable_name, CommandRegistry};
use crate::infrastructure::{Delegate, ExecutableLocator};

/// Routes registered command names to `<prefix>-<name>` executables.
///
/// Makes exactly one delegation attempt per dispatch and never interprets the
/// subcommand's result.
pub struct Dispatcher {
    registry: CommandRegistry,
    prefix: String,
    locator: Arc<dyn ExecutableLocator>,
    delegate: Arc<dyn Delegate>,
}

impl Dispatcher {
    pub fn new(
        registry: CommandRegistry,
        prefix: impl Into<String>,
        locator: Arc<dyn ExecutableLocator>,
        delegate: Arc<dyn Delegate>,
    ) -> Self {
        Self {
            registry,
            prefix: prefix.into(),
            locator,
            delegate,
        }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Locate the executable for a registered command.
    pub fn resolve(&self, command: &str) -> ApplicationResult<PathBuf> {
        if !self.registry.contains(command) {
            return Err(ApplicationError::UnknownCommand {
                name: command.to_string(),
                available: self
                    .registry
                    .names()
                    .into_iter()
                    .map(String::from)
                    .collect(),
            });
        }

        let executable = executable_name(&self.prefix, command);
        if let Some(path) = self.locator.locate(&executable) {
            return Ok(path);
        }
        match self.locator.locate_non_executable(&executable) {
            Some(path) => Err(ApplicationError::NotExecutable { path }),
            None => Err(ApplicationError::SubcommandNotFound { executable }),
        }
    }

    /// Run `command` with `args` and return the exit code to pass through.
    #[instrument(level = "debug", skip(self, args))]
    pub fn dispatch(&self, command: &str, args: &[OsString]) -> ApplicationResult<i32> {
        let executable = self.resolve(command)?;
        debug!("delegating to {} with {} args", executable.display(), args.len());

        self.delegate
            .delegate(&executable, args)
            .map_err(|source| ApplicationError::DelegationFailed { executable, source })
    }
}
