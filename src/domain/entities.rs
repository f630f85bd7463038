//! Domain entities: registered commands and executable naming

use std::collections::HashSet;

use crate::domain::DomainError;

/// A subcommand the dispatcher knows how to route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Name typed on the command line, e.g. "bind"
    pub name: String,
    /// One-line description shown in help
    pub description: String,
    /// Usage placeholder shown after the name, e.g. "[credentials]"
    pub args_hint: Option<String>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            args_hint: None,
        }
    }

    pub fn with_args_hint(mut self, hint: impl Into<String>) -> Self {
        self.args_hint = Some(hint.into());
        self
    }

    /// Name plus usage hint, as listed in help output.
    pub fn usage(&self) -> String {
        match &self.args_hint {
            Some(hint) => format!("{} {}", self.name, hint),
            None => self.name.clone(),
        }
    }
}

/// Immutable, ordered set of registered commands.
///
/// Built once at startup. Names are unique; insertion order is preserved for
/// help output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRegistry {
    commands: Vec<CommandSpec>,
}

impl CommandRegistry {
    /// Build a registry, rejecting duplicate or malformed names.
    pub fn new(commands: Vec<CommandSpec>) -> Result<Self, DomainError> {
        let mut seen = HashSet::new();
        for spec in &commands {
            validate_name(&spec.name)?;
            if !seen.insert(spec.name.as_str()) {
                return Err(DomainError::DuplicateCommand(spec.name.clone()));
            }
        }
        Ok(Self { commands })
    }

    /// Look up a command by exact name.
    pub fn find(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|spec| spec.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.commands.iter().map(|spec| spec.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandRegistry {
    /// The commands shipped with `pm`.
    fn default() -> Self {
        Self {
            commands: vec![
                CommandSpec::new("bind", "integrate binding credentials")
                    .with_args_hint("[credentials]"),
                CommandSpec::new("things", "access things service"),
                CommandSpec::new("auth", "get your suiteAuth token"),
            ],
        }
    }
}

/// Names must be usable as a file name suffix and must not look like an option.
fn validate_name(name: &str) -> Result<(), DomainError> {
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidCommandName(name.to_string()))
    }
}

/// Executable implementing `command` for a dispatcher named `prefix`: `<prefix>-<command>`.
pub fn executable_name(prefix: &str, command: &str) -> String {
    format!("{prefix}-{command}")
}
