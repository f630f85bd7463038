//! CLI argument definitions using clap
//!
//! Only options before the command name belong to the dispatcher. The command name
//! and everything after it are taken verbatim as an external subcommand so they
//! can be forwarded unchanged.

use std::ffi::{OsStr, OsString};
use std::path::Path;

use clap::error::ErrorKind;
use clap::{ArgAction, Command, CommandFactory, FromArgMatches, Parser, Subcommand};
use clap_complete::Shell;

use crate::cli::{CliError, CliResult};
use crate::domain::CommandRegistry;

/// Program name used when argv[0] is missing or unusable.
pub const DEFAULT_PROGRAM: &str = "pm";

/// Pseudo-command that shows help, either top-level or for a subcommand.
pub const HELP_COMMAND: &str = "help";

const BANNER: &str = r"
  _   _     _
 | |_| |__ (_)_ __   __ _ ___
 | __| '_ \| | '_ \ / _` / __|
 | |_| | | | | | | | (_| \__ \
  \__|_| |_|_|_| |_|\__, |___/
                    |___/
";

/// What the dispatcher was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Print rendered top-level help
    ShowHelp(String),
    /// Print rendered version line
    ShowVersion(String),
    /// Write a completion script for the given shell
    Completions(Shell),
    /// Delegate to a subcommand
    Dispatch {
        command: String,
        args: Vec<OsString>,
    },
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Number of `-d` flags
    pub verbosity: u8,
    pub action: Action,
}

/// Derive the program name (and thus the subcommand prefix) from argv[0].
pub fn program_name(argv0: Option<&OsStr>) -> String {
    argv0
        .map(Path::new)
        .and_then(Path::file_stem)
        .and_then(OsStr::to_str)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .unwrap_or_else(|| DEFAULT_PROGRAM.to_string())
}

/// Command line interface for the things service
#[derive(Parser, Debug)]
#[command(name = "pm")]
#[command(version, long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub debug: u8,

    /// Print a shell completion script
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,

    #[command(subcommand)]
    pub command: Option<External>,
}

/// Subcommands are not declared to clap; they are checked against the registry later.
#[derive(Subcommand, Debug)]
pub enum External {
    // command name followed by its arguments, untouched
    #[command(external_subcommand)]
    Run(Vec<OsString>),
}

/// Build the top-level command under the runtime program name, with the
/// registered commands listed in help.
pub fn build_cli(registry: &CommandRegistry, program: &str) -> Command {
    Cli::command()
        .name(program.to_string())
        .bin_name(program.to_string())
        .override_usage(format!("{program} [OPTIONS] <command> [args...]"))
        .help_template("{about-with-newline}\n{usage-heading} {usage}\n\n{all-args}{after-help}")
        .after_help(format!("\n{}{}", commands_section(registry), BANNER))
}

/// Top-level command with the registered commands declared, so completion
/// scripts can offer their names.
pub fn build_completion_cli(registry: &CommandRegistry, program: &str) -> Command {
    registry
        .iter()
        .fold(build_cli(registry, program), |cmd, spec| {
            cmd.subcommand(Command::new(spec.name.clone()).about(spec.description.clone()))
        })
}

/// Render the "Commands:" block listing every registered command.
pub fn commands_section(registry: &CommandRegistry) -> String {
    let mut rows: Vec<(String, String)> = registry
        .iter()
        .map(|spec| (spec.usage(), spec.description.clone()))
        .collect();
    if !registry.contains(HELP_COMMAND) {
        rows.push((
            format!("{HELP_COMMAND} [command]"),
            "display help for [command]".to_string(),
        ));
    }

    let width = rows.iter().map(|(usage, _)| usage.len()).max().unwrap_or(0);
    let mut out = String::from("Commands:\n");
    for (usage, description) in rows {
        out.push_str(&format!("  {usage:<width$}  {description}\n"));
    }
    out
}

/// Parse the arguments following the program path.
pub fn parse<I, T>(registry: &CommandRegistry, program: &str, args: I) -> CliResult<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut cmd = build_cli(registry, program);
    let argv = std::iter::once(OsString::from(program)).chain(args.into_iter().map(Into::into));

    let matches = match cmd.try_get_matches_from_mut(argv) {
        Ok(matches) => matches,
        Err(e) => {
            let action = match e.kind() {
                ErrorKind::DisplayHelp => Action::ShowHelp(e.render().to_string()),
                ErrorKind::DisplayVersion => Action::ShowVersion(e.render().to_string()),
                _ => return Err(CliError::Parse(e)),
            };
            return Ok(Invocation {
                verbosity: 0,
                action,
            });
        }
    };

    let cli = Cli::from_arg_matches(&matches).map_err(CliError::Parse)?;
    let verbosity = cli.debug;

    if let Some(shell) = cli.completions {
        return Ok(Invocation {
            verbosity,
            action: Action::Completions(shell),
        });
    }

    let mut argv = match cli.command {
        Some(External::Run(argv)) => argv.into_iter(),
        None => Vec::new().into_iter(),
    };
    let action = match argv.next() {
        None => Action::ShowHelp(cmd.render_help().to_string()),
        Some(name) => {
            // clap has already rejected a non-UTF-8 command name
            let name = name.to_string_lossy().into_owned();
            let args: Vec<OsString> = argv.collect();
            if name == HELP_COMMAND && !registry.contains(HELP_COMMAND) {
                help_action(&mut cmd, args)
            } else {
                Action::Dispatch { command: name, args }
            }
        }
    };

    Ok(Invocation { verbosity, action })
}

/// `help` alone shows top-level help; `help <command>` asks the subcommand itself.
fn help_action(cmd: &mut Command, args: Vec<OsString>) -> Action {
    match args.into_iter().next() {
        None => Action::ShowHelp(cmd.render_help().to_string()),
        Some(target) => Action::Dispatch {
            command: target.to_string_lossy().into_owned(),
            args: vec![OsString::from("--help")],
        },
    }
}
