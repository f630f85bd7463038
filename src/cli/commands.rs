//! Execute a parsed invocation

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::Dispatcher;
use crate::cli::args::{build_completion_cli, Action, Invocation};
use crate::cli::{CliError, CliResult};
use crate::config::{DelegationMode, Settings};
use crate::domain::CommandRegistry;
use crate::exitcode;
use crate::infrastructure::{install_dir, Delegate, ExecDelegate, SearchPathLocator, SpawnDelegate};

/// Run the invocation and return the process exit code.
///
/// For a delegated command this is the subcommand's own exit code. In exec mode a
/// successful delegation never returns.
pub fn execute(invocation: Invocation, registry: CommandRegistry, program: &str) -> CliResult<i32> {
    match invocation.action {
        Action::ShowHelp(text) | Action::ShowVersion(text) => {
            write_stdout(&text)?;
            Ok(exitcode::OK)
        }
        Action::Completions(shell) => {
            write_stdout(&completion_script(shell, &registry, program))?;
            Ok(exitcode::OK)
        }
        Action::Dispatch { command, args } => {
            let settings = Settings::load()?;
            let dispatcher = build_dispatcher(registry, program, &settings);
            Ok(dispatcher.dispatch(&command, &args)?)
        }
    }
}

/// Wire the dispatcher from settings: install dir, then configured paths, then `PATH`.
#[instrument(level = "debug", skip(registry))]
pub fn build_dispatcher(registry: CommandRegistry, program: &str, settings: &Settings) -> Dispatcher {
    let mut dirs: Vec<PathBuf> = install_dir().into_iter().collect();
    dirs.extend(settings.search_paths.iter().cloned());
    debug!("search dirs before PATH: {:?}, mode: {}", dirs, settings.mode);

    let delegate: Arc<dyn Delegate> = match settings.mode {
        DelegationMode::Exec => Arc::new(ExecDelegate),
        DelegationMode::Spawn => Arc::new(SpawnDelegate),
    };

    Dispatcher::new(
        registry,
        settings.effective_prefix(program),
        Arc::new(SearchPathLocator::new(dirs)),
        delegate,
    )
}

/// Render the completion script in memory; `generate` panics on write errors.
fn completion_script(shell: Shell, registry: &CommandRegistry, program: &str) -> String {
    let mut cmd = build_completion_cli(registry, program);
    let mut buf = Vec::new();
    generate(shell, &mut cmd, program.to_string(), &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn write_stdout(text: &str) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    match writeln!(stdout, "{}", text.trim_end()).and_then(|()| stdout.flush()) {
        Ok(()) => Ok(()),
        // reader went away (e.g. `pm --help | head`)
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        Err(e) => Err(CliError::io("write to stdout", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_prefix_setting_when_building_dispatcher_then_uses_it() {
        let settings = Settings {
            prefix: Some("things".into()),
            search_paths: vec![],
            mode: DelegationMode::Spawn,
        };

        let dispatcher = build_dispatcher(CommandRegistry::default(), "pm", &settings);

        assert_eq!(dispatcher.prefix(), "things");
        assert_eq!(dispatcher.registry().len(), 3);
    }

    #[test]
    fn given_shell_when_rendering_completions_then_script_offers_commands() {
        let script = completion_script(Shell::Bash, &CommandRegistry::default(), "pm");

        assert!(script.contains("pm"));
        assert!(script.contains("things"));
        assert!(script.contains("bind"));
    }

    #[test]
    fn given_no_prefix_setting_when_building_dispatcher_then_uses_program_name() {
        let dispatcher =
            build_dispatcher(CommandRegistry::default(), "pm", &Settings::default());
        assert_eq!(dispatcher.prefix(), "pm");
    }
}
