use std::{env, process};

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use pm::cli::{self, output, CliError};
use pm::domain::CommandRegistry;

fn main() {
    let mut argv = env::args_os();
    let program = cli::program_name(argv.next().as_deref());
    let registry = CommandRegistry::default();

    let invocation = match cli::parse(&registry, &program, argv) {
        Ok(invocation) => invocation,
        Err(e) => exit_with(&e),
    };

    setup_logging(invocation.verbosity);
    tracing::debug!("program: {}, action: {:?}", program, invocation.action);

    match cli::execute(invocation, registry, &program) {
        Ok(code) => process::exit(code),
        Err(e) => exit_with(&e),
    }
}

fn exit_with(e: &CliError) -> ! {
    match e {
        // clap renders its own "error:" prefix and usage hint
        CliError::Parse(err) => {
            let _ = err.print();
        }
        other => output::error(other),
    }
    process::exit(e.exit_code());
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            output::warning("Don't be crazy, max is -d -d -d");
            LevelFilter::TRACE
        }
    };

    // stderr only: stdout belongs to the delegated command
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}
