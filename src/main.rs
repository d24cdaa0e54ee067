use anyhow::{Context, Result};
use jobshell::io_adapters::{EditorSource, LineSource, PlainSource};
use jobshell::{Config, Interpreter, signal};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> ExitCode {
    // Logs go to stderr so they never mix with job notices on stdout.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_env("JOBSHELL_LOG").unwrap_or_else(|_| EnvFilter::new("off")))
        .init();

    let config: Config = argh::from_env();
    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("jobshell: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config) -> Result<()> {
    signal::install().context("cannot set up signal handling")?;

    let mut source: Box<dyn LineSource> = if config.plain {
        Box::new(PlainSource::new(io::stdin().lock()))
    } else {
        Box::new(EditorSource::new()?)
    };
    Interpreter::default().repl(source.as_mut(), config)
}
