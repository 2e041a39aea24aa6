use std::io;
use std::process::ExitCode;

use agent_config::{ConfigStore, Environment};
use agent_telemetry::tracing_support;
use anyhow::{Context, Result};
use article_generator::cli::{Cli, Command};
use article_generator::commands;
use clap::Parser;
use tracing::debug;

fn main() -> ExitCode {
    // Must run before the runtime spawns worker threads.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    if let Err(err) = tracing_support::init(cli.verbosity()) {
        eprintln!("warning: {err}");
    }
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(%err, "failed to load .env"),
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let store = ConfigStore::new(cli.config);
    let mut stdout = io::stdout().lock();

    runtime.block_on(async {
        match cli.command {
            Command::Config { action } => commands::config::run(&store, action, &mut stdout).await,
            Command::Generate(args) => {
                let env = Environment::from_process();
                commands::generate::run(&store, args, &env, &mut stdout).await
            }
        }
    })
}
