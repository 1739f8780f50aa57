// Entrypoint for the release publisher.
// - Keeps `main` small: resolve configuration, run the publisher, map any
//   failure to exit status 1.

use std::process::ExitCode;

use clap::Parser;
use release_publisher::config::Cli;
use release_publisher::{ui, Publisher};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    // Loaded before parsing so clap sees the variables; reported once
    // logging is up.
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    // A missing .env file is fine; CI usually exports variables directly.
    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("failed to load .env file: {e}");
        }
    }

    match publish(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn publish(cli: &Cli) -> anyhow::Result<()> {
    let root = cli.root()?;
    let file = cli.file_config(&root)?;
    let config = cli.resolve(file, ui::credential_source().as_mut())?;

    let publisher = Publisher::new(config)?;
    debug!(
        root = %publisher.config().paths.root.display(),
        remote_dir = %publisher.config().remote_dir,
        "configuration resolved"
    );
    let archive = publisher.run()?;
    ui::report_uploaded(&archive);
    Ok(())
}
