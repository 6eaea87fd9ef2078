//! unbroken: forward Go test results and coverage to Grafana
//!
//! Runs an HTTP server accepting `go test -json` uploads, or derives
//! metrics from a local file with the `derive` subcommand.

use anyhow::Context;
use clap::Parser;
use tracing::info;

use unbroken::commands;
use unbroken::config::{Command, Config};
use unbroken::server;

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr so `derive` output stays clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    config.validate().context("invalid configuration")?;

    match &config.command {
        Some(Command::Derive { file, push }) => {
            let report = commands::run_derive(
                &config,
                file.as_deref(),
                std::io::stdin().lock(),
                *push,
                std::io::stdout().lock(),
            )?;
            info!(
                metrics = report.metrics,
                diagnostics = report.diagnostics,
                pushed = report.pushed,
                "derive finished"
            );
        }
        Some(Command::Serve) | None => {
            // The push client is blocking, so the runtime is built by hand
            // rather than wrapping all of main in it
            let runtime = tokio::runtime::Runtime::new().context("failed to start runtime")?;
            runtime.block_on(server::serve(&config))?;
        }
    }

    Ok(())
}
