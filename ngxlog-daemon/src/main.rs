use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use ngxlog_core::config::ExporterConfig;
use ngxlog_daemon::cli::DaemonCli;
use ngxlog_daemon::logging;
use ngxlog_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = DaemonCli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: DaemonCli) -> Result<()> {
    let mut config = {
        // warnings from env overrides and app validation happen during load
        let _bootstrap = tracing::subscriber::set_default(logging::bootstrap_subscriber());
        ExporterConfig::load(&cli.config_file)
            .await
            .context("failed to load config")?
    };
    cli.apply_overrides(&mut config);

    logging::init_tracing(&config)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config_file.display(),
        "ngxlog starting"
    );

    let orchestrator = Orchestrator::build_from_config(config).await?;

    if cli.validate {
        tracing::info!(
            applications = orchestrator.profiles().len(),
            "configuration is valid"
        );
        return Ok(());
    }

    orchestrator.run().await
}
