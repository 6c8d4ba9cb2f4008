use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use pdfjoin::{AppConfig, cli::Cli, output, output::OutputFormatter, telemetry::init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::try_from(&cli.settings).context("Failed to load configuration")?;
    let formatter = OutputFormatter::new(config.json);

    match pdfjoin::run(cli.command, &config, &formatter).await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            tracing::debug!(error = ?err, "Command failed");
            output::print_error(&formatter, &err);
            Ok(ExitCode::from(err.exit_code() as u8))
        }
    }
}
