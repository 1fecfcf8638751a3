//! risk-survey CLI entry point.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use risk_survey::cli::{commands, handle_error, Cli, Commands};
use risk_survey::infrastructure::config::ConfigLoader;
use risk_survey::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => Some(logger),
        Err(err) => {
            let _ = tracing_subscriber::registry()
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init();
            tracing::warn!(error = %err, "falling back to default logging");
            None
        }
    };

    let result = match cli.command {
        Commands::Timeline(args) => commands::timeline::execute(args, config, cli.json),
        Commands::Estimate(args) => commands::estimate::execute(args, cli.json).await,
        Commands::Phase2(args) => commands::phase2::execute(args, &config, cli.json),
        Commands::Simulate(args) => commands::simulate::execute(args, config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
