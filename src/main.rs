use clap::Parser;
use genesis_spec::cli::{self, Cli};
use genesis_spec::config::GenesisConfig;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over the configured level
    let config = GenesisConfig::load_or_default(&cli.config);
    let log_level = match &config {
        Ok(c) => c.log_level.clone(),
        Err(_) => "info".to_string(),
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match config.and_then(|config| cli::run(cli, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
