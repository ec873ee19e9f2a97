use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use orderload::adapter::inbound::cli::{self, command::Cli};
use orderload::infrastructure::bootstrap::Services;
use orderload::infrastructure::config::settings::Config;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match Config::load_or_default(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    config.init_logging();
    info!("orderload starting");

    let operator = Arc::new(Services::from_config(&config));
    match cli::execute(&cli, operator, &config.server.listen).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
