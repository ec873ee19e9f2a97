//! CLI module graph.

pub mod command;
pub mod drop;
pub mod ingest;
pub mod serve;

use std::process::ExitCode;
use std::sync::Arc;

use crate::error::Result;
use crate::port::OrderOperator;

use command::{Cli, Commands};

/// Dispatch a parsed command line.
///
/// `listen` is the configured server address, used when `serve` has no
/// `--listen` override.
pub async fn execute(
    cli: &Cli,
    operator: Arc<dyn OrderOperator>,
    listen: &str,
) -> Result<ExitCode> {
    match &cli.command {
        Commands::Serve(args) => {
            serve::execute(args, listen, operator).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Ingest(args) => ingest::execute(args, operator.as_ref()).await,
        Commands::Drop => Ok(drop::execute(operator.as_ref()).await),
    }
}
