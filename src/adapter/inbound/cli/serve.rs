//! Handler for the `serve` command.

use std::sync::Arc;

use tracing::info;

use crate::adapter::inbound::cli::command::ServeArgs;
use crate::adapter::inbound::http;
use crate::error::Result;
use crate::port::OrderOperator;

/// Serve HTTP until Ctrl-C, then wait for dispatched ingestions.
pub async fn execute(
    args: &ServeArgs,
    listen: &str,
    operator: Arc<dyn OrderOperator>,
) -> Result<()> {
    let listen = args.listen.as_deref().unwrap_or(listen);
    http::serve(listen, operator, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received");
    })
    .await
}
