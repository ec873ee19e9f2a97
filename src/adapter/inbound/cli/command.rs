//! Command-line interface definitions.
//!
//! Defines the CLI structure for orderload using `clap`: a long-running
//! HTTP server, one-shot ingestion of a stored event, and the admin drop.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Batched ingestion of JSON order files into a document store
#[derive(Parser, Debug)]
#[command(name = "orderload")]
#[command(version)]
pub struct Cli {
    /// Path to the TOML configuration file (defaults apply when absent)
    #[arg(long, global = true, default_value = "orderload.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the orderload CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the event webhook and admin endpoints
    Serve(ServeArgs),

    /// Ingest the blob named by a stored storage event
    Ingest(IngestArgs),

    /// Delete every document in the destination collection
    Drop,
}

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Listen address, overriding `[server] listen`
    #[arg(long)]
    pub listen: Option<String>,
}

/// Arguments for the `ingest` command.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Event Grid JSON file (single event or array); `-` reads stdin
    #[arg(long)]
    pub event: PathBuf,
}
