//! hapi CLI - Streaming client for HAPI time-series data servers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hapi_lib::prelude::*;
use hapi_lib::ContentCoding;
use tracing_subscriber::EnvFilter;

mod commands;
mod display;

use display::DataFormat;

#[derive(Parser)]
#[command(name = "hapi")]
#[command(about = "Streaming client for HAPI time-series data servers", long_about = None)]
#[command(version)]
struct Cli {
    /// Server base URL (e.g., https://cdaweb.gsfc.nasa.gov/hapi)
    server: String,

    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Do not ask the server for gzip-compressed responses
    #[arg(long, global = true)]
    no_gzip: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the server's datasets
    Catalog,

    /// Show dataset metadata
    Info {
        /// Dataset identifier
        dataset: String,
    },

    /// Stream dataset records to stdout as CSV
    Data {
        /// Dataset identifier
        dataset: String,

        /// Start time (ISO-8601, e.g. 2020-01-01T00:00Z)
        #[arg(short, long)]
        start: String,

        /// Stop time, exclusive (ISO-8601)
        #[arg(short = 'e', long)]
        stop: String,

        /// Comma-separated parameter names (omit for all)
        #[arg(short, long)]
        parameters: Option<String>,

        /// Wire format requested from the server
        #[arg(short, long, value_enum, default_value = "csv")]
        format: DataFormat,

        /// Maximum number of chunk requests
        #[arg(long, default_value_t = hapi_lib::DEFAULT_CHUNK_LIMIT)]
        chunk_limit: usize,
    },
}

/// Initialize tracing; `RUST_LOG` takes precedence over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let base = Url::parse(&cli.server).with_context(|| format!("Invalid server URL: {}", cli.server))?;
    let config = ClientConfig {
        content_coding: if cli.no_gzip {
            ContentCoding::Identity
        } else {
            ContentCoding::Gzip
        },
        ..Default::default()
    };
    let service = HapiService::new(base, config)?;

    match cli.command {
        Commands::Catalog => commands::catalog::list_catalog(&service).await,
        Commands::Info { dataset } => commands::info::show_info(&service, &dataset).await,
        Commands::Data {
            dataset,
            start,
            stop,
            parameters,
            format,
            chunk_limit,
        } => {
            commands::data::stream_data(
                service,
                &dataset,
                &start,
                &stop,
                parameters.as_deref(),
                format,
                chunk_limit,
            )
            .await
        }
    }
}
