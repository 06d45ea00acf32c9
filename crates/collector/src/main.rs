//! Civic - feed ingestion and route persistence
//!
//! # Usage
//!
//! ```bash
//! # Parse saved feed payloads and store them through every subscribed route
//! civic ingest --config configs/civic.toml --feed vix vix-0915.xml vix-0916.xml
//!
//! # Re-store newline-delimited JSON envelopes through one route, in order
//! civic replay --config configs/civic.toml --route vix_latest archive.jsonl
//! ```

mod cmd;

use anyhow::Result;
use civic_config::{LogConfig, LogFormat};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Civic - feed ingestion and route persistence
#[derive(Parser, Debug)]
#[command(name = "civic")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error); overrides [log].level
    #[arg(short, long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse feed payloads and publish them to the configured routes
    Ingest(cmd::ingest::IngestArgs),

    /// Store saved envelopes through one route with blocking writes
    Replay(cmd::replay::ReplayArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Ingest(args) => {
            let config = cmd::load_config(&args.config)?;
            init_logging(cli.log_level.as_deref(), &config.log)?;
            cmd::report_config(&config);
            cmd::ingest::run(args, config).await
        }
        Command::Replay(args) => {
            let config = cmd::load_config(&args.config)?;
            init_logging(cli.log_level.as_deref(), &config.log)?;
            cmd::report_config(&config);
            cmd::replay::run(args, config).await
        }
    }
}

/// Initialize the tracing subscriber
///
/// `--log-level` wins over `[log].level`; an unparseable filter falls back
/// to `info`.
fn init_logging(level: Option<&str>, log: &LogConfig) -> Result<()> {
    let level = level.unwrap_or(log.level.as_str());
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Console => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}
