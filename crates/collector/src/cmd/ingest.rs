//! `civic ingest` - parse feed payloads and publish them on the bus

use std::path::PathBuf;

use anyhow::{Context, Result};
use civic_config::Config;
use civic_pipeline::Bus;
use civic_sources::Feed;
use clap::Args;

use super::{DEFAULT_CONFIG, build_filers};

/// Arguments for `civic ingest`
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Feed whose parser and address are used
    #[arg(short, long)]
    pub feed: String,

    /// Raw payloads, one feed fetch per file
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Parse each file with the feed, publish it, then drain every filer
pub async fn run(args: IngestArgs, config: Config) -> Result<()> {
    let feed_config = config.feed(&args.feed)?;
    let feed = Feed::new(&args.feed, feed_config)
        .with_context(|| format!("feed '{}' cannot be used", args.feed))?;

    let filers = build_filers(&config);
    if filers.is_empty() {
        tracing::warn!("no usable routes configured, nothing will be stored");
    }
    let bus = Bus::start(filers, config.global.queue_size).context("failed to start bus")?;

    for path in &args.files {
        let raw = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        let envelope = feed.ingest(&raw);
        let records = envelope.record_count();
        let delivered = bus.publish_blocking(feed.address(), envelope).await;

        tracing::info!(
            feed = %feed.name(),
            file = %path.display(),
            records,
            routes = delivered,
            "feed payload published"
        );
    }

    for (route, snapshot) in bus.shutdown().await? {
        tracing::info!(
            route = %route,
            messages_received = snapshot.messages_received,
            messages_filtered = snapshot.messages_filtered,
            records_stored = snapshot.records_stored,
            write_errors = snapshot.write_errors,
            "route finished"
        );
    }

    Ok(())
}
