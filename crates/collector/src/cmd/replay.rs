//! `civic replay` - store saved envelopes through one route, in order
//!
//! Input files hold one JSON envelope per line, as written by an `append`
//! route without `flatten` or `records_data`. Each line is stored with the
//! blocking form, so every write has completed before the next line is read.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use civic_config::Config;
use civic_protocol::Document;
use civic_sinks::Filer;
use clap::Args;

use super::DEFAULT_CONFIG;

/// Arguments for `civic replay`
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Route to store through
    #[arg(short, long)]
    pub route: String,

    /// Newline-delimited JSON envelope files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Store every envelope in `args.files` through the named route
pub async fn run(args: ReplayArgs, config: Config) -> Result<()> {
    let route = config.route(&args.route)?;
    let filer = Filer::from_route(&args.route, route)
        .with_context(|| format!("route '{}' cannot be used", args.route))?;

    let files = args.files;
    let filer = tokio::task::spawn_blocking(move || -> Result<Filer> {
        for path in &files {
            replay_file(&filer, path)?;
        }
        Ok(filer)
    })
    .await
    .context("replay task failed")??;

    let snapshot = filer.metrics().snapshot();
    tracing::info!(
        route = %filer.name(),
        messages_received = snapshot.messages_received,
        messages_filtered = snapshot.messages_filtered,
        records_stored = snapshot.records_stored,
        write_errors = snapshot.write_errors,
        "replay finished"
    );
    Ok(())
}

/// Store each line of one file; returns the number of records written
pub fn replay_file(filer: &Filer, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut stored = 0;
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Document>(line) {
            Ok(message) => stored += filer.store_document_blocking(&message),
            Err(e) => tracing::warn!(
                file = %path.display(),
                line = index + 1,
                error = %e,
                "skipping line that is not a JSON object"
            ),
        }
    }

    tracing::debug!(file = %path.display(), records = stored, "file replayed");
    Ok(stored)
}
