//! National Sites CLI - Browse national park sites by state
//!
//! Scrapes nps.gov for the sites of a chosen state and lists places near a
//! chosen site using the MapQuest radius search. Every response is cached on
//! disk so repeated lookups work without the network.

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use npsites::cache::CacheStore;
use npsites::cli::{Cli, Config};
use npsites::data::build_state_index;
use npsites::fetch::HttpFetcher;
use npsites::shell::Shell;
use tokio::io::BufReader;

/// Sends logs to stderr so they never interleave with the prompt
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // A missing .env file is fine; the key may come from the real environment
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::from_cli(&cli)?;

    init_tracing();
    tracing::info!(cache_file = %config.cache_file.display(), "starting npsites");

    let fetcher = HttpFetcher::new(config.timeout).context("failed to build HTTP client")?;
    let mut store = CacheStore::open(&config.cache_file, fetcher);
    tracing::debug!(
        path = %store.backing_path().display(),
        entries = store.len(),
        "response cache ready"
    );

    let states = build_state_index(&mut store)
        .await
        .context("failed to load the list of states from nps.gov")?;

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    let mut shell = Shell::new(&mut store, states, config.api_key);
    shell.run(stdin, &mut stdout).await?;

    Ok(())
}
