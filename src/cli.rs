//! Command-line interface parsing for the national sites CLI
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into the runtime configuration: where the response cache lives, the
//! MapQuest API key, and the network timeout.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;

use crate::cache::default_cache_path;
use crate::fetch::DEFAULT_TIMEOUT;

/// Cache file used when no home directory can be determined
const FALLBACK_CACHE_FILE: &str = "npsites-cache.json";

/// Error types for CLI argument handling
#[derive(Debug, Error)]
pub enum CliError {
    /// A zero timeout would fail every request
    #[error("Invalid timeout: must be at least 1 second")]
    InvalidTimeout,
}

/// Browse national park sites by state and find places nearby
#[derive(Parser, Debug)]
#[command(name = "npsites")]
#[command(about = "Browse national park sites by state and find places nearby")]
#[command(version)]
pub struct Cli {
    /// Response cache file (defaults to the user cache directory)
    #[arg(long, value_name = "PATH", env = "NPSITES_CACHE_FILE")]
    pub cache_file: Option<PathBuf>,

    /// MapQuest API key used for nearby place searches
    #[arg(long, value_name = "KEY", env = "MAPQUEST_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Network timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout: u64,
}

/// Runtime configuration derived from CLI arguments and environment
#[derive(Debug, Clone)]
pub struct Config {
    /// Backing file of the response cache
    pub cache_file: PathBuf,
    /// MapQuest API key, if configured
    pub api_key: Option<String>,
    /// Per-request network timeout
    pub timeout: Duration,
}

impl Config {
    /// Creates a Config from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Config)` with defaults filled in
    /// * `Err(CliError)` if an argument is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.timeout == 0 {
            return Err(CliError::InvalidTimeout);
        }

        let cache_file = cli
            .cache_file
            .clone()
            .or_else(default_cache_path)
            .unwrap_or_else(|| PathBuf::from(FALLBACK_CACHE_FILE));

        let api_key = cli
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        Ok(Config {
            cache_file,
            api_key,
            timeout: Duration::from_secs(cli.timeout),
        })
    }
}
