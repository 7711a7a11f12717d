//! Command-line interface parsing for movierec
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! validated runtime `Settings`. Every global option can also come from the
//! environment (or a `.env` file loaded at startup).

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use crate::cache::{EnrichmentCache, DEFAULT_TTL_DAYS};
use crate::metadata::omdb::OMDB_BASE_URL;
use crate::metadata::{MetadataFetcher, OmdbClient};
use crate::recommend::DEFAULT_RECOMMENDATIONS;
use crate::report::export_file_name;
use crate::throttle::Throttle;

/// Error types for CLI configuration
#[derive(Debug, Error)]
pub enum CliError {
    /// A network command was run without an API key
    #[error("No OMDb API key configured. Pass --api-key or set OMDB_API_KEY")]
    MissingApiKey,

    /// The cache TTL is not positive or too large to represent
    #[error("Invalid cache TTL: {0} days (must be positive and representable)")]
    InvalidTtl(i64),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// movierec - Movie recommendations enriched with OMDb metadata
#[derive(Parser, Debug)]
#[command(name = "movierec")]
#[command(about = "Content-based movie recommendations with OMDb posters, ratings and plots")]
#[command(version)]
pub struct Cli {
    /// OMDb API key
    #[arg(long, env = "OMDB_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// OMDb endpoint
    #[arg(long, env = "OMDB_BASE_URL", default_value = OMDB_BASE_URL, global = true)]
    pub base_url: String,

    /// Location of the persisted metadata cache
    #[arg(long, env = "MOVIEREC_CACHE_FILE", value_name = "PATH", global = true)]
    pub cache_file: Option<PathBuf>,

    /// Keep the metadata cache in memory only
    #[arg(long, global = true)]
    pub no_persist: bool,

    /// Days before a cached response is fetched again
    #[arg(long, env = "MOVIEREC_CACHE_TTL_DAYS", default_value_t = DEFAULT_TTL_DAYS, global = true)]
    pub ttl_days: i64,

    /// Minimum milliseconds between OMDb requests
    #[arg(long, default_value_t = 100, global = true)]
    pub throttle_ms: u64,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, env = "MOVIEREC_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Recommend movies similar to TITLE
    Recommend {
        /// A title from the catalog
        title: String,

        /// JSON file with `titles` and the `similarity` matrix
        #[arg(long, env = "MOVIEREC_CATALOG", value_name = "PATH")]
        catalog: PathBuf,

        /// Number of recommendations
        #[arg(long, short = 'n', default_value_t = DEFAULT_RECOMMENDATIONS)]
        count: usize,

        /// Skip OMDb lookups and show similarity scores only
        #[arg(long)]
        no_enrich: bool,

        /// Save a text summary, optionally to a specific file
        ///
        /// Examples:
        ///   movierec recommend Avatar --catalog movies.json --export
        ///   movierec recommend Avatar --catalog movies.json --export picks.txt
        #[arg(long, value_name = "PATH")]
        export: Option<Option<PathBuf>>,
    },

    /// Show OMDb details for TITLE
    Details {
        title: String,

        /// Release year, to tell remakes apart
        #[arg(long)]
        year: Option<u16>,

        /// Print the normalized record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the poster URL for TITLE
    Poster {
        title: String,

        /// Release year, to tell remakes apart
        #[arg(long)]
        year: Option<u16>,
    },

    /// Test the connection to OMDb
    Check,

    /// Inspect or reset the metadata cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    /// Show how many responses are cached
    Stats,
    /// Remove every cached response
    Clear,
}

/// Runtime configuration derived from CLI arguments
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: Option<String>,
    pub base_url: String,
    /// Persisted cache location; `None` keeps the cache in memory
    pub cache_path: Option<PathBuf>,
    pub ttl: chrono::Duration,
    pub throttle: Duration,
}

impl Settings {
    /// Creates Settings from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(Settings)` with the cache path resolved
    /// * `Err(CliError::InvalidTtl)` if the TTL is not positive or overflows
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.ttl_days <= 0 {
            return Err(CliError::InvalidTtl(cli.ttl_days));
        }
        let ttl =
            chrono::Duration::try_days(cli.ttl_days).ok_or(CliError::InvalidTtl(cli.ttl_days))?;

        let cache_path = if cli.no_persist {
            None
        } else {
            cli.cache_file.clone().or_else(EnrichmentCache::default_path)
        };

        Ok(Settings {
            api_key: cli
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            base_url: cli.base_url.clone(),
            cache_path,
            ttl,
            throttle: Duration::from_millis(cli.throttle_ms),
        })
    }

    /// The API key, required by every command that reaches OMDb
    pub fn require_api_key(&self) -> Result<&str, CliError> {
        self.api_key.as_deref().ok_or(CliError::MissingApiKey)
    }

    /// Opens the persisted cache, or an in-memory one when persistence is off
    pub fn open_cache(&self) -> EnrichmentCache {
        match &self.cache_path {
            Some(path) => EnrichmentCache::open(path, self.ttl),
            None => EnrichmentCache::in_memory(self.ttl),
        }
    }

    /// Builds a fetcher talking to the configured OMDb endpoint
    pub fn fetcher(&self) -> Result<MetadataFetcher<OmdbClient>, CliError> {
        let client = OmdbClient::new(self.require_api_key()?).with_base_url(self.base_url.clone());
        Ok(MetadataFetcher::new(client).with_throttle(Throttle::new(self.throttle)))
    }
}

/// Where `--export` should write, if it was given
pub fn export_path(export: &Option<Option<PathBuf>>, selected: &str) -> Option<PathBuf> {
    match export {
        None => None,
        Some(None) => Some(PathBuf::from(export_file_name(selected))),
        Some(Some(path)) => Some(path.clone()),
    }
}
