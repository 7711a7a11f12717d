//! Cache-first metadata resolution
//!
//! `MetadataFetcher` consults the enrichment cache before calling the metadata
//! API, classifies every outcome into a [`ResolveError`] kind and writes only
//! confirmed, positive responses back into the cache.

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::omdb::{CHECK_TIMEOUT, DETAIL_TIMEOUT};
use super::{LookupQuery, MetadataApi, MetadataRecord, TransportError};
use crate::cache::EnrichmentCache;
use crate::poster;
use crate::throttle::Throttle;

/// Well-known title looked up during connectivity checks
const CHECK_TITLE: &str = "Inception";

/// Why a title could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The API answered but has no record for the title
    #[error("No movie found for '{0}'")]
    NotFound(String),

    /// The request exceeded its timeout
    #[error("Request timed out")]
    Timeout,

    /// The API could not be reached
    #[error("Network error: {0}")]
    Network(String),

    /// Anything else, including malformed responses and API-side errors
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

/// Coarse failure category, for presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    NotFound,
    Timeout,
    Network,
    Unknown,
}

impl FailureKind {
    /// Human-readable description of the failure
    pub fn message(self) -> &'static str {
        match self {
            FailureKind::NotFound => "Movie not found",
            FailureKind::Timeout => "Connection timed out",
            FailureKind::Network => "Could not reach the metadata service",
            FailureKind::Unknown => "Unexpected error while loading metadata",
        }
    }
}

impl ResolveError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ResolveError::NotFound(_) => FailureKind::NotFound,
            ResolveError::Timeout => FailureKind::Timeout,
            ResolveError::Network(_) => FailureKind::Network,
            ResolveError::Unknown(_) => FailureKind::Unknown,
        }
    }
}

impl From<TransportError> for ResolveError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout => ResolveError::Timeout,
            TransportError::Network(message) => ResolveError::Network(message),
            TransportError::Decode(message) => ResolveError::Unknown(message),
        }
    }
}

/// Result of a connectivity check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// The check title resolved
    Connected {
        title: String,
        year: String,
        director: String,
    },
    /// The API answered with an error message
    ApiError {
        message: String,
        /// The message points at the API key (missing, invalid, not activated)
        key_problem: bool,
    },
    /// The API could not be reached
    Unreachable(String),
}

/// Computes the cache key for a title, optionally disambiguated by year
pub fn cache_key(title: &str, year: Option<u16>) -> String {
    match year {
        Some(year) => format!("{}_{}", title, year),
        None => title.to_string(),
    }
}

/// Resolves movie metadata through the enrichment cache
///
/// The cache is owned by the caller and passed into every resolution, so its
/// lifecycle stays with the session that created it.
#[derive(Debug)]
pub struct MetadataFetcher<A> {
    api: A,
    throttle: Throttle,
    short_plot: bool,
}

impl<A: MetadataApi> MetadataFetcher<A> {
    /// Creates a fetcher with the default throttle and short plots enabled
    pub fn new(api: A) -> Self {
        Self {
            api,
            throttle: Throttle::default(),
            short_plot: true,
        }
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_short_plot(mut self, short_plot: bool) -> Self {
        self.short_plot = short_plot;
        self
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Resolves metadata for `title`
    ///
    /// # Behavior
    /// - A fresh, successful cache entry is returned without a network call
    /// - Otherwise one request is made, after waiting on the throttle
    /// - Only successful responses are cached; not-found and errors never are
    pub async fn resolve(
        &mut self,
        cache: &mut EnrichmentCache,
        title: &str,
        year: Option<u16>,
    ) -> Result<MetadataRecord, ResolveError> {
        let key = cache_key(title, year);

        if let Some(cached) = cache.get(&key) {
            if is_success(cached) {
                debug!(key = %key, "Metadata cache hit");
                return Ok(MetadataRecord::from_response(cached, title));
            }
        }
        debug!(key = %key, "Metadata cache miss");

        let query = LookupQuery {
            title: title.to_string(),
            year,
            short_plot: self.short_plot,
            timeout: DETAIL_TIMEOUT,
        };

        self.throttle.ready().await;
        let raw = match self.api.lookup(&query).await {
            Ok(raw) => raw,
            Err(err) => {
                warn!(title, error = %err, "Metadata lookup failed");
                return Err(err.into());
            }
        };

        if let Err(err) = classify(&raw, title) {
            match &err {
                ResolveError::NotFound(_) => info!(title, "No metadata found"),
                _ => warn!(title, error = %err, "Metadata lookup rejected"),
            }
            return Err(err);
        }

        let record = MetadataRecord::from_response(&raw, title);
        if let Err(err) = cache.set(&key, raw) {
            warn!(key = %key, error = %err, "Failed to persist metadata cache");
        }
        info!(key = %key, "Cached metadata");
        Ok(record)
    }

    /// Resolves only the poster URL, substituting a placeholder on any failure
    pub async fn resolve_poster(
        &mut self,
        cache: &mut EnrichmentCache,
        title: &str,
        year: Option<u16>,
    ) -> String {
        let outcome = self.resolve(cache, title, year).await;
        poster::poster_for(&outcome)
    }

    /// Looks up a well-known title to test the API, bypassing the cache
    pub async fn check_connection(&mut self) -> ConnectionStatus {
        let query = LookupQuery {
            title: CHECK_TITLE.to_string(),
            year: None,
            short_plot: false,
            timeout: CHECK_TIMEOUT,
        };

        self.throttle.ready().await;
        let raw = match self.api.lookup(&query).await {
            Ok(raw) => raw,
            Err(err) => return ConnectionStatus::Unreachable(err.to_string()),
        };

        if is_success(&raw) {
            let record = MetadataRecord::from_response(&raw, CHECK_TITLE);
            return ConnectionStatus::Connected {
                title: record.title,
                year: record.year,
                director: record.director,
            };
        }

        match raw.get("Error").and_then(Value::as_str) {
            Some(message) => ConnectionStatus::ApiError {
                key_problem: message.to_lowercase().contains("key"),
                message: message.to_string(),
            },
            None => ConnectionStatus::ApiError {
                message: "Unknown API error".to_string(),
                key_problem: false,
            },
        }
    }
}

/// True if the response carries `Response: "True"`
fn is_success(raw: &Value) -> bool {
    raw.get("Response")
        .and_then(Value::as_str)
        .is_some_and(|flag| flag.eq_ignore_ascii_case("true"))
}

/// Interprets the API-level outcome of a transport-successful response
fn classify(raw: &Value, title: &str) -> Result<(), ResolveError> {
    let Some(body) = raw.as_object() else {
        return Err(ResolveError::Unknown(
            "response is not a JSON object".to_string(),
        ));
    };

    match body.get("Response").and_then(Value::as_str) {
        Some(flag) if flag.eq_ignore_ascii_case("true") => Ok(()),
        Some(flag) if flag.eq_ignore_ascii_case("false") => {
            match body.get("Error").and_then(Value::as_str) {
                Some(message) if !message.to_lowercase().contains("not found") => {
                    Err(ResolveError::Unknown(message.to_string()))
                }
                _ => Err(ResolveError::NotFound(title.to_string())),
            }
        }
        _ => Err(ResolveError::Unknown(
            "response has no Response indicator".to_string(),
        )),
    }
}
