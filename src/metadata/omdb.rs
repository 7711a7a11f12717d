//! OMDb API client
//!
//! Issues title lookups against the OMDb API and returns the raw JSON body.
//! Response interpretation is left to the fetcher.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Base URL for the OMDb API
pub const OMDB_BASE_URL: &str = "http://www.omdbapi.com/";

/// Timeout for detail and poster lookups
pub const DETAIL_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for connectivity checks
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors raised below the API level, before a JSON body is available
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request did not complete within its timeout
    #[error("Request timed out")]
    Timeout,

    /// Connection, DNS or HTTP status failure
    #[error("Network error: {0}")]
    Network(String),

    /// The body was not valid JSON
    #[error("Malformed response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key
        let err = err.without_url();
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_decode() {
            TransportError::Decode(err.to_string())
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

/// A single title lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupQuery {
    pub title: String,
    /// Release year used to disambiguate remakes
    pub year: Option<u16>,
    /// Ask for the short plot summary
    pub short_plot: bool,
    pub timeout: Duration,
}

impl LookupQuery {
    /// Query parameters for the request, excluding the API key
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("t", self.title.clone()), ("type", "movie".to_string())];
        if let Some(year) = self.year {
            params.push(("y", year.to_string()));
        }
        if self.short_plot {
            params.push(("plot", "short".to_string()));
        }
        params
    }
}

/// Source of raw metadata responses
#[async_trait]
pub trait MetadataApi: Send + Sync {
    /// Performs one lookup and returns the decoded JSON body
    async fn lookup(&self, query: &LookupQuery) -> Result<Value, TransportError>;
}

/// Client for the OMDb API
#[derive(Clone)]
pub struct OmdbClient {
    http_client: Client,
    api_key: String,
    /// Base URL for the API (allows override for testing)
    base_url: String,
}

impl fmt::Debug for OmdbClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OmdbClient")
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl OmdbClient {
    /// Creates a client for the public OMDb endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: OMDB_BASE_URL.to_string(),
        }
    }

    /// Overrides the endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MetadataApi for OmdbClient {
    async fn lookup(&self, query: &LookupQuery) -> Result<Value, TransportError> {
        info!(title = %query.title, year = ?query.year, "Querying OMDb");

        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str())])
            .query(&query.params())
            .timeout(query.timeout)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Value>().await?);
        }

        // OMDb answers key problems with 401 and its usual JSON body
        match response.json::<Value>().await {
            Ok(body) if body.get("Response").is_some() => Ok(body),
            _ => Err(TransportError::Network(format!("HTTP status {}", status))),
        }
    }
}

/// Shows the first four characters of a key followed by `****`
pub fn mask_api_key(key: &str) -> String {
    let prefix: String = key.chars().take(4).collect();
    format!("{}****", prefix)
}
