//! Movie metadata models and the OMDb enrichment pipeline
//!
//! This module contains the normalized `MetadataRecord` shown to users, the
//! HTTP client for the OMDb API and the cache-first fetcher that ties them
//! together.

pub mod fetcher;
pub mod omdb;

pub use fetcher::{cache_key, ConnectionStatus, FailureKind, MetadataFetcher, ResolveError};
pub use omdb::{LookupQuery, MetadataApi, OmdbClient, TransportError};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker used for every field the upstream did not provide
pub const UNAVAILABLE: &str = "N/A";

/// Returns true if a normalized field carries a real value
pub fn is_available(value: &str) -> bool {
    !value.trim().is_empty() && value != UNAVAILABLE
}

/// Normalized movie metadata
///
/// Every field is always present. Missing upstream values are represented by
/// [`UNAVAILABLE`] so rendering never has to branch on absence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: String,
    pub year: String,
    /// IMDb rating out of 10
    pub rating: String,
    pub plot: String,
    pub genre: String,
    pub director: String,
    pub actors: String,
    pub poster_url: String,
    pub runtime: String,
    pub awards: String,
}

impl MetadataRecord {
    /// Maps a raw OMDb response onto the normalized record
    ///
    /// `queried_title` is used when the response has no `Title`.
    pub fn from_response(raw: &Value, queried_title: &str) -> Self {
        let title = text_field(raw, "Title");
        Self {
            title: if is_available(&title) {
                title
            } else {
                queried_title.to_string()
            },
            year: text_field(raw, "Year"),
            rating: text_field(raw, "imdbRating"),
            plot: text_field(raw, "Plot"),
            genre: text_field(raw, "Genre"),
            director: text_field(raw, "Director"),
            actors: text_field(raw, "Actors"),
            poster_url: text_field(raw, "Poster"),
            runtime: text_field(raw, "Runtime"),
            awards: text_field(raw, "Awards"),
        }
    }

    /// Poster URL, if the upstream has one
    pub fn poster(&self) -> Option<&str> {
        is_available(&self.poster_url).then_some(self.poster_url.as_str())
    }
}

/// Reads a string field, falling back to [`UNAVAILABLE`] when missing or blank
fn text_field(raw: &Value, name: &str) -> String {
    raw.get(name)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(UNAVAILABLE)
        .to_string()
}
