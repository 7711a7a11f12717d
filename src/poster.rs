//! Poster URLs and failure placeholders
//!
//! Each failure mode maps to its own placeholder image so the cause is visible
//! without looking at logs.

use crate::metadata::{FailureKind, MetadataRecord, ResolveError};

pub const NO_POSTER_PLACEHOLDER: &str =
    "https://via.placeholder.com/300x450?text=No+Poster+Available";
pub const MOVIE_NOT_FOUND_PLACEHOLDER: &str =
    "https://via.placeholder.com/300x450?text=Movie+Not+Found";
pub const TIMEOUT_PLACEHOLDER: &str =
    "https://via.placeholder.com/300x450?text=Connection+Timeout";
pub const NETWORK_ERROR_PLACEHOLDER: &str =
    "https://via.placeholder.com/300x450?text=Error+Loading+Poster";
pub const UNKNOWN_ERROR_PLACEHOLDER: &str = "https://via.placeholder.com/300x450?text=Error";

/// Placeholder for a failed resolution
pub fn placeholder_for(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::NotFound => MOVIE_NOT_FOUND_PLACEHOLDER,
        FailureKind::Timeout => TIMEOUT_PLACEHOLDER,
        FailureKind::Network => NETWORK_ERROR_PLACEHOLDER,
        FailureKind::Unknown => UNKNOWN_ERROR_PLACEHOLDER,
    }
}

/// Poster URL for a resolution outcome, or the matching placeholder
pub fn poster_for(outcome: &Result<MetadataRecord, ResolveError>) -> String {
    match outcome {
        Ok(record) => record.poster().unwrap_or(NO_POSTER_PLACEHOLDER).to_string(),
        Err(err) => placeholder_for(err.kind()).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn test_placeholders_are_distinct() {
        let all: HashSet<&str> = [
            NO_POSTER_PLACEHOLDER,
            MOVIE_NOT_FOUND_PLACEHOLDER,
            TIMEOUT_PLACEHOLDER,
            NETWORK_ERROR_PLACEHOLDER,
            UNKNOWN_ERROR_PLACEHOLDER,
        ]
        .into_iter()
        .collect();
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_poster_for_found_record() {
        let raw = json!({"Response": "True", "Title": "Heat", "Poster": "http://x/heat.jpg"});
        let outcome = Ok(MetadataRecord::from_response(&raw, "Heat"));
        assert_eq!(poster_for(&outcome), "http://x/heat.jpg");
    }

    #[test]
    fn test_poster_for_record_without_poster() {
        let raw = json!({"Response": "True", "Title": "Heat", "Poster": "N/A"});
        let outcome = Ok(MetadataRecord::from_response(&raw, "Heat"));
        assert_eq!(poster_for(&outcome), NO_POSTER_PLACEHOLDER);
    }

    #[test]
    fn test_poster_for_each_failure() {
        let cases = [
            (ResolveError::NotFound("x".to_string()), MOVIE_NOT_FOUND_PLACEHOLDER),
            (ResolveError::Timeout, TIMEOUT_PLACEHOLDER),
            (ResolveError::Network("refused".to_string()), NETWORK_ERROR_PLACEHOLDER),
            (ResolveError::Unknown("boom".to_string()), UNKNOWN_ERROR_PLACEHOLDER),
        ];
        for (err, expected) in cases {
            assert_eq!(poster_for(&Err(err)), expected);
        }
    }
}
