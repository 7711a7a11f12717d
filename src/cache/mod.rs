//! Cache module for storing metadata API responses
//!
//! This module provides the enrichment cache that sits between recommendation
//! and the metadata API. Entries expire lazily after a configurable TTL and can
//! optionally be persisted to a single JSON file.

mod manager;

pub use manager::{CacheError, CacheStats, EnrichmentCache, DEFAULT_TTL_DAYS};
