//! Enrichment cache for upstream metadata responses
//!
//! Provides an `EnrichmentCache` that maps lookup keys to raw API responses with
//! an insertion timestamp. Freshness is checked lazily on read; stale entries stay
//! in the store until the cache is cleared or the key is overwritten.

use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Default time-to-live for cache entries in days
pub const DEFAULT_TTL_DAYS: i64 = 7;

/// File name of the persisted cache inside the cache directory
const CACHE_FILE_NAME: &str = "omdb_cache.json";

/// Errors that can occur when persisting the cache
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the cache file failed
    #[error("Cache file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The cache contents could not be serialized
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A single stored entry, in the on-disk shape `{data, timestamp}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    /// The raw upstream response
    data: Value,
    /// ISO-8601 insertion time
    timestamp: String,
}

impl StoredEntry {
    /// Returns true if the entry is younger than `ttl` at `now`.
    ///
    /// A timestamp that cannot be parsed is never fresh.
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match parse_timestamp(&self.timestamp) {
            Some(stored_at) => now - stored_at < ttl,
            None => false,
        }
    }
}

/// Counts reported by [`EnrichmentCache::stats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Entries physically stored
    pub entries: usize,
    /// Entries that would be returned by `get`
    pub fresh: usize,
    /// Entries past their TTL or with an unreadable timestamp
    pub stale: usize,
}

/// Key-value store of raw metadata responses with time-based expiry
///
/// The cache holds at most one entry per key. When opened with a path, every
/// `set` rewrites the whole store to disk through a temporary file and a rename,
/// so an interrupted write never leaves a truncated cache behind.
#[derive(Debug, Clone)]
pub struct EnrichmentCache {
    entries: BTreeMap<String, StoredEntry>,
    ttl: Duration,
    /// Backing file, if the cache is persisted
    path: Option<PathBuf>,
}

impl EnrichmentCache {
    /// Creates an empty cache that lives only in memory
    pub fn in_memory(ttl: Duration) -> Self {
        Self {
            entries: BTreeMap::new(),
            ttl,
            path: None,
        }
    }

    /// Opens a cache persisted at `path`
    ///
    /// A missing file yields an empty cache. A file that cannot be read or parsed
    /// is also treated as empty; it is replaced on the next successful `set`.
    pub fn open(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        debug!(path = %path.display(), entries = entries.len(), "Opened enrichment cache");
        Self {
            entries,
            ttl,
            path: Some(path),
        }
    }

    /// Returns the XDG-compliant location of the persisted cache
    ///
    /// Uses `~/.cache/movierec/omdb_cache.json` on Linux. Returns `None` if the
    /// cache directory cannot be determined (e.g., no home directory).
    pub fn default_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "movierec")?;
        Some(project_dirs.cache_dir().join(CACHE_FILE_NAME))
    }

    /// Time-to-live applied on reads
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Backing file, if persisted
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Returns the stored response for `key` if it is still fresh
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.get_at(key, Utc::now())
    }

    /// Same as [`get`](Self::get), evaluated at an explicit instant
    pub fn get_at(&self, key: &str, now: DateTime<Utc>) -> Option<&Value> {
        let entry = self.entries.get(key)?;
        if entry.is_fresh(now, self.ttl) {
            Some(&entry.data)
        } else {
            debug!(key, "Cache entry is stale");
            None
        }
    }

    /// Inserts or overwrites the entry for `key`, stamped with the current time
    pub fn set(&mut self, key: &str, data: Value) -> Result<(), CacheError> {
        self.set_at(key, data, Utc::now())
    }

    /// Same as [`set`](Self::set), with an explicit insertion time
    ///
    /// The in-memory entry is updated even when persisting fails.
    pub fn set_at(
        &mut self,
        key: &str,
        data: Value,
        stored_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        self.entries.insert(
            key.to_string(),
            StoredEntry {
                data,
                timestamp: stored_at.to_rfc3339(),
            },
        );
        self.persist()
    }

    /// Removes every entry and deletes the backing file
    pub fn clear(&mut self) -> Result<(), CacheError> {
        self.entries.clear();
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Number of stored entries, stale ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored, fresh and stale entry counts at the current time
    pub fn stats(&self) -> CacheStats {
        let now = Utc::now();
        let fresh = self
            .entries
            .values()
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .count();
        CacheStats {
            entries: self.entries.len(),
            fresh,
            stale: self.entries.len() - fresh,
        }
    }

    /// Writes the full store to disk, if persisted
    fn persist(&self) -> Result<(), CacheError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&self.entries)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

/// Reads the persisted store, dropping anything that is not a `{data, timestamp}` entry
fn load_entries(path: &Path) -> BTreeMap<String, StoredEntry> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cache file unreadable, starting empty");
            return BTreeMap::new();
        }
    };

    let raw: BTreeMap<String, Value> = match serde_json::from_str(&content) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cache file corrupt, starting empty");
            return BTreeMap::new();
        }
    };

    raw.into_iter()
        .filter_map(|(key, value)| match serde_json::from_value::<StoredEntry>(value) {
            Ok(entry) => Some((key, entry)),
            Err(e) => {
                debug!(key, error = %e, "Dropping malformed cache entry");
                None
            }
        })
        .collect()
}

/// Parses an ISO-8601 timestamp
///
/// Accepts RFC 3339 with an offset, or a naive `YYYY-MM-DDTHH:MM:SS[.ffffff]`
/// interpreted as local time.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_cache() -> (EnrichmentCache, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cache = EnrichmentCache::open(
            temp_dir.path().join(CACHE_FILE_NAME),
            Duration::days(DEFAULT_TTL_DAYS),
        );
        (cache, temp_dir)
    }

    fn sample_response(title: &str) -> Value {
        json!({ "Response": "True", "Title": title, "imdbRating": "8.8" })
    }

    #[test]
    fn test_get_returns_none_for_missing_key() {
        let cache = EnrichmentCache::in_memory(Duration::days(7));
        assert!(cache.get("Inception").is_none());
    }

    #[test]
    fn test_read_after_write() {
        let mut cache = EnrichmentCache::in_memory(Duration::days(7));
        let data = sample_response("Inception");

        cache.set("Inception", data.clone()).unwrap();

        assert_eq!(cache.get("Inception"), Some(&data));
    }

    #[test]
    fn test_stale_entry_reads_as_absent_but_is_still_stored() {
        let mut cache = EnrichmentCache::in_memory(Duration::days(7));
        let stored_at = Utc::now() - Duration::days(8);

        cache
            .set_at("Alien", sample_response("Alien"), stored_at)
            .unwrap();

        assert!(cache.get("Alien").is_none());
        assert_eq!(cache.len(), 1, "Stale entry should remain until cleared");
    }

    #[test]
    fn test_entry_expires_exactly_at_ttl() {
        let mut cache = EnrichmentCache::in_memory(Duration::hours(1));
        let stored_at = Utc::now();
        cache
            .set_at("Heat", sample_response("Heat"), stored_at)
            .unwrap();

        let just_before = stored_at + Duration::hours(1) - Duration::seconds(1);
        let at_ttl = stored_at + Duration::hours(1);

        assert!(cache.get_at("Heat", just_before).is_some());
        assert!(cache.get_at("Heat", at_ttl).is_none());
    }

    #[test]
    fn test_overwrite_replaces_data_and_timestamp() {
        let mut cache = EnrichmentCache::in_memory(Duration::days(7));
        cache
            .set_at("Up", json!({"Title": "old"}), Utc::now() - Duration::days(30))
            .unwrap();
        cache.set("Up", json!({"Title": "new"})).unwrap();

        assert_eq!(cache.get("Up"), Some(&json!({"Title": "new"})));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_set_persists_to_disk_and_reloads() {
        let (mut cache, temp_dir) = create_test_cache();
        cache
            .set("Inception_2010", sample_response("Inception"))
            .unwrap();

        let path = temp_dir.path().join(CACHE_FILE_NAME);
        assert!(path.exists(), "Cache file should exist");
        assert!(
            !path.with_extension("json.tmp").exists(),
            "Temporary file should be renamed away"
        );

        let reopened = EnrichmentCache::open(&path, Duration::days(7));
        assert_eq!(
            reopened.get("Inception_2010"),
            Some(&sample_response("Inception"))
        );
    }

    #[test]
    fn test_persisted_format_uses_data_and_timestamp() {
        let (mut cache, temp_dir) = create_test_cache();
        cache.set("Heat", sample_response("Heat")).unwrap();

        let content = fs::read_to_string(temp_dir.path().join(CACHE_FILE_NAME)).unwrap();
        let parsed: Value = serde_json::from_str(&content).unwrap();

        assert_eq!(parsed["Heat"]["data"]["Title"], "Heat");
        let timestamp = parsed["Heat"]["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(timestamp).is_ok());
    }

    #[test]
    fn test_corrupt_file_opens_as_empty_cache() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CACHE_FILE_NAME);
        fs::write(&path, "{ not json").unwrap();

        let mut cache = EnrichmentCache::open(&path, Duration::days(7));
        assert!(cache.is_empty());

        // The next write replaces the corrupt file
        cache.set("Heat", sample_response("Heat")).unwrap();
        let reopened = EnrichmentCache::open(&path, Duration::days(7));
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_malformed_timestamp_is_a_miss() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CACHE_FILE_NAME);
        let content = json!({
            "Heat": { "data": sample_response("Heat"), "timestamp": "yesterday-ish" }
        });
        fs::write(&path, content.to_string()).unwrap();

        let cache = EnrichmentCache::open(&path, Duration::days(7));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("Heat").is_none());
        assert_eq!(cache.stats().stale, 1);
    }

    #[test]
    fn test_entries_without_data_are_dropped_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CACHE_FILE_NAME);
        let content = json!({
            "Heat": { "data": sample_response("Heat"), "timestamp": Utc::now().to_rfc3339() },
            "Broken": { "timestamp": Utc::now().to_rfc3339() },
            "Scalar": 42
        });
        fs::write(&path, content.to_string()).unwrap();

        let cache = EnrichmentCache::open(&path, Duration::days(7));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("Heat").is_some());
    }

    #[test]
    fn test_naive_local_timestamp_is_accepted() {
        let now = Local::now().naive_local();
        let raw = now.format("%Y-%m-%dT%H:%M:%S%.6f").to_string();

        let parsed = parse_timestamp(&raw).expect("Naive timestamp should parse");
        assert!((Utc::now() - parsed).num_seconds().abs() < 5);
    }

    #[test]
    fn test_clear_removes_entries_and_file() {
        let (mut cache, temp_dir) = create_test_cache();
        cache.set("Heat", sample_response("Heat")).unwrap();
        cache.set("Alien", sample_response("Alien")).unwrap();

        cache.clear().unwrap();

        assert!(cache.is_empty());
        assert!(!temp_dir.path().join(CACHE_FILE_NAME).exists());
        // Clearing twice is fine
        cache.clear().unwrap();
    }

    #[test]
    fn test_stats_counts_fresh_and_stale() {
        let mut cache = EnrichmentCache::in_memory(Duration::days(7));
        cache.set("Heat", sample_response("Heat")).unwrap();
        cache
            .set_at("Alien", sample_response("Alien"), Utc::now() - Duration::days(9))
            .unwrap();

        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 2,
                fresh: 1,
                stale: 1
            }
        );
    }

    #[test]
    fn test_failed_persist_still_updates_memory() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file where the cache directory should be
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let mut cache = EnrichmentCache::open(blocker.join(CACHE_FILE_NAME), Duration::days(7));

        let result = cache.set("Heat", sample_response("Heat"));

        assert!(result.is_err(), "Persisting under a file should fail");
        assert_eq!(cache.get("Heat"), Some(&sample_response("Heat")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_write_creates_directory_if_missing() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("nested").join("cache").join(CACHE_FILE_NAME);
        let mut cache = EnrichmentCache::open(&nested, Duration::days(7));

        cache.set("Heat", sample_response("Heat")).unwrap();

        assert!(nested.exists(), "Nested directory should be created");
    }

    #[test]
    fn test_default_path_is_xdg_compliant() {
        if let Some(path) = EnrichmentCache::default_path() {
            let path_str = path.to_string_lossy();
            assert!(path_str.contains("movierec"));
            assert!(path_str.ends_with(CACHE_FILE_NAME));
        }
        // Test passes if default_path() returns None (e.g., no home directory in CI)
    }
}
