//! Content-based recommendations from a precomputed similarity matrix
//!
//! The catalog is loaded once from a JSON file holding the movie titles and a
//! square similarity matrix indexed the same way. Neighbors are then enriched
//! with OMDb metadata through the fetcher.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::cache::EnrichmentCache;
use crate::metadata::{FailureKind, MetadataApi, MetadataFetcher, MetadataRecord};
use crate::poster;

/// Number of recommendations shown by default
pub const DEFAULT_RECOMMENDATIONS: usize = 5;

/// Errors that can occur when loading or querying the catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read
    #[error("Failed to read catalog {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The catalog file is not valid JSON of the expected shape
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Matrix row count does not match the number of titles
    #[error("Similarity matrix has {rows} rows but the catalog lists {titles} titles")]
    RowCount { rows: usize, titles: usize },

    /// A matrix row is not as long as the title list
    #[error("Similarity row {row} has {len} scores, expected {expected}")]
    RowLength {
        row: usize,
        len: usize,
        expected: usize,
    },

    /// A score is NaN or infinite
    #[error("Similarity score at ({row}, {col}) is not a finite number")]
    NonFinite { row: usize, col: usize },

    /// The requested title is not in the catalog
    #[error("Movie not in catalog: '{0}'")]
    UnknownTitle(String),
}

/// On-disk catalog shape
#[derive(Debug, Deserialize)]
struct CatalogFile {
    titles: Vec<String>,
    similarity: Vec<Vec<f64>>,
}

/// Movie titles with their pairwise similarity scores
#[derive(Debug, Clone)]
pub struct Catalog {
    titles: Vec<String>,
    similarity: Vec<Vec<f64>>,
}

/// A similar movie found in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    /// Position in the catalog
    pub index: usize,
    pub title: String,
    /// Similarity to the queried movie, clamped to `[0, 1]`
    pub score: f64,
}

impl Catalog {
    /// Builds a catalog, checking that the matrix is square and finite
    pub fn new(titles: Vec<String>, similarity: Vec<Vec<f64>>) -> Result<Self, CatalogError> {
        if similarity.len() != titles.len() {
            return Err(CatalogError::RowCount {
                rows: similarity.len(),
                titles: titles.len(),
            });
        }
        for (row, scores) in similarity.iter().enumerate() {
            if scores.len() != titles.len() {
                return Err(CatalogError::RowLength {
                    row,
                    len: scores.len(),
                    expected: titles.len(),
                });
            }
            if let Some(col) = scores.iter().position(|score| !score.is_finite()) {
                return Err(CatalogError::NonFinite { row, col });
            }
        }
        Ok(Self { titles, similarity })
    }

    /// Parses a catalog from `{"titles": [...], "similarity": [[...], ...]}`
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(content)?;
        Self::new(file.titles, file.similarity)
    }

    /// Loads a catalog file
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json(&content)?;
        info!(path = %path.display(), movies = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Position of the first movie with exactly this title
    pub fn index_of(&self, title: &str) -> Option<usize> {
        self.titles.iter().position(|candidate| candidate == title)
    }

    /// Returns the `count` movies most similar to `title`
    ///
    /// Sorted by descending score, excluding the movie itself. Equal scores keep
    /// catalog order.
    pub fn similar(&self, title: &str, count: usize) -> Result<Vec<Neighbor>, CatalogError> {
        let index = self
            .index_of(title)
            .ok_or_else(|| CatalogError::UnknownTitle(title.to_string()))?;

        let mut candidates: Vec<(usize, f64)> = self.similarity[index]
            .iter()
            .copied()
            .enumerate()
            .filter(|(candidate, _)| *candidate != index)
            .collect();
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(candidates
            .into_iter()
            .take(count)
            .map(|(candidate, score)| Neighbor {
                index: candidate,
                title: self.titles[candidate].clone(),
                score: score.clamp(0.0, 1.0),
            })
            .collect())
    }
}

/// A recommended movie, with enrichment when it resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub score: f64,
    /// Poster URL or failure placeholder; `None` when not enriched
    pub poster: Option<String>,
    pub details: Option<MetadataRecord>,
    /// Why enrichment failed, if it did
    pub failure: Option<FailureKind>,
}

impl Recommendation {
    /// A recommendation without any metadata lookup
    pub fn unenriched(neighbor: Neighbor) -> Self {
        Self {
            title: neighbor.title,
            score: neighbor.score,
            poster: None,
            details: None,
            failure: None,
        }
    }
}

/// Resolves metadata for each neighbor, one lookup at a time
///
/// Lookups are title-only; the catalog carries no release years.
pub async fn enrich<A: MetadataApi>(
    fetcher: &mut MetadataFetcher<A>,
    cache: &mut EnrichmentCache,
    neighbors: Vec<Neighbor>,
) -> Vec<Recommendation> {
    let total = neighbors.len();
    let mut recommendations = Vec::with_capacity(total);

    for (position, neighbor) in neighbors.into_iter().enumerate() {
        info!(current = position + 1, total, title = %neighbor.title, "Loading recommendation");

        let outcome = fetcher.resolve(cache, &neighbor.title, None).await;
        let poster = poster::poster_for(&outcome);
        let (details, failure) = match outcome {
            Ok(record) => (Some(record), None),
            Err(err) => (None, Some(err.kind())),
        };

        recommendations.push(Recommendation {
            title: neighbor.title,
            score: neighbor.score,
            poster: Some(poster),
            details,
            failure,
        });
    }

    recommendations
}
