//! Maps a free-text question to exactly one canonical Tally report name.

pub mod catalog;
pub mod embedding;
pub mod index;

pub use catalog::{canonical_report_name, default_catalog, ReportDescriptor, DEFAULT_REPORT};
pub use embedding::{cosine_similarity, tokenize, Embedder, HashingEmbedder};
pub use index::{IndexedReport, ReportIndex};

use crate::error::{Result, TallyError};
use log::{info, warn};
use std::path::Path;
use std::sync::RwLock;

pub struct ReportResolver<E: Embedder> {
    embedder: E,
    // Queries take the read lock; rebuild swaps the whole index under the write lock.
    index: RwLock<ReportIndex>,
}

impl<E: Embedder> ReportResolver<E> {
    /// A resolver with an empty index. Until [`rebuild`](Self::rebuild) runs every
    /// query resolves to [`DEFAULT_REPORT`].
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            index: RwLock::new(ReportIndex::default()),
        }
    }

    pub fn with_index(embedder: E, index: ReportIndex) -> Self {
        Self {
            embedder,
            index: RwLock::new(index),
        }
    }

    /// Builds a resolver over [`default_catalog`].
    pub async fn with_default_catalog(embedder: E) -> Result<Self> {
        let resolver = Self::new(embedder);
        resolver.rebuild(&default_catalog()).await?;
        Ok(resolver)
    }

    /// Drops the current index and recreates it from `descriptors`. Maintenance
    /// operation: not meant to run per query.
    pub async fn rebuild(&self, descriptors: &[ReportDescriptor]) -> Result<usize> {
        let fresh = ReportIndex::build(&self.embedder, descriptors).await?;
        let count = fresh.len();
        let mut guard = self
            .index
            .write()
            .map_err(|_| TallyError::Config("report index lock poisoned".to_string()))?;
        *guard = fresh;
        Ok(count)
    }

    pub fn index_len(&self) -> usize {
        self.index.read().map(|index| index.len()).unwrap_or(0)
    }

    /// Canonical name of the closest descriptor together with its similarity score,
    /// or `None` when the index is empty or the query cannot be embedded.
    pub async fn resolve_scored(&self, query: &str) -> Option<(String, f32)> {
        let vector = match self.embedder.embed(query).await {
            Ok(vector) => vector,
            Err(e) => {
                warn!("Embedding failed for query '{}': {}", query, e);
                return None;
            }
        };
        let index = self.index.read().ok()?;
        index
            .nearest(&vector)
            .map(|(descriptor, score)| (descriptor.canonical_name.clone(), score))
    }

    /// Always returns a report name: the nearest match, or [`DEFAULT_REPORT`].
    pub async fn resolve(&self, query: &str) -> String {
        match self.resolve_scored(query).await {
            Some((name, score)) => {
                info!("Report lookup: '{}' -> '{}' ({:.3})", query, name, score);
                name
            }
            None => {
                warn!(
                    "No report match for '{}', falling back to '{}'",
                    query, DEFAULT_REPORT
                );
                DEFAULT_REPORT.to_string()
            }
        }
    }

    pub fn save_index(&self, path: &Path) -> Result<()> {
        let index = self
            .index
            .read()
            .map_err(|_| TallyError::Config("report index lock poisoned".to_string()))?;
        index.save(path)
    }

    pub fn load_index(&self, path: &Path) -> Result<usize> {
        let loaded = ReportIndex::load(path, &self.embedder.model_id())?;
        let count = loaded.len();
        let mut guard = self
            .index
            .write()
            .map_err(|_| TallyError::Config("report index lock poisoned".to_string()))?;
        *guard = loaded;
        Ok(count)
    }
}
