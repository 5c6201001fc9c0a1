use crate::error::{Result, TallyError};
use crate::resolver::catalog::ReportDescriptor;
use crate::resolver::embedding::{cosine_similarity, Embedder};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedReport {
    pub descriptor: ReportDescriptor,
    pub vector: Vec<f32>,
}

/// Descriptors with precomputed description embeddings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportIndex {
    pub model_id: String,
    pub entries: Vec<IndexedReport>,
}

impl ReportIndex {
    /// Embeds every description. The result replaces any previous index wholesale.
    pub async fn build<E: Embedder + ?Sized>(
        embedder: &E,
        descriptors: &[ReportDescriptor],
    ) -> Result<Self> {
        let mut entries = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let vector = embedder.embed(&descriptor.description).await?;
            entries.push(IndexedReport {
                descriptor: descriptor.clone(),
                vector,
            });
        }
        info!(
            "Built report index with {} descriptors ({})",
            entries.len(),
            embedder.model_id()
        );
        Ok(Self {
            model_id: embedder.model_id(),
            entries,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Closest descriptor by cosine similarity; the first entry wins ties.
    pub fn nearest(&self, query: &[f32]) -> Option<(&ReportDescriptor, f32)> {
        let mut best: Option<(&ReportDescriptor, f32)> = None;
        for entry in &self.entries {
            let score = cosine_similarity(query, &entry.vector);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((&entry.descriptor, score)),
            }
        }
        best
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Loads a saved index, refusing one built by a different embedder.
    pub fn load(path: &Path, expected_model_id: &str) -> Result<Self> {
        let index: Self = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        if index.model_id != expected_model_id {
            return Err(TallyError::Config(format!(
                "index at {} was built with '{}', expected '{}'",
                path.display(),
                index.model_id,
                expected_model_id
            )));
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::catalog::default_catalog;
    use crate::resolver::embedding::HashingEmbedder;

    #[tokio::test]
    async fn test_build_and_nearest() {
        let embedder = HashingEmbedder::default();
        let index = ReportIndex::build(&embedder, &default_catalog()).await.unwrap();
        assert_eq!(index.len(), 8);

        let query = embedder.embed_sync("show me the closing stock value");
        let (best, score) = index.nearest(&query).unwrap();
        assert_eq!(best.canonical_name, "Stock Summary");
        assert!(score > 0.5);
    }

    #[test]
    fn test_empty_index_has_no_nearest() {
        assert!(ReportIndex::default().nearest(&[1.0, 0.0]).is_none());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let embedder = HashingEmbedder::new(64);
        let index = ReportIndex::build(&embedder, &default_catalog()).await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        index.save(&path).unwrap();
        let loaded = ReportIndex::load(&path, &embedder.model_id()).unwrap();
        assert_eq!(loaded.len(), index.len());
        assert_eq!(loaded.entries[3].vector, index.entries[3].vector);

        assert!(matches!(
            ReportIndex::load(&path, "other-model"),
            Err(TallyError::Config(_))
        ));
    }
}
