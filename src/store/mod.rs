mod chroma;
mod local;

pub use chroma::ChromaIndex;
pub use local::LocalIndex;

use async_trait::async_trait;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::types::{EmbeddedChunk, RetrievedChunk};

/// Client for the vector store collaborator.
///
/// Writes are keyed by chunk id, so re-upserting a chunk overwrites its
/// text, vector, and metadata instead of duplicating it. Query results come
/// back ordered by ascending distance (most similar first).
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Creates the collection if it does not exist. Called on the write
    /// path; retrieval never creates collections.
    async fn ensure_collection(&self) -> Result<()>;
    async fn upsert(&self, chunks: &[EmbeddedChunk]) -> Result<()>;
    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>>;
    async fn count(&self) -> Result<usize>;
}

pub fn create_index(settings: &Settings) -> Result<Box<dyn VectorIndex>> {
    match settings.index_backend.as_str() {
        "chroma" => Ok(Box::new(ChromaIndex::new(
            &settings.chroma_url(),
            &settings.chroma_collection,
            settings.embed_dimensions,
            settings.http_timeout_secs,
        ))),
        "local" => Ok(Box::new(LocalIndex::persistent(
            settings.local_index_path.clone().into(),
            settings.embed_dimensions,
        ))),
        other => Err(Error::Configuration(format!(
            "unknown index backend '{other}'; use 'chroma' or 'local'"
        ))),
    }
}

/// Checks every vector in a batch against the index dimensionality before
/// anything is written.
pub(crate) fn check_dimensions(chunks: &[EmbeddedChunk], dimensions: usize) -> Result<()> {
    for embedded in chunks {
        if embedded.vector.len() != dimensions {
            return Err(Error::Configuration(format!(
                "chunk '{}' has a {}-dimensional vector but the index expects {}",
                embedded.chunk.chunk_id,
                embedded.vector.len(),
                dimensions
            )));
        }
    }
    Ok(())
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// Cosine distance used by the local backend: `1 - similarity`, floored at 0
/// so antipodal vectors read as maximally distant rather than negative.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    (1.0 - cosine_similarity(a, b)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_index_rejects_unknown_backends() {
        let mut settings = Settings::default();
        settings.index_backend = "pinecone".to_string();
        assert!(matches!(
            create_index(&settings),
            Err(Error::Configuration(_))
        ));

        settings.index_backend = "local".to_string();
        assert!(create_index(&settings).is_ok());
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 0.0).abs() < 0.001);
    }

    #[test]
    fn test_cosine_distance_orders_by_similarity() {
        let query = vec![1.0, 0.0, 0.0];
        let near = vec![0.9, 0.1, 0.0];
        let far = vec![0.0, 1.0, 0.0];
        assert!(cosine_distance(&query, &near) < cosine_distance(&query, &far));
        assert!(cosine_distance(&query, &far) >= 0.0);
    }

    #[test]
    fn test_cosine_similarity_empty() {
        let a: Vec<f32> = vec![];
        let b: Vec<f32> = vec![];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }
}
