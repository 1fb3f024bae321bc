use thiserror::Error;

/// Errors surfaced by the ingestion and retrieval pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The source document could not be read or parsed. Fatal for that
    /// ingestion; nothing was chunked or indexed.
    #[error("failed to extract text from '{source_id}': {reason}")]
    Extraction { source_id: String, reason: String },

    /// The embedding service is unreachable or returned a malformed response.
    #[error("embedding service unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// The vector index rejected a write or is unreachable. Chunks from the
    /// failed batch are not considered indexed; re-running the document is safe.
    #[error("vector index write failed: {0}")]
    IndexWrite(String),

    /// The generation model is unreachable or returned a malformed response.
    #[error("generation service unavailable: {0}")]
    GenerationUnavailable(String),

    /// Retrieval was attempted against a collection that was never created.
    #[error("collection '{0}' does not exist")]
    CollectionNotFound(String),

    /// Invalid chunk geometry, dimensionality mismatch, or other setup problem.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, Error>;
