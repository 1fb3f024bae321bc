use std::sync::Arc;

use crate::embedder::Embedder;
use crate::error::Result;
use crate::store::VectorIndex;
use crate::types::RetrievedChunk;

/// Default neighbor count when the caller does not specify `k`.
pub const DEFAULT_K: usize = 5;

/// Read-path orchestrator: embeds a query and returns the index's nearest
/// neighbors in the index's own order. Collaborator errors pass through
/// unchanged.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        let query_vector = self.embedder.embed_query(query).await?;
        self.index.query(&query_vector, k).await
    }
}
