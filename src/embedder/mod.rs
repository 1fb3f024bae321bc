mod ollama;

pub use ollama::OllamaEmbedder;

use async_trait::async_trait;

use crate::error::Result;

/// Client for the embedding model collaborator.
///
/// One instance is bound to one model for its whole lifetime, so query
/// vectors and chunk vectors always live in the same space.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds a batch of texts, order-preserving, one vector per input.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    /// Embeds a single query text.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;
    fn dimensions(&self) -> usize;
    async fn health_check(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    pub endpoint: String,
    pub model: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            timeout_secs: 30,
        }
    }
}

pub fn create_embedder(config: &EmbedderConfig) -> Box<dyn Embedder> {
    Box::new(OllamaEmbedder::new(
        &config.endpoint,
        &config.model,
        config.dimensions,
        config.timeout_secs,
    ))
}
