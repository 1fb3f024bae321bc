use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::error::{Error, Result};

/// Embedding client for Ollama's `/api/embed` endpoint.
pub struct OllamaEmbedder {
    endpoint: String,
    model: String,
    dimensions: usize,
    client: Client,
}

#[derive(Serialize)]
struct EmbedRequest {
    model: String,
    input: Vec<String>,
    truncate: bool,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct TagsResponse {
    models: Vec<TaggedModel>,
}

#[derive(Deserialize)]
struct TaggedModel {
    name: String,
}

impl OllamaEmbedder {
    pub fn new(endpoint: &str, model: &str, dimensions: usize, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .expect("default TLS backend available");

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            dimensions,
            client,
        }
    }

    fn unavailable(&self, err: reqwest::Error) -> Error {
        if err.is_connect() {
            Error::EmbeddingUnavailable(format!(
                "cannot connect to embedding service at {}",
                self.endpoint
            ))
        } else if err.is_timeout() {
            Error::EmbeddingUnavailable(format!(
                "embedding request timed out against {}",
                self.endpoint
            ))
        } else {
            Error::EmbeddingUnavailable(err.to_string())
        }
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = EmbedRequest {
            model: self.model.clone(),
            input: texts.to_vec(),
            truncate: true,
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|err| self.unavailable(err))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::EmbeddingUnavailable(format!(
                "embedding service returned {status}: {body}"
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|err| Error::EmbeddingUnavailable(format!("malformed response: {err}")))?;

        if parsed.embeddings.len() != texts.len() {
            return Err(Error::EmbeddingUnavailable(format!(
                "embedding service returned {} vectors for {} inputs",
                parsed.embeddings.len(),
                texts.len()
            )));
        }

        Ok(parsed.embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| Error::EmbeddingUnavailable("no embedding returned".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.endpoint))
            .send()
            .await
            .map_err(|err| self.unavailable(err))?;

        if !response.status().is_success() {
            return Err(Error::EmbeddingUnavailable(format!(
                "embedding service health check returned {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|err| Error::EmbeddingUnavailable(format!("malformed tags response: {err}")))?;
        let model_available = tags.models.iter().any(|m| {
            m.name.starts_with(&self.model) || m.name == format!("{}:latest", self.model)
        });

        if !model_available {
            return Err(Error::EmbeddingUnavailable(format!(
                "model '{}' is not available on the embedding service",
                self.model
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn embedder_for(server: &MockServer) -> OllamaEmbedder {
        OllamaEmbedder::new(&server.base_url(), "nomic-embed-text", 3, 5)
    }

    #[tokio::test]
    async fn embed_batch_preserves_input_order() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/embed")
                    .json_body_partial(r#"{"model":"nomic-embed-text"}"#);
                then.status(200).json_body(json!({
                    "embeddings": [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
                }));
            })
            .await;

        let embedder = embedder_for(&server);
        let vectors = embedder
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], vec![1.0, 0.0, 0.0]);
        assert_eq!(vectors[1], vec![0.0, 1.0, 0.0]);
    }

    #[tokio::test]
    async fn mismatched_vector_count_is_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/embed");
                then.status(200)
                    .json_body(json!({ "embeddings": [[1.0, 0.0, 0.0]] }));
            })
            .await;

        let embedder = embedder_for(&server);
        let err = embedder
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmbeddingUnavailable(_)));
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/api/embed");
                then.status(500).body("model exploded");
            })
            .await;

        let embedder = embedder_for(&server);
        let err = embedder.embed_query("hello").await.unwrap_err();
        assert!(matches!(err, Error::EmbeddingUnavailable(_)));
    }

    #[tokio::test]
    async fn empty_batch_skips_the_network() {
        // No mock registered: a request would fail the test with a connect error.
        let server = MockServer::start_async().await;
        let embedder = embedder_for(&server);
        let vectors = embedder.embed_batch(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }
}
