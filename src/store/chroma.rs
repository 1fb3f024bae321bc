use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;

use super::{check_dimensions, VectorIndex};
use crate::error::{Error, Result};
use crate::types::{EmbeddedChunk, RetrievedChunk};

/// ChromaDB adapter speaking the v1 HTTP API.
///
/// The collection id is resolved once and cached; the write path may create
/// the collection, the read path only looks it up and reports
/// `CollectionNotFound` when it was never created.
pub struct ChromaIndex {
    base_url: String,
    collection: String,
    dimensions: usize,
    client: Client,
    collection_id: RwLock<Option<String>>,
}

#[derive(Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    metadatas: Option<Vec<Vec<Option<ChunkMetadata>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<f32>>>,
}

#[derive(Deserialize, Default)]
struct ChunkMetadata {
    #[serde(default)]
    source_id: String,
    #[serde(default)]
    page_number: u32,
}

impl ChromaIndex {
    pub fn new(base_url: &str, collection: &str, dimensions: usize, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .expect("default TLS backend available");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
            dimensions,
            client,
            collection_id: RwLock::new(None),
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }

    fn unreachable(err: reqwest::Error) -> Error {
        Error::IndexWrite(format!("vector index unreachable: {err}"))
    }

    /// Looks up the collection id without creating the collection.
    async fn lookup_id(&self) -> Result<String> {
        if let Some(id) = self.collection_id.read().await.clone() {
            return Ok(id);
        }

        let response = self
            .client
            .get(self.api(&format!("/collections/{}", self.collection)))
            .send()
            .await
            .map_err(Self::unreachable)?;

        if !response.status().is_success() {
            return Err(Error::CollectionNotFound(self.collection.clone()));
        }

        let parsed: CollectionResponse = response
            .json()
            .await
            .map_err(|err| Error::IndexWrite(format!("malformed collection response: {err}")))?;
        let mut cached = self.collection_id.write().await;
        *cached = Some(parsed.id.clone());
        Ok(parsed.id)
    }
}

#[async_trait]
impl VectorIndex for ChromaIndex {
    async fn ensure_collection(&self) -> Result<()> {
        if self.collection_id.read().await.is_some() {
            return Ok(());
        }

        let response = self
            .client
            .post(self.api("/collections"))
            .json(&json!({
                "name": self.collection,
                "get_or_create": true,
                "metadata": { "hnsw:space": "cosine" },
            }))
            .send()
            .await
            .map_err(Self::unreachable)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::IndexWrite(format!(
                "collection create returned {status}: {body}"
            )));
        }

        let parsed: CollectionResponse = response
            .json()
            .await
            .map_err(|err| Error::IndexWrite(format!("malformed collection response: {err}")))?;
        let mut cached = self.collection_id.write().await;
        *cached = Some(parsed.id);
        Ok(())
    }

    async fn upsert(&self, chunks: &[EmbeddedChunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        check_dimensions(chunks, self.dimensions)?;

        self.ensure_collection().await?;
        let id = self.lookup_id().await?;

        let ids: Vec<&str> = chunks.iter().map(|c| c.chunk.chunk_id.as_str()).collect();
        let documents: Vec<&str> = chunks.iter().map(|c| c.chunk.text.as_str()).collect();
        let embeddings: Vec<&[f32]> = chunks.iter().map(|c| c.vector.as_slice()).collect();
        let metadatas: Vec<serde_json::Value> = chunks
            .iter()
            .map(|c| {
                json!({
                    "source_id": c.chunk.source_id,
                    "page_number": c.chunk.page_number,
                    "sequence": c.chunk.sequence,
                    "hash": c.chunk.hash,
                })
            })
            .collect();

        let response = self
            .client
            .post(self.api(&format!("/collections/{id}/upsert")))
            .json(&json!({
                "ids": ids,
                "embeddings": embeddings,
                "documents": documents,
                "metadatas": metadatas,
            }))
            .send()
            .await
            .map_err(Self::unreachable)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::IndexWrite(format!(
                "upsert returned {status}: {body}"
            )));
        }
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        let id = self.lookup_id().await?;

        let response = self
            .client
            .post(self.api(&format!("/collections/{id}/query")))
            .json(&json!({
                "query_embeddings": [vector],
                "n_results": k,
                "include": ["documents", "metadatas", "distances"],
            }))
            .send()
            .await
            .map_err(Self::unreachable)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::IndexWrite(format!(
                "query returned {status}: {body}"
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|err| Error::IndexWrite(format!("malformed query response: {err}")))?;

        let Some(ids) = parsed.ids.into_iter().next() else {
            return Ok(Vec::new());
        };
        let documents = parsed
            .documents
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();
        let metadatas = parsed
            .metadatas
            .and_then(|m| m.into_iter().next())
            .unwrap_or_default();
        let distances = parsed
            .distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();

        let mut results = Vec::with_capacity(ids.len());
        for (position, chunk_id) in ids.into_iter().enumerate() {
            let metadata = metadatas
                .get(position)
                .and_then(|m| m.as_ref())
                .map(|m| (m.source_id.clone(), m.page_number))
                .unwrap_or_default();
            results.push(RetrievedChunk {
                chunk_id,
                text: documents
                    .get(position)
                    .and_then(|d| d.clone())
                    .unwrap_or_default(),
                source_id: metadata.0,
                page_number: metadata.1,
                distance: distances.get(position).copied().unwrap_or(0.0),
            });
        }
        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let id = self.lookup_id().await?;
        let response = self
            .client
            .get(self.api(&format!("/collections/{id}/count")))
            .send()
            .await
            .map_err(Self::unreachable)?;

        if !response.status().is_success() {
            return Err(Error::IndexWrite(format!(
                "count returned {}",
                response.status()
            )));
        }
        response
            .json::<usize>()
            .await
            .map_err(|err| Error::IndexWrite(format!("malformed count response: {err}")))
    }
}
