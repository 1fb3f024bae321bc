use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{check_dimensions, cosine_distance, VectorIndex};
use crate::error::{Error, Result};
use crate::types::{EmbeddedChunk, RetrievedChunk};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredChunk {
    chunk_id: String,
    source_id: String,
    page_number: u32,
    text: String,
    hash: String,
    vector: Vec<f32>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexData {
    chunks: HashMap<String, StoredChunk>,
}

/// In-process vector index with brute-force cosine search.
///
/// Backs development setups without a Chroma server and doubles as the test
/// substitute for the remote index. With a path configured the contents
/// survive restarts via an atomic JSON snapshot; without one the index is
/// purely in-memory. The collection "exists" once the first upsert has run,
/// mirroring the create-on-ingest behavior of the remote backend.
pub struct LocalIndex {
    path: Option<PathBuf>,
    dimensions: usize,
    data: RwLock<IndexData>,
    created: RwLock<bool>,
}

impl LocalIndex {
    pub fn in_memory(dimensions: usize) -> Self {
        Self {
            path: None,
            dimensions,
            data: RwLock::new(IndexData::default()),
            created: RwLock::new(false),
        }
    }

    pub fn persistent(path: PathBuf, dimensions: usize) -> Self {
        let mut data = IndexData::default();
        let mut created = false;
        if path.exists() {
            if let Ok(bytes) = fs::read(&path) {
                if let Ok(loaded) = serde_json::from_slice(&bytes) {
                    data = loaded;
                    created = true;
                }
            }
        }
        Self {
            path: Some(path),
            dimensions,
            data: RwLock::new(data),
            created: RwLock::new(created),
        }
    }

    fn persist(&self, data: &IndexData) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| Error::IndexWrite(err.to_string()))?;
        }
        let temp_path = path.with_extension("tmp");
        let json = serde_json::to_vec(data).map_err(|err| Error::IndexWrite(err.to_string()))?;
        fs::write(&temp_path, json).map_err(|err| Error::IndexWrite(err.to_string()))?;
        fs::rename(&temp_path, path).map_err(|err| Error::IndexWrite(err.to_string()))?;
        Ok(())
    }

    fn is_created(&self) -> Result<bool> {
        let created = self
            .created
            .read()
            .map_err(|err| Error::IndexWrite(err.to_string()))?;
        Ok(*created)
    }
}

#[async_trait]
impl VectorIndex for LocalIndex {
    async fn ensure_collection(&self) -> Result<()> {
        let mut created = self
            .created
            .write()
            .map_err(|err| Error::IndexWrite(err.to_string()))?;
        *created = true;
        Ok(())
    }

    async fn upsert(&self, chunks: &[EmbeddedChunk]) -> Result<()> {
        check_dimensions(chunks, self.dimensions)?;

        let mut data = self
            .data
            .write()
            .map_err(|err| Error::IndexWrite(err.to_string()))?;
        for embedded in chunks {
            let chunk = &embedded.chunk;
            data.chunks.insert(
                chunk.chunk_id.clone(),
                StoredChunk {
                    chunk_id: chunk.chunk_id.clone(),
                    source_id: chunk.source_id.clone(),
                    page_number: chunk.page_number,
                    text: chunk.text.clone(),
                    hash: chunk.hash.clone(),
                    vector: embedded.vector.clone(),
                },
            );
        }
        self.persist(&data)?;
        drop(data);

        let mut created = self
            .created
            .write()
            .map_err(|err| Error::IndexWrite(err.to_string()))?;
        *created = true;
        Ok(())
    }

    async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<RetrievedChunk>> {
        if !self.is_created()? {
            let name = self
                .path
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "in-memory".to_string());
            return Err(Error::CollectionNotFound(name));
        }

        let data = self
            .data
            .read()
            .map_err(|err| Error::IndexWrite(err.to_string()))?;
        let mut results: Vec<RetrievedChunk> = data
            .chunks
            .values()
            .map(|stored| RetrievedChunk {
                chunk_id: stored.chunk_id.clone(),
                text: stored.text.clone(),
                source_id: stored.source_id.clone(),
                page_number: stored.page_number,
                distance: cosine_distance(vector, &stored.vector),
            })
            .collect();

        results.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(k);
        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        let data = self
            .data
            .read()
            .map_err(|err| Error::IndexWrite(err.to_string()))?;
        Ok(data.chunks.len())
    }
}
