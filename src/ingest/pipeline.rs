use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use super::{cleaner, parser, splitter::Splitter};
use crate::embedder::Embedder;
use crate::error::{Error, Result};
use crate::store::VectorIndex;
use crate::types::{Chunk, EmbeddedChunk, RawPage};

const EMBED_BATCH_SIZE: usize = 32;

/// Write-path pipeline: extract pages, normalize, chunk, embed, upsert.
///
/// No step rolls back its predecessors; a failure anywhere leaves the
/// document "not indexed" and re-running it is safe because chunk ids are
/// deterministic and the index upserts by id.
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    splitter: Splitter,
}

#[derive(Debug, Clone)]
pub struct IngestionReport {
    pub source_id: String,
    pub pages: usize,
    pub chunks_written: usize,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        splitter: Splitter,
    ) -> Self {
        Self {
            embedder,
            index,
            splitter,
        }
    }

    pub async fn ingest_path(&self, path: &Path) -> Result<IngestionReport> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("document");
        let source_id = parser::source_id_from_name(name);
        let bytes = std::fs::read(path).map_err(|err| Error::Extraction {
            source_id: source_id.clone(),
            reason: format!("cannot read {}: {err}", path.display()),
        })?;
        self.ingest_bytes(&source_id, &bytes).await
    }

    pub async fn ingest_bytes(&self, source_id: &str, bytes: &[u8]) -> Result<IngestionReport> {
        let pages = parser::extract_pages(source_id, bytes)?;
        let cleaned: Vec<RawPage> = pages
            .into_iter()
            .map(|page| RawPage {
                text: cleaner::clean(&page.text),
                ..page
            })
            .filter(|page| !page.text.is_empty())
            .collect();

        let chunks = self.splitter.split(&cleaned);
        debug!(
            source_id,
            pages = cleaned.len(),
            chunks = chunks.len(),
            "document chunked"
        );

        if chunks.is_empty() {
            info!(source_id, "document produced no indexable text");
            return Ok(IngestionReport {
                source_id: source_id.to_string(),
                pages: cleaned.len(),
                chunks_written: 0,
            });
        }

        let embedded = self.embed_chunks(chunks).await?;

        self.index.ensure_collection().await?;
        self.index.upsert(&embedded).await?;

        let report = IngestionReport {
            source_id: source_id.to_string(),
            pages: cleaned.len(),
            chunks_written: embedded.len(),
        };
        info!(
            source_id,
            pages = report.pages,
            chunks = report.chunks_written,
            "document indexed"
        );
        Ok(report)
    }

    async fn embed_chunks(&self, chunks: Vec<Chunk>) -> Result<Vec<EmbeddedChunk>> {
        let mut embedded = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(EMBED_BATCH_SIZE) {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let vectors = self.embedder.embed_batch(&texts).await?;

            for (chunk, vector) in batch.iter().cloned().zip(vectors.into_iter()) {
                embedded.push(EmbeddedChunk { chunk, vector });
            }
        }

        Ok(embedded)
    }
}
