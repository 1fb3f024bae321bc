//! End-to-end ingestion and retrieval against the in-process index, with a
//! deterministic embedding stand-in so results are stable across runs.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;

use doclens::embedder::Embedder;
use doclens::error::Error;
use doclens::ingest::{clean, Ingestor, Splitter};
use doclens::retriever::Retriever;
use doclens::store::{LocalIndex, VectorIndex};

struct HashEmbedder;

fn hash_vector(text: &str) -> Vec<f32> {
    let mut vector = [0.0f32; 8];
    for (position, byte) in text.bytes().enumerate() {
        vector[position % 8] += byte as f32;
    }
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    vector.iter().map(|x| x / norm.max(1e-6)).collect()
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> doclens::error::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| hash_vector(text)).collect())
    }

    async fn embed_query(&self, text: &str) -> doclens::error::Result<Vec<f32>> {
        Ok(hash_vector(text))
    }

    fn dimensions(&self) -> usize {
        8
    }

    async fn health_check(&self) -> doclens::error::Result<()> {
        Ok(())
    }
}

fn make_pipeline(index: Arc<LocalIndex>) -> (Ingestor, Retriever) {
    let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder);
    let ingestor = Ingestor::new(
        Arc::clone(&embedder),
        index.clone(),
        Splitter::new(80, 16).unwrap(),
    );
    let retriever = Retriever::new(embedder, index);
    (ingestor, retriever)
}

const DOCUMENT: &[u8] = b"The Rust borrow checker enforces aliasing rules at compile time. \
Ownership moves values between bindings unless the type is Copy. \
Lifetimes describe how long references remain valid. \
Traits define shared behavior that generic code can rely on.";

async fn all_chunk_ids(index: &LocalIndex) -> BTreeSet<String> {
    index
        .query(&hash_vector("probe"), usize::MAX)
        .await
        .unwrap()
        .into_iter()
        .map(|hit| hit.chunk_id)
        .collect()
}

#[tokio::test]
async fn ingest_then_retrieve_round_trip() {
    let index = Arc::new(LocalIndex::in_memory(8));
    let (ingestor, retriever) = make_pipeline(index.clone());

    let report = ingestor.ingest_bytes("rust-notes", DOCUMENT).await.unwrap();
    assert!(report.chunks_written >= 2, "document should span chunks");

    // Query with the exact text of an indexed chunk: its vector is identical,
    // so it must come back first with near-zero distance.
    let first_chunk = index
        .query(&hash_vector("probe"), 1)
        .await
        .unwrap()
        .pop()
        .unwrap();
    let hits = retriever.retrieve(&first_chunk.text, 1).await.unwrap();
    assert_eq!(hits[0].chunk_id, first_chunk.chunk_id);
    assert!(hits[0].distance < 0.01);
}

#[tokio::test]
async fn re_ingesting_the_same_document_is_idempotent() {
    let index = Arc::new(LocalIndex::in_memory(8));
    let (ingestor, _) = make_pipeline(index.clone());

    ingestor.ingest_bytes("rust-notes", DOCUMENT).await.unwrap();
    let ids_after_first = all_chunk_ids(&index).await;

    ingestor.ingest_bytes("rust-notes", DOCUMENT).await.unwrap();
    let ids_after_second = all_chunk_ids(&index).await;

    assert_eq!(ids_after_first, ids_after_second);
    assert_eq!(index.count().await.unwrap(), ids_after_first.len());
}

#[tokio::test]
async fn retrieval_distances_never_decrease() {
    let index = Arc::new(LocalIndex::in_memory(8));
    let (ingestor, retriever) = make_pipeline(index.clone());
    ingestor.ingest_bytes("rust-notes", DOCUMENT).await.unwrap();

    let hits = retriever.retrieve("how does ownership work", 10).await.unwrap();
    assert!(!hits.is_empty());
    for pair in hits.windows(2) {
        assert!(
            pair[0].distance <= pair[1].distance,
            "results out of order: {} then {}",
            pair[0].distance,
            pair[1].distance
        );
    }
}

#[tokio::test]
async fn retrieving_from_a_missing_collection_fails_loudly() {
    let index = Arc::new(LocalIndex::in_memory(8));
    let (_, retriever) = make_pipeline(index);

    let err = retriever.retrieve("anything", 5).await.unwrap_err();
    assert!(matches!(err, Error::CollectionNotFound(_)));
}

#[tokio::test]
async fn chunk_texts_cover_the_normalized_document() {
    let index = Arc::new(LocalIndex::in_memory(8));
    let (ingestor, _) = make_pipeline(index.clone());
    ingestor.ingest_bytes("rust-notes", DOCUMENT).await.unwrap();

    let normalized = clean(std::str::from_utf8(DOCUMENT).unwrap());
    let hits = index.query(&hash_vector("probe"), usize::MAX).await.unwrap();
    for hit in &hits {
        assert!(
            normalized.contains(&hit.text),
            "chunk text not found in normalized source: {:?}",
            hit.text
        );
    }
    // Every sentence of the source survives somewhere in the chunks.
    for sentence in ["borrow checker", "Ownership moves", "Lifetimes", "Traits"] {
        assert!(
            hits.iter().any(|hit| hit.text.contains(sentence)),
            "content dropped during chunking: {sentence}"
        );
    }
}
