use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One non-empty page of raw text extracted from a source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPage {
    pub source_id: String,
    pub page_number: u32,
    pub text: String,
}

/// A bounded span of normalized page text, the unit of embedding and indexing.
///
/// `chunk_id` is derived from the source, page, and emission position, so
/// re-ingesting an identical document produces identical ids and upserts
/// overwrite instead of duplicating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub source_id: String,
    pub page_number: u32,
    pub text: String,
    pub sequence: usize,
    /// Short SHA-256 prefix of the chunk text, kept as index metadata so
    /// content drift between re-ingestions is visible in index dumps.
    pub hash: String,
}

impl Chunk {
    pub fn id_for(source_id: &str, page_number: u32, sequence: usize) -> String {
        format!("{source_id}_p{page_number}_c{sequence}")
    }
}

/// A chunk paired with its embedding vector, ready for the index.
#[derive(Debug, Clone)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

/// One nearest-neighbor hit returned by the index. Smaller distance means
/// more similar under the index's metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub chunk_id: String,
    pub text: String,
    pub source_id: String,
    pub page_number: u32,
    pub distance: f32,
}

/// One row of the append-only feedback log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub timestamp: DateTime<Utc>,
    pub query_id: String,
    pub rating: i32,
    pub feedback: String,
}

pub fn hash_content(content: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_ids_are_deterministic() {
        assert_eq!(Chunk::id_for("report.pdf", 3, 0), "report.pdf_p3_c0");
        assert_eq!(
            Chunk::id_for("report.pdf", 3, 0),
            Chunk::id_for("report.pdf", 3, 0)
        );
    }

    #[test]
    fn test_hash_content() {
        let h1 = hash_content("hello");
        let h2 = hash_content("hello");
        let h3 = hash_content("world");

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
        assert_eq!(h1.len(), 16);
    }
}
