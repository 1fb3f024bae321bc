//! Retrieval-augmented question answering over document collections.
//!
//! ```text
//! write path: bytes -> ingest::parser -> ingest::cleaner -> ingest::splitter
//!                 -> embedder -> store (upsert by chunk id)
//! read path:  query -> embedder -> store (k nearest) -> retriever
//!                 -> generator (grounding prompt -> LLM answer)
//! ```
//!
//! Both paths share one [`embedder::Embedder`] and one [`store::VectorIndex`],
//! so chunk vectors and query vectors always live in the same space.

pub mod cli;
pub mod config;
pub mod embedder;
pub mod error;
pub mod generator;
pub mod ingest;
pub mod retriever;
pub mod server;
pub mod store;
pub mod types;

pub use config::Settings;
pub use error::Error;
pub use types::{Chunk, EmbeddedChunk, FeedbackRecord, RawPage, RetrievedChunk};
