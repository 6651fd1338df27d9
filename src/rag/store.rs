//! VectorStore trait: abstract interface for the pre-built chunk index.
//!
//! The index is built offline and opened read-only; the pipeline only ever
//! searches and counts. The primary implementation is `SqliteVectorStore`
//! in the `sqlite` module.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::PipelineError;

/// A stored chunk of previously indexed text with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Unique chunk identifier.
    pub chunk_id: String,
    /// The text content of the chunk.
    pub content: String,
    /// Source identifier (filename, statement period, etc.).
    pub source: String,
    /// Optional metadata (JSON).
    pub metadata: Option<serde_json::Value>,
}

/// Result of a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSearchResult {
    pub chunk: StoredChunk,
    /// Cosine similarity score (higher = better).
    pub score: f32,
}

/// Abstract trait for the vector index backend.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Search for chunks similar to the query embedding, best first.
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, PipelineError>;

    /// Total number of indexed chunks.
    async fn count(&self) -> Result<usize, PipelineError>;
}
