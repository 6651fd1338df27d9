//! SQLite-backed vector index, opened read-only.
//!
//! The index is produced by an offline embedding job; this process never
//! builds or mutates it. Chunk text and metadata live in SQLite rows with
//! serialized embeddings, searched by brute-force cosine similarity.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};

use super::store::{ChunkSearchResult, StoredChunk, VectorStore};
use crate::core::errors::PipelineError;

pub const INDEX_FILE: &str = "index.db";

#[derive(Debug)]
pub struct SqliteVectorStore {
    pool: SqlitePool,
    #[allow(dead_code)]
    db_path: PathBuf,
}

impl SqliteVectorStore {
    /// Open the pre-built index inside `index_dir`.
    ///
    /// Fails when the index file does not exist; an index with zero rows is
    /// the caller's problem to warn about, not an open error.
    pub async fn open(index_dir: &Path) -> Result<Self, PipelineError> {
        let db_path = index_dir.join(INDEX_FILE);
        if !db_path.exists() {
            return Err(PipelineError::Provider(format!(
                "vector index not found at {}",
                db_path.display()
            )));
        }
        Self::with_path(db_path).await
    }

    /// Open a specific index file (for testing).
    pub async fn with_path(db_path: PathBuf) -> Result<Self, PipelineError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .read_only(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(PipelineError::provider)?;

        Ok(Self { pool, db_path })
    }

    /// Deserialize embedding from bytes (little-endian f32).
    fn deserialize_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    /// Compute cosine similarity between two vectors.
    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() || a.is_empty() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
        let denom = norm_a * norm_b;

        if denom <= f32::EPSILON {
            0.0
        } else {
            dot / denom
        }
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    async fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkSearchResult>, PipelineError> {
        if limit == 0 || query_embedding.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT chunk_id, content, source, metadata, embedding
             FROM chunks WHERE embedding IS NOT NULL",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(PipelineError::provider)?;

        let mut scored = Vec::with_capacity(rows.len());
        for row in rows {
            let bytes: Vec<u8> = row.get("embedding");
            let embedding = Self::deserialize_embedding(&bytes);
            let score = Self::cosine_similarity(query_embedding, &embedding);

            let metadata: Option<String> = row.get("metadata");
            let metadata = metadata.and_then(|raw| serde_json::from_str(&raw).ok());

            scored.push(ChunkSearchResult {
                chunk: StoredChunk {
                    chunk_id: row.get("chunk_id"),
                    content: row.get("content"),
                    source: row.get("source"),
                    metadata,
                },
                score,
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);

        Ok(scored)
    }

    async fn count(&self) -> Result<usize, PipelineError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM chunks")
            .fetch_one(&self.pool)
            .await
            .map_err(PipelineError::provider)?;
        let n: i64 = row.get("n");
        Ok(n as usize)
    }
}
