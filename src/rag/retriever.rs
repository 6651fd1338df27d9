//! Query-time retrieval: embed the question, search the index.

use std::sync::Arc;

use crate::llm::LlmProvider;

use super::store::{ChunkSearchResult, VectorStore};

/// Number of chunks retrieved per query.
pub const DEFAULT_TOP_K: usize = 3;

/// Wraps the vector index behind a query-string interface.
///
/// Read-only; failures degrade to an empty result because downstream stages
/// must treat "no context available" as a normal condition, not an error.
#[derive(Clone)]
pub struct Retriever {
    llm: Arc<dyn LlmProvider>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(llm: Arc<dyn LlmProvider>, store: Arc<dyn VectorStore>) -> Self {
        Self { llm, store }
    }

    /// Return the `k` chunks closest to `query`, best first.
    ///
    /// No minimum-similarity cutoff is applied here; relevance gating, if
    /// any, happens in the responder.
    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<ChunkSearchResult> {
        let query = query.trim();
        if query.is_empty() || k == 0 {
            return Vec::new();
        }

        let embeddings = match self.llm.embed(&[query.to_string()]).await {
            Ok(vectors) => vectors,
            Err(err) => {
                tracing::warn!("Query embedding failed, proceeding without context: {}", err);
                return Vec::new();
            }
        };

        let Some(query_embedding) = embeddings.first() else {
            tracing::warn!("Embedding provider returned no vector for the query");
            return Vec::new();
        };

        match self.store.search(query_embedding, k).await {
            Ok(results) => results,
            Err(err) => {
                tracing::warn!("Similarity search failed, proceeding without context: {}", err);
                Vec::new()
            }
        }
    }
}
