use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::config::{AppConfig, ConfigError};
use crate::llm::{GeminiProvider, LlmProvider};
use crate::pipeline::Orchestrator;
use crate::rag::{Retriever, SqliteVectorStore, VectorStore};
use crate::tools::{SearchClient, SerpApiClient};

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to initialize LLM provider: {0}")]
    Llm(#[source] anyhow::Error),

    #[error("Failed to open vector index: {0}")]
    Index(#[source] anyhow::Error),

    #[error("Failed to initialize search client: {0}")]
    Search(#[source] anyhow::Error),
}

/// Application state shared across routes.
///
/// Every external collaborator is an explicitly constructed, injected
/// handle; tests substitute stubs through the same trait objects.
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn VectorStore>,
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// Wire the providers, open the index, and build the orchestrator.
    ///
    /// An empty index is a warning, not a startup failure: queries proceed
    /// with no retrieved context.
    pub async fn initialize(config: AppConfig) -> Result<Arc<Self>, InitializationError> {
        let timeout = Duration::from_secs(config.http_timeout_secs);

        let llm: Arc<dyn LlmProvider> = Arc::new(
            GeminiProvider::new(
                config.google_api_key.clone(),
                config.gemini_model.clone(),
                config.embed_model.clone(),
                timeout,
            )
            .map_err(|e| InitializationError::Llm(e.into()))?,
        );

        let store: Arc<dyn VectorStore> = Arc::new(
            SqliteVectorStore::open(&config.index_dir)
                .await
                .map_err(|e| InitializationError::Index(e.into()))?,
        );

        match store.count().await {
            Ok(0) => tracing::warn!(
                "Vector index at {} is empty; queries will run without context",
                config.index_dir.display()
            ),
            Ok(n) => tracing::info!("Vector index loaded with {} chunks", n),
            Err(err) => tracing::warn!("Failed to count indexed chunks: {}", err),
        }

        let search: Arc<dyn SearchClient> = Arc::new(
            SerpApiClient::new(config.serpapi_api_key.clone(), timeout)
                .map_err(|e| InitializationError::Search(e.into()))?,
        );

        let retriever = Retriever::new(llm.clone(), store.clone());
        let orchestrator = Orchestrator::new(retriever, llm, search);

        Ok(Arc::new(AppState {
            config,
            store,
            orchestrator,
        }))
    }
}
