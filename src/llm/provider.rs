use async_trait::async_trait;

use crate::core::errors::PipelineError;

/// Handle to a hosted LLM service.
///
/// Both pipeline stages compose a single flat prompt, so the generation
/// contract is prompt-in, text-out. The same provider also supplies query
/// embeddings for similarity search.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// return the provider name (e.g. "gemini")
    fn name(&self) -> &str;

    /// text completion for a composed prompt
    async fn generate(&self, prompt: &str) -> Result<String, PipelineError>;

    /// generate embeddings
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, PipelineError>;
}
