use async_trait::async_trait;

use super::types::{ChatRequest, Completion};
use crate::core::errors::PipelineError;

/// Seam for the hosted LLM service. The pipeline and the vector store only
/// hold `Arc<dyn LlmProvider>`, so tests can substitute in-process doubles.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g. "groq").
    fn name(&self) -> &str;

    /// Check whether the service is reachable with the configured key.
    async fn health_check(&self) -> bool;

    /// Chat completion (non-streaming).
    async fn chat(&self, request: ChatRequest, model_id: &str)
        -> Result<Completion, PipelineError>;

    /// Embed a batch of texts with the given embedding model.
    async fn embed(
        &self,
        inputs: &[String],
        model_id: &str,
    ) -> Result<Vec<Vec<f32>>, PipelineError>;
}
