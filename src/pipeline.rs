//! End-to-end RAG orchestration: retrieve, build the prompt, generate.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::core::errors::PipelineError;
use crate::core::retry::{with_retry, RetryPolicy};
use crate::llm::{ChatRequest, LlmProvider};
use crate::prompt::{build_prompt, FALLBACK_ANSWER};
use crate::retrieval::HybridRetriever;

#[derive(Debug, Clone, Serialize)]
pub struct RagMetrics {
    pub retrieval_time_ms: u64,
    pub generation_time_ms: u64,
    pub total_time_ms: u64,
    pub retrieved_docs_count: usize,
    pub total_tokens: u32,
    pub model_used: String,
    pub collection: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RagResult {
    pub answer: String,
    pub metrics: RagMetrics,
}

/// Stateless per-call pipeline. All collaborators are injected handles so
/// tests can run it against in-process doubles.
pub struct RagPipeline {
    retriever: HybridRetriever,
    llm: Arc<dyn LlmProvider>,
    model_id: String,
    collection: String,
    top_k: usize,
    retry: RetryPolicy,
}

impl RagPipeline {
    pub fn new(
        retriever: HybridRetriever,
        llm: Arc<dyn LlmProvider>,
        model_id: String,
        collection: String,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            llm,
            model_id,
            collection,
            top_k,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Answer one query. Transient retrieval/generation failures are
    /// retried within the bounded policy; fatal failures propagate typed.
    /// An empty retrieval outcome short-circuits to the fallback answer
    /// without calling the LLM, since the grounding contract already
    /// defines that behavior for the no-context case.
    pub async fn answer(&self, query: &str) -> Result<RagResult, PipelineError> {
        let started = Instant::now();

        let outcome = with_retry(self.retry, "retrieval", || {
            self.retriever.search(query, self.top_k)
        })
        .await?;

        if outcome.is_empty() {
            tracing::info!("no documents retrieved, returning fallback answer");
            let total_time_ms = started.elapsed().as_millis() as u64;
            return Ok(RagResult {
                answer: FALLBACK_ANSWER.to_string(),
                metrics: RagMetrics {
                    retrieval_time_ms: outcome.retrieval_time_ms,
                    generation_time_ms: 0,
                    total_time_ms,
                    retrieved_docs_count: 0,
                    total_tokens: 0,
                    model_used: self.model_id.clone(),
                    collection: self.collection.clone(),
                },
            });
        }

        let prompt = build_prompt(query, &outcome.results);

        let generation_started = Instant::now();
        let completion = with_retry(self.retry, "generation", || {
            self.llm
                .chat(ChatRequest::new(prompt.clone()), &self.model_id)
        })
        .await?;
        let generation_time_ms = generation_started.elapsed().as_millis() as u64;

        let total_time_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "answered in {}ms (retrieval {}ms, generation {}ms, {} tokens)",
            total_time_ms,
            outcome.retrieval_time_ms,
            generation_time_ms,
            completion.total_tokens
        );

        Ok(RagResult {
            answer: completion.content,
            metrics: RagMetrics {
                retrieval_time_ms: outcome.retrieval_time_ms,
                generation_time_ms,
                total_time_ms,
                retrieved_docs_count: outcome.retrieved_count,
                total_tokens: completion.total_tokens,
                model_used: completion.model,
                collection: self.collection.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::core::errors::PipelineError;
    use crate::dataset::DocMetadata;
    use crate::llm::Completion;
    use crate::vector::{ScoredResult, SearchStore};

    fn hit(id: &str, context: &str) -> ScoredResult {
        ScoredResult {
            id: id.to_string(),
            score: 0.9,
            metadata: DocMetadata {
                title: "Title".to_string(),
                context: context.to_string(),
                question: "q".to_string(),
                answer: "a".to_string(),
                has_answer: true,
            },
        }
    }

    struct FixedStore(Vec<ScoredResult>);

    #[async_trait]
    impl SearchStore for FixedStore {
        async fn dense_search(
            &self,
            _query: &str,
            limit: usize,
        ) -> Result<Vec<ScoredResult>, PipelineError> {
            Ok(self.0.iter().take(limit).cloned().collect())
        }

        async fn sparse_search(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<ScoredResult>, PipelineError> {
            Ok(Vec::new())
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    struct CountingLlm {
        calls: AtomicU32,
        fail_times: u32,
    }

    impl CountingLlm {
        fn answering() -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_times: 0,
            }
        }

        fn flaky(fail_times: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                fail_times,
            }
        }
    }

    #[async_trait]
    impl LlmProvider for CountingLlm {
        fn name(&self) -> &str {
            "mock"
        }

        async fn health_check(&self) -> bool {
            true
        }

        async fn chat(
            &self,
            _request: ChatRequest,
            model_id: &str,
        ) -> Result<Completion, PipelineError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.fail_times {
                return Err(PipelineError::generation("rate limited", true));
            }
            Ok(Completion {
                content: "Paris".to_string(),
                model: model_id.to_string(),
                prompt_tokens: 40,
                completion_tokens: 2,
                total_tokens: 42,
            })
        }

        async fn embed(
            &self,
            _inputs: &[String],
            _model_id: &str,
        ) -> Result<Vec<Vec<f32>>, PipelineError> {
            Ok(Vec::new())
        }
    }

    fn pipeline(store: FixedStore, llm: Arc<CountingLlm>) -> RagPipeline {
        let retriever =
            HybridRetriever::new(Arc::new(store), Duration::from_secs(5));
        RagPipeline::new(
            retriever,
            llm,
            "test-model".to_string(),
            "squad_v2".to_string(),
            2,
        )
        .with_retry_policy(RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        })
    }

    #[tokio::test]
    async fn answer_carries_metrics_and_answer_text() {
        let llm = Arc::new(CountingLlm::answering());
        let result = pipeline(FixedStore(vec![hit("a", "Paris is the capital")]), llm)
            .answer("What is the capital of France?")
            .await
            .unwrap();

        assert_eq!(result.answer, "Paris");
        assert_eq!(result.metrics.retrieved_docs_count, 1);
        assert_eq!(result.metrics.total_tokens, 42);
        assert_eq!(result.metrics.model_used, "test-model");
        assert_eq!(result.metrics.collection, "squad_v2");
    }

    #[tokio::test]
    async fn total_time_covers_both_phases() {
        let llm = Arc::new(CountingLlm::answering());
        let result = pipeline(FixedStore(vec![hit("a", "ctx")]), llm)
            .answer("q")
            .await
            .unwrap();

        let m = &result.metrics;
        assert!(m.total_time_ms >= m.retrieval_time_ms + m.generation_time_ms);
    }

    #[tokio::test]
    async fn retrieved_count_is_bounded_by_top_k() {
        let llm = Arc::new(CountingLlm::answering());
        let store = FixedStore(vec![hit("a", "1"), hit("b", "2"), hit("c", "3"), hit("d", "4")]);
        let result = pipeline(store, llm).answer("q").await.unwrap();

        assert!(result.metrics.retrieved_docs_count <= 2);
    }

    #[tokio::test]
    async fn empty_retrieval_returns_fallback_without_calling_the_llm() {
        let llm = Arc::new(CountingLlm::answering());
        let result = pipeline(FixedStore(Vec::new()), llm.clone())
            .answer("What is the capital of France?")
            .await
            .unwrap();

        assert_eq!(result.answer, FALLBACK_ANSWER);
        assert_eq!(result.metrics.generation_time_ms, 0);
        assert_eq!(result.metrics.total_tokens, 0);
        assert_eq!(result.metrics.retrieved_docs_count, 0);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn transient_generation_failures_are_retried() {
        let llm = Arc::new(CountingLlm::flaky(2));
        let result = pipeline(FixedStore(vec![hit("a", "ctx")]), llm.clone())
            .answer("q")
            .await
            .unwrap();

        assert_eq!(result.answer, "Paris");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_the_generation_error() {
        let llm = Arc::new(CountingLlm::flaky(10));
        let err = pipeline(FixedStore(vec![hit("a", "ctx")]), llm)
            .answer("q")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Generation { .. }));
    }
}
