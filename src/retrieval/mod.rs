//! Hybrid retrieval: dense + sparse candidate lists fused client-side.

pub mod fusion;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::errors::PipelineError;
use crate::vector::{ScoredResult, SearchStore};

/// Over-fetch factor for each candidate list before fusion.
const PREFETCH_FACTOR: usize = 3;

#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    /// Fused results, most relevant first.
    pub results: Vec<ScoredResult>,
    pub retrieval_time_ms: u64,
    pub retrieved_count: usize,
}

impl RetrievalOutcome {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

pub struct HybridRetriever {
    store: Arc<dyn SearchStore>,
    call_timeout: Duration,
}

impl HybridRetriever {
    pub fn new(store: Arc<dyn SearchStore>, call_timeout: Duration) -> Self {
        Self {
            store,
            call_timeout,
        }
    }

    /// Issue both candidate queries over-fetching `3 * limit` each, fuse
    /// with RRF and truncate to `limit`. Zero candidates from both spaces
    /// is a valid empty outcome, not a failure; downstream handles the
    /// no-context case.
    pub async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<RetrievalOutcome, PipelineError> {
        let started = Instant::now();
        let prefetch = PREFETCH_FACTOR * limit;

        let dense = self
            .bounded(self.store.dense_search(query, prefetch))
            .await?;
        let sparse = self
            .bounded(self.store.sparse_search(query, prefetch))
            .await?;

        let results = fusion::reciprocal_rank_fusion(dense, sparse, limit);
        let retrieval_time_ms = started.elapsed().as_millis() as u64;

        tracing::debug!(
            "retrieved {} documents in {}ms",
            results.len(),
            retrieval_time_ms
        );

        Ok(RetrievalOutcome {
            retrieved_count: results.len(),
            results,
            retrieval_time_ms,
        })
    }

    async fn bounded<F>(&self, call: F) -> Result<Vec<ScoredResult>, PipelineError>
    where
        F: std::future::Future<Output = Result<Vec<ScoredResult>, PipelineError>>,
    {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::retrieval(
                format!("vector store query exceeded {:?}", self.call_timeout),
                true,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::dataset::DocMetadata;

    struct FixedStore {
        dense: Vec<ScoredResult>,
        sparse: Vec<ScoredResult>,
    }

    #[async_trait]
    impl SearchStore for FixedStore {
        async fn dense_search(
            &self,
            _query: &str,
            limit: usize,
        ) -> Result<Vec<ScoredResult>, PipelineError> {
            Ok(self.dense.iter().take(limit).cloned().collect())
        }

        async fn sparse_search(
            &self,
            _query: &str,
            limit: usize,
        ) -> Result<Vec<ScoredResult>, PipelineError> {
            Ok(self.sparse.iter().take(limit).cloned().collect())
        }

        async fn health_check(&self) -> bool {
            true
        }
    }

    struct FailingStore;

    #[async_trait]
    impl SearchStore for FailingStore {
        async fn dense_search(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<ScoredResult>, PipelineError> {
            Err(PipelineError::retrieval("connection refused", true))
        }

        async fn sparse_search(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<ScoredResult>, PipelineError> {
            Err(PipelineError::retrieval("connection refused", true))
        }

        async fn health_check(&self) -> bool {
            false
        }
    }

    fn hit(id: &str) -> ScoredResult {
        ScoredResult {
            id: id.to_string(),
            score: 0.5,
            metadata: DocMetadata {
                title: String::new(),
                context: format!("context {id}"),
                question: String::new(),
                answer: String::new(),
                has_answer: true,
            },
        }
    }

    fn retriever(store: impl SearchStore + 'static) -> HybridRetriever {
        HybridRetriever::new(Arc::new(store), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn respects_the_limit() {
        let store = FixedStore {
            dense: vec![hit("a"), hit("b"), hit("c"), hit("d")],
            sparse: vec![hit("e"), hit("f")],
        };

        let outcome = retriever(store).search("q", 2).await.unwrap();
        assert_eq!(outcome.retrieved_count, 2);
        assert_eq!(outcome.results.len(), 2);
    }

    #[tokio::test]
    async fn zero_candidates_is_an_empty_outcome_not_an_error() {
        let store = FixedStore {
            dense: Vec::new(),
            sparse: Vec::new(),
        };

        let outcome = retriever(store).search("q", 2).await.unwrap();
        assert!(outcome.is_empty());
        assert_eq!(outcome.retrieved_count, 0);
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let err = retriever(FailingStore).search("q", 2).await.unwrap_err();
        assert!(matches!(err, PipelineError::Retrieval { .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn retrieved_count_matches_results() {
        let store = FixedStore {
            dense: vec![hit("a")],
            sparse: vec![hit("a"), hit("b")],
        };

        let outcome = retriever(store).search("q", 5).await.unwrap();
        assert_eq!(outcome.retrieved_count, outcome.results.len());
        assert_eq!(outcome.retrieved_count, 2);
    }
}
