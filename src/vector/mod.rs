//! Vector store abstraction.
//!
//! The pipeline only sees these traits; the Qdrant implementation lives in
//! the `qdrant` module and test doubles live next to the pipeline tests.

pub mod qdrant;
pub mod sparse;

use async_trait::async_trait;

use crate::core::errors::PipelineError;
use crate::dataset::{DocMetadata, EmbeddingDocument};

/// One search hit: stored metadata plus the backend score for the space
/// the hit came from (replaced by the fused score after rank fusion).
#[derive(Debug, Clone)]
pub struct ScoredResult {
    pub id: String,
    pub score: f32,
    pub metadata: DocMetadata,
}

/// Query side of the store: two independently ranked candidate lists, one
/// per vector space, best first.
#[async_trait]
pub trait SearchStore: Send + Sync {
    async fn dense_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredResult>, PipelineError>;

    async fn sparse_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredResult>, PipelineError>;

    /// Cheap reachability probe for the status endpoint.
    async fn health_check(&self) -> bool;
}

/// Ingestion side of the store, used only by the `ingest` binary.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn ensure_collection(&self) -> Result<(), PipelineError>;

    async fn upsert(&self, documents: &[EmbeddingDocument]) -> Result<(), PipelineError>;

    async fn count(&self) -> Result<u64, PipelineError>;
}
