use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::config::Settings;
use crate::db::LogStore;
use crate::llm::{GroqProvider, LlmProvider};
use crate::pipeline::RagPipeline;
use crate::retrieval::HybridRetriever;
use crate::vector::qdrant::QdrantStore;
use crate::vector::SearchStore;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("failed to initialize vector store: {0}")]
    VectorStore(String),

    #[error("failed to initialize interaction log: {0}")]
    Database(String),
}

/// Shared application state: configuration plus the service handles the
/// pipeline and handlers borrow. Everything is constructed once at startup
/// and injected, so tests can assemble the same shape from doubles.
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<dyn SearchStore>,
    pub llm: Arc<dyn LlmProvider>,
    pub logs: LogStore,
    pub pipeline: RagPipeline,
}

impl AppState {
    pub async fn initialize(settings: Settings) -> Result<Arc<Self>, InitializationError> {
        let timeout = Duration::from_secs(settings.request_timeout_secs);

        let llm: Arc<dyn LlmProvider> = Arc::new(GroqProvider::new(
            settings.llm_base_url.clone(),
            settings.llm_api_key.clone(),
            timeout,
        ));

        let store: Arc<dyn SearchStore> = Arc::new(
            QdrantStore::new(
                &settings.qdrant_url,
                settings.collection.clone(),
                llm.clone(),
                settings.embedding_model.clone(),
                settings.embedding_dim,
            )
            .map_err(|e| InitializationError::VectorStore(e.to_string()))?,
        );

        let logs = LogStore::connect(&settings.database_url)
            .await
            .map_err(|e| InitializationError::Database(e.to_string()))?;

        let retriever = HybridRetriever::new(store.clone(), timeout);
        let pipeline = RagPipeline::new(
            retriever,
            llm.clone(),
            settings.llm_model.clone(),
            settings.collection.clone(),
            settings.top_k,
        );

        Ok(Arc::new(Self {
            settings,
            store,
            llm,
            logs,
            pipeline,
        }))
    }
}
