//! One-time dataset ingestion: read a SQuAD v2 export, normalize and
//! prepare documents, and upsert them into the Qdrant collection with
//! dense and sparse vectors.
//!
//! Usage: `ingest <path-to-squad-json-or-jsonl>`

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};

use squadrag::core::config::Settings;
use squadrag::core::logging;
use squadrag::dataset::{load_records, prepare_document};
use squadrag::llm::{GroqProvider, LlmProvider};
use squadrag::vector::qdrant::QdrantStore;
use squadrag::vector::DocumentSink;

const BATCH_SIZE: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init(Path::new("logs"));

    let path: PathBuf = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => bail!("usage: ingest <path-to-squad-json-or-jsonl>"),
    };

    let settings = Settings::from_env();
    let llm: Arc<dyn LlmProvider> = Arc::new(GroqProvider::new(
        settings.llm_base_url.clone(),
        settings.llm_api_key.clone(),
        Duration::from_secs(settings.request_timeout_secs),
    ));
    let store = QdrantStore::new(
        &settings.qdrant_url,
        settings.collection.clone(),
        llm,
        settings.embedding_model.clone(),
        settings.embedding_dim,
    )
    .context("cannot build qdrant client")?;

    let records = load_records(&path)
        .with_context(|| format!("cannot load records from {}", path.display()))?;
    tracing::info!("loaded {} records from {}", records.len(), path.display());

    let documents: Vec<_> = records.into_iter().map(prepare_document).collect();

    store
        .ensure_collection()
        .await
        .context("cannot ensure collection")?;

    let total = documents.len();
    for (batch_index, batch) in documents.chunks(BATCH_SIZE).enumerate() {
        store
            .upsert(batch)
            .await
            .with_context(|| format!("upsert failed at batch {batch_index}"))?;
        tracing::info!(
            "ingested {}/{} documents",
            (batch_index * BATCH_SIZE + batch.len()).min(total),
            total
        );
    }

    let count = store.count().await.context("cannot count points")?;
    tracing::info!(
        "collection '{}' now holds {} points",
        settings.collection,
        count
    );

    Ok(())
}
