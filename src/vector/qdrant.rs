//! Qdrant-backed store with two named vector spaces per point:
//! a dense cosine space and a sparse BM25 space with server-side IDF.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, CountPointsBuilder, CreateCollectionBuilder, Distance, Modifier,
    NamedVectors, PointStruct, Query, QueryPointsBuilder, ScoredPoint, SparseVectorParamsBuilder,
    SparseVectorsConfigBuilder, UpsertPointsBuilder, Value, Vector, VectorParamsBuilder,
    VectorsConfigBuilder,
};
use qdrant_client::{Payload, Qdrant};
use uuid::Uuid;

use super::sparse;
use super::{DocumentSink, ScoredResult, SearchStore};
use crate::core::errors::PipelineError;
use crate::dataset::{DocMetadata, EmbeddingDocument};
use crate::llm::LlmProvider;

pub const DENSE_VECTOR: &str = "dense";
pub const SPARSE_VECTOR: &str = "bm25";

pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    embedder: Arc<dyn LlmProvider>,
    embedding_model: String,
    embedding_dim: u64,
}

impl QdrantStore {
    pub fn new(
        url: &str,
        collection: String,
        embedder: Arc<dyn LlmProvider>,
        embedding_model: String,
        embedding_dim: u64,
    ) -> Result<Self, PipelineError> {
        let client = Qdrant::from_url(url)
            .build()
            .map_err(|e| PipelineError::retrieval(format!("cannot build client: {e}"), false))?;

        Ok(Self {
            client,
            collection,
            embedder,
            embedding_model,
            embedding_dim,
        })
    }

    /// Dense query vector via the embeddings endpoint. An embedding-service
    /// failure surfaces as a retrieval error since it happens inside the
    /// search boundary.
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, PipelineError> {
        let mut vectors = self
            .embedder
            .embed(&[query.to_string()], &self.embedding_model)
            .await
            .map_err(|e| {
                let transient = e.is_transient();
                PipelineError::retrieval(format!("query embedding failed: {e}"), transient)
            })?;

        if vectors.is_empty() {
            return Err(PipelineError::retrieval(
                "embedding service returned no vector",
                false,
            ));
        }
        Ok(vectors.swap_remove(0))
    }

    async fn ranked_query(&self, query: Query, space: &str, limit: usize)
        -> Result<Vec<ScoredResult>, PipelineError> {
        let response = self
            .client
            .query(
                QueryPointsBuilder::new(&self.collection)
                    .query(query)
                    .using(space)
                    .limit(limit as u64)
                    .with_payload(true),
            )
            .await
            .map_err(qdrant_error)?;

        response.result.iter().map(scored_result).collect()
    }
}

/// Connection-level failures are transient; a missing collection or a
/// malformed request will not fix itself and is fatal.
fn qdrant_error(err: qdrant_client::QdrantError) -> PipelineError {
    let message = err.to_string();
    let fatal = message.contains("doesn't exist") || message.contains("Not found");
    PipelineError::retrieval(message, !fatal)
}

fn scored_result(point: &ScoredPoint) -> Result<ScoredResult, PipelineError> {
    let id = match point.id.as_ref().and_then(|id| id.point_id_options.as_ref()) {
        Some(PointIdOptions::Uuid(uuid)) => uuid.clone(),
        Some(PointIdOptions::Num(num)) => num.to_string(),
        None => return Err(PipelineError::retrieval("hit without point id", false)),
    };

    Ok(ScoredResult {
        id,
        score: point.score,
        metadata: metadata_from_payload(&point.payload)?,
    })
}

fn metadata_from_payload(
    payload: &HashMap<String, Value>,
) -> Result<DocMetadata, PipelineError> {
    let fields = match payload.get("metadata").and_then(|v| v.kind.as_ref()) {
        Some(Kind::StructValue(nested)) => &nested.fields,
        _ => {
            return Err(PipelineError::retrieval(
                "payload is missing the metadata object",
                false,
            ))
        }
    };

    let text = |key: &str| -> Result<String, PipelineError> {
        match fields.get(key).and_then(|v| v.kind.as_ref()) {
            Some(Kind::StringValue(s)) => Ok(s.clone()),
            _ => Err(PipelineError::retrieval(
                format!("payload is missing field `{key}`"),
                false,
            )),
        }
    };

    Ok(DocMetadata {
        title: text("title")?,
        context: text("context")?,
        question: text("question")?,
        answer: text("answer")?,
        has_answer: matches!(
            fields.get("has_answer").and_then(|v| v.kind.as_ref()),
            Some(Kind::BoolValue(true))
        ),
    })
}

#[async_trait]
impl SearchStore for QdrantStore {
    async fn dense_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredResult>, PipelineError> {
        let vector = self.embed_query(query).await?;
        self.ranked_query(Query::new_nearest(vector), DENSE_VECTOR, limit)
            .await
    }

    async fn sparse_search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredResult>, PipelineError> {
        let encoded = sparse::encode_query(query);
        if encoded.is_empty() {
            return Ok(Vec::new());
        }

        let pairs: Vec<(u32, f32)> = encoded
            .indices
            .into_iter()
            .zip(encoded.values)
            .collect();
        self.ranked_query(Query::new_nearest(pairs.as_slice()), SPARSE_VECTOR, limit)
            .await
    }

    async fn health_check(&self) -> bool {
        self.client.health_check().await.is_ok()
    }
}

#[async_trait]
impl DocumentSink for QdrantStore {
    async fn ensure_collection(&self) -> Result<(), PipelineError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(qdrant_error)?;
        if exists {
            return Ok(());
        }

        tracing::info!("creating collection '{}'", self.collection);

        let mut vectors = VectorsConfigBuilder::default();
        vectors.add_named_vector_params(
            DENSE_VECTOR,
            VectorParamsBuilder::new(self.embedding_dim, Distance::Cosine),
        );

        let mut sparse_vectors = SparseVectorsConfigBuilder::default();
        sparse_vectors.add_named_vector_params(
            SPARSE_VECTOR,
            SparseVectorParamsBuilder::default().modifier(Modifier::Idf),
        );

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(vectors)
                    .sparse_vectors_config(sparse_vectors),
            )
            .await
            .map_err(qdrant_error)?;
        Ok(())
    }

    async fn upsert(&self, documents: &[EmbeddingDocument]) -> Result<(), PipelineError> {
        if documents.is_empty() {
            return Ok(());
        }

        let texts: Vec<String> = documents.iter().map(|doc| doc.text.clone()).collect();
        let dense_vectors = self
            .embedder
            .embed(&texts, &self.embedding_model)
            .await?;
        if dense_vectors.len() != documents.len() {
            return Err(PipelineError::retrieval(
                format!(
                    "embedding service returned {} vectors for {} documents",
                    dense_vectors.len(),
                    documents.len()
                ),
                false,
            ));
        }

        let mut points = Vec::with_capacity(documents.len());
        for (document, dense) in documents.iter().zip(dense_vectors) {
            let encoded = sparse::encode_document(&document.text);

            let vectors = NamedVectors::default()
                .add_vector(DENSE_VECTOR, Vector::new_dense(dense))
                .add_vector(
                    SPARSE_VECTOR,
                    Vector::new_sparse(encoded.indices, encoded.values),
                );

            let payload_value = serde_json::json!({ "metadata": document.metadata });
            let payload = Payload::try_from(payload_value)
                .map_err(|e| PipelineError::data(format!("unserializable payload: {e}")))?;

            points.push(PointStruct::new(
                Uuid::new_v4().to_string(),
                vectors,
                payload,
            ));
        }

        self.client
            .upsert_points(
                UpsertPointsBuilder::new(&self.collection, points)
                    .wait(true)
                    .build(),
            )
            .await
            .map_err(qdrant_error)?;
        Ok(())
    }

    async fn count(&self) -> Result<u64, PipelineError> {
        let response = self
            .client
            .count(CountPointsBuilder::new(&self.collection).exact(true))
            .await
            .map_err(qdrant_error)?;
        Ok(response.result.map(|r| r.count).unwrap_or(0))
    }
}
