//! Relational interaction log: questions, answers with metrics, feedback.
//!
//! Logging sits outside the core pipeline; callers fire it off the hot
//! path and a failure here never fails an answer.

use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};

use crate::core::errors::ApiError;
use crate::pipeline::RagMetrics;

#[derive(Debug, Clone, Serialize)]
pub struct ConversationEntry {
    pub question: String,
    pub answer: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStats {
    pub total_questions: i64,
    pub avg_response_time_ms: f64,
    pub avg_tokens: f64,
    pub fast_responses: i64,
}

#[derive(Clone)]
pub struct LogStore {
    pool: PgPool,
}

impl LogStore {
    pub async fn connect(database_url: &str) -> Result<Self, ApiError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .map_err(|e| ApiError::internal(format!("cannot connect to postgres: {e}")))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS questions (
                id TEXT PRIMARY KEY,
                question_text TEXT NOT NULL,
                user_id TEXT NOT NULL DEFAULT 'anonymous',
                session_id TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS answers (
                id TEXT PRIMARY KEY,
                question_id TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
                answer_text TEXT NOT NULL,
                model_used TEXT NOT NULL,
                retrieval_time_ms BIGINT NOT NULL,
                generation_time_ms BIGINT NOT NULL,
                total_time_ms BIGINT NOT NULL,
                qdrant_collection TEXT NOT NULL,
                retrieved_docs_count BIGINT NOT NULL,
                total_tokens BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS feedback (
                id BIGSERIAL PRIMARY KEY,
                answer_id TEXT NOT NULL REFERENCES answers(id) ON DELETE CASCADE,
                rating INT NOT NULL,
                feedback_text TEXT,
                is_helpful BOOLEAN,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_answers_question_id ON answers(question_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(())
    }

    pub async fn log_question(
        &self,
        question_text: &str,
        user_id: &str,
        session_id: Option<&str>,
    ) -> Result<String, ApiError> {
        let question_id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO questions (id, question_text, user_id, session_id)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&question_id)
        .bind(question_text)
        .bind(user_id)
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(question_id)
    }

    pub async fn log_answer(
        &self,
        question_id: &str,
        answer_text: &str,
        metrics: &RagMetrics,
    ) -> Result<String, ApiError> {
        let answer_id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO answers (
                id, question_id, answer_text, model_used,
                retrieval_time_ms, generation_time_ms, total_time_ms,
                qdrant_collection, retrieved_docs_count, total_tokens
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&answer_id)
        .bind(question_id)
        .bind(answer_text)
        .bind(&metrics.model_used)
        .bind(metrics.retrieval_time_ms as i64)
        .bind(metrics.generation_time_ms as i64)
        .bind(metrics.total_time_ms as i64)
        .bind(&metrics.collection)
        .bind(metrics.retrieved_docs_count as i64)
        .bind(metrics.total_tokens as i64)
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(answer_id)
    }

    pub async fn log_feedback(
        &self,
        answer_id: &str,
        rating: i32,
        feedback_text: Option<&str>,
        is_helpful: Option<bool>,
    ) -> Result<(), ApiError> {
        let result = sqlx::query(
            "INSERT INTO feedback (answer_id, rating, feedback_text, is_helpful)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(answer_id)
        .bind(rating)
        .bind(feedback_text)
        .bind(is_helpful)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => Err(
                ApiError::NotFound(format!("answer {answer_id} does not exist")),
            ),
            Err(e) => Err(ApiError::internal(e)),
        }
    }

    pub async fn recent_conversations(
        &self,
        limit: i64,
    ) -> Result<Vec<ConversationEntry>, ApiError> {
        let rows = sqlx::query(
            "SELECT q.question_text, a.answer_text, q.created_at
             FROM questions q
             LEFT JOIN answers a ON q.id = a.question_id
             ORDER BY q.created_at DESC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        let mut conversations = Vec::with_capacity(rows.len());
        for row in rows {
            let created_at: chrono::DateTime<chrono::Utc> = row
                .try_get("created_at")
                .map_err(ApiError::internal)?;
            conversations.push(ConversationEntry {
                question: row.try_get("question_text").map_err(ApiError::internal)?,
                answer: row.try_get("answer_text").map_err(ApiError::internal)?,
                timestamp: created_at.to_rfc3339(),
            });
        }

        Ok(conversations)
    }

    /// Aggregates over the last 24 hours of answers.
    pub async fn system_stats(&self) -> Result<SystemStats, ApiError> {
        let row = sqlx::query(
            "SELECT
                COUNT(*) AS total_questions,
                COALESCE(AVG(total_time_ms), 0)::DOUBLE PRECISION AS avg_response_time,
                COALESCE(AVG(total_tokens), 0)::DOUBLE PRECISION AS avg_tokens,
                COUNT(*) FILTER (WHERE total_time_ms < 1000) AS fast_responses
             FROM answers
             WHERE created_at >= NOW() - INTERVAL '24 hours'",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(SystemStats {
            total_questions: row.try_get("total_questions").map_err(ApiError::internal)?,
            avg_response_time_ms: row
                .try_get("avg_response_time")
                .map_err(ApiError::internal)?,
            avg_tokens: row.try_get("avg_tokens").map_err(ApiError::internal)?,
            fast_responses: row.try_get("fast_responses").map_err(ApiError::internal)?,
        })
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
