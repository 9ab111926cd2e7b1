use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Run the pipeline for one question and persist the interaction.
///
/// Logging happens after the answer is computed and its failure only
/// warns; the caller still gets their answer.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let question = payload.question.trim().to_string();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }

    let result = state.pipeline.answer(&question).await?;

    let user_id = payload.user_id.unwrap_or_else(|| "anonymous".to_string());
    let answer_id = log_interaction(&state, &question, &user_id, payload.session_id, &result).await;

    Ok(Json(json!({
        "answer": result.answer,
        "answer_id": answer_id,
        "metrics": result.metrics,
    })))
}

async fn log_interaction(
    state: &AppState,
    question: &str,
    user_id: &str,
    session_id: Option<String>,
    result: &crate::pipeline::RagResult,
) -> Option<String> {
    let question_id = match state
        .logs
        .log_question(question, user_id, session_id.as_deref())
        .await
    {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("failed to log question: {}", e);
            return None;
        }
    };

    match state
        .logs
        .log_answer(&question_id, &result.answer, &result.metrics)
        .await
    {
        Ok(answer_id) => Some(answer_id),
        Err(e) => {
            tracing::warn!("failed to log answer: {}", e);
            None
        }
    }
}
