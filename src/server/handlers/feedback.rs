use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub answer_id: String,
    pub rating: i32,
    #[serde(default)]
    pub feedback_text: Option<String>,
    #[serde(default)]
    pub is_helpful: Option<bool>,
}

pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !(1..=5).contains(&payload.rating) {
        return Err(ApiError::BadRequest(
            "rating must be between 1 and 5".to_string(),
        ));
    }

    state
        .logs
        .log_feedback(
            &payload.answer_id,
            payload.rating,
            payload.feedback_text.as_deref(),
            payload.is_helpful,
        )
        .await?;

    Ok(Json(json!({ "status": "recorded" })))
}
