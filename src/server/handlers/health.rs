use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Reachability of the three collaborators, for the UI sidebar.
pub async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let qdrant = state.store.health_check().await;
    let postgres = state.logs.health_check().await;
    let llm = state.llm.health_check().await;

    Json(json!({
        "qdrant": qdrant,
        "postgres": postgres,
        "llm": llm,
        "collection": state.settings.collection,
        "model": state.settings.llm_model,
    }))
}
