use std::sync::Arc;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{conversations, feedback, health, qa, stats};
use crate::state::AppState;

/// Application router: health probes, the question-answering endpoint, and
/// the interaction-log endpoints the chat front end reads.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health::health))
        .route("/api/status", get(health::status))
        .route("/api/ask", post(qa::ask))
        .route("/api/conversations", get(conversations::recent))
        .route("/api/feedback", post(feedback::submit))
        .route("/api/stats", get(stats::stats))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
