//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use document_store::DocumentStore;
use serde::Serialize;

use super::users::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<u64>,
}

/// GET /health: reports whether the document store answers.
pub async fn check<S: DocumentStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> (StatusCode, Json<HealthResponse>) {
    match state.search.count().await {
        Ok(users) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                users: Some(users),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "document store unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable",
                    users: None,
                }),
            )
        }
    }
}
