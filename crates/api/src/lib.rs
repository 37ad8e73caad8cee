//! Read-side HTTP API over the denormalized user documents.
//!
//! Provides the user search endpoints, with structured logging (tracing)
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use document_store::DocumentStore;
use metrics_exporter_prometheus::PrometheusHandle;
use query::UserSearchService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::users::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: DocumentStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route("/api/v1/users/search", get(routes::users::search_all::<S>))
        .route(
            "/api/v1/users/search/{parameters}",
            get(routes::users::search::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state over a document store.
pub fn create_state<S: DocumentStore + Clone + 'static>(
    store: S,
    default_page_size: u32,
) -> Arc<AppState<S>> {
    Arc::new(AppState {
        search: UserSearchService::new(store),
        default_page_size,
    })
}
