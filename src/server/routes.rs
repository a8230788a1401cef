//! Route definitions.

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Creates the router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    // Uploads are buffered whole; unbounded unless a cap is configured.
    let body_limit = match state.server.max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    let api = Router::new()
        .route("/api/sessions", post(handlers::create_session))
        .route(
            "/api/sessions/{id}",
            get(handlers::get_session).delete(handlers::delete_session),
        )
        .route("/api/sessions/{id}/messages", post(handlers::send_message))
        .route("/api/sessions/{id}/pdf", post(handlers::upload_pdf))
        .route("/api/sessions/{id}/data", post(handlers::upload_data))
        .route("/api/sessions/{id}/clear", post(handlers::clear_chat))
        .route("/api/sessions/{id}/files", delete(handlers::remove_files));

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .merge(api)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
