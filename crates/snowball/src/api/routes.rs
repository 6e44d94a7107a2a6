//! API route definitions.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::handlers;
use super::state::AppState;

/// Build the control-plane router.
pub fn create_router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
        .on_response(DefaultOnResponse::new().level(Level::DEBUG));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/identity", get(handlers::identity))
        .route("/discover", post(handlers::discover))
        .route("/pairing/request", post(handlers::request_pairing))
        .route("/pairing/approve", post(handlers::approve_pairing))
        .route("/pairing/status", get(handlers::pairing_status))
        .route("/pairing/requests", get(handlers::pairing_requests))
        .route("/capabilities", get(handlers::capabilities))
        .route("/resources/grant", post(handlers::grant_resources))
        .route("/sandbox/launch", post(handlers::launch))
        .layer(trace_layer)
        .with_state(state)
}
