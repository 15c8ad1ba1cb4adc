//! Router assembly

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use super::auth::{require_bearer, BearerAuth};
use super::handler::{receive_webhook, serve_index, stream_logs};
use crate::registry::ListenerRegistry;
use crate::relay::Relay;

/// Shared state available to all route handlers
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ListenerRegistry>,
    pub relay: Arc<Relay>,
    pub auth: Arc<BearerAuth>,
}

/// Build the router:
/// - `/`        entry page, sets the session cookie
/// - `/webhook` publish, optional bearer auth
/// - `/logs`    WebSocket log stream
///
/// Unsupported methods on these paths answer 405.
pub fn build_router(state: AppState, max_body_size: usize) -> Router {
    let webhook = post(receive_webhook).route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_bearer,
    ));

    Router::new()
        .route("/", get(serve_index))
        .route("/webhook", webhook)
        .route("/logs", get(stream_logs))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .with_state(state)
}
