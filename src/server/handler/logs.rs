//! Log stream over WebSocket

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use futures::stream::SplitStream;
use futures::StreamExt;

use crate::registry::{ListenerStream, RegistryError};
use crate::server::cookie;
use crate::server::routes::AppState;
use crate::session::run_stream;

/// `GET /logs`: stream this session's messages as text frames
///
/// Never creates a session. The listener is removed from the registry when
/// the connection ends, whatever the cause.
pub async fn stream_logs(
    State(state): State<AppState>,
    jar: CookieJar,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let Some(id) = cookie::session_id(&jar) else {
        tracing::warn!("Log stream requested without a session cookie");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    if state.registry.get_listener(id).is_none() {
        tracing::warn!(listener_id = %id, "Log stream requested for unknown session");
        return StatusCode::BAD_REQUEST.into_response();
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => {
            tracing::error!(listener_id = %id, error = %rejection, "Failed to upgrade the connection");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let stream = match state.registry.attach(id) {
        Ok(stream) => stream,
        Err(RegistryError::AlreadyStreaming(_)) => {
            tracing::warn!(listener_id = %id, "Session already has a log stream");
            return StatusCode::CONFLICT.into_response();
        }
        Err(RegistryError::ListenerNotFound(_)) => {
            tracing::warn!(listener_id = %id, "Session removed before upgrade");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    ws.on_failed_upgrade(move |e| {
        tracing::error!(listener_id = %id, error = %e, "WebSocket upgrade failed");
    })
    .on_upgrade(move |socket| handle_socket(socket, stream))
}

async fn handle_socket(socket: WebSocket, stream: ListenerStream) {
    tracing::info!(listener_id = %stream.id(), "Log stream connected");

    let (mut sink, incoming) = socket.split();
    run_stream(stream, &mut sink, peer_closed(incoming)).await;
}

/// Resolves once the browser closes its side or the socket errors
async fn peer_closed(mut incoming: SplitStream<WebSocket>) {
    while let Some(Ok(message)) = incoming.next().await {
        if let Message::Close(_) = message {
            break;
        }
    }
}
